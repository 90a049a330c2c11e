//! Per-block trade netting.
//!
//! Consumes an already block/log-ordered event stream for one pool and
//! accumulates per-address buy/sell volume of the reference asset (token0),
//! emitting a [`NetPositions`] snapshot at every block boundary. Netting is
//! pure aggregation; classification happens downstream.
//!
//! Block numbers must be non-decreasing: netting depends on seeing all of a
//! block's events contiguously, so a regression fails fast instead of
//! silently producing split blocks.

use std::collections::HashMap;

use alloy::primitives::Address;
use eyre::{eyre, Result};
use tracing::debug;

use poolscope_data::taxonomy::AddressTaxonomy;
use poolscope_data::types::SwapEvent;

/// How an event's flow is booked to an address before netting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AttributionMode {
    /// Book everything under the recipient (`to`) address.
    #[default]
    Recipient,
    /// Prefer known bots, then routers, then fall back to the sender.
    ///
    /// Precedence: sender if sender is a known bot; else recipient if it is
    /// a known bot; else whichever of sender/recipient is a known router
    /// (sender wins when both are); else the sender, with both addresses
    /// recorded as unattributed.
    BotPrecedence,
}

/// Net buy/sell volume per address for exactly one block.
///
/// Buys are token0 paid into the pool (the trader acquiring token1), sells
/// are token0 paid out. Created at a block boundary, consumed by the
/// classifier, discarded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetPositions {
    /// Block number the snapshot covers.
    pub block_number: u64,
    /// Timestamp of the block's first event, unix seconds.
    pub timestamp_s: u64,
    /// Token0 volume per buying address.
    pub buyers: HashMap<Address, u128>,
    /// Token0 volume per selling address.
    pub sellers: HashMap<Address, u128>,
}

impl NetPositions {
    fn new(block_number: u64, timestamp_s: u64) -> Self {
        Self {
            block_number,
            timestamp_s,
            buyers: HashMap::new(),
            sellers: HashMap::new(),
        }
    }

    /// Sum of all per-address net volumes in the block.
    pub fn total_volume(&self) -> u128 {
        let bought: u128 = self.buyers.values().sum();
        let sold: u128 = self.sellers.values().sum();
        bought + sold
    }

    /// True when no flow was recorded for the block.
    pub fn is_empty(&self) -> bool {
        self.buyers.is_empty() && self.sellers.is_empty()
    }
}

/// Nets out spurious volume created by the pool's reserve-sync mechanism.
///
/// V2 pools occasionally report both token0 sides non-zero on one event when
/// excess reserves are returned to the swapper. Only the difference is real
/// flow: `(100, 30)` corrects to `(70, 0)` and `(30, 100)` to `(0, 70)`.
pub fn correct_sync_artifact(amount0_in: u128, amount0_out: u128) -> (u128, u128) {
    if amount0_in > 0 && amount0_out > 0 {
        if amount0_in > amount0_out {
            (amount0_in - amount0_out, 0)
        } else {
            (0, amount0_out - amount0_in)
        }
    } else {
        (amount0_in, amount0_out)
    }
}

/// Streaming per-block netter.
///
/// Feed events in order with [`BlockNetter::push`]; every block boundary
/// yields the finished block's snapshot. Call [`BlockNetter::finish`] once
/// at stream end for the final block.
pub struct BlockNetter<'a> {
    taxonomy: &'a AddressTaxonomy,
    mode: AttributionMode,
    current: Option<NetPositions>,
    /// Occurrence counts for addresses no attribution rule matched
    /// (populated in [`AttributionMode::BotPrecedence`] only).
    pub unattributed: HashMap<Address, u64>,
    /// Events where the sender was a known bot but the recipient a known
    /// router; the sender won, per the documented precedence.
    pub attribution_conflicts: u64,
}

impl<'a> BlockNetter<'a> {
    pub fn new(taxonomy: &'a AddressTaxonomy, mode: AttributionMode) -> Self {
        Self {
            taxonomy,
            mode,
            current: None,
            unattributed: HashMap::new(),
            attribution_conflicts: 0,
        }
    }

    /// Selects the address this event's flow is booked under.
    fn attribute(&mut self, event: &SwapEvent) -> Address {
        let sender = event.sender();
        let recipient = event.recipient();

        match self.mode {
            AttributionMode::Recipient => recipient,
            AttributionMode::BotPrecedence => {
                if self.taxonomy.is_arb_bot(sender) {
                    if self.taxonomy.is_router(recipient) {
                        self.attribution_conflicts += 1;
                        debug!(
                            sender = %sender,
                            recipient = %recipient,
                            tx_hash = event.tx_hash(),
                            "sender is a bot but recipient is a router; using sender"
                        );
                    }
                    sender
                } else if self.taxonomy.is_arb_bot(recipient) {
                    recipient
                } else if self.taxonomy.is_router(sender) {
                    sender
                } else if self.taxonomy.is_router(recipient) {
                    recipient
                } else {
                    *self.unattributed.entry(sender).or_insert(0) += 1;
                    *self.unattributed.entry(recipient).or_insert(0) += 1;
                    sender
                }
            }
        }
    }

    /// Nets one event into the current block.
    ///
    /// Returns the previous block's snapshot when `event` starts a new
    /// block, `None` otherwise. Snapshots are emitted even for blocks whose
    /// corrected flow nets to zero so callers can track coverage.
    ///
    /// # Errors
    /// Fails fast when `event.block_number()` is lower than the block
    /// currently being aggregated; the stream precondition is broken and
    /// every downstream number would be wrong.
    pub fn push(&mut self, event: &SwapEvent) -> Result<Option<NetPositions>> {
        let block_number = event.block_number();

        let boundary = match &self.current {
            Some(current) if current.block_number == block_number => false,
            Some(current) if current.block_number > block_number => {
                return Err(eyre!(
                    "event stream is not block-ordered: block {} after block {}",
                    block_number,
                    current.block_number
                ));
            }
            _ => true,
        };
        let emitted = if boundary {
            self.current
                .replace(NetPositions::new(block_number, event.timestamp_s()))
        } else {
            None
        };

        let address = self.attribute(event);
        let (amount0_in, amount0_out) = match event {
            SwapEvent::V2(v2) => correct_sync_artifact(v2.amount0_in, v2.amount0_out),
            SwapEvent::V3(_) => event.token0_flow(),
        };

        let current = self
            .current
            .get_or_insert_with(|| NetPositions::new(block_number, event.timestamp_s()));
        if amount0_out > 0 {
            *current.sellers.entry(address).or_insert(0) += amount0_out;
        } else if amount0_in > 0 {
            *current.buyers.entry(address).or_insert(0) += amount0_in;
        }

        Ok(emitted)
    }

    /// Flushes the final block at stream end.
    pub fn finish(&mut self) -> Option<NetPositions> {
        self.current.take()
    }
}
