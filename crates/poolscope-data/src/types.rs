//! Type definitions for pool swap-event data.
//!
//! Token0 is always the reference (quote) asset: all classified volumes are
//! expressed in token0 base units. For a USDC/WETH pool that means volumes
//! are in USDC base units (6 decimals).

use alloy::primitives::Address;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Uniswap V2-style swap event.
///
/// Amounts are non-negative base-unit integers; `amount0_in` is token0 paid
/// into the pool by the trader, `amount0_out` is token0 paid out to the
/// trader. Both sides of the same token can be non-zero when the pool's
/// reserve-sync mechanism returns excess to the swapper (a sync artifact,
/// corrected during block netting).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapEventV2 {
    /// Block timestamp in unix seconds.
    pub timestamp_s: u64,
    /// Block number containing the swap.
    pub block_number: u64,
    /// Pool contract address.
    pub pool: Address,
    /// Token0 paid into the pool.
    pub amount0_in: u128,
    /// Token1 paid into the pool.
    pub amount1_in: u128,
    /// Token0 paid out to the trader.
    pub amount0_out: u128,
    /// Token1 paid out to the trader.
    pub amount1_out: u128,
    /// Recipient of the swap output.
    pub to: Address,
    /// Swap initiator (usually a router contract).
    pub sender: Address,
    /// Transaction hash (lowercase hex with 0x prefix).
    pub tx_hash: String,
}

/// Uniswap V3-style swap event.
///
/// Signed base-unit amounts; a negative amount denotes an outflow from the
/// pool to the trader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapEventV3 {
    /// Block timestamp in unix seconds.
    pub timestamp_s: u64,
    /// Block number containing the swap.
    pub block_number: u64,
    /// Pool contract address.
    pub pool: Address,
    /// Signed token0 delta from the pool's perspective.
    pub amount0: i128,
    /// Signed token1 delta from the pool's perspective.
    pub amount1: i128,
    /// Recipient of the swap output.
    pub to: Address,
    /// Swap initiator.
    pub sender: Address,
    /// Transaction hash (lowercase hex with 0x prefix).
    pub tx_hash: String,
}

/// A swap event from either pool generation, with a unified accessor surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SwapEvent {
    V2(SwapEventV2),
    V3(SwapEventV3),
}

impl SwapEvent {
    /// Block number containing the swap.
    pub fn block_number(&self) -> u64 {
        match self {
            SwapEvent::V2(event) => event.block_number,
            SwapEvent::V3(event) => event.block_number,
        }
    }

    /// Block timestamp in unix seconds.
    pub fn timestamp_s(&self) -> u64 {
        match self {
            SwapEvent::V2(event) => event.timestamp_s,
            SwapEvent::V3(event) => event.timestamp_s,
        }
    }

    /// Pool contract address.
    pub fn pool(&self) -> Address {
        match self {
            SwapEvent::V2(event) => event.pool,
            SwapEvent::V3(event) => event.pool,
        }
    }

    /// Swap initiator address.
    pub fn sender(&self) -> Address {
        match self {
            SwapEvent::V2(event) => event.sender,
            SwapEvent::V3(event) => event.sender,
        }
    }

    /// Recipient address of the swap output.
    pub fn recipient(&self) -> Address {
        match self {
            SwapEvent::V2(event) => event.to,
            SwapEvent::V3(event) => event.to,
        }
    }

    /// Transaction hash.
    pub fn tx_hash(&self) -> &str {
        match self {
            SwapEvent::V2(event) => &event.tx_hash,
            SwapEvent::V3(event) => &event.tx_hash,
        }
    }

    /// Token0 flow as `(into_pool, out_of_pool)` in base units.
    ///
    /// For V3 events the signed delta is split into the unsigned pair; for
    /// V2 events the raw pair is returned uncorrected (sync-artifact
    /// correction happens during block netting).
    pub fn token0_flow(&self) -> (u128, u128) {
        match self {
            SwapEvent::V2(event) => (event.amount0_in, event.amount0_out),
            SwapEvent::V3(event) => {
                if event.amount0 >= 0 {
                    (event.amount0 as u128, 0)
                } else {
                    (0, event.amount0.unsigned_abs())
                }
            }
        }
    }
}

/// UTC day of a unix timestamp, for per-day volume bucketing.
///
/// Returns `None` for timestamps outside the representable chrono range.
pub fn day_of(timestamp_s: u64) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp(timestamp_s as i64, 0).map(|dt| dt.date_naive())
}
