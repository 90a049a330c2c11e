//! Upper bound on toxic-arbitrage volume.
//!
//! "Toxic" arbitrage is flow driven by an external price source: the
//! arbitrageur trades against a stale pool price and the LP side realizes a
//! negative markout. The per-block bound is the volume required to move the
//! block's start price toward its end price, i.e. the absolute imbalance
//! between token0 inflow and outflow. True toxic volume can never exceed
//! the bound but can be smaller, since some one-sided flow is just ordinary
//! traders pushing the price.
//!
//! Example over three blocks (token0 units):
//! - block 1: inflow 10        → bound 10
//! - block 2: outflow 10       → bound 10
//! - block 3: in 4, out 5, in 10 → |14 − 5| = 9

use eyre::{eyre, Result};

use poolscope_data::types::SwapEvent;

use crate::netting::correct_sync_artifact;

/// Volume totals from one bound estimation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArbBound {
    /// Total token0 volume across the stream (both directions).
    pub total_volume: u128,
    /// Accumulated per-block imbalance, the arbitrage upper bound.
    pub bound_volume: u128,
}

impl ArbBound {
    /// Bound as a fraction of total volume; 0 when nothing traded.
    pub fn proportion(&self) -> f64 {
        if self.total_volume == 0 {
            0.0
        } else {
            self.bound_volume as f64 / self.total_volume as f64
        }
    }
}

/// Accumulates the toxic-arbitrage bound over an ordered event stream.
///
/// # Errors
/// Fails fast on non-monotone block input, same as block netting.
pub fn estimate_arb_bound(events: &[SwapEvent]) -> Result<ArbBound> {
    let mut bound = ArbBound::default();
    let mut current_block: Option<u64> = None;
    let mut block_in = 0u128;
    let mut block_out = 0u128;

    let flush = |block_in: &mut u128, block_out: &mut u128, bound: &mut ArbBound| {
        bound.total_volume += *block_in + *block_out;
        bound.bound_volume += block_in.abs_diff(*block_out);
        *block_in = 0;
        *block_out = 0;
    };

    for event in events {
        let block_number = event.block_number();
        match current_block {
            Some(block) if block == block_number => {}
            Some(block) if block > block_number => {
                return Err(eyre!(
                    "event stream is not block-ordered: block {block_number} after block {block}"
                ));
            }
            _ => {
                if current_block.is_some() {
                    flush(&mut block_in, &mut block_out, &mut bound);
                }
                current_block = Some(block_number);
            }
        }

        let (raw_in, raw_out) = event.token0_flow();
        let (amount0_in, amount0_out) = correct_sync_artifact(raw_in, raw_out);
        block_in += amount0_in;
        block_out += amount0_out;
    }

    if current_block.is_some() {
        flush(&mut block_in, &mut block_out, &mut bound);
    }

    Ok(bound)
}
