//! Trade-frequency statistics over an event stream.
//!
//! Answers three questions about a pool's activity profile: how many trades
//! land in a block (counting the empty blocks in between), what share of
//! blocks see any trade at all, and how long the no-trade gaps between
//! traded blocks run.

use eyre::{eyre, Result};

use poolscope_data::types::SwapEvent;

/// Summary statistics for one frequency pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrequencyStats {
    /// Number of blocks in the covered range, empty blocks included.
    pub blocks_covered: u64,
    /// Mean trades per block over the covered range.
    pub mean_trades_per_block: f64,
    /// Median trades per block.
    pub median_trades_per_block: u64,
    /// Population standard deviation of trades per block.
    pub std_trades_per_block: f64,
    /// Share of covered blocks with at least one trade, in [0, 1].
    pub traded_block_share: f64,
    /// Mean no-trade gap length between consecutive traded blocks.
    pub mean_gap: f64,
    /// Median gap length.
    pub median_gap: u64,
    /// Population standard deviation of gap lengths.
    pub std_gap: f64,
}

fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|value| *value as f64).sum::<f64>() / values.len() as f64
}

fn population_std(values: &[u64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|value| {
            let delta = *value as f64 - mean;
            delta * delta
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

fn median(values: &[u64]) -> u64 {
    if values.is_empty() {
        return 0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted[sorted.len() / 2]
}

/// Computes trade-frequency statistics over an ordered event stream.
///
/// Returns all-zero stats for an empty stream.
///
/// # Errors
/// Fails fast on non-monotone block input.
pub fn trade_frequency(events: &[SwapEvent]) -> Result<FrequencyStats> {
    let mut per_block: Vec<u64> = Vec::new();
    let mut gaps: Vec<u64> = Vec::new();
    let mut last_block: Option<u64> = None;
    let mut in_block = 0u64;

    for event in events {
        let block_number = event.block_number();
        match last_block {
            None => {
                last_block = Some(block_number);
                in_block = 1;
            }
            Some(block) if block == block_number => {
                in_block += 1;
            }
            Some(block) if block > block_number => {
                return Err(eyre!(
                    "event stream is not block-ordered: block {block_number} after block {block}"
                ));
            }
            Some(block) => {
                gaps.push(block_number - block - 1);
                per_block.push(in_block);
                // Empty blocks between the two traded ones count as zero.
                per_block.extend(std::iter::repeat(0).take((block_number - block - 1) as usize));
                last_block = Some(block_number);
                in_block = 1;
            }
        }
    }

    if last_block.is_none() {
        return Ok(FrequencyStats::default());
    }
    per_block.push(in_block);

    let traded_blocks = per_block.iter().filter(|count| **count > 0).count();
    let mean_trades = mean(&per_block);
    let mean_gap = mean(&gaps);

    Ok(FrequencyStats {
        blocks_covered: per_block.len() as u64,
        mean_trades_per_block: mean_trades,
        median_trades_per_block: median(&per_block),
        std_trades_per_block: population_std(&per_block, mean_trades),
        traded_block_share: traded_blocks as f64 / per_block.len() as f64,
        mean_gap,
        median_gap: median(&gaps),
        std_gap: population_std(&gaps, mean_gap),
    })
}
