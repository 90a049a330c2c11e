//! Header-driven parsing of delimited swap-event records.
//!
//! Event rows arrive pre-extracted from an external indexer as
//! comma-delimited text with a header line. The two failure modes are
//! handled differently:
//!
//! - A **missing required column** in the header is a structural schema
//!   violation (an integration error) and fails fast with a descriptive
//!   error at [`EventSchema::from_header`] time.
//! - An individual row with the **wrong arity or non-numeric fields** is a
//!   data-quality condition: the row is skipped and counted in
//!   [`ParseStats`], never aborting the run.

use alloy::primitives::Address;
use eyre::{eyre, Result};
use tracing::debug;

use crate::types::{SwapEvent, SwapEventV2, SwapEventV3};

/// Pool generation the record stream was extracted from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolVersion {
    /// V2-style events: unsigned in/out amount pairs per token.
    V2,
    /// V3-style events: one signed amount per token.
    V3,
}

/// Required column names for V2 records, in [`EventSchema`] index order.
const V2_COLUMNS: [&str; 10] = [
    "timestamp",
    "block",
    "pool",
    "amount0_in",
    "amount1_in",
    "amount0_out",
    "amount1_out",
    "to",
    "sender",
    "tx_hash",
];

/// Required column names for V3 records, in [`EventSchema`] index order.
const V3_COLUMNS: [&str; 8] = [
    "timestamp",
    "block",
    "pool",
    "amount0",
    "amount1",
    "to",
    "sender",
    "tx_hash",
];

/// Counters for a parsing pass over one record stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Rows successfully parsed into events.
    pub parsed: u64,
    /// Malformed rows skipped (wrong arity or unparseable fields).
    pub skipped: u64,
    /// Well-formed rows dropped by the pool filter.
    pub filtered: u64,
}

/// Column layout resolved from a header line.
///
/// Columns may appear in any order and extra columns are ignored; only the
/// required set must be present.
#[derive(Clone, Debug)]
pub struct EventSchema {
    version: PoolVersion,
    /// Field index per required column, in `V2_COLUMNS`/`V3_COLUMNS` order.
    indices: Vec<usize>,
}

impl EventSchema {
    /// Resolves the column layout from a comma-delimited header line.
    ///
    /// # Errors
    /// Returns an error naming the first required column missing from the
    /// header. This is a structural schema violation, not a data condition.
    pub fn from_header(version: PoolVersion, header: &str) -> Result<Self> {
        let names: Vec<&str> = header.split(',').map(str::trim).collect();
        let required: &[&str] = match version {
            PoolVersion::V2 => &V2_COLUMNS,
            PoolVersion::V3 => &V3_COLUMNS,
        };

        let mut indices = Vec::with_capacity(required.len());
        for column in required {
            let index = names
                .iter()
                .position(|name| name.eq_ignore_ascii_case(column))
                .ok_or_else(|| {
                    eyre!("required column `{column}` missing from header `{header}`")
                })?;
            indices.push(index);
        }

        Ok(Self { version, indices })
    }

    /// Pool generation this schema parses.
    pub fn version(&self) -> PoolVersion {
        self.version
    }

    /// Parses one record line. Returns `None` for malformed rows.
    pub fn parse_line(&self, line: &str) -> Option<SwapEvent> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let field = |slot: usize| fields.get(self.indices[slot]).copied();

        let timestamp_s = field(0)?.parse::<u64>().ok()?;
        let block_number = field(1)?.parse::<u64>().ok()?;
        let pool = field(2)?.parse::<Address>().ok()?;

        match self.version {
            PoolVersion::V2 => Some(SwapEvent::V2(SwapEventV2 {
                timestamp_s,
                block_number,
                pool,
                amount0_in: field(3)?.parse::<u128>().ok()?,
                amount1_in: field(4)?.parse::<u128>().ok()?,
                amount0_out: field(5)?.parse::<u128>().ok()?,
                amount1_out: field(6)?.parse::<u128>().ok()?,
                to: field(7)?.parse::<Address>().ok()?,
                sender: field(8)?.parse::<Address>().ok()?,
                tx_hash: field(9)?.to_string(),
            })),
            PoolVersion::V3 => Some(SwapEvent::V3(SwapEventV3 {
                timestamp_s,
                block_number,
                pool,
                amount0: field(3)?.parse::<i128>().ok()?,
                amount1: field(4)?.parse::<i128>().ok()?,
                to: field(5)?.parse::<Address>().ok()?,
                sender: field(6)?.parse::<Address>().ok()?,
                tx_hash: field(7)?.to_string(),
            })),
        }
    }

    /// Parses every record line, skipping malformed rows and rows for other
    /// pools when a filter is given. Empty lines are ignored entirely.
    pub fn parse_records<'a>(
        &self,
        lines: impl IntoIterator<Item = &'a str>,
        pool_filter: Option<Address>,
    ) -> (Vec<SwapEvent>, ParseStats) {
        let mut events = Vec::new();
        let mut stats = ParseStats::default();

        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            match self.parse_line(line) {
                Some(event) => {
                    if pool_filter.is_some_and(|pool| event.pool() != pool) {
                        stats.filtered += 1;
                        continue;
                    }
                    stats.parsed += 1;
                    events.push(event);
                }
                None => {
                    stats.skipped += 1;
                    debug!(line, "skipping malformed event row");
                }
            }
        }

        (events, stats)
    }
}
