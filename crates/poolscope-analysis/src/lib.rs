//! poolscope-analysis crate
//!
//! Behavioral volume analysis over swap-event streams: per-block trade
//! netting, address-taxonomy classification into four volume buckets,
//! a toxic-arbitrage volume upper bound, and trade-frequency statistics.

pub mod arb_bound;
pub mod classify;
pub mod frequency;
pub mod netting;

pub use classify::{classify_events, ClassificationConfig, ClassificationReport, VolumeBuckets};
pub use netting::{AttributionMode, BlockNetter, NetPositions};
