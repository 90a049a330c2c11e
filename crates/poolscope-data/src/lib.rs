//! poolscope-data crate
//!
//! Swap-event types, header-driven record parsing, and the address
//! taxonomy registry shared by the analysis and CLI crates.

pub mod schema;
pub mod taxonomy;
pub mod types;

pub use schema::{EventSchema, ParseStats, PoolVersion};
pub use taxonomy::{AddressClass, AddressTaxonomy};
pub use types::{SwapEvent, SwapEventV2, SwapEventV3};
