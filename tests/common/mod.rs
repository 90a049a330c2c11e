//! Shared test helpers and utilities.
//!
//! Factory functions for swap events and taxonomies with sensible defaults.

#![allow(dead_code)]

use alloy::primitives::Address;
use poolscope_data::taxonomy::{AddressClass, AddressTaxonomy};
use poolscope_data::types::{SwapEvent, SwapEventV2, SwapEventV3};

/// Test pool address shared by all fixtures.
pub fn pool() -> Address {
    Address::with_last_byte(0xaa)
}

/// Short helper for single-byte test addresses.
pub fn addr(suffix: u8) -> Address {
    Address::with_last_byte(suffix)
}

/// V2 swap event with the given token0 flow, booked to `to`.
///
/// The timestamp follows mainnet 12-second spacing from a fixed genesis so
/// per-day bucketing sees realistic values.
pub fn v2_swap(block: u64, amount0_in: u128, amount0_out: u128, to: Address) -> SwapEvent {
    SwapEvent::V2(SwapEventV2 {
        timestamp_s: 1_680_000_000 + block * 12,
        block_number: block,
        pool: pool(),
        amount0_in,
        amount1_in: if amount0_out > 0 { 1 } else { 0 },
        amount0_out,
        amount1_out: if amount0_in > 0 { 1 } else { 0 },
        to,
        sender: addr(0xee),
        tx_hash: format!("0x{block:x}"),
    })
}

/// V3 swap event with a signed token0 delta, booked to `to`.
pub fn v3_swap(block: u64, amount0: i128, to: Address) -> SwapEvent {
    SwapEvent::V3(SwapEventV3 {
        timestamp_s: 1_680_000_000 + block * 12,
        block_number: block,
        pool: pool(),
        amount0,
        amount1: -amount0.signum(),
        to,
        sender: addr(0xee),
        tx_hash: format!("0x{block:x}"),
    })
}

/// Taxonomy with one router (0x..01), one bot (0x..02), one internal (0x..03).
pub fn standard_taxonomy() -> AddressTaxonomy {
    AddressTaxonomy::new([
        (addr(1), AddressClass::Router),
        (addr(2), AddressClass::ArbBot),
        (addr(3), AddressClass::Internal),
    ])
}
