//! Benchmarks for poolscope-sim core components.
//!
//! Uses fixed seeds for reproducible performance testing.
//! Run with: `cargo bench --package poolscope-sim`

use alloy::primitives::Address;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use poolscope_analysis::classify::{classify_events, ClassificationConfig};
use poolscope_data::taxonomy::{AddressClass, AddressTaxonomy};
use poolscope_data::types::{SwapEvent, SwapEventV2};
use poolscope_sim::engine::evaluate_path;
use poolscope_sim::path::{generate_path, path_seed};

/// One simulated day at 12-second ticks.
const TICKS_PER_DAY: u32 = 7_200;

/// Benchmark: generate a single one-day GBM path.
fn bench_generate_path(c: &mut Criterion) {
    c.bench_function("generate_path_one_day", |b| {
        b.iter(|| {
            generate_path(
                black_box(1_000.0),
                black_box(0.03),
                black_box(TICKS_PER_DAY),
                black_box(1),
                black_box(path_seed(123, 0)),
            )
        });
    });
}

/// Benchmark: replay the arbitrageur over a one-day path.
fn bench_evaluate_path(c: &mut Criterion) {
    let prices = generate_path(1_000.0, 0.03, TICKS_PER_DAY, 1, path_seed(123, 0));

    c.bench_function("evaluate_path_one_day", |b| {
        b.iter(|| {
            evaluate_path(
                black_box(&prices),
                black_box(1_000_000.0),
                black_box(1_000.0),
                black_box(0.003),
                black_box(50.0),
            )
        });
    });
}

/// Benchmark: classify 1000 blocks of synthetic swap events.
fn bench_classify_1000_blocks(c: &mut Criterion) {
    let router = Address::with_last_byte(1);
    let bot = Address::with_last_byte(2);
    let taxonomy = AddressTaxonomy::new([
        (router, AddressClass::Router),
        (bot, AddressClass::ArbBot),
    ]);

    let events: Vec<SwapEvent> = (0..1_000u64)
        .flat_map(|block| {
            let to = if block % 3 == 0 { bot } else { router };
            [
                SwapEvent::V2(SwapEventV2 {
                    timestamp_s: 1_680_000_000 + block * 12,
                    block_number: 17_000_000 + block,
                    pool: Address::with_last_byte(0xaa),
                    amount0_in: 1_000 + block as u128,
                    amount1_in: 0,
                    amount0_out: 0,
                    amount1_out: 1,
                    to,
                    sender: router,
                    tx_hash: format!("0x{block:x}"),
                }),
                SwapEvent::V2(SwapEventV2 {
                    timestamp_s: 1_680_000_000 + block * 12,
                    block_number: 17_000_000 + block,
                    pool: Address::with_last_byte(0xaa),
                    amount0_in: 0,
                    amount1_in: 1,
                    amount0_out: 500,
                    amount1_out: 0,
                    to,
                    sender: router,
                    tx_hash: format!("0x{block:x}1"),
                }),
            ]
        })
        .collect();

    c.bench_function("classify_1000_blocks", |b| {
        b.iter(|| {
            classify_events(
                black_box(&events),
                black_box(&taxonomy),
                black_box(&ClassificationConfig::default()),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_generate_path,
    bench_evaluate_path,
    bench_classify_1000_blocks
);
criterion_main!(benches);
