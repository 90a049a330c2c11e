//! Four-bucket behavioral volume classification.
//!
//! Same-block buy-and-sell by a non-router address is definitionally
//! sandwich behavior (front- plus back-run); unilateral flow from a known
//! bot is opportunistic arbitrage; router/aggregator addresses carry
//! aggregated retail intent regardless of direction. Everything else is
//! surfaced as unclassified ("other") together with a ranked anomaly list
//! for taxonomy curation.

use std::collections::{BTreeMap, HashMap};

use alloy::primitives::Address;
use chrono::NaiveDate;
use eyre::Result;
use serde::Serialize;
use tracing::debug;

use poolscope_data::taxonomy::{AddressClass, AddressTaxonomy};
use poolscope_data::types::{day_of, SwapEvent};

use crate::netting::{AttributionMode, BlockNetter, NetPositions};

/// Token0 volume split across the four behavioral buckets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VolumeBuckets {
    /// Same-block bidirectional volume from known bots.
    pub sandwich: u128,
    /// Unidirectional volume from known bots.
    pub arbitrage: u128,
    /// Router/aggregator volume (retail intent).
    pub core: u128,
    /// Everything unclassified, including pool-internal flow.
    pub other: u128,
}

impl VolumeBuckets {
    /// Sum across all four buckets.
    pub fn total(&self) -> u128 {
        self.sandwich + self.arbitrage + self.core + self.other
    }

    /// Adds another bucket set into this one.
    pub fn accumulate(&mut self, other: &VolumeBuckets) {
        self.sandwich += other.sandwich;
        self.arbitrage += other.arbitrage;
        self.core += other.core;
        self.other += other.other;
    }
}

/// Diagnostic record surfaced for manual taxonomy curation.
///
/// Not an error: unclassified flow still lands in the `other` bucket. High
/// `volume` entries come from unknown bilateral (sandwich-shaped) addresses;
/// zero-volume entries with `occurrences` come from events no attribution
/// rule matched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    /// Address to investigate.
    pub address: Address,
    /// Accumulated unknown bilateral volume.
    pub volume: u128,
    /// How many times the address was flagged.
    pub occurrences: u64,
}

/// Classification result for a single block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockClassification {
    /// Block number the result covers.
    pub block_number: u64,
    /// Timestamp of the block's first event, unix seconds.
    pub timestamp_s: u64,
    /// Classified volume.
    pub buckets: VolumeBuckets,
    /// Unknown bilateral addresses above the reporting threshold.
    pub flagged: Vec<(Address, u128)>,
}

/// Knobs for a classification run.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassificationConfig {
    /// How events are booked to addresses before netting.
    pub attribution: AttributionMode,
    /// Unknown bilateral volume above this is recorded as an anomaly.
    pub anomaly_threshold: u128,
}

/// Aggregated output of a classification run.
#[derive(Clone, Debug, Default)]
pub struct ClassificationReport {
    /// Run-level bucket totals.
    pub totals: VolumeBuckets,
    /// Number of block snapshots classified.
    pub blocks: u64,
    /// Bucket totals per UTC day.
    pub daily: BTreeMap<NaiveDate, VolumeBuckets>,
    /// Ranked anomaly list, largest volume first.
    pub anomalies: Vec<Anomaly>,
    /// Bot-vs-router attribution conflicts (BotPrecedence mode only).
    pub attribution_conflicts: u64,
}

/// Classifies one block's net positions against a taxonomy.
///
/// The four buckets always sum to [`NetPositions::total_volume`]; every
/// address lands in exactly one bucket.
pub fn classify_positions(
    positions: &NetPositions,
    taxonomy: &AddressTaxonomy,
    anomaly_threshold: u128,
) -> BlockClassification {
    let mut buckets = VolumeBuckets::default();
    let mut flagged = Vec::new();

    for (address, bought) in &positions.buyers {
        if let Some(sold) = positions.sellers.get(address) {
            // Bilateral: the address both bought and sold within the block.
            let volume = bought + sold;
            match taxonomy.classify(*address) {
                AddressClass::Router => buckets.core += volume,
                AddressClass::ArbBot => buckets.sandwich += volume,
                AddressClass::Internal => buckets.other += volume,
                AddressClass::Unknown => {
                    if volume > anomaly_threshold {
                        debug!(
                            block = positions.block_number,
                            address = %address,
                            volume,
                            "unknown bilateral address above reporting threshold"
                        );
                        flagged.push((*address, volume));
                    }
                    buckets.other += volume;
                }
            }
        } else {
            classify_unilateral(&mut buckets, taxonomy, *address, *bought);
        }
    }

    for (address, sold) in &positions.sellers {
        if !positions.buyers.contains_key(address) {
            classify_unilateral(&mut buckets, taxonomy, *address, *sold);
        }
    }

    BlockClassification {
        block_number: positions.block_number,
        timestamp_s: positions.timestamp_s,
        buckets,
        flagged,
    }
}

fn classify_unilateral(
    buckets: &mut VolumeBuckets,
    taxonomy: &AddressTaxonomy,
    address: Address,
    volume: u128,
) {
    match taxonomy.classify(address) {
        AddressClass::Router => buckets.core += volume,
        AddressClass::ArbBot => buckets.arbitrage += volume,
        AddressClass::Internal | AddressClass::Unknown => buckets.other += volume,
    }
}

/// Runs the full pipeline over an ordered event stream for one pool.
///
/// Nets each block, classifies every snapshot, and accumulates run totals,
/// per-day totals, and the ranked anomaly list.
///
/// # Errors
/// Propagates the netter's fail-fast error on non-monotone block input.
pub fn classify_events(
    events: &[SwapEvent],
    taxonomy: &AddressTaxonomy,
    config: &ClassificationConfig,
) -> Result<ClassificationReport> {
    let mut netter = BlockNetter::new(taxonomy, config.attribution);
    let mut report = ClassificationReport::default();
    let mut anomaly_volumes: HashMap<Address, (u128, u64)> = HashMap::new();

    let absorb = |report: &mut ClassificationReport,
                      anomaly_volumes: &mut HashMap<Address, (u128, u64)>,
                      result: BlockClassification| {
        report.totals.accumulate(&result.buckets);
        report.blocks += 1;
        if let Some(day) = day_of(result.timestamp_s) {
            report
                .daily
                .entry(day)
                .or_default()
                .accumulate(&result.buckets);
        }
        for (address, volume) in result.flagged {
            let entry = anomaly_volumes.entry(address).or_insert((0, 0));
            entry.0 += volume;
            entry.1 += 1;
        }
    };

    for event in events {
        if let Some(snapshot) = netter.push(event)? {
            let result = classify_positions(&snapshot, taxonomy, config.anomaly_threshold);
            absorb(&mut report, &mut anomaly_volumes, result);
        }
    }
    if let Some(snapshot) = netter.finish() {
        let result = classify_positions(&snapshot, taxonomy, config.anomaly_threshold);
        absorb(&mut report, &mut anomaly_volumes, result);
    }

    for (address, count) in &netter.unattributed {
        let entry = anomaly_volumes.entry(*address).or_insert((0, 0));
        entry.1 += count;
    }
    report.attribution_conflicts = netter.attribution_conflicts;

    report.anomalies = anomaly_volumes
        .into_iter()
        .map(|(address, (volume, occurrences))| Anomaly {
            address,
            volume,
            occurrences,
        })
        .collect();
    report.anomalies.sort_by(|a, b| {
        b.volume
            .cmp(&a.volume)
            .then(b.occurrences.cmp(&a.occurrences))
            .then(a.address.cmp(&b.address))
    });

    Ok(report)
}
