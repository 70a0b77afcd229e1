//! Placement Engine
//!
//! Greedy, single-pass assignment of items to cache servers.
//!
//! # Best-Weight-First
//!
//! 1. Sum request quantities per item across the whole topology
//! 2. Visit items from the heaviest aggregate weight down
//! 3. For each access point demanding the item, put it on the
//!    lowest-latency connected cache that does not hold it yet and has room
//!
//! Placements are never revisited: no eviction, no swapping. A placement made
//! for one access point is visible to the next one in the same item loop, so
//! a shared cache is filled once.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::model::{AccessPoint, AccessPointId, CacheId, ItemId, Topology};
use crate::domain::score::{self, Score};
use crate::error::{Error, Result};
use crate::metrics;

// =============================================================================
// Configuration
// =============================================================================

/// Which greedy heuristic to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementStrategy {
    /// Items by descending aggregate demand, access points in id order
    #[default]
    BestWeightFirst,
    /// Demand records in declaration order, cheapest quantity × latency cache
    PerRequest,
}

/// How items with equal aggregate weight are grouped before ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightGrouping {
    /// Every item is kept; ties are ranked by first appearance
    #[default]
    Grouped,
    /// One item per weight value; the last one seen wins and the others are
    /// never considered
    Collapse,
}

impl std::fmt::Display for PlacementStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementStrategy::BestWeightFirst => write!(f, "best-weight-first"),
            PlacementStrategy::PerRequest => write!(f, "per-request"),
        }
    }
}

impl std::str::FromStr for PlacementStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "best-weight-first" | "best_weight_first" => Ok(PlacementStrategy::BestWeightFirst),
            "per-request" | "per_request" => Ok(PlacementStrategy::PerRequest),
            other => Err(Error::Config(format!("unknown placement strategy: {}", other))),
        }
    }
}

impl std::fmt::Display for WeightGrouping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeightGrouping::Grouped => write!(f, "grouped"),
            WeightGrouping::Collapse => write!(f, "collapse"),
        }
    }
}

impl std::str::FromStr for WeightGrouping {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "grouped" => Ok(WeightGrouping::Grouped),
            "collapse" => Ok(WeightGrouping::Collapse),
            other => Err(Error::Config(format!("unknown weight grouping: {}", other))),
        }
    }
}

/// Configuration for the placement engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementConfig {
    pub strategy: PlacementStrategy,

    /// Only used by [`PlacementStrategy::BestWeightFirst`]
    pub weight_grouping: WeightGrouping,
}

// =============================================================================
// Report
// =============================================================================

/// Summary of one placement run
#[derive(Debug, Clone, Serialize)]
pub struct PlacementReport {
    pub strategy: PlacementStrategy,
    pub weight_grouping: WeightGrouping,

    /// Distinct items with at least one demand record
    pub items_demanded: usize,

    /// Items actually visited after grouping
    pub items_considered: usize,

    /// Demanded items never visited because of `Collapse` grouping
    pub items_dropped: usize,

    /// Items added to caches
    pub placements: u64,

    /// Evaluations that found no qualifying cache
    pub skipped_evaluations: u64,

    /// Caches holding at least one item afterwards
    pub caches_used: usize,

    pub score: Score,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Counters accumulated while placing.
#[derive(Debug, Default)]
struct Tally {
    items_demanded: usize,
    items_considered: usize,
    placements: u64,
    skipped: u64,
}

// =============================================================================
// Weights
// =============================================================================

/// Aggregate request quantity per demanded item, in order of first appearance
/// (access points by id, records in declaration order).
pub fn aggregate_weights(topology: &Topology) -> Vec<(ItemId, u64)> {
    let mut order: Vec<ItemId> = Vec::new();
    let mut totals: HashMap<ItemId, u64> = HashMap::new();

    for ap in topology.access_points() {
        for record in ap.requests() {
            let total = totals.entry(record.item()).or_insert_with(|| {
                order.push(record.item());
                0
            });
            *total = total.saturating_add(record.quantity());
        }
    }

    order
        .into_iter()
        .map(|item| (item, totals.get(&item).copied().unwrap_or(0)))
        .collect()
}

/// Order demanded items for processing, heaviest first.
///
/// With [`WeightGrouping::Collapse`] every demand record, in topology order,
/// writes its item into a single slot keyed by that item's aggregate weight,
/// so only the last item written for each weight survives.
pub fn rank_items(topology: &Topology, grouping: WeightGrouping) -> Vec<ItemId> {
    let weights = aggregate_weights(topology);

    match grouping {
        WeightGrouping::Grouped => {
            let mut groups: BTreeMap<u64, Vec<ItemId>> = BTreeMap::new();
            for (item, weight) in weights {
                groups.entry(weight).or_default().push(item);
            }
            groups.into_values().rev().flatten().collect()
        }
        WeightGrouping::Collapse => {
            let by_item: HashMap<ItemId, u64> = weights.into_iter().collect();
            let mut slots: BTreeMap<u64, ItemId> = BTreeMap::new();
            for ap in topology.access_points() {
                for record in ap.requests() {
                    if let Some(weight) = by_item.get(&record.item()) {
                        slots.insert(*weight, record.item());
                    }
                }
            }
            slots.into_values().rev().collect()
        }
    }
}

/// Access points demanding each item, in id order, indexed by item id.
fn demand_index(topology: &Topology) -> Vec<Vec<AccessPointId>> {
    let mut index: Vec<Vec<AccessPointId>> = vec![Vec::new(); topology.items().len()];

    for ap in topology.access_points() {
        for record in ap.requests() {
            if let Some(entry) = index.get_mut(record.item().0) {
                if entry.last() != Some(&ap.id()) {
                    entry.push(ap.id());
                }
            }
        }
    }

    index
}

// =============================================================================
// Cache Selection
// =============================================================================

/// Choose the cache minimising `cost(latency)` among the access point's
/// connections that do not hold `item` and have at least `required_mb` free.
///
/// Connections are scanned in declaration order; on equal cost the later
/// connection wins.
fn select_cache<F>(
    topology: &Topology,
    access_point: &AccessPoint,
    item: ItemId,
    required_mb: u64,
    cost: F,
) -> Option<CacheId>
where
    F: Fn(u64) -> u64,
{
    let mut best: Option<(CacheId, u64)> = None;

    for &(cache_id, latency) in access_point.connections() {
        let Ok(cache) = topology.cache(cache_id) else {
            continue;
        };
        if cache.holds(item) || !cache.has_room_for(required_mb) {
            continue;
        }

        let candidate = cost(latency);
        if best.map_or(true, |(_, current)| candidate <= current) {
            best = Some((cache_id, candidate));
        }
    }

    best.map(|(cache_id, _)| cache_id)
}

// =============================================================================
// Engine
// =============================================================================

/// Runs a placement heuristic over a topology it is given exclusive access to.
#[derive(Debug, Clone, Default)]
pub struct PlacementEngine {
    config: PlacementConfig,
}

impl PlacementEngine {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Place items into `topology`'s caches and report what happened.
    #[instrument(skip(self, topology), fields(strategy = %self.config.strategy))]
    pub fn place(&self, topology: &mut Topology) -> Result<PlacementReport> {
        let started_at = Utc::now();
        let clock = Instant::now();

        let tally = match self.config.strategy {
            PlacementStrategy::BestWeightFirst => {
                best_weight_first(topology, self.config.weight_grouping)?
            }
            PlacementStrategy::PerRequest => per_request(topology)?,
        };

        metrics::record_placements(tally.placements, tally.skipped);

        let report = PlacementReport {
            strategy: self.config.strategy,
            weight_grouping: self.config.weight_grouping,
            items_demanded: tally.items_demanded,
            items_considered: tally.items_considered,
            items_dropped: tally.items_demanded - tally.items_considered,
            placements: tally.placements,
            skipped_evaluations: tally.skipped,
            caches_used: topology.caches_in_use().count(),
            score: score::evaluate(topology),
            started_at,
            finished_at: Utc::now(),
            duration_ms: clock.elapsed().as_millis() as u64,
        };

        info!(
            "Placement done: {} placements over {} items ({} dropped), {} caches used, score {}",
            report.placements,
            report.items_considered,
            report.items_dropped,
            report.caches_used,
            report.score.score
        );

        Ok(report)
    }
}

fn best_weight_first(topology: &mut Topology, grouping: WeightGrouping) -> Result<Tally> {
    let items_demanded = aggregate_weights(topology).len();
    let ranked = rank_items(topology, grouping);
    let index = demand_index(topology);

    debug!(
        "Ranked {} of {} demanded items ({})",
        ranked.len(),
        items_demanded,
        grouping
    );

    let mut tally = Tally {
        items_demanded,
        items_considered: ranked.len(),
        ..Default::default()
    };

    for item in ranked {
        let size_mb = topology.item(item)?.size_mb();
        let demanding = index.get(item.0).map(Vec::as_slice).unwrap_or(&[]);

        for &ap_id in demanding {
            let ap = topology.access_point(ap_id)?;
            match select_cache(topology, ap, item, size_mb, |latency| latency) {
                Some(cache) => {
                    topology.place(cache, item)?;
                    tally.placements += 1;
                }
                None => tally.skipped += 1,
            }
        }
    }

    Ok(tally)
}

fn per_request(topology: &mut Topology) -> Result<Tally> {
    let mut tally = Tally {
        items_demanded: aggregate_weights(topology).len(),
        ..Default::default()
    };
    tally.items_considered = tally.items_demanded;

    for ap_index in 0..topology.access_points().len() {
        let ap_id = AccessPointId(ap_index);
        let request_count = topology.access_point(ap_id)?.requests().len();

        for request_index in 0..request_count {
            let ap = topology.access_point(ap_id)?;
            let record = &ap.requests()[request_index];
            let item = record.item();
            let quantity = record.quantity();

            match select_cache(topology, ap, item, record.weight(), |latency| {
                latency.saturating_mul(quantity)
            }) {
                Some(cache) => {
                    topology.place(cache, item)?;
                    tally.placements += 1;
                }
                None => tally.skipped += 1,
            }
        }
    }

    Ok(tally)
}
