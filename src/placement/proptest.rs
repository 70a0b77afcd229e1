//! Property-Based Tests for the Placement Engine
//!
//! # Test Properties
//!
//! 1. **Capacity**: no cache ever holds more than its initial capacity
//! 2. **Uniqueness**: an item appears at most once per cache
//! 3. **Determinism**: placing a fresh copy of the same topology gives the same assignment
//! 4. **Weight Sum**: aggregate weight does not depend on request order

#![cfg(test)]

use proptest::prelude::*;

use super::engine::{
    aggregate_weights, PlacementConfig, PlacementEngine, PlacementStrategy, WeightGrouping,
};
use crate::domain::model::{AccessPointId, CacheId, ItemId, Topology};

// =============================================================================
// Property Strategies
// =============================================================================

/// Raw topology description: (capacity, item sizes, access points, requests).
#[derive(Debug, Clone)]
struct Instance {
    capacity: u64,
    caches: usize,
    sizes: Vec<u64>,
    /// (datacenter latency, [(cache, latency)])
    access_points: Vec<(u64, Vec<(usize, u64)>)>,
    /// (item, access point, quantity)
    requests: Vec<(usize, usize, u64)>,
}

impl Instance {
    fn build(&self) -> Topology {
        let mut t = Topology::new(self.caches, self.capacity);
        for size in &self.sizes {
            t.add_item(*size);
        }
        for (ld, connections) in &self.access_points {
            let ap = t.add_access_point(*ld);
            for (cache, latency) in connections {
                t.connect(ap, CacheId(*cache), *latency).unwrap();
            }
        }
        for (item, ap, quantity) in &self.requests {
            t.add_demand(ItemId(*item), AccessPointId(*ap), *quantity)
                .unwrap();
        }
        t
    }
}

fn instance_strategy() -> impl Strategy<Value = Instance> {
    (1usize..=5, 1usize..=12, 1usize..=6, 10u64..=200).prop_flat_map(
        |(caches, items, aps, capacity)| {
            let sizes = prop::collection::vec(1u64..=150, items);
            let access_points = prop::collection::vec(
                (
                    100u64..=2000,
                    prop::collection::vec((0..caches, 1u64..=500), 0..=caches),
                ),
                aps,
            );
            let requests =
                prop::collection::vec((0..items, 0..aps, 1u64..=50), 0..=30);
            (sizes, access_points, requests).prop_map(move |(sizes, access_points, requests)| {
                Instance {
                    capacity,
                    caches,
                    sizes,
                    access_points,
                    requests,
                }
            })
        },
    )
}

fn config_strategy() -> impl Strategy<Value = PlacementConfig> {
    (
        prop_oneof![
            Just(PlacementStrategy::BestWeightFirst),
            Just(PlacementStrategy::PerRequest)
        ],
        prop_oneof![Just(WeightGrouping::Grouped), Just(WeightGrouping::Collapse)],
    )
        .prop_map(|(strategy, weight_grouping)| PlacementConfig {
            strategy,
            weight_grouping,
        })
}

fn assignment(t: &Topology) -> Vec<Vec<ItemId>> {
    t.caches().iter().map(|c| c.items().to_vec()).collect()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: the sum of placed sizes never exceeds the initial capacity.
    #[test]
    fn prop_capacity_never_exceeded(instance in instance_strategy(), config in config_strategy()) {
        let mut t = instance.build();
        PlacementEngine::new(config).place(&mut t)?;

        for cache in t.caches() {
            let used: u64 = cache
                .items()
                .iter()
                .map(|id| t.item(*id).map(|i| i.size_mb()).unwrap_or(0))
                .sum();
            prop_assert!(used <= cache.capacity_mb());
            prop_assert_eq!(used, cache.used_mb());
        }
    }

    /// Property: no cache lists the same item twice.
    #[test]
    fn prop_no_duplicate_items(instance in instance_strategy(), config in config_strategy()) {
        let mut t = instance.build();
        PlacementEngine::new(config).place(&mut t)?;

        for cache in t.caches() {
            let mut items = cache.items().to_vec();
            items.sort();
            items.dedup();
            prop_assert_eq!(items.len(), cache.items().len());
        }
    }

    /// Property: two fresh loads of the same instance place identically.
    #[test]
    fn prop_placement_is_deterministic(instance in instance_strategy(), config in config_strategy()) {
        let engine = PlacementEngine::new(config);

        let mut first = instance.build();
        let mut second = instance.build();
        engine.place(&mut first)?;
        engine.place(&mut second)?;

        prop_assert_eq!(assignment(&first), assignment(&second));
    }

    /// Property: only demanded items are ever placed.
    #[test]
    fn prop_only_demanded_items_placed(instance in instance_strategy()) {
        let mut t = instance.build();
        PlacementEngine::default().place(&mut t)?;

        let demanded: Vec<ItemId> = aggregate_weights(&t).into_iter().map(|(i, _)| i).collect();
        for cache in t.caches() {
            for item in cache.items() {
                prop_assert!(demanded.contains(item));
            }
        }
    }

    /// Property: aggregate weight is the plain sum of quantities, whatever the order.
    #[test]
    fn prop_weight_independent_of_order(quantities in prop::collection::vec(1u64..=1000, 1..20)) {
        let mut forward = Topology::new(1, 10);
        let mut backward = Topology::new(1, 10);
        let item_f = forward.add_item(1);
        let item_b = backward.add_item(1);

        for q in &quantities {
            let ap = forward.add_access_point(100);
            forward.add_demand(item_f, ap, *q).unwrap();
        }
        for q in quantities.iter().rev() {
            let ap = backward.add_access_point(100);
            backward.add_demand(item_b, ap, *q).unwrap();
        }

        let expected: u64 = quantities.iter().sum();
        prop_assert_eq!(aggregate_weights(&forward), vec![(item_f, expected)]);
        prop_assert_eq!(aggregate_weights(&backward), vec![(item_b, expected)]);
    }
}
