//! Latency-savings scoring for a finished placement.
//!
//! Every request is served by the lowest-latency connected cache that holds
//! its item, or by the datacenter otherwise. The score is the average latency
//! saved per request, in thousandths of a latency unit.

use serde::Serialize;

use super::model::{AccessPoint, DemandRecord, Topology};

/// Aggregate savings over all demand records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Score {
    /// Total request count (sum of quantities)
    pub requests: u64,
    /// Sum of (datacenter latency - serving latency) × quantity
    pub saved_latency: u64,
    /// `saved_latency * 1000 / requests`, 0 without requests
    pub score: u64,
}

/// Best latency at which `record` can be served from a cache, if any holds it.
pub fn serving_latency(
    topology: &Topology,
    access_point: &AccessPoint,
    record: &DemandRecord,
) -> Option<u64> {
    access_point
        .connections()
        .iter()
        .filter(|(cache, _)| {
            topology
                .cache(*cache)
                .map(|c| c.holds(record.item()))
                .unwrap_or(false)
        })
        .map(|(_, latency)| *latency)
        .min()
}

pub fn evaluate(topology: &Topology) -> Score {
    let mut requests: u64 = 0;
    let mut saved: u64 = 0;

    for ap in topology.access_points() {
        for record in ap.requests() {
            requests = requests.saturating_add(record.quantity());
            if let Some(latency) = serving_latency(topology, ap, record) {
                let gain = ap.datacenter_latency().saturating_sub(latency);
                saved = saved.saturating_add(gain.saturating_mul(record.quantity()));
            }
        }
    }

    let score = if requests == 0 {
        0
    } else {
        ((saved as u128 * 1000) / requests as u128) as u64
    };

    Score {
        requests,
        saved_latency: saved,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AccessPointId, CacheId, ItemId};

    #[test]
    fn test_empty_topology_scores_zero() {
        let t = Topology::new(1, 100);
        assert_eq!(evaluate(&t), Score::default());
    }

    #[test]
    fn test_unplaced_requests_save_nothing() {
        let mut t = Topology::new(1, 100);
        let item = t.add_item(10);
        let ap = t.add_access_point(1000);
        t.connect(ap, CacheId(0), 100).unwrap();
        t.add_demand(item, ap, 5).unwrap();

        let score = evaluate(&t);
        assert_eq!(score.requests, 5);
        assert_eq!(score.saved_latency, 0);
        assert_eq!(score.score, 0);
    }

    #[test]
    fn test_uses_best_cache_holding_item() {
        // Two endpoints, three caches: the classic worked example.
        let mut t = Topology::new(3, 100);
        for size in [50, 50, 80, 30, 110] {
            t.add_item(size);
        }
        let e0 = t.add_access_point(1000);
        t.connect(e0, CacheId(0), 100).unwrap();
        t.connect(e0, CacheId(2), 200).unwrap();
        t.connect(e0, CacheId(1), 300).unwrap();
        let e1 = t.add_access_point(500);

        t.add_demand(ItemId(3), e0, 1500).unwrap();
        t.add_demand(ItemId(0), e1, 1000).unwrap();
        t.add_demand(ItemId(4), e0, 500).unwrap();
        t.add_demand(ItemId(1), e0, 1000).unwrap();

        t.place(CacheId(0), ItemId(2)).unwrap();
        t.place(CacheId(1), ItemId(3)).unwrap();
        t.place(CacheId(1), ItemId(1)).unwrap();
        t.place(CacheId(2), ItemId(0)).unwrap();
        t.place(CacheId(2), ItemId(1)).unwrap();

        let score = evaluate(&t);
        assert_eq!(score.requests, 4000);
        // item 3: 1500 × 700, item 1: 1000 × 800 (via cache 2)
        assert_eq!(score.saved_latency, 1_850_000);
        assert_eq!(score.score, 462_500);

        let ap = t.access_point(AccessPointId(0)).unwrap();
        assert_eq!(serving_latency(&t, ap, &ap.requests()[2]), Some(200));
    }
}
