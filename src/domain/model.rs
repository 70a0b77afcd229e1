//! Entity Model
//!
//! In-memory representation of one placement problem: items, cache servers,
//! access points and the demand records attached to them.
//!
//! # Ownership
//!
//! ```text
//! Topology ──owns──▶ Vec<Item>
//!          ──owns──▶ Vec<CacheServer> ──refs──▶ AccessPointId, ItemId
//!          ──owns──▶ Vec<AccessPoint> ──refs──▶ CacheId
//!                                     ──owns──▶ Vec<DemandRecord> ──refs──▶ ItemId
//! ```
//!
//! Entities refer to each other by dense identifier, never by pointer, so a
//! `Topology` is a plain owned value that can be moved between tasks. A new
//! topology is built for every job and dropped when the job ends.

use std::collections::{HashSet, TryReserveError};

use serde::Serialize;

use crate::error::{EntityKind, Error, Result};

// =============================================================================
// Identifiers
// =============================================================================

/// Item identifier (dense, `0..V`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemId(pub usize);

/// Cache server identifier (dense, `0..C`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CacheId(pub usize);

/// Access point identifier (dense, `0..E`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AccessPointId(pub usize);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for CacheId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for AccessPointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Header
// =============================================================================

/// Declared counts of a problem instance (first line of the input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopologyHeader {
    /// Number of items (V)
    pub items: usize,
    /// Number of access points (E)
    pub access_points: usize,
    /// Number of demand records (R)
    pub requests: usize,
    /// Number of cache servers (C)
    pub caches: usize,
    /// Capacity of every cache server in megabytes (X)
    pub capacity_mb: u64,
}

// =============================================================================
// Item
// =============================================================================

/// A piece of content, placed whole or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    id: ItemId,
    size_mb: u64,
}

impl Item {
    pub fn new(id: ItemId, size_mb: u64) -> Self {
        Self { id, size_mb }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn size_mb(&self) -> u64 {
        self.size_mb
    }
}

// =============================================================================
// Demand Record
// =============================================================================

/// Repeated requests for one item from the owning access point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemandRecord {
    item: ItemId,
    item_size_mb: u64,
    quantity: u64,
}

impl DemandRecord {
    pub fn new(item: &Item, quantity: u64) -> Self {
        Self {
            item: item.id(),
            item_size_mb: item.size_mb(),
            quantity,
        }
    }

    pub fn item(&self) -> ItemId {
        self.item
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    /// Item size × request count.
    pub fn weight(&self) -> u64 {
        self.item_size_mb.saturating_mul(self.quantity)
    }
}

// =============================================================================
// Cache Server
// =============================================================================

/// A capacity-bounded store holding zero or more items.
#[derive(Debug, Clone)]
pub struct CacheServer {
    id: CacheId,
    capacity_mb: u64,
    remaining_mb: u64,
    /// Placed items in placement order
    items: Vec<ItemId>,
    held: HashSet<ItemId>,
    /// Back-references to connected access points
    access_points: Vec<AccessPointId>,
}

impl CacheServer {
    pub fn new(id: CacheId, capacity_mb: u64) -> Self {
        Self {
            id,
            capacity_mb,
            remaining_mb: capacity_mb,
            items: Vec::new(),
            held: HashSet::new(),
            access_points: Vec::new(),
        }
    }

    pub fn id(&self) -> CacheId {
        self.id
    }

    /// Initial capacity in megabytes.
    pub fn capacity_mb(&self) -> u64 {
        self.capacity_mb
    }

    /// Capacity left after the items placed so far.
    pub fn remaining_mb(&self) -> u64 {
        self.remaining_mb
    }

    pub fn used_mb(&self) -> u64 {
        self.capacity_mb - self.remaining_mb
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn access_points(&self) -> &[AccessPointId] {
        &self.access_points
    }

    pub fn holds(&self, item: ItemId) -> bool {
        self.held.contains(&item)
    }

    pub fn has_room_for(&self, size_mb: u64) -> bool {
        self.remaining_mb >= size_mb
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append `item` and charge its size against the remaining capacity.
    ///
    /// The caller must have checked [`has_room_for`](Self::has_room_for)
    /// first; this mutator does not enforce it. Adding an item the cache
    /// already holds changes nothing, so the item list and the capacity
    /// accounting always agree.
    pub fn add_item(&mut self, item: &Item) {
        debug_assert!(
            self.has_room_for(item.size_mb()),
            "cache {} over capacity adding item {}",
            self.id,
            item.id()
        );

        if !self.held.insert(item.id()) {
            return;
        }
        self.items.push(item.id());
        self.remaining_mb = self.remaining_mb.saturating_sub(item.size_mb());
    }

    fn link_access_point(&mut self, access_point: AccessPointId) {
        if !self.access_points.contains(&access_point) {
            self.access_points.push(access_point);
        }
    }
}

// =============================================================================
// Access Point
// =============================================================================

/// A demand source connected to a subset of cache servers.
#[derive(Debug, Clone)]
pub struct AccessPoint {
    id: AccessPointId,
    datacenter_latency: u64,
    /// Connected caches in declaration order; one latency per cache
    connections: Vec<(CacheId, u64)>,
    requests: Vec<DemandRecord>,
}

impl AccessPoint {
    pub fn new(id: AccessPointId, datacenter_latency: u64) -> Self {
        Self {
            id,
            datacenter_latency,
            connections: Vec::new(),
            requests: Vec::new(),
        }
    }

    pub fn id(&self) -> AccessPointId {
        self.id
    }

    /// Latency paid when no cache serves a request.
    pub fn datacenter_latency(&self) -> u64 {
        self.datacenter_latency
    }

    pub fn connections(&self) -> &[(CacheId, u64)] {
        &self.connections
    }

    pub fn latency_to(&self, cache: CacheId) -> Option<u64> {
        self.connections
            .iter()
            .find(|(id, _)| *id == cache)
            .map(|(_, latency)| *latency)
    }

    pub fn requests(&self) -> &[DemandRecord] {
        &self.requests
    }

    /// Quantity requested for `item` by the first matching record.
    ///
    /// Returns `None` when this access point never asked for the item.
    pub fn requested_quantity(&self, item: ItemId) -> Option<u64> {
        self.requests
            .iter()
            .find(|r| r.item() == item)
            .map(DemandRecord::quantity)
    }

    /// Whether any demand record references `item`.
    pub fn has_demand(&self, item: ItemId) -> bool {
        self.requests.iter().any(|r| r.item() == item)
    }

    /// Record a connection. Re-declaring a cache replaces its latency in place.
    fn connect(&mut self, cache: CacheId, latency: u64) {
        match self.connections.iter_mut().find(|(id, _)| *id == cache) {
            Some(entry) => entry.1 = latency,
            None => self.connections.push((cache, latency)),
        }
    }

    fn add_request(&mut self, record: DemandRecord) {
        self.requests.push(record);
    }
}

// =============================================================================
// Topology
// =============================================================================

/// The complete entity graph for one job.
#[derive(Debug, Clone)]
pub struct Topology {
    capacity_mb: u64,
    items: Vec<Item>,
    caches: Vec<CacheServer>,
    access_points: Vec<AccessPoint>,
}

impl Topology {
    /// Create `cache_count` empty cache servers of `capacity_mb` each.
    pub fn new(cache_count: usize, capacity_mb: u64) -> Self {
        Self {
            capacity_mb,
            items: Vec::new(),
            caches: (0..cache_count)
                .map(|id| CacheServer::new(CacheId(id), capacity_mb))
                .collect(),
            access_points: Vec::new(),
        }
    }

    /// Create the cache servers declared by `header`.
    ///
    /// The cache count comes from untrusted input, so the allocation is
    /// fallible. Items and access points grow as their lines are read.
    pub fn with_header(header: &TopologyHeader) -> std::result::Result<Self, TryReserveError> {
        let mut caches = Vec::new();
        caches.try_reserve_exact(header.caches)?;
        caches.extend(
            (0..header.caches).map(|id| CacheServer::new(CacheId(id), header.capacity_mb)),
        );

        Ok(Self {
            capacity_mb: header.capacity_mb,
            items: Vec::new(),
            caches,
            access_points: Vec::new(),
        })
    }

    pub fn capacity_mb(&self) -> u64 {
        self.capacity_mb
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Append an item with the next dense id.
    pub fn add_item(&mut self, size_mb: u64) -> ItemId {
        let id = ItemId(self.items.len());
        self.items.push(Item::new(id, size_mb));
        id
    }

    /// Append an access point with the next dense id.
    pub fn add_access_point(&mut self, datacenter_latency: u64) -> AccessPointId {
        let id = AccessPointId(self.access_points.len());
        self.access_points
            .push(AccessPoint::new(id, datacenter_latency));
        id
    }

    /// Connect an access point to a cache server, recording both directions.
    pub fn connect(
        &mut self,
        access_point: AccessPointId,
        cache: CacheId,
        latency: u64,
    ) -> Result<()> {
        if cache.0 >= self.caches.len() {
            return Err(Error::no_such(EntityKind::CacheServer, cache.0));
        }
        let ap = self
            .access_points
            .get_mut(access_point.0)
            .ok_or_else(|| Error::no_such(EntityKind::AccessPoint, access_point.0))?;

        ap.connect(cache, latency);
        self.caches[cache.0].link_access_point(access_point);
        Ok(())
    }

    /// Attach a demand record for `item` to `access_point`.
    pub fn add_demand(
        &mut self,
        item: ItemId,
        access_point: AccessPointId,
        quantity: u64,
    ) -> Result<()> {
        let record = DemandRecord::new(self.item(item)?, quantity);
        let ap = self
            .access_points
            .get_mut(access_point.0)
            .ok_or_else(|| Error::no_such(EntityKind::AccessPoint, access_point.0))?;

        ap.add_request(record);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    pub fn item(&self, id: ItemId) -> Result<&Item> {
        self.items
            .get(id.0)
            .ok_or_else(|| Error::no_such(EntityKind::Item, id.0))
    }

    pub fn cache(&self, id: CacheId) -> Result<&CacheServer> {
        self.caches
            .get(id.0)
            .ok_or_else(|| Error::no_such(EntityKind::CacheServer, id.0))
    }

    pub fn access_point(&self, id: AccessPointId) -> Result<&AccessPoint> {
        self.access_points
            .get(id.0)
            .ok_or_else(|| Error::no_such(EntityKind::AccessPoint, id.0))
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn caches(&self) -> &[CacheServer] {
        &self.caches
    }

    pub fn access_points(&self) -> &[AccessPoint] {
        &self.access_points
    }

    /// Cache servers holding at least one item, in id order.
    pub fn caches_in_use(&self) -> impl Iterator<Item = &CacheServer> {
        self.caches.iter().filter(|c| !c.is_empty())
    }

    /// Total number of demand records across all access points.
    pub fn request_count(&self) -> usize {
        self.access_points.iter().map(|ap| ap.requests().len()).sum()
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Place `item` on `cache`. Capacity and duplicate checks are the caller's job.
    pub fn place(&mut self, cache: CacheId, item: ItemId) -> Result<()> {
        let item = self
            .items
            .get(item.0)
            .ok_or_else(|| Error::no_such(EntityKind::Item, item.0))?;
        let server = self
            .caches
            .get_mut(cache.0)
            .ok_or_else(|| Error::no_such(EntityKind::CacheServer, cache.0))?;

        server.add_item(item);
        Ok(())
    }
}
