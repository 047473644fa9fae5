//! Item endpoints: sources that inject items onto the network and sinks that
//! consume them.
//!
//! These are the only places where items are created or destroyed; belts,
//! junctions and loaders only move them.

use crate::fixed::{Fixed64, Ticks};
use crate::grid::{Direction, Grid, GridPosition, Side};
use crate::id::ItemTypeId;
use crate::machine::offer;
use crate::transport::{AcceptRejected, Activity, BeltItem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// How much a source may still produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Depletion {
    Infinite,
    Finite { remaining: u32 },
}

/// Produces one item every `interval` ticks into a one-slot buffer and pushes
/// it onto the tile in front, alternating lanes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSource {
    item: ItemTypeId,
    direction: Direction,
    interval: u32,
    depletion: Depletion,
    progress: u32,
    ready: Option<ItemTypeId>,
    next_side: Side,
    produced: u64,
}

impl ItemSource {
    pub fn new(item: ItemTypeId, direction: Direction, interval: u32) -> Self {
        Self {
            item,
            direction,
            interval: interval.max(1),
            depletion: Depletion::Infinite,
            progress: 0,
            ready: None,
            next_side: Side::Left,
            produced: 0,
        }
    }

    /// Stop after producing `count` items.
    pub fn finite(mut self, count: u32) -> Self {
        self.depletion = Depletion::Finite { remaining: count };
        self
    }

    pub fn item(&self) -> ItemTypeId {
        self.item
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn depletion(&self) -> Depletion {
        self.depletion
    }

    /// Total items produced so far.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// Whether an item sits in the output buffer.
    pub fn has_ready(&self) -> bool {
        self.ready.is_some()
    }

    fn produce(&mut self) -> bool {
        if self.ready.is_some() {
            return false;
        }
        if let Depletion::Finite { remaining } = &mut self.depletion {
            if *remaining == 0 {
                return false;
            }
            *remaining -= 1;
        }
        self.ready = Some(self.item);
        self.produced += 1;
        true
    }

    pub fn update(&mut self, position: GridPosition, grid: &mut Grid, tick: Ticks) -> Activity {
        let mut activity = Activity::Idle;
        if self.ready.is_none() && self.depletion != (Depletion::Finite { remaining: 0 }) {
            self.progress += 1;
            if self.progress >= self.interval && self.produce() {
                self.progress = 0;
                activity = Activity::Advanced;
            }
        }

        let Some(item) = self.ready else {
            return activity;
        };
        let target = position.step(self.direction);
        for side in [self.next_side, self.next_side.other()] {
            let outgoing = BeltItem {
                item,
                position: Fixed64::ZERO,
                moved_at: tick,
            };
            if offer(grid, target, self.direction, side, outgoing) {
                self.ready = None;
                self.next_side = side.other();
                return Activity::Advanced;
            }
        }
        activity.merge(Activity::Blocked)
    }

    /// The buffered item, offered to a loader standing in front.
    pub fn peek_exit_item(&self, toward: Direction) -> Option<BeltItem> {
        if toward != self.direction {
            return None;
        }
        self.ready.map(|item| BeltItem::new(item, Fixed64::ZERO))
    }

    pub fn take_exit_item(&mut self, toward: Direction) -> Option<BeltItem> {
        let item = self.peek_exit_item(toward)?;
        self.ready = None;
        Some(item)
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Consumes every item handed to it, from any side, until full.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSink {
    capacity: Option<u32>,
    received: BTreeMap<ItemTypeId, u32>,
    total: u32,
}

impl ItemSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn count(&self, item: ItemTypeId) -> u32 {
        self.received.get(&item).copied().unwrap_or(0)
    }

    pub fn received(&self) -> &BTreeMap<ItemTypeId, u32> {
        &self.received
    }

    pub fn can_accept(&self) -> Result<(), AcceptRejected> {
        match self.capacity {
            Some(cap) if self.total >= cap => Err(AcceptRejected::LaneFull),
            _ => Ok(()),
        }
    }

    pub fn accept(&mut self, item: BeltItem) -> Result<(), AcceptRejected> {
        self.can_accept()?;
        *self.received.entry(item.item).or_insert(0) += 1;
        self.total += 1;
        Ok(())
    }
}
