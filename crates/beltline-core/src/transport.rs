//! Lane-level item transport.
//!
//! A [`TransportLine`] is two parallel [`Lane`]s. Each lane keeps its items
//! sorted by ascending position, where `0` is the entry end and
//! [`LaneGeometry::length`] is the exit end. Items never pass one another and
//! never come closer than [`LaneGeometry::min_spacing`].
//!
//! # Advance
//!
//! [`Lane::advance`] walks items from the exit end toward the entry end, so
//! every item sees the already-updated position of the item ahead:
//!
//! 1. Items that already moved in this tick (they arrived through a hand-off
//!    from a machine updated earlier) stay put and act as obstacles.
//! 2. The leading item moves `speed` forward. Crossing the exit offers it to
//!    the hand-off callback with the overflow as its new position; a refusal
//!    clamps it to the exit.
//! 3. Every other item moves `min(position + speed, ahead - min_spacing)`.
//!
//! # Accept
//!
//! [`Lane::accept`] is the only way to put an item into a lane owned by
//! another machine. It places the item at the entry, as close to the overflow
//! position as spacing allows.
//!
//! An item handed over in tick `t` is spaced against the rearmost item as it
//! stands once the receiving lane has advanced in `t`, and a capacity bound
//! counts items that left the lane during `t`. Both are known before the
//! receiving lane runs, so a hand-off has the same outcome whether the
//! upstream or the downstream machine is updated first. For the projection
//! to be exact, the item behind a leader that leaves stays `min_spacing`
//! short of the exit in that tick, as it would behind a blocked leader.

use crate::fixed::{Fixed64, Ticks};
use crate::grid::Side;
use crate::id::ItemTypeId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Items and geometry
// ---------------------------------------------------------------------------

/// An item travelling on a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeltItem {
    pub item: ItemTypeId,
    /// Offset from the entry end along the direction of travel.
    pub position: Fixed64,
    /// Last tick in which this item advanced.
    pub moved_at: Ticks,
}

impl BeltItem {
    pub fn new(item: ItemTypeId, position: Fixed64) -> Self {
        Self {
            item,
            position,
            moved_at: 0,
        }
    }
}

/// Physical constants of a lane. Copied into each machine at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneGeometry {
    pub length: Fixed64,
    pub speed: Fixed64,
    pub min_spacing: Fixed64,
}

/// Why a machine refused an item. Routine back-pressure, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AcceptRejected {
    #[error("item would enter against the direction of travel")]
    WrongOrientation,
    #[error("lane entry is full")]
    LaneFull,
    #[error("junction queue is full")]
    QueueFull,
    #[error("machine does not accept pushed items")]
    NotAccepting,
}

/// What a machine (or lane) did during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Activity {
    /// Nothing to do.
    Idle,
    /// Something wanted to move and could not.
    Blocked,
    /// At least one item moved or changed hands.
    Advanced,
}

impl Activity {
    /// Combine two outcomes: any movement wins, then any blockage.
    pub fn merge(self, other: Activity) -> Activity {
        self.max(other)
    }
}

/// Ordering or spacing violation found by [`Lane::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaneViolation {
    #[error("item {index} at {position} lies outside the lane")]
    OutOfRange { index: usize, position: Fixed64 },
    #[error("items {index} and {next} are {gap} apart, below the minimum spacing")]
    TooClose {
        index: usize,
        next: usize,
        gap: Fixed64,
    },
}

// ---------------------------------------------------------------------------
// Lane
// ---------------------------------------------------------------------------

/// Items that left a lane through its exit during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Departures {
    tick: Ticks,
    count: usize,
}

/// One item-carrying track. Front of the deque is the entry end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lane {
    items: VecDeque<BeltItem>,
    departed: Departures,
}

impl Lane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a lane from items in any order. Spacing is not checked; use
    /// [`Lane::check_invariants`] when the input is untrusted.
    pub fn from_items(items: impl IntoIterator<Item = BeltItem>) -> Self {
        let mut items: Vec<BeltItem> = items.into_iter().collect();
        items.sort_by_key(|i| i.position);
        Self {
            items: items.into(),
            departed: Departures::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items from the entry end to the exit end.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &BeltItem> + ExactSizeIterator {
        self.items.iter()
    }

    /// Positions from the entry end to the exit end.
    pub fn positions(&self) -> Vec<Fixed64> {
        self.items.iter().map(|i| i.position).collect()
    }

    /// The item closest to the exit.
    pub fn front(&self) -> Option<&BeltItem> {
        self.items.back()
    }

    /// Remove the exit-most item if it is waiting at the exit boundary.
    pub fn take_exit_item(&mut self, geometry: &LaneGeometry) -> Option<BeltItem> {
        match self.items.back() {
            Some(front) if front.position >= geometry.length => self.items.pop_back(),
            _ => None,
        }
    }

    /// Remove and return every item, exit-most first.
    pub fn drain(&mut self) -> Vec<BeltItem> {
        self.items.drain(..).rev().collect()
    }

    /// Items handed off through the exit during `tick`.
    pub fn departures(&self, tick: Ticks) -> usize {
        if tick > 0 && self.departed.tick == tick {
            self.departed.count
        } else {
            0
        }
    }

    fn record_departure(&mut self, tick: Ticks) {
        if self.departed.tick == tick {
            self.departed.count += 1;
        } else {
            self.departed = Departures { tick, count: 1 };
        }
    }

    /// Position of the rearmost item once this lane has advanced in `tick`.
    /// A leader that reaches the exit counts as standing on it.
    fn rear_after_advance(&self, geometry: &LaneGeometry, tick: Ticks) -> Option<Fixed64> {
        let rear = self.items.front()?;
        if rear.moved_at >= tick {
            return Some(rear.position);
        }
        let mut limit = geometry.length;
        let mut position = rear.position;
        for current in self.items.iter().rev() {
            position = if current.moved_at >= tick {
                current.position
            } else {
                (current.position + geometry.speed)
                    .min(limit)
                    .max(current.position)
            };
            limit = position - geometry.min_spacing;
        }
        Some(position)
    }

    /// Where `item` would be placed, or `None` if the entry has no room.
    /// `item.position` is the overflow carried over from upstream and
    /// `item.moved_at` the tick of the hand-off.
    pub fn entry_slot(
        &self,
        item: &BeltItem,
        geometry: &LaneGeometry,
        capacity: Option<usize>,
    ) -> Option<Fixed64> {
        let tick = item.moved_at;
        let departed = self.departures(tick);
        if capacity.is_some_and(|cap| self.items.len() + departed >= cap) {
            return None;
        }
        let rear = match self.rear_after_advance(geometry, tick) {
            Some(rear) => Some(rear),
            None if departed > 0 => Some(geometry.length),
            None => None,
        };
        let mut slot = item.position.max(Fixed64::ZERO).min(geometry.length);
        if let Some(rear) = rear {
            slot = slot.min(rear - geometry.min_spacing);
        }
        (slot >= Fixed64::ZERO).then_some(slot)
    }

    pub fn can_accept(
        &self,
        item: &BeltItem,
        geometry: &LaneGeometry,
        capacity: Option<usize>,
    ) -> bool {
        self.entry_slot(item, geometry, capacity).is_some()
    }

    /// Insert `item` at the entry end. Its `position` is the overflow carried
    /// over from the upstream lane.
    pub fn accept(
        &mut self,
        mut item: BeltItem,
        geometry: &LaneGeometry,
        capacity: Option<usize>,
    ) -> Result<(), AcceptRejected> {
        let slot = self
            .entry_slot(&item, geometry, capacity)
            .ok_or(AcceptRejected::LaneFull)?;
        item.position = slot;
        self.items.push_front(item);
        Ok(())
    }

    /// Insert an item at an arbitrary position, keeping the lane sorted.
    /// Returns `false` (and leaves the lane untouched) if the position is off
    /// the lane or too close to a neighbour.
    pub fn insert(&mut self, item: BeltItem, geometry: &LaneGeometry) -> bool {
        if item.position < Fixed64::ZERO || item.position > geometry.length {
            return false;
        }
        let index = self.items.partition_point(|i| i.position < item.position);
        let clear_behind = index == 0
            || item.position - self.items[index - 1].position >= geometry.min_spacing;
        let clear_ahead = index == self.items.len()
            || self.items[index].position - item.position >= geometry.min_spacing;
        if !(clear_behind && clear_ahead) {
            return false;
        }
        self.items.insert(index, item);
        true
    }

    /// Advance every item by one tick. `hand_off` receives the leading item
    /// with its overflow position and returns whether the downstream machine
    /// took it.
    pub fn advance<F>(&mut self, geometry: &LaneGeometry, tick: Ticks, mut hand_off: F) -> Activity
    where
        F: FnMut(BeltItem) -> bool,
    {
        let mut activity = Activity::Idle;
        // Highest position the current item may reach; `None` while nothing
        // remains ahead of it.
        let mut limit: Option<Fixed64> = None;
        let mut index = self.items.len();

        while index > 0 {
            index -= 1;
            let current = self.items[index];

            if current.moved_at == tick {
                limit = Some(current.position - geometry.min_spacing);
                continue;
            }

            let mut target = current.position + geometry.speed;
            if let Some(limit) = limit {
                target = target.min(limit);
            }

            if limit.is_none() && target >= geometry.length {
                let outgoing = BeltItem {
                    item: current.item,
                    position: target - geometry.length,
                    moved_at: tick,
                };
                if hand_off(outgoing) {
                    self.items.pop_back();
                    self.record_departure(tick);
                    activity = Activity::Advanced;
                    limit = Some(geometry.length - geometry.min_spacing);
                    continue;
                }
                target = geometry.length;
            }

            let target = target.max(current.position);
            activity = activity.merge(if target > current.position {
                Activity::Advanced
            } else {
                Activity::Blocked
            });

            let slot = &mut self.items[index];
            slot.position = target;
            slot.moved_at = tick;
            limit = Some(target - geometry.min_spacing);
        }

        activity
    }

    /// Verify ordering, spacing and bounds.
    pub fn check_invariants(&self, geometry: &LaneGeometry) -> Result<(), LaneViolation> {
        for (index, item) in self.items.iter().enumerate() {
            if item.position < Fixed64::ZERO || item.position > geometry.length {
                return Err(LaneViolation::OutOfRange {
                    index,
                    position: item.position,
                });
            }
            if let Some(next) = self.items.get(index + 1) {
                let gap = next.position - item.position;
                if gap < geometry.min_spacing {
                    return Err(LaneViolation::TooClose {
                        index,
                        next: index + 1,
                        gap,
                    });
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TransportLine
// ---------------------------------------------------------------------------

/// Two parallel lanes, indexed by [`Side`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportLine {
    lanes: [Lane; 2],
}

impl TransportLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lane(&self, side: Side) -> &Lane {
        &self.lanes[side.index()]
    }

    pub fn lane_mut(&mut self, side: Side) -> &mut Lane {
        &mut self.lanes[side.index()]
    }

    pub fn item_count(&self) -> usize {
        self.lanes.iter().map(Lane::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(Lane::is_empty)
    }

    /// Every item with its side, left lane first.
    pub fn items(&self) -> impl Iterator<Item = (Side, &BeltItem)> {
        Side::ALL
            .into_iter()
            .flat_map(move |side| self.lane(side).iter().map(move |item| (side, item)))
    }

    pub fn check_invariants(&self, geometry: &LaneGeometry) -> Result<(), LaneViolation> {
        self.lanes
            .iter()
            .try_for_each(|lane| lane.check_invariants(geometry))
    }
}
