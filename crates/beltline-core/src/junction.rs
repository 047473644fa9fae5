//! Four-way junctions.
//!
//! A junction keeps one [`TransportLine`] per entry side. The queue an item
//! sits in records the side it entered through, so routing never has to be
//! re-derived from geometry: `routes[entered_from]` names the exit. The
//! default route goes straight across; [`Junction::with_route`] installs
//! turn mappings.
//!
//! # Merging
//!
//! When several entries route to the same exit they are advanced in
//! round-robin order. Each lane of each exit keeps a pointer into
//! [`Direction::ALL`] (which starts the rotation at Up > Right > Down >
//! Left); after an entry hands an item off on that lane, the pointer moves
//! just past it. Whether the downstream lane takes an item does not depend on
//! which entry offers it, so an entry whose item waits at the crossing
//! boundary is passed over at most once by each other contender: never more
//! than [`MAX_CONSECUTIVE_MISSES`] times in a row.

use crate::fixed::Ticks;
use crate::grid::{Direction, Grid, GridPosition, Side};
use crate::machine::offer;
use crate::transport::{AcceptRejected, Activity, BeltItem, LaneGeometry, TransportLine};
use serde::{Deserialize, Serialize};

/// Upper bound on hand-offs to other entries while an item waits at the
/// boundary, with all four entries merged onto one exit.
pub const MAX_CONSECUTIVE_MISSES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Junction {
    geometry: LaneGeometry,
    /// Maximum items per entry lane.
    capacity: usize,
    /// Exit direction, indexed by the side an item entered through.
    routes: [Direction; 4],
    /// Entry queues, indexed by the side items entered through.
    queues: [TransportLine; 4],
    /// Next entry (index into `Direction::ALL`) to try first, per exit and
    /// lane.
    round_robin: [[usize; 2]; 4],
}

impl Junction {
    pub fn new(geometry: LaneGeometry, capacity: usize) -> Self {
        Self {
            geometry,
            capacity: capacity.max(1),
            routes: Direction::ALL.map(Direction::opposite),
            queues: Default::default(),
            round_robin: [[0; 2]; 4],
        }
    }

    /// Send items entering through `entered_from` out through `exit`.
    pub fn with_route(mut self, entered_from: Direction, exit: Direction) -> Self {
        self.routes[entered_from.index()] = exit;
        self
    }

    pub fn route(&self, entered_from: Direction) -> Direction {
        self.routes[entered_from.index()]
    }

    pub fn geometry(&self) -> &LaneGeometry {
        &self.geometry
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The queue of items that entered through `entered_from`.
    pub fn queue(&self, entered_from: Direction) -> &TransportLine {
        &self.queues[entered_from.index()]
    }

    pub fn queue_mut(&mut self, entered_from: Direction) -> &mut TransportLine {
        &mut self.queues[entered_from.index()]
    }

    pub fn item_count(&self) -> usize {
        self.queues.iter().map(TransportLine::item_count).sum()
    }

    /// Whether any entry routes out through `exit`.
    pub fn outputs_toward(&self, exit: Direction) -> bool {
        self.routes.contains(&exit)
    }

    /// Entries routed to `exit`, in the order they are served on `side`.
    fn contenders(&self, exit: Direction, side: Side) -> impl Iterator<Item = Direction> + '_ {
        let start = self.round_robin[exit.index()][side.index()];
        (0..4)
            .map(move |k| Direction::ALL[(start + k) % 4])
            .filter(move |entry| self.routes[entry.index()] == exit)
    }

    fn mark_served(&mut self, exit: Direction, side: Side, entry: Direction) {
        self.round_robin[exit.index()][side.index()] = (entry.index() + 1) % 4;
    }

    pub fn can_accept(
        &self,
        travel: Direction,
        side: Side,
        item: &BeltItem,
    ) -> Result<(), AcceptRejected> {
        let lane = self.queues[travel.opposite().index()].lane(side);
        if lane.can_accept(item, &self.geometry, Some(self.capacity)) {
            Ok(())
        } else {
            Err(AcceptRejected::QueueFull)
        }
    }

    pub fn accept(
        &mut self,
        travel: Direction,
        side: Side,
        item: BeltItem,
    ) -> Result<(), AcceptRejected> {
        let capacity = self.capacity;
        self.queues[travel.opposite().index()]
            .lane_mut(side)
            .accept(item, &self.geometry, Some(capacity))
            .map_err(|_| AcceptRejected::QueueFull)
    }

    pub fn update(&mut self, position: GridPosition, grid: &mut Grid, tick: Ticks) -> Activity {
        let mut activity = Activity::Idle;
        for exit in Direction::ALL {
            let target = position.step(exit);
            for side in Side::ALL {
                let order: Vec<Direction> = self.contenders(exit, side).collect();
                for entry in order {
                    let mut served = false;
                    let lane = self.queues[entry.index()].lane_mut(side);
                    activity = activity.merge(lane.advance(&self.geometry, tick, |item| {
                        served = offer(grid, target, exit, side, item);
                        served
                    }));
                    if served {
                        self.mark_served(exit, side, entry);
                    }
                }
            }
        }
        activity
    }

    /// Remove an item waiting at the crossing boundary toward `toward` on
    /// `side`, honouring the same round-robin order as [`Junction::update`].
    pub fn take_exit_item(&mut self, side: Side, toward: Direction) -> Option<BeltItem> {
        let order: Vec<Direction> = self.contenders(toward, side).collect();
        for entry in order {
            let geometry = self.geometry;
            if let Some(item) = self.queues[entry.index()]
                .lane_mut(side)
                .take_exit_item(&geometry)
            {
                self.mark_served(toward, side, entry);
                return Some(item);
            }
        }
        None
    }

    pub fn peek_exit_item(&self, side: Side, toward: Direction) -> Option<&BeltItem> {
        self.contenders(toward, side).find_map(|entry| {
            self.queues[entry.index()]
                .lane(side)
                .front()
                .filter(|item| item.position >= self.geometry.length)
        })
    }
}
