//! Conveyor belts.
//!
//! A belt carries a [`TransportLine`] along its direction. Both lanes hand
//! their leading item to whatever machine sits on the next tile in that
//! direction, on the same side.
//!
//! Belts remember which of their four sides have a neighbour feeding into
//! them (`inputs`). The set holds directions only, never references, and is
//! rebuilt by [`ConveyorBelt::relink`] whenever a neighbour is placed or
//! removed. It decides how a perpendicular feed lands: with nothing feeding
//! the belt from behind it is a curve and keeps its lane; with a straight
//! feeder it is a side-load onto the lane nearest the feeding neighbour.

use crate::fixed::Ticks;
use crate::grid::{Direction, Grid, GridPosition, Side};
use crate::machine::offer;
use crate::transport::{AcceptRejected, Activity, BeltItem, LaneGeometry, TransportLine};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConveyorBelt {
    direction: Direction,
    geometry: LaneGeometry,
    line: TransportLine,
    /// Sides (by absolute direction) with a neighbour outputting into us.
    inputs: [bool; 4],
}

impl ConveyorBelt {
    pub fn new(direction: Direction, geometry: LaneGeometry) -> Self {
        Self {
            direction,
            geometry,
            line: TransportLine::new(),
            inputs: [false; 4],
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn geometry(&self) -> &LaneGeometry {
        &self.geometry
    }

    pub fn line(&self) -> &TransportLine {
        &self.line
    }

    pub fn line_mut(&mut self) -> &mut TransportLine {
        &mut self.line
    }

    /// Whether a neighbour on side `from` feeds into this belt.
    pub fn has_input(&self, from: Direction) -> bool {
        self.inputs[from.index()]
    }

    /// True when a neighbour directly behind feeds this belt.
    pub fn has_straight_feeder(&self) -> bool {
        self.has_input(self.direction.opposite())
    }

    /// Recompute `inputs` from the neighbours currently on the grid.
    pub fn relink(&mut self, position: GridPosition, grid: &Grid) {
        for from in Direction::ALL {
            let neighbour = position.step(from);
            self.inputs[from.index()] = grid
                .machine(neighbour)
                .is_some_and(|m| m.feeds(neighbour, position));
        }
    }

    /// The lane an item travelling `travel` on `side` lands on.
    fn entry_lane(&self, travel: Direction, side: Side) -> Result<Side, AcceptRejected> {
        if travel == self.direction.opposite() {
            return Err(AcceptRejected::WrongOrientation);
        }
        if travel == self.direction || !self.has_straight_feeder() {
            return Ok(side);
        }
        // Side-load: the feeder sits opposite to where the item travels.
        Ok(Side::facing(self.direction, travel.opposite()).unwrap_or(side))
    }

    pub fn can_accept(
        &self,
        travel: Direction,
        side: Side,
        item: &BeltItem,
    ) -> Result<(), AcceptRejected> {
        let lane = self.entry_lane(travel, side)?;
        if self.line.lane(lane).can_accept(item, &self.geometry, None) {
            Ok(())
        } else {
            Err(AcceptRejected::LaneFull)
        }
    }

    pub fn accept(
        &mut self,
        travel: Direction,
        side: Side,
        item: BeltItem,
    ) -> Result<(), AcceptRejected> {
        let lane = self.entry_lane(travel, side)?;
        self.line.lane_mut(lane).accept(item, &self.geometry, None)
    }

    pub fn update(&mut self, position: GridPosition, grid: &mut Grid, tick: Ticks) -> Activity {
        let target = position.step(self.direction);
        let direction = self.direction;
        let mut activity = Activity::Idle;
        for side in Side::ALL {
            let lane = self.line.lane_mut(side);
            activity = activity.merge(lane.advance(&self.geometry, tick, |item| {
                offer(grid, target, direction, side, item)
            }));
        }
        activity
    }

    /// Remove the item waiting at the exit of `side`, if this belt points
    /// `toward` the caller.
    pub fn take_exit_item(&mut self, side: Side, toward: Direction) -> Option<BeltItem> {
        if toward != self.direction {
            return None;
        }
        self.line.lane_mut(side).take_exit_item(&self.geometry)
    }

    pub fn peek_exit_item(&self, side: Side, toward: Direction) -> Option<&BeltItem> {
        if toward != self.direction {
            return None;
        }
        self.line
            .lane(side)
            .front()
            .filter(|item| item.position >= self.geometry.length)
    }
}
