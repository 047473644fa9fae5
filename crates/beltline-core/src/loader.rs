//! Loaders bridge one tile: they lift the item waiting at the exit of the
//! machine behind them and set it down at the entry of the machine in front,
//! one item per `cadence` ticks.
//!
//! Both ends are addressed by coordinate and resolved again on every attempt;
//! the loader's own tile is the skipped gap.

use crate::fixed::{Fixed64, Ticks};
use crate::grid::{Direction, Grid, GridPosition, Side};
use crate::transport::{Activity, BeltItem};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loader {
    direction: Direction,
    cadence: u32,
    /// Ticks since the last transfer, saturating at `cadence`.
    progress: u32,
    next_side: Side,
}

impl Loader {
    pub fn new(direction: Direction, cadence: u32) -> Self {
        Self {
            direction,
            cadence: cadence.max(1),
            progress: 0,
            next_side: Side::Left,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn cadence(&self) -> u32 {
        self.cadence
    }

    pub fn progress(&self) -> u32 {
        self.progress
    }

    /// Tile the loader pulls from.
    pub fn source(&self, position: GridPosition) -> GridPosition {
        position.step(self.direction.opposite())
    }

    /// Tile the loader delivers to.
    pub fn destination(&self, position: GridPosition) -> GridPosition {
        position.step(self.direction)
    }

    pub fn update(&mut self, position: GridPosition, grid: &mut Grid, tick: Ticks) -> Activity {
        if self.progress < self.cadence {
            self.progress += 1;
        }
        if self.progress < self.cadence {
            return Activity::Idle;
        }

        let source = self.source(position);
        let destination = self.destination(position);
        let travel = self.direction;

        for side in [self.next_side, self.next_side.other()] {
            let Some(ready) = grid
                .machine(source)
                .and_then(|m| m.peek_exit_item(side, travel))
            else {
                continue;
            };
            let carried = BeltItem {
                item: ready.item,
                position: Fixed64::ZERO,
                moved_at: tick,
            };
            let fits = grid
                .machine(destination)
                .is_some_and(|m| m.can_accept(travel, side, &carried).is_ok());
            if !fits {
                continue;
            }
            if grid
                .machine_mut(source)
                .and_then(|m| m.take_exit_item(side, travel))
                .is_none()
            {
                continue;
            }
            let delivered = grid
                .machine_mut(destination)
                .is_some_and(|m| m.accept(travel, side, carried).is_ok());
            debug_assert!(delivered, "destination refused after can_accept");

            self.progress = 0;
            self.next_side = side.other();
            return Activity::Advanced;
        }

        Activity::Blocked
    }
}
