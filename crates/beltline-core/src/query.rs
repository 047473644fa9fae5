//! Read-only query API for inspecting simulation state.
//!
//! Snapshot types are owned copies, with no references into the grid, so a
//! renderer can hold them across ticks.

use crate::engine::GameState;
use crate::fixed::{Fixed64, fixed64_to_f64};
use crate::grid::{Direction, GridPosition, Side};
use crate::id::ItemTypeId;
use crate::machine::{InTransit, MachineKind};
use std::collections::BTreeMap;

/// Lateral offset of a lane from the tile centre line, in tiles.
const LANE_OFFSET: f64 = 0.25;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// A read-only view of one placed machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineSnapshot {
    pub position: GridPosition,
    pub kind: MachineKind,
    /// Facing direction, for belts, loaders and sources.
    pub direction: Option<Direction>,
    /// Items on lanes or in queues.
    pub item_count: usize,
}

/// An item in world space, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSnapshot {
    pub item: ItemTypeId,
    /// The tile carrying the item.
    pub tile: GridPosition,
    pub side: Side,
    pub heading: Direction,
    /// World coordinates in tiles; tile `(x, y)` spans `[x, x+1) x [y, y+1)`.
    pub world: (f64, f64),
}

/// World position of an item on the tile at `tile`.
pub fn world_position(tile: GridPosition, in_transit: &InTransit) -> (f64, f64) {
    let progress = if in_transit.length > Fixed64::ZERO {
        fixed64_to_f64(in_transit.item.position) / fixed64_to_f64(in_transit.length)
    } else {
        0.0
    };
    let along = progress - 0.5;
    let (hx, hy) = in_transit.heading.offset();
    let lateral = match in_transit.side {
        Side::Left => in_transit.heading.rotate_ccw(),
        Side::Right => in_transit.heading.rotate_cw(),
    };
    let (lx, ly) = lateral.offset();
    (
        f64::from(tile.x) + 0.5 + f64::from(hx) * along + f64::from(lx) * LANE_OFFSET,
        f64::from(tile.y) + 0.5 + f64::from(hy) * along + f64::from(ly) * LANE_OFFSET,
    )
}

impl GameState {
    /// Every machine grouped by kind, each group in traversal order.
    pub fn machines_by_kind(&self) -> BTreeMap<MachineKind, Vec<MachineSnapshot>> {
        let mut groups: BTreeMap<MachineKind, Vec<MachineSnapshot>> = BTreeMap::new();
        for (position, machine) in self.grid().machines() {
            groups
                .entry(machine.kind())
                .or_default()
                .push(MachineSnapshot {
                    position,
                    kind: machine.kind(),
                    direction: machine.direction(),
                    item_count: machine.item_count(),
                });
        }
        groups
    }

    /// Every in-transit item in traversal order.
    pub fn item_snapshots(&self) -> Vec<ItemSnapshot> {
        self.grid()
            .machines()
            .flat_map(|(tile, machine)| {
                machine
                    .in_transit()
                    .into_iter()
                    .map(move |in_transit| ItemSnapshot {
                        item: in_transit.item.item,
                        tile,
                        side: in_transit.side,
                        heading: in_transit.heading,
                        world: world_position(tile, &in_transit),
                    })
            })
            .collect()
    }
}
