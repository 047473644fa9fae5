//! The closed set of machines that can occupy a tile.
//!
//! Uses enum dispatch (not trait objects): every operation matches all
//! variants exhaustively, so adding a machine type is a compile error until
//! each operation handles it.

use crate::belt::ConveyorBelt;
use crate::fixed::{Fixed64, Ticks};
use crate::grid::{Direction, Grid, GridPosition, Side};
use crate::junction::Junction;
use crate::loader::Loader;
use crate::processor::{ItemSink, ItemSource};
use crate::transport::{AcceptRejected, Activity, BeltItem};
use serde::{Deserialize, Serialize};

/// A machine placed on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Machine {
    ConveyorBelt(ConveyorBelt),
    Junction(Junction),
    Loader(Loader),
    Source(ItemSource),
    Sink(ItemSink),
}

/// Discriminant tag for machine variants, used for grouping and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MachineKind {
    ConveyorBelt,
    Junction,
    Loader,
    Source,
    Sink,
}

/// An item currently on a lane or in a queue, with where it is heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InTransit {
    pub item: BeltItem,
    pub side: Side,
    /// Direction the item leaves this machine through. For junction items
    /// this is the routed exit, so a turned item already heads for its new
    /// direction while it crosses.
    pub heading: Direction,
    /// Length of the lane the item is on.
    pub length: Fixed64,
}

/// Offer `item`, travelling `travel` on `side`, to the machine at `target`.
/// Returns whether it was taken.
pub(crate) fn offer(
    grid: &mut Grid,
    target: GridPosition,
    travel: Direction,
    side: Side,
    item: BeltItem,
) -> bool {
    grid.machine_mut(target)
        .is_some_and(|m| m.accept(travel, side, item).is_ok())
}

impl Machine {
    pub fn kind(&self) -> MachineKind {
        match self {
            Machine::ConveyorBelt(_) => MachineKind::ConveyorBelt,
            Machine::Junction(_) => MachineKind::Junction,
            Machine::Loader(_) => MachineKind::Loader,
            Machine::Source(_) => MachineKind::Source,
            Machine::Sink(_) => MachineKind::Sink,
        }
    }

    /// Facing direction, for machines that have one.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Machine::ConveyorBelt(b) => Some(b.direction()),
            Machine::Loader(l) => Some(l.direction()),
            Machine::Source(s) => Some(s.direction()),
            Machine::Junction(_) | Machine::Sink(_) => None,
        }
    }

    // -- Tick --

    /// Run one tick. `position` is the tile this machine occupies; the
    /// machine itself has been lifted out of `grid` for the call.
    pub fn update(&mut self, position: GridPosition, grid: &mut Grid, tick: Ticks) -> Activity {
        match self {
            Machine::ConveyorBelt(b) => b.update(position, grid, tick),
            Machine::Junction(j) => j.update(position, grid, tick),
            Machine::Loader(l) => l.update(position, grid, tick),
            Machine::Source(s) => s.update(position, grid, tick),
            Machine::Sink(_) => Activity::Idle,
        }
    }

    // -- Hand-off --

    /// Whether `item`, travelling `travel` on `side`, would be taken right
    /// now.
    pub fn can_accept(
        &self,
        travel: Direction,
        side: Side,
        item: &BeltItem,
    ) -> Result<(), AcceptRejected> {
        match self {
            Machine::ConveyorBelt(b) => b.can_accept(travel, side, item),
            Machine::Junction(j) => j.can_accept(travel, side, item),
            Machine::Sink(s) => s.can_accept(),
            Machine::Loader(_) | Machine::Source(_) => Err(AcceptRejected::NotAccepting),
        }
    }

    /// Take `item` into this machine. On rejection the caller still owns the
    /// item and must keep it.
    pub fn accept(
        &mut self,
        travel: Direction,
        side: Side,
        item: BeltItem,
    ) -> Result<(), AcceptRejected> {
        match self {
            Machine::ConveyorBelt(b) => b.accept(travel, side, item),
            Machine::Junction(j) => j.accept(travel, side, item),
            Machine::Sink(s) => s.accept(item),
            Machine::Loader(_) | Machine::Source(_) => Err(AcceptRejected::NotAccepting),
        }
    }

    /// The item waiting at this machine's exit toward `toward` on `side`.
    pub fn peek_exit_item(&self, side: Side, toward: Direction) -> Option<BeltItem> {
        match self {
            Machine::ConveyorBelt(b) => b.peek_exit_item(side, toward).copied(),
            Machine::Junction(j) => j.peek_exit_item(side, toward).copied(),
            Machine::Source(s) => s.peek_exit_item(toward),
            Machine::Loader(_) | Machine::Sink(_) => None,
        }
    }

    pub fn take_exit_item(&mut self, side: Side, toward: Direction) -> Option<BeltItem> {
        match self {
            Machine::ConveyorBelt(b) => b.take_exit_item(side, toward),
            Machine::Junction(j) => j.take_exit_item(side, toward),
            Machine::Source(s) => s.take_exit_item(toward),
            Machine::Loader(_) | Machine::Sink(_) => None,
        }
    }

    // -- Wiring --

    /// Whether this machine, standing at `from`, outputs into `into`.
    pub fn feeds(&self, from: GridPosition, into: GridPosition) -> bool {
        match self {
            Machine::ConveyorBelt(b) => from.step(b.direction()) == into,
            Machine::Source(s) => from.step(s.direction()) == into,
            Machine::Loader(l) => l.destination(from) == into,
            Machine::Junction(j) => Direction::ALL
                .into_iter()
                .any(|exit| from.step(exit) == into && j.outputs_toward(exit)),
            Machine::Sink(_) => false,
        }
    }

    /// Refresh neighbour links after the grid around `position` changed.
    pub fn relink(&mut self, position: GridPosition, grid: &Grid) {
        if let Machine::ConveyorBelt(b) = self {
            b.relink(position, grid);
        }
    }

    // -- Contents --

    /// Items on lanes or in queues. Sink contents are consumed, not in transit.
    pub fn in_transit(&self) -> Vec<InTransit> {
        match self {
            Machine::ConveyorBelt(b) => b
                .line()
                .items()
                .map(|(side, item)| InTransit {
                    item: *item,
                    side,
                    heading: b.direction(),
                    length: b.geometry().length,
                })
                .collect(),
            Machine::Junction(j) => Direction::ALL
                .into_iter()
                .flat_map(move |entered_from| {
                    let heading = j.route(entered_from);
                    j.queue(entered_from)
                        .items()
                        .map(move |(side, item)| InTransit {
                            item: *item,
                            side,
                            heading,
                            length: j.geometry().length,
                        })
                })
                .collect(),
            Machine::Loader(_) | Machine::Source(_) | Machine::Sink(_) => Vec::new(),
        }
    }

    pub fn item_count(&self) -> usize {
        match self {
            Machine::ConveyorBelt(b) => b.line().item_count(),
            Machine::Junction(j) => j.item_count(),
            Machine::Loader(_) | Machine::Source(_) | Machine::Sink(_) => 0,
        }
    }

    /// Remove every in-transit item, exit-most first per lane, with the same
    /// headings [`Machine::in_transit`] reports. A source gives up its
    /// buffered item.
    pub fn drain(&mut self) -> Vec<InTransit> {
        match self {
            Machine::ConveyorBelt(b) => {
                let heading = b.direction();
                let length = b.geometry().length;
                Side::ALL
                    .into_iter()
                    .flat_map(|side| {
                        b.line_mut()
                            .lane_mut(side)
                            .drain()
                            .into_iter()
                            .map(move |item| InTransit {
                                item,
                                side,
                                heading,
                                length,
                            })
                            .collect::<Vec<_>>()
                    })
                    .collect()
            }
            Machine::Junction(j) => {
                let length = j.geometry().length;
                let mut drained = Vec::new();
                for entered_from in Direction::ALL {
                    let heading = j.route(entered_from);
                    for side in Side::ALL {
                        for item in j.queue_mut(entered_from).lane_mut(side).drain() {
                            drained.push(InTransit {
                                item,
                                side,
                                heading,
                                length,
                            });
                        }
                    }
                }
                drained
            }
            Machine::Source(s) => {
                let heading = s.direction();
                s.take_exit_item(heading)
                    .map(|item| InTransit {
                        item,
                        side: Side::Left,
                        heading,
                        length: Fixed64::ZERO,
                    })
                    .into_iter()
                    .collect()
            }
            Machine::Loader(_) | Machine::Sink(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{belt, fixed, iron, junction, sink, standard_geometry};

    #[test]
    fn kinds_match_variants() {
        assert_eq!(belt(Direction::Up).kind(), MachineKind::ConveyorBelt);
        assert_eq!(junction().kind(), MachineKind::Junction);
        assert_eq!(sink().kind(), MachineKind::Sink);
        assert_eq!(
            Machine::Loader(Loader::new(Direction::Up, 1)).kind(),
            MachineKind::Loader
        );
    }

    #[test]
    fn feeds_follows_direction() {
        let from = GridPosition::new(0, 0);
        let b = belt(Direction::Right);
        assert!(b.feeds(from, GridPosition::new(1, 0)));
        assert!(!b.feeds(from, GridPosition::new(0, 1)));

        let l = Machine::Loader(Loader::new(Direction::Down, 3));
        assert!(l.feeds(from, GridPosition::new(0, 1)));
        assert!(!sink().feeds(from, GridPosition::new(1, 0)));
        assert!(junction().feeds(from, GridPosition::new(-1, 0)));
    }

    #[test]
    fn offer_to_empty_tile_fails() {
        let mut grid = Grid::new();
        assert!(!offer(
            &mut grid,
            GridPosition::new(9, 9),
            Direction::Up,
            Side::Left,
            BeltItem::new(iron(), Fixed64::ZERO)
        ));
    }

    #[test]
    fn drain_reports_heading() {
        let mut m = belt(Direction::Left);
        if let Machine::ConveyorBelt(b) = &mut m {
            b.line_mut()
                .lane_mut(Side::Right)
                .insert(BeltItem::new(iron(), fixed(40.0)), &standard_geometry());
        }
        assert_eq!(m.item_count(), 1);
        assert_eq!(m.in_transit().len(), 1);
        let drained = m.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].heading, Direction::Left);
        assert_eq!(drained[0].side, Side::Right);
        assert_eq!(m.item_count(), 0);
    }

    #[test]
    fn junction_in_transit_heads_across() {
        let mut m = junction();
        if let Machine::Junction(j) = &mut m {
            j.accept(Direction::Right, Side::Left, BeltItem::new(iron(), Fixed64::ZERO))
                .unwrap();
        }
        let items = m.in_transit();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].heading, Direction::Right);
    }

    #[test]
    fn turned_junction_items_report_one_heading() {
        let mut m = Machine::Junction(
            Junction::new(standard_geometry(), 4).with_route(Direction::Left, Direction::Down),
        );
        if let Machine::Junction(j) = &mut m {
            j.accept(Direction::Right, Side::Left, BeltItem::new(iron(), fixed(30.0)))
                .unwrap();
        }
        let shown: Vec<Direction> = m.in_transit().iter().map(|i| i.heading).collect();
        let drained: Vec<Direction> = m.drain().iter().map(|i| i.heading).collect();
        assert_eq!(shown, vec![Direction::Down]);
        assert_eq!(drained, shown);
    }
}
