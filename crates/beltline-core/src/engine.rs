//! The game state: owns the catalog, configuration, grid, clock and event
//! bus, and drives the tick loop.
//!
//! # Construction
//!
//! [`GameState::new`] takes a frozen [`ItemCatalog`] and a validated
//! [`EngineConfig`]; machines are placed afterwards. Placement and removal
//! go through [`GameState::place`] / [`GameState::remove`] so neighbour
//! links are refreshed and lifecycle events are emitted.
//!
//! # Tick
//!
//! Each [`GameState::frame`] that is not paused:
//! 1. advances the clock by one tick,
//! 2. snapshots the occupied coordinates in traversal order,
//! 3. lifts each machine out of its tile, runs `update` with mutable access
//!    to the rest of the grid, and puts it back.
//!
//! Machines placed during a tick are picked up by the next one.

use crate::belt::ConveyorBelt;
use crate::catalog::ItemCatalog;
use crate::config::{ConfigError, EngineConfig};
use crate::event::{Event, EventBus, EventKind, Listener};
use crate::fixed::{Fixed64, Ticks};
use crate::grid::{Direction, Grid, GridPosition, PlacementError};
use crate::id::ItemTypeId;
use crate::junction::Junction;
use crate::loader::Loader;
use crate::machine::{Machine, offer};
use crate::processor::{ItemSink, ItemSource};
use crate::sim::{FrameReport, SimState, StateHash};
use crate::transport::BeltItem;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Removal
// ---------------------------------------------------------------------------

/// What happens to the items on a machine that is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalPolicy {
    /// Return every item to the caller.
    #[default]
    Spill,
    /// Offer each item to the machine it was heading for; return the rest.
    HandOff,
}

/// Result of [`GameState::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub machine: Machine,
    /// Items that left the network and now belong to the caller.
    pub spilled: Vec<BeltItem>,
    /// Items passed on to a downstream machine.
    pub handed_off: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemovalError {
    #[error("no machine at ({}, {})", .0.x, .0.y)]
    Vacant(GridPosition),
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct GameState {
    catalog: ItemCatalog,
    config: EngineConfig,
    grid: Grid,
    pub sim_state: SimState,
    pub event_bus: EventBus,
    /// Items consumed by sinks that have since been removed.
    retired_consumed: u64,
    /// Items produced by sources that have since been removed.
    retired_produced: u64,
    /// Items returned to callers of [`GameState::remove`].
    spilled: u64,
}

impl GameState {
    pub fn new(catalog: ItemCatalog, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            catalog,
            grid: Grid::with_limits(config.grid),
            sim_state: SimState::new(),
            event_bus: EventBus::new(config.sim.event_history),
            config,
            retired_consumed: 0,
            retired_produced: 0,
            spilled: 0,
        })
    }

    /// A game state with the default configuration.
    pub fn with_catalog(catalog: ItemCatalog) -> Self {
        let config = EngineConfig::default();
        Self {
            catalog,
            grid: Grid::with_limits(config.grid),
            sim_state: SimState::new(),
            event_bus: EventBus::new(config.sim.event_history),
            config,
            retired_consumed: 0,
            retired_produced: 0,
            spilled: 0,
        }
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn machine(&self, pos: GridPosition) -> Option<&Machine> {
        self.grid.machine(pos)
    }

    /// Direct access to a placed machine, e.g. to seed lane contents.
    /// Links are not refreshed; replacing the machine must go through
    /// [`GameState::remove`] and [`GameState::place`].
    pub fn machine_mut(&mut self, pos: GridPosition) -> Option<&mut Machine> {
        self.grid.machine_mut(pos)
    }

    /// Subscribe to an event kind on the bus.
    pub fn on(&mut self, kind: EventKind, listener: Listener) {
        self.event_bus.on(kind, listener);
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    /// Place a machine, link it with its neighbours and announce it.
    pub fn place(&mut self, pos: GridPosition, machine: Machine) -> Result<(), PlacementError> {
        let kind = machine.kind();
        self.grid.place(pos, machine)?;
        self.relink_around(pos);
        debug!("placed {kind:?} at ({}, {})", pos.x, pos.y);
        self.event_bus.emit(Event::MachineCreated {
            kind,
            position: pos,
            tick: self.sim_state.tick,
        });
        Ok(())
    }

    pub fn place_belt(&mut self, pos: GridPosition, direction: Direction) -> Result<(), PlacementError> {
        let belt = ConveyorBelt::new(direction, self.config.belt.geometry());
        self.place(pos, Machine::ConveyorBelt(belt))
    }

    /// Place a straight-through junction.
    pub fn place_junction(&mut self, pos: GridPosition) -> Result<(), PlacementError> {
        self.place_routed_junction(pos, &[])
    }

    /// Place a junction with turn mappings `(entered_from, exit)`.
    pub fn place_routed_junction(
        &mut self,
        pos: GridPosition,
        routes: &[(Direction, Direction)],
    ) -> Result<(), PlacementError> {
        let junction = routes.iter().fold(
            Junction::new(
                self.config.junction.lane.geometry(),
                self.config.junction.queue_capacity,
            ),
            |j, &(entered_from, exit)| j.with_route(entered_from, exit),
        );
        self.place(pos, Machine::Junction(junction))
    }

    pub fn place_loader(&mut self, pos: GridPosition, direction: Direction) -> Result<(), PlacementError> {
        let loader = Loader::new(direction, self.config.loader.cadence);
        self.place(pos, Machine::Loader(loader))
    }

    pub fn place_source(
        &mut self,
        pos: GridPosition,
        item: ItemTypeId,
        direction: Direction,
    ) -> Result<(), PlacementError> {
        let source = ItemSource::new(item, direction, self.config.source.interval);
        self.place(pos, Machine::Source(source))
    }

    pub fn place_sink(&mut self, pos: GridPosition) -> Result<(), PlacementError> {
        self.place(pos, Machine::Sink(ItemSink::new()))
    }

    /// Remove the machine at `pos`. No item is ever lost: whatever is not
    /// handed off is returned in [`Removal::spilled`].
    pub fn remove(&mut self, pos: GridPosition, policy: RemovalPolicy) -> Result<Removal, RemovalError> {
        let mut machine = self.grid.remove(pos).ok_or(RemovalError::Vacant(pos))?;
        let kind = machine.kind();
        match &machine {
            Machine::Sink(sink) => self.retired_consumed += u64::from(sink.total()),
            Machine::Source(source) => self.retired_produced += source.produced(),
            _ => {}
        }

        let mut spilled = Vec::new();
        let mut handed_off = 0;
        for in_transit in machine.drain() {
            // Between ticks: spaced against where items stand now.
            let outgoing = BeltItem::new(in_transit.item.item, Fixed64::ZERO);
            let taken = policy == RemovalPolicy::HandOff
                && offer(
                    &mut self.grid,
                    pos.step(in_transit.heading),
                    in_transit.heading,
                    in_transit.side,
                    outgoing,
                );
            if taken {
                handed_off += 1;
            } else {
                spilled.push(in_transit.item);
            }
        }

        self.spilled += spilled.len() as u64;
        self.relink_around(pos);
        debug!(
            "removed {kind:?} at ({}, {}): {handed_off} handed off, {} spilled",
            pos.x,
            pos.y,
            spilled.len()
        );
        self.event_bus.emit(Event::MachineRemoved {
            kind,
            position: pos,
            spilled: spilled.len() as u32,
            tick: self.sim_state.tick,
        });
        Ok(Removal {
            machine,
            spilled,
            handed_off,
        })
    }

    /// Refresh the links of the machine at `pos` and of its four neighbours.
    fn relink_around(&mut self, pos: GridPosition) {
        let neighbours = Direction::ALL.map(|dir| pos.step(dir));
        for at in std::iter::once(pos).chain(neighbours) {
            if let Some(mut machine) = self.grid.take_machine(at) {
                machine.relink(at, &self.grid);
                self.grid.restore_machine(at, machine);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------------

    /// Run one frame of `dt`. A paused simulation does nothing.
    pub fn frame(&mut self, dt: Duration) -> FrameReport {
        if self.sim_state.paused {
            return FrameReport::default();
        }
        let tick = self.sim_state.advance(dt);
        let mut report = FrameReport::ran(tick);

        for pos in self.grid.occupied_positions() {
            let Some(mut machine) = self.grid.take_machine(pos) else {
                continue;
            };
            let activity = machine.update(pos, &mut self.grid, tick);
            self.grid.restore_machine(pos, machine);
            report.record(activity);
        }

        trace!(
            "tick {tick}: {} advanced, {} blocked, {} idle",
            report.advanced, report.blocked, report.idle
        );
        report
    }

    /// Run one frame of the configured tick duration.
    pub fn step(&mut self) -> FrameReport {
        self.frame(self.config.sim.tick_duration)
    }

    pub fn pause(&mut self) {
        if self.sim_state.paused {
            return;
        }
        self.sim_state.paused = true;
        debug!("paused at tick {}", self.sim_state.tick);
        self.event_bus.emit(Event::SimulationPaused {
            tick: self.sim_state.tick,
        });
    }

    pub fn resume(&mut self) {
        if !self.sim_state.paused {
            return;
        }
        self.sim_state.paused = false;
        debug!("resumed at tick {}", self.sim_state.tick);
        self.event_bus.emit(Event::SimulationResumed {
            tick: self.sim_state.tick,
        });
    }

    pub fn is_paused(&self) -> bool {
        self.sim_state.paused
    }

    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    pub fn elapsed(&self) -> Duration {
        self.sim_state.elapsed
    }

    // -----------------------------------------------------------------------
    // Accounting
    // -----------------------------------------------------------------------

    /// Items on lanes, in junction queues and in source buffers.
    pub fn items_in_transit(&self) -> usize {
        self.grid
            .machines()
            .map(|(_, m)| match m {
                Machine::Source(s) => usize::from(s.has_ready()),
                other => other.item_count(),
            })
            .sum()
    }

    /// Items consumed by sinks, including sinks removed since.
    pub fn items_consumed(&self) -> u64 {
        let live: u64 = self
            .grid
            .machines()
            .filter_map(|(_, m)| match m {
                Machine::Sink(s) => Some(u64::from(s.total())),
                _ => None,
            })
            .sum();
        live + self.retired_consumed
    }

    /// Items created by sources, including sources removed since.
    pub fn items_produced(&self) -> u64 {
        let live: u64 = self
            .grid
            .machines()
            .filter_map(|(_, m)| match m {
                Machine::Source(s) => Some(s.produced()),
                _ => None,
            })
            .sum();
        live + self.retired_produced
    }

    /// Items that left the network through [`Removal::spilled`]. Together
    /// with the items in transit and consumed, accounts for every item
    /// produced.
    pub fn items_spilled(&self) -> u64 {
        self.spilled
    }

    /// Deterministic hash over the tick, traversal order, machine kinds and
    /// every item position.
    pub fn state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.sim_state.tick);
        for (pos, machine) in self.grid.machines() {
            hash.write_i32(pos.x);
            hash.write_i32(pos.y);
            hash.write_u32(machine.kind() as u32);
            for in_transit in machine.in_transit() {
                hash.write_u32(in_transit.item.item.0);
                hash.write_u32(in_transit.side.index() as u32);
                hash.write_u32(in_transit.heading.index() as u32);
                hash.write_fixed64(in_transit.item.position);
            }
            match machine {
                Machine::Loader(l) => hash.write_u32(l.progress()),
                Machine::Sink(s) => hash.write_u32(s.total()),
                Machine::Source(s) => hash.write_u64(s.produced()),
                Machine::ConveyorBelt(_) | Machine::Junction(_) => {}
            }
        }
        hash.finish()
    }
}
