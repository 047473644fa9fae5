//! Synchronous in-process event bus.
//!
//! Events are delivered to subscribers inside [`EventBus::emit`], so a
//! listener reacting to [`Event::MachineCreated`] runs before the next tick.
//! Each event is delivered at most once; subscribers registered later do not
//! see earlier events. A bounded per-kind history ([`EventBuffer`]) keeps the
//! most recent events for inspection.
//!
//! Event kinds can be suppressed via [`EventBus::suppress`], which skips both
//! delivery and history for that kind.

use crate::fixed::Ticks;
use crate::grid::GridPosition;
use crate::machine::MachineKind;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    MachineCreated {
        kind: MachineKind,
        position: GridPosition,
        tick: Ticks,
    },
    MachineRemoved {
        kind: MachineKind,
        position: GridPosition,
        /// Items returned to the caller instead of staying on the network.
        spilled: u32,
        tick: Ticks,
    },
    SimulationPaused {
        tick: Ticks,
    },
    SimulationResumed {
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for subscription and suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MachineCreated,
    MachineRemoved,
    SimulationPaused,
    SimulationResumed,
}

const EVENT_KIND_COUNT: usize = 4;

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::MachineCreated { .. } => EventKind::MachineCreated,
            Event::MachineRemoved { .. } => EventKind::MachineRemoved,
            Event::SimulationPaused { .. } => EventKind::SimulationPaused,
            Event::SimulationResumed { .. } => EventKind::SimulationResumed,
        }
    }

    pub fn tick(&self) -> Ticks {
        match self {
            Event::MachineCreated { tick, .. }
            | Event::MachineRemoved { tick, .. }
            | Event::SimulationPaused { tick }
            | Event::SimulationResumed { tick } => *tick,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer: bounded history
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer. When full, the oldest event is dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
}

impl EventBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        let start = if self.len < self.capacity() {
            0
        } else {
            // head points at the next write position, which is the oldest entry
            self.head
        };
        (0..self.len).filter_map(move |k| self.events[(start + k) % self.capacity()].as_ref())
    }

    pub fn clear(&mut self) {
        self.events.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// A listener receives events read-only.
pub type Listener = Box<dyn FnMut(&Event)>;

/// Subscriber lists, suppression flags and history, one slot per kind.
pub struct EventBus {
    history: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<Listener>; EVENT_KIND_COUNT],
    history_capacity: usize,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("history", &self.history)
            .field("suppressed", &self.suppressed)
            .field(
                "listeners",
                &self.listeners.iter().map(Vec::len).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Default::default(),
            history_capacity,
        }
    }

    /// Suppress an event kind: no delivery, no history.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.history[kind.index()] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Register a listener. Listeners run in registration order.
    pub fn on(&mut self, kind: EventKind, listener: Listener) {
        self.listeners[kind.index()].push(listener);
    }

    /// Record `event` and deliver it to every listener of its kind.
    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        for listener in &mut self.listeners[idx] {
            listener(&event);
        }
        let capacity = self.history_capacity;
        self.history[idx]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event);
    }

    /// Recent events of one kind, oldest first.
    pub fn history(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.history[kind.index()].as_ref()
    }

    pub fn clear_history(&mut self) {
        self.history.iter_mut().flatten().for_each(EventBuffer::clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn created(x: i32, tick: Ticks) -> Event {
        Event::MachineCreated {
            kind: MachineKind::ConveyorBelt,
            position: GridPosition::new(x, 0),
            tick,
        }
    }

    #[test]
    fn ring_buffer_drops_oldest() {
        let mut buffer = EventBuffer::new(2);
        buffer.push(created(0, 1));
        buffer.push(created(1, 2));
        buffer.push(created(2, 3));
        let ticks: Vec<_> = buffer.iter().map(Event::tick).collect();
        assert_eq!(ticks, vec![2, 3]);
        assert_eq!(buffer.total_written(), 3);
        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn listeners_run_synchronously_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new(8);
        let first = Rc::clone(&log);
        bus.on(
            EventKind::MachineCreated,
            Box::new(move |e| first.borrow_mut().push(("first", e.tick()))),
        );
        let second = Rc::clone(&log);
        bus.on(
            EventKind::MachineCreated,
            Box::new(move |e| second.borrow_mut().push(("second", e.tick()))),
        );

        bus.emit(created(0, 4));
        assert_eq!(*log.borrow(), vec![("first", 4), ("second", 4)]);
    }

    #[test]
    fn late_listener_sees_no_replay() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new(8);
        bus.emit(created(0, 1));
        let c = Rc::clone(&count);
        bus.on(EventKind::MachineCreated, Box::new(move |_| *c.borrow_mut() += 1));
        assert_eq!(*count.borrow(), 0);
        bus.emit(created(1, 2));
        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.history(EventKind::MachineCreated).unwrap().len(), 2);
    }

    #[test]
    fn suppressed_kind_is_silent() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new(8);
        let c = Rc::clone(&count);
        bus.on(EventKind::MachineCreated, Box::new(move |_| *c.borrow_mut() += 1));
        bus.suppress(EventKind::MachineCreated);
        bus.emit(created(0, 1));
        assert_eq!(*count.borrow(), 0);
        assert!(bus.history(EventKind::MachineCreated).is_none());
        assert!(bus.is_suppressed(EventKind::MachineCreated));
    }

    #[test]
    fn kinds_are_routed_separately() {
        let mut bus = EventBus::new(8);
        bus.emit(Event::SimulationPaused { tick: 3 });
        assert!(bus.history(EventKind::MachineCreated).is_none());
        assert_eq!(bus.history(EventKind::SimulationPaused).unwrap().len(), 1);
    }
}
