//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                    │
//! │  ┌──────────────┬──────────┬──────────┬──────────────────────┐ │
//! │  │ DeviceState  │ on_enter │ on_exit  │ on_event             │ │
//! │  ├──────────────┼──────────┼──────────┼──────────────────────┤ │
//! │  │ Booting      │ fn(ctx)  │    -     │ fn(ctx, ev)->Option<>│ │
//! │  │ Associating  │ fn(ctx)  │    -     │ fn(ctx, ev)->Option<>│ │
//! │  │ ...          │          │          │                      │ │
//! │  │ Sleeping     │ fn(ctx)  │ fn(ctx)  │ fn(ctx, ev)->Option<>│ │
//! │  │ ShuttingDown │ fn(ctx)  │    -     │ fn(ctx, ev)->Option<>│ │
//! │  └──────────────┴──────────┴──────────┴──────────────────────┘ │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! For each event the engine calls `on_event` for the **current** state.
//! If it returns `Some(next)`, the engine runs `on_exit` for the current
//! state, then `on_enter` for the next, and updates the current pointer.
//! Handlers only write [`Command`](context::Command)s into the context;
//! [`Fsm::step`] hands them back to the caller to execute, so the whole
//! machine is a pure `(state, event) -> (state, commands)` function.

pub mod context;
pub mod states;

use context::{Commands, FsmContext};
use log::info;

use crate::events::Event;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all lifecycle states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceState {
    Booting = 0,
    Associating = 1,
    SessionOpening = 2,
    PublishingOpen = 3,
    AwaitingCloseOrShutdown = 4,
    Sleeping = 5,
    ReassociatingAfterWake = 6,
    SessionOpeningAfterWake = 7,
    PublishingClosed = 8,
    ShuttingDown = 9,
}

impl DeviceState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 10;

    /// Convert an index back to `DeviceState`.  Panics on out-of-range in
    /// debug builds; returns `ShuttingDown` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Booting,
            1 => Self::Associating,
            2 => Self::SessionOpening,
            3 => Self::PublishingOpen,
            4 => Self::AwaitingCloseOrShutdown,
            5 => Self::Sleeping,
            6 => Self::ReassociatingAfterWake,
            7 => Self::SessionOpeningAfterWake,
            8 => Self::PublishingClosed,
            9 => Self::ShuttingDown,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::ShuttingDown
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-event handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateEventFn = fn(&mut FsmContext, Event) -> Option<DeviceState>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array, no heap and no `dyn`.
pub struct StateDescriptor {
    pub id: DeviceState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_event: StateEventFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `DeviceState as usize`.
    table: [StateDescriptor; DeviceState::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Events dispatched since construction.
    dispatched: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; DeviceState::COUNT], initial: DeviceState) -> Self {
        Self {
            table,
            current: initial as usize,
            dispatched: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first event.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Deliver one event to the current state.
    ///
    /// 1. Call `on_event` for the current state.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn dispatch(&mut self, event: Event, ctx: &mut FsmContext) {
        self.dispatched += 1;

        let next = (self.table[self.current].on_event)(ctx, event);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Dispatch `event` and return the commands it produced, in order.
    pub fn step(&mut self, event: Event, ctx: &mut FsmContext) -> Commands {
        self.dispatch(event, ctx);
        ctx.take_commands()
    }

    /// Force an immediate transition regardless of the current handler.
    /// Used once at boot to leave `Booting`.
    pub fn force_transition(&mut self, next: DeviceState, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> DeviceState {
        DeviceState::from_index(self.current)
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: DeviceState, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        // Enter new state
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}


#[cfg(all(test, not(target_os = "espidf")))]
mod proptests {
    use super::context::{Command, DoorLevel, FsmContext};
    use super::*;
    use crate::events::LinkStatus;
    use proptest::prelude::*;

    fn arb_event() -> impl Strategy<Value = Event> {
        prop_oneof![
            Just(Event::LinkStatusChanged(LinkStatus::GotIp)),
            Just(Event::LinkStatusChanged(LinkStatus::Other)),
            Just(Event::SessionConnected),
            Just(Event::PublishAcknowledged),
            Just(Event::WakeInterrupt),
        ]
    }

    fn arb_door() -> impl Strategy<Value = DoorLevel> {
        prop_oneof![Just(DoorLevel::Open), Just(DoorLevel::Closed)]
    }

    /// What the service does after a publish the session accepted.
    fn accept(ctx: &mut FsmContext, cmds: &Commands) {
        for cmd in cmds {
            if let Command::Publish(level) = cmd {
                ctx.mark_queued(*level);
            }
        }
    }

    proptest! {
        #[test]
        fn cut_power_only_with_flag_and_empty_queue(
            events in proptest::collection::vec(
                (arb_event(), arb_door(), any::<bool>(), any::<bool>()),
                1..100,
            )
        ) {
            let mut fsm = Fsm::new(states::build_state_table(), DeviceState::Booting);
            let mut ctx = FsmContext::new();
            fsm.start(&mut ctx);
            fsm.force_transition(DeviceState::Associating, &mut ctx);
            ctx.take_commands();

            for (ev, door, empty, accepted) in events {
                ctx.observe(door, empty);
                let cmds = fsm.step(ev, &mut ctx);
                if accepted {
                    accept(&mut ctx, &cmds);
                }
                if cmds.contains(&Command::CutPower) {
                    prop_assert!(ctx.closed_sent);
                    prop_assert!(empty);
                    prop_assert_eq!(fsm.current_state(), DeviceState::ShuttingDown);
                }
            }
        }

        #[test]
        fn at_most_one_report_of_each_kind_per_phase(
            events in proptest::collection::vec((arb_event(), arb_door(), any::<bool>()), 1..100)
        ) {
            let mut fsm = Fsm::new(states::build_state_table(), DeviceState::Booting);
            let mut ctx = FsmContext::new();
            fsm.start(&mut ctx);
            fsm.force_transition(DeviceState::Associating, &mut ctx);
            ctx.take_commands();

            let (mut opens, mut closes) = (0u32, 0u32);
            let mut last_phase = ctx.phase;
            for (ev, door, empty) in events {
                ctx.observe(door, empty);
                let cmds = fsm.step(ev, &mut ctx);
                accept(&mut ctx, &cmds);
                if ctx.phase != last_phase {
                    last_phase = ctx.phase;
                    closes = 0;
                }
                for cmd in &cmds {
                    match cmd {
                        Command::Publish(DoorLevel::Open) => opens += 1,
                        Command::Publish(DoorLevel::Closed) => closes += 1,
                        _ => {}
                    }
                }
                prop_assert!(opens <= 1, "open published {} times", opens);
                prop_assert!(closes <= 1, "closed published {} times", closes);
            }
        }
    }
}
