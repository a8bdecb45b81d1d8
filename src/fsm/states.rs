//! Concrete state handler functions and table builder.
//!
//! Each state is a row of plain `fn` pointers with no captured state.
//! Handlers never touch hardware; they read the
//! observations in [`FsmContext`] and append [`Command`]s.
//!
//! ```text
//!  BOOTING ──▶ ASSOCIATING ──[got ip]──▶ SESSION_OPENING
//!                  │                          │
//!                  └──────[session up]────────┤
//!                                             ▼
//!                 door open ◀──── publish "open" ────▶ door closed
//!                     │                                    │
//!                     ▼                                    ▼
//!              PUBLISHING_OPEN                 AWAITING_CLOSE_OR_SHUTDOWN
//!                     │ [ack]                              │ [ack, queue empty]
//!                     ▼                                    │
//!                 SLEEPING ──[wake]──▶ REASSOCIATING       │
//!                                           │ [got ip]     │
//!                                           ▼              │
//!                              SESSION_OPENING_AFTER_WAKE  │
//!                                           │ [session up] │
//!                                           ▼              │
//!                                   PUBLISHING_CLOSED      │
//!                                           │ [ack, empty] │
//!                                           ▼              ▼
//!                                        SHUTTING_DOWN (power cut)
//! ```
//!
//! Events a state does not list are ignored, which keeps every handler
//! safe against duplicate delivery.

use log::{debug, info};

use super::context::{Command, DoorLevel, FsmContext, Phase};
use super::{DeviceState, StateDescriptor};
use crate::app::ports::WakeEdge;
use crate::events::{Event, LinkStatus};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; DeviceState::COUNT] {
    [
        // Index 0: Booting
        StateDescriptor {
            id: DeviceState::Booting,
            name: "Booting",
            on_enter: Some(booting_enter),
            on_exit: None,
            on_event: booting_event,
        },
        // Index 1: Associating
        StateDescriptor {
            id: DeviceState::Associating,
            name: "Associating",
            on_enter: Some(associate_enter),
            on_exit: None,
            on_event: associating_event,
        },
        // Index 2: SessionOpening
        StateDescriptor {
            id: DeviceState::SessionOpening,
            name: "SessionOpening",
            on_enter: None,
            on_exit: None,
            on_event: session_opening_event,
        },
        // Index 3: PublishingOpen
        StateDescriptor {
            id: DeviceState::PublishingOpen,
            name: "PublishingOpen",
            on_enter: None,
            on_exit: None,
            on_event: publishing_open_event,
        },
        // Index 4: AwaitingCloseOrShutdown
        StateDescriptor {
            id: DeviceState::AwaitingCloseOrShutdown,
            name: "AwaitingCloseOrShutdown",
            on_enter: None,
            on_exit: None,
            on_event: awaiting_close_event,
        },
        // Index 5: Sleeping
        StateDescriptor {
            id: DeviceState::Sleeping,
            name: "Sleeping",
            on_enter: Some(sleeping_enter),
            on_exit: Some(sleeping_exit),
            on_event: sleeping_event,
        },
        // Index 6: ReassociatingAfterWake
        StateDescriptor {
            id: DeviceState::ReassociatingAfterWake,
            name: "ReassociatingAfterWake",
            on_enter: Some(associate_enter),
            on_exit: None,
            on_event: reassociating_event,
        },
        // Index 7: SessionOpeningAfterWake
        StateDescriptor {
            id: DeviceState::SessionOpeningAfterWake,
            name: "SessionOpeningAfterWake",
            on_enter: None,
            on_exit: None,
            on_event: session_opening_after_wake_event,
        },
        // Index 8: PublishingClosed
        StateDescriptor {
            id: DeviceState::PublishingClosed,
            name: "PublishingClosed",
            on_enter: None,
            on_exit: None,
            on_event: publishing_closed_event,
        },
        // Index 9: ShuttingDown
        StateDescriptor {
            id: DeviceState::ShuttingDown,
            name: "ShuttingDown",
            on_enter: Some(shutting_down_enter),
            on_exit: None,
            on_event: shutting_down_event,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared reactions
// ═══════════════════════════════════════════════════════════════════════════

fn ignored(state: &str, event: Event) -> Option<DeviceState> {
    debug!("{}: ignoring {:?}", state, event);
    None
}

/// Link flaps while the session is up or being opened: hand the decision
/// to the session and stay put.
fn follow_link(ctx: &mut FsmContext, status: LinkStatus) {
    match status {
        LinkStatus::GotIp => ctx.emit(Command::OpenSession),
        LinkStatus::Other => ctx.emit(Command::CloseSession),
    }
}

/// Session is up on the boot path: report "open", and "closed" too if the
/// door has already shut again.
fn publish_initial(ctx: &mut FsmContext) -> Option<DeviceState> {
    ctx.emit(Command::Publish(DoorLevel::Open));
    if ctx.door == DoorLevel::Closed {
        ctx.emit(Command::Publish(DoorLevel::Closed));
        info!("door already closed, reporting both");
        return Some(DeviceState::AwaitingCloseOrShutdown);
    }
    Some(DeviceState::PublishingOpen)
}

/// Session is up after a wake: the wake itself means the door closed.
fn publish_closed(ctx: &mut FsmContext) -> Option<DeviceState> {
    ctx.emit(Command::Publish(DoorLevel::Closed));
    Some(DeviceState::PublishingClosed)
}

/// The session came back while "closed" has not been accepted yet.
fn resend_closed(ctx: &mut FsmContext) -> Option<DeviceState> {
    info!("session back, \"closed\" not queued yet, sending again");
    ctx.emit(Command::Publish(DoorLevel::Closed));
    None
}

/// Power may only be cut once "closed" is out and nothing is left queued.
fn may_cut_power(ctx: &FsmContext) -> bool {
    ctx.closed_sent && ctx.outbound_empty
}

// ═══════════════════════════════════════════════════════════════════════════
//  BOOTING
// ═══════════════════════════════════════════════════════════════════════════

fn booting_enter(ctx: &mut FsmContext) {
    ctx.emit(Command::HoldPower);
}

fn booting_event(_ctx: &mut FsmContext, event: Event) -> Option<DeviceState> {
    ignored("BOOTING", event)
}

// ═══════════════════════════════════════════════════════════════════════════
//  ASSOCIATING / SESSION_OPENING: boot path
// ═══════════════════════════════════════════════════════════════════════════

fn associate_enter(ctx: &mut FsmContext) {
    ctx.emit(Command::Associate);
}

fn associating_event(ctx: &mut FsmContext, event: Event) -> Option<DeviceState> {
    match event {
        Event::LinkStatusChanged(LinkStatus::GotIp) => {
            ctx.emit(Command::OpenSession);
            Some(DeviceState::SessionOpening)
        }
        Event::LinkStatusChanged(LinkStatus::Other) => {
            ctx.emit(Command::CloseSession);
            None
        }
        // The client may reconnect on its own before we saw the address.
        Event::SessionConnected => publish_initial(ctx),
        other => ignored("ASSOCIATING", other),
    }
}

fn session_opening_event(ctx: &mut FsmContext, event: Event) -> Option<DeviceState> {
    match event {
        Event::LinkStatusChanged(status) => {
            follow_link(ctx, status);
            None
        }
        Event::SessionConnected => publish_initial(ctx),
        other => ignored("SESSION_OPENING", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  PUBLISHING_OPEN: "open" in flight, door still open
// ═══════════════════════════════════════════════════════════════════════════

fn publishing_open_event(ctx: &mut FsmContext, event: Event) -> Option<DeviceState> {
    match event {
        Event::LinkStatusChanged(status) => {
            follow_link(ctx, status);
            None
        }
        Event::PublishAcknowledged => {
            info!("PUBLISHING_OPEN: open delivered, going to sleep");
            Some(DeviceState::Sleeping)
        }
        other => ignored("PUBLISHING_OPEN", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  AWAITING_CLOSE_OR_SHUTDOWN: "open" and "closed" both queued
// ═══════════════════════════════════════════════════════════════════════════

fn awaiting_close_event(ctx: &mut FsmContext, event: Event) -> Option<DeviceState> {
    match event {
        Event::LinkStatusChanged(status) => {
            follow_link(ctx, status);
            None
        }
        Event::PublishAcknowledged if may_cut_power(ctx) => Some(DeviceState::ShuttingDown),
        Event::PublishAcknowledged => {
            debug!("AWAITING_CLOSE: ack, but closed not out or queue busy");
            None
        }
        Event::SessionConnected if !ctx.closed_sent => resend_closed(ctx),
        other => ignored("AWAITING_CLOSE", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  SLEEPING
// ═══════════════════════════════════════════════════════════════════════════

fn sleeping_enter(ctx: &mut FsmContext) {
    ctx.emit(Command::Disassociate);
    ctx.emit(Command::RadioOff);
    ctx.emit(Command::ArmWake(WakeEdge::Falling));
    ctx.emit(Command::EnterSleep);
}

fn sleeping_exit(ctx: &mut FsmContext) {
    ctx.emit(Command::RadioOn);
}

fn sleeping_event(ctx: &mut FsmContext, event: Event) -> Option<DeviceState> {
    match event {
        Event::WakeInterrupt => {
            ctx.phase = Phase::PostWake;
            ctx.closed_sent = false;
            info!("SLEEPING: woken by detect line");
            Some(DeviceState::ReassociatingAfterWake)
        }
        other => ignored("SLEEPING", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  REASSOCIATING / SESSION_OPENING_AFTER_WAKE: wake path
// ═══════════════════════════════════════════════════════════════════════════

fn reassociating_event(ctx: &mut FsmContext, event: Event) -> Option<DeviceState> {
    match event {
        Event::LinkStatusChanged(LinkStatus::GotIp) => {
            ctx.emit(Command::OpenSession);
            Some(DeviceState::SessionOpeningAfterWake)
        }
        Event::LinkStatusChanged(LinkStatus::Other) => {
            ctx.emit(Command::CloseSession);
            None
        }
        Event::SessionConnected => publish_closed(ctx),
        other => ignored("REASSOCIATING", other),
    }
}

fn session_opening_after_wake_event(ctx: &mut FsmContext, event: Event) -> Option<DeviceState> {
    match event {
        Event::LinkStatusChanged(status) => {
            follow_link(ctx, status);
            None
        }
        Event::SessionConnected => publish_closed(ctx),
        other => ignored("SESSION_OPENING_AFTER_WAKE", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  PUBLISHING_CLOSED
// ═══════════════════════════════════════════════════════════════════════════

fn publishing_closed_event(ctx: &mut FsmContext, event: Event) -> Option<DeviceState> {
    match event {
        Event::LinkStatusChanged(status) => {
            follow_link(ctx, status);
            None
        }
        Event::PublishAcknowledged if may_cut_power(ctx) => Some(DeviceState::ShuttingDown),
        Event::SessionConnected if !ctx.closed_sent => resend_closed(ctx),
        other => ignored("PUBLISHING_CLOSED", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  SHUTTING_DOWN: terminal
// ═══════════════════════════════════════════════════════════════════════════

fn shutting_down_enter(ctx: &mut FsmContext) {
    info!("SHUTTING_DOWN: queue drained, dropping hold rail");
    ctx.emit(Command::CutPower);
}

fn shutting_down_event(_ctx: &mut FsmContext, event: Event) -> Option<DeviceState> {
    ignored("SHUTTING_DOWN", event)
}
