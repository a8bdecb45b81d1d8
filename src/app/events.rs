//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; on the device they go to the log.

use crate::error::Error;
use crate::fsm::DeviceState;
use crate::fsm::context::{Command, DoorLevel};
use crate::power::WakeReason;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(DeviceState),

    /// The FSM transitioned between states.
    StateChanged { from: DeviceState, to: DeviceState },

    /// A door report was handed to the session (queued, not yet delivered).
    Published(DoorLevel),

    /// The device is about to block in low-power sleep.
    SleepEntered,

    /// Sleep ended.
    Woke(WakeReason),

    /// The hold rail is about to drop.  Nothing follows this event.
    PowerCut,

    /// A port rejected a command.  The lifecycle does not retry.
    CommandFailed { command: Command, error: Error },
}
