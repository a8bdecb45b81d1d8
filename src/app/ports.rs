//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (detect line, power latch, WiFi, MQTT, event sinks)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! Collaborator *notifications* (address acquired, session connected,
//! delivery confirmed, wake) do not flow through these traits; adapters
//! push them into the [`event queue`](crate::events) instead.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::fsm::context::DoorLevel;
use crate::power::WakeReason;

// ───────────────────────────────────────────────────────────────
// Shared value types
// ───────────────────────────────────────────────────────────────

/// Edge on the detect line that ends a sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeEdge {
    /// HIGH → LOW: the door just closed.
    Falling,
}

/// Radio operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioMode {
    /// Station mode, ready to associate.
    Station,
    /// Radio powered down.
    Off,
}

/// MQTT delivery guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Qos {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl Qos {
    /// Wire value (0, 1 or 2).
    pub const fn level(self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
            Self::ExactlyOnce => 2,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Door sensor port (digital input monitor)
// ───────────────────────────────────────────────────────────────

/// Read side of the detect line plus its one-shot wake registration.
pub trait DoorSensorPort {
    /// Sample the detect line right now.  Never cached.
    fn read_level(&mut self) -> DoorLevel;

    /// Arm the detect line as the sole wake source for the next sleep.
    /// The registration is consumed when it fires.
    fn arm_wake(&mut self, edge: WakeEdge);
}

// ───────────────────────────────────────────────────────────────
// Power port (hold rail + sleep)
// ───────────────────────────────────────────────────────────────

pub trait PowerPort {
    /// Drive the hold rail.  `false` removes power from the board, so a
    /// successful low write never returns on real hardware.
    fn set_hold_rail(&mut self, high: bool) -> Result<(), HwError>;

    /// Enter low-power sleep with no timer wake source.  Blocks until the
    /// armed wake source fires, then returns why it woke.
    fn enter_low_power_sleep(&mut self) -> WakeReason;
}

// ───────────────────────────────────────────────────────────────
// Link port (WiFi association)
// ───────────────────────────────────────────────────────────────

/// Link-layer commands.  Status changes arrive as
/// [`Event::LinkStatusChanged`](crate::events::Event::LinkStatusChanged).
pub trait LinkPort {
    /// Begin association.  Completion is reported asynchronously.
    fn connect(&mut self) -> Result<(), LinkError>;

    /// Drop the association.
    fn disconnect(&mut self);

    /// Power the radio up into station mode or down entirely.
    fn set_radio(&mut self, mode: RadioMode) -> Result<(), LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Session port (MQTT)
// ───────────────────────────────────────────────────────────────

/// Messaging-session commands.  Handshake completion and delivery
/// confirmations arrive as events.
pub trait SessionPort {
    /// Open (or re-open) the session to the broker.
    fn connect(&mut self) -> Result<(), SessionError>;

    /// Close the session.  Queued messages stay queued.
    fn disconnect(&mut self);

    /// Hand a message to the session for delivery.  Returning `Ok` means
    /// queued, not delivered.
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        retain: bool,
    ) -> Result<(), SessionError>;

    /// `true` when no message is waiting for transmission or confirmation.
    fn is_outbound_queue_empty(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Aggregate
// ───────────────────────────────────────────────────────────────

/// Every driven port the lifecycle needs, as one bound.
pub trait DevicePorts: DoorSensorPort + PowerPort + LinkPort + SessionPort {}

impl<T: DoorSensorPort + PowerPort + LinkPort + SessionPort> DevicePorts for T {}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`LinkPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// SSID or passphrase rejected; says which and why.
    InvalidCredentials(&'static str),
    /// The driver refused the request (code from the platform).
    Driver(i32),
}

/// Errors from [`SessionPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The session settings cannot be used (bad client id, host, protocol).
    UnsupportedConfig(&'static str),
    /// No client exists yet; `connect` has not been called.
    NotConnected,
    /// The client rejected the publish (code from the platform).
    PublishFailed(i32),
    /// The client could not be created or started.
    Driver(i32),
}

/// Errors from raw GPIO access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwError {
    GpioRead,
    GpioWrite,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials(why) => write!(f, "WiFi credentials invalid: {}", why),
            Self::Driver(rc) => write!(f, "WiFi driver error (rc={})", rc),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedConfig(msg) => write!(f, "unsupported session config: {}", msg),
            Self::NotConnected => write!(f, "session not connected"),
            Self::PublishFailed(rc) => write!(f, "publish failed (rc={})", rc),
            Self::Driver(rc) => write!(f, "MQTT client error (rc={})", rc),
        }
    }
}

impl fmt::Display for HwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioRead => write!(f, "GPIO read failed"),
            Self::GpioWrite => write!(f, "GPIO write failed"),
        }
    }
}
