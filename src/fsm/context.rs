//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It holds the lifecycle phase, the closed-sent latch, the
//! observations sampled just before the current event, and the command
//! buffer the handlers fill.  Think of it as the "blackboard" in a
//! blackboard architecture.

use log::warn;

use crate::app::ports::WakeEdge;

// ---------------------------------------------------------------------------
// Door level
// ---------------------------------------------------------------------------

/// Physical state of the monitored door, derived from the detect line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoorLevel {
    Open,
    Closed,
}

impl DoorLevel {
    /// Map the raw detect-line level.  The reed switch pulls the line low
    /// while the magnet is present.
    pub const fn from_line(is_high: bool) -> Self {
        if is_high { Self::Open } else { Self::Closed }
    }

    /// Exact bytes published for this level.
    pub const fn payload(self) -> &'static [u8] {
        match self {
            Self::Open => b"open",
            Self::Closed => b"closed",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Which half of the power cycle the device is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Initial boot path: report "open", maybe "closed".
    PreSleep,
    /// Woken by the detect line: report "closed" only.
    PostWake,
}

// ---------------------------------------------------------------------------
// Commands (written by state handlers; applied by the service)
// ---------------------------------------------------------------------------

/// A side effect requested by a state handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Latch the hold rail high.
    HoldPower,
    /// Start link association.
    Associate,
    /// Drop the link association.
    Disassociate,
    RadioOff,
    RadioOn,
    /// Open the messaging session.
    OpenSession,
    /// Close the messaging session.
    CloseSession,
    /// Publish the given level's payload on the device topic.
    Publish(DoorLevel),
    /// Arm the detect line as the wake source.
    ArmWake(WakeEdge),
    /// Block in low-power sleep until the armed source fires.
    EnterSleep,
    /// Drop the hold rail.  Terminal.
    CutPower,
}

/// Upper bound on commands produced by one event (exit + handler + enter).
pub const MAX_COMMANDS: usize = 8;

/// Ordered command list produced by one FSM step.
pub type Commands = heapless::Vec<Command, MAX_COMMANDS>;

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Lifecycle --
    pub phase: Phase,
    /// Latched once the session has accepted a "closed" report.  Set by
    /// the service from the publish result, never by a handler.
    pub closed_sent: bool,

    // -- Observations (sampled before each dispatch) --
    /// Detect-line level at dispatch time.
    pub door: DoorLevel,
    /// Whether the session's outbound queue was empty at dispatch time.
    pub outbound_empty: bool,

    // -- Outputs --
    /// Commands to apply after the step, in order.
    pub commands: Commands,
}

impl FsmContext {
    pub fn new() -> Self {
        Self {
            phase: Phase::PreSleep,
            closed_sent: false,
            door: DoorLevel::Open,
            outbound_empty: true,
            commands: Commands::new(),
        }
    }

    /// Record fresh observations ahead of a dispatch.
    pub fn observe(&mut self, door: DoorLevel, outbound_empty: bool) {
        self.door = door;
        self.outbound_empty = outbound_empty;
    }

    /// Append a command.  Overflow is a table bug; the command is dropped
    /// and logged rather than panicking on the device.
    pub fn emit(&mut self, cmd: Command) {
        if self.commands.push(cmd).is_err() {
            warn!("FSM command buffer full, dropped {:?}", cmd);
            debug_assert!(false, "command buffer overflow");
        }
    }

    /// The session accepted a report for `level`.  Only "closed" is
    /// latched; it gates the power cut.
    pub fn mark_queued(&mut self, level: DoorLevel) {
        if level == DoorLevel::Closed {
            self.closed_sent = true;
        }
    }

    /// Take the accumulated commands, leaving the buffer empty.
    pub fn take_commands(&mut self) -> Commands {
        core::mem::take(&mut self.commands)
    }
}

impl Default for FsmContext {
    fn default() -> Self {
        Self::new()
    }
}
