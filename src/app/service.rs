//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the lifecycle FSM and its context.  It exposes a
//! clean, hardware-agnostic API.  All I/O flows through port traits
//! injected at call sites, making the entire service testable with mock
//! adapters.
//!
//! ```text
//!  Event queue ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                  │      AppService        │
//!  DevicePorts ◀──▶│  observe · step · apply│
//!                  └────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::SystemConfig;
use crate::error::Result;
use crate::events::Event;
use crate::fsm::context::{Command, FsmContext, Phase};
use crate::fsm::states::build_state_table;
use crate::fsm::{DeviceState, Fsm};

use super::events::AppEvent;
use super::identity::DeviceIdentity;
use super::ports::{DevicePorts, EventSink, LinkPort, RadioMode, SessionPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates the door-report lifecycle.
pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    config: SystemConfig,
    identity: DeviceIdentity,
}

impl AppService {
    /// Construct the service from configuration and boot identity.
    ///
    /// Does **not** start the FSM: call [`start`](Self::start) next.
    pub fn new(config: SystemConfig, identity: DeviceIdentity) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), DeviceState::Booting),
            ctx: FsmContext::new(),
            config,
            identity,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter `Booting` (latch the hold rail), then move straight on to
    /// `Associating` and start the link.
    pub fn start(&mut self, io: &mut impl DevicePorts, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started, topic={}", self.identity.topic);

        self.fsm.force_transition(DeviceState::Associating, &mut self.ctx);
        sink.emit(&AppEvent::StateChanged {
            from: DeviceState::Booting,
            to: DeviceState::Associating,
        });

        let cmds = self.ctx.take_commands();
        self.apply(&cmds, io, sink);
    }

    // ── Event handling ────────────────────────────────────────

    /// Run one event to completion: observe → FSM step → apply commands.
    ///
    /// The door level and queue state are sampled here, right before the
    /// handler decides, and never cached across events.
    pub fn handle_event(
        &mut self,
        event: Event,
        io: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) {
        let prev_state = self.fsm.current_state();

        let door = io.read_level();
        let outbound_empty = io.is_outbound_queue_empty();
        self.ctx.observe(door, outbound_empty);

        let cmds = self.fsm.step(event, &mut self.ctx);

        // Report the move before applying: `EnterSleep` blocks.
        let new_state = self.fsm.current_state();
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }

        self.apply(&cmds, io, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> DeviceState {
        self.fsm.current_state()
    }

    pub fn phase(&self) -> Phase {
        self.ctx.phase
    }

    /// Whether the session has accepted "closed" this cycle.
    pub fn closed_sent(&self) -> bool {
        self.ctx.closed_sent
    }

    pub fn topic(&self) -> &str {
        &self.identity.topic
    }

    pub fn client_id(&self) -> &str {
        &self.identity.client_id
    }

    /// Total events dispatched since startup.
    pub fn dispatched(&self) -> u64 {
        self.fsm.dispatched()
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate FSM commands into port calls, in order.  Failures are
    /// logged and reported, never retried here.  A report only counts as
    /// sent once the session has accepted it.
    fn apply(&mut self, cmds: &[Command], io: &mut impl DevicePorts, sink: &mut impl EventSink) {
        for &cmd in cmds {
            match self.apply_one(cmd, io, sink) {
                Ok(()) => {
                    if let Command::Publish(level) = cmd {
                        self.ctx.mark_queued(level);
                    }
                }
                Err(error) => {
                    warn!("{:?} failed: {}", cmd, error);
                    sink.emit(&AppEvent::CommandFailed { command: cmd, error });
                }
            }
        }
    }

    fn apply_one(
        &self,
        cmd: Command,
        io: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match cmd {
            Command::HoldPower => io.set_hold_rail(true)?,
            Command::Associate => LinkPort::connect(io)?,
            Command::Disassociate => LinkPort::disconnect(io),
            Command::RadioOff => io.set_radio(RadioMode::Off)?,
            Command::RadioOn => io.set_radio(RadioMode::Station)?,
            Command::OpenSession => SessionPort::connect(io)?,
            Command::CloseSession => SessionPort::disconnect(io),
            Command::Publish(level) => {
                io.publish(
                    &self.identity.topic,
                    level.payload(),
                    self.config.publish_qos,
                    self.config.publish_retain,
                )?;
                sink.emit(&AppEvent::Published(level));
            }
            Command::ArmWake(edge) => io.arm_wake(edge),
            Command::EnterSleep => {
                sink.emit(&AppEvent::SleepEntered);
                let reason = io.enter_low_power_sleep();
                sink.emit(&AppEvent::Woke(reason));
            }
            Command::CutPower => {
                sink.emit(&AppEvent::PowerCut);
                io.set_hold_rail(false)?;
            }
        }
        Ok(())
    }
}
