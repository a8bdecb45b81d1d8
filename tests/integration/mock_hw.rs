//! Mock device adapter for integration tests.
//!
//! Records every port call so tests can assert on the full command
//! history without touching real GPIO, radio or broker.  The door level
//! and the outbound queue state are plain fields the test flips between
//! events.

use doorsense::app::events::AppEvent;
use doorsense::app::ports::{
    DoorSensorPort, EventSink, HwError, LinkError, LinkPort, PowerPort, Qos, RadioMode,
    SessionError, SessionPort, WakeEdge,
};
use doorsense::fsm::context::DoorLevel;
use doorsense::power::WakeReason;

// ── Port call record ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortCall {
    HoldRail(bool),
    LinkConnect,
    LinkDisconnect,
    Radio(RadioMode),
    SessionConnect,
    SessionDisconnect,
    Publish {
        topic: String,
        payload: Vec<u8>,
        qos: Qos,
        retain: bool,
    },
    ArmWake(WakeEdge),
    Sleep,
}

// ── MockDevice ────────────────────────────────────────────────

pub struct MockDevice {
    pub calls: Vec<PortCall>,
    /// Level returned by the next `read_level`.
    pub door: DoorLevel,
    /// Value returned by `is_outbound_queue_empty`.
    pub queue_empty: bool,
    /// When set, publishes are rejected with this error.
    pub publish_error: Option<SessionError>,
    /// Restrict `publish_error` to this payload; `None` rejects them all.
    pub reject_only: Option<&'static [u8]>,
}

impl MockDevice {
    pub fn new(door: DoorLevel) -> Self {
        Self {
            calls: Vec::new(),
            door,
            queue_empty: true,
            publish_error: None,
            reject_only: None,
        }
    }

    /// Payloads handed to the session, in order.
    pub fn published(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PortCall::Publish { payload, .. } => core::str::from_utf8(payload).ok(),
                _ => None,
            })
            .collect()
    }

    pub fn power_cut(&self) -> bool {
        self.calls.contains(&PortCall::HoldRail(false))
    }

    pub fn slept(&self) -> bool {
        self.calls.contains(&PortCall::Sleep)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl DoorSensorPort for MockDevice {
    fn read_level(&mut self) -> DoorLevel {
        self.door
    }

    fn arm_wake(&mut self, edge: WakeEdge) {
        self.calls.push(PortCall::ArmWake(edge));
    }
}

impl PowerPort for MockDevice {
    fn set_hold_rail(&mut self, high: bool) -> Result<(), HwError> {
        self.calls.push(PortCall::HoldRail(high));
        Ok(())
    }

    fn enter_low_power_sleep(&mut self) -> WakeReason {
        self.calls.push(PortCall::Sleep);
        WakeReason::DetectLine
    }
}

impl LinkPort for MockDevice {
    fn connect(&mut self) -> Result<(), LinkError> {
        self.calls.push(PortCall::LinkConnect);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.calls.push(PortCall::LinkDisconnect);
    }

    fn set_radio(&mut self, mode: RadioMode) -> Result<(), LinkError> {
        self.calls.push(PortCall::Radio(mode));
        Ok(())
    }
}

impl SessionPort for MockDevice {
    fn connect(&mut self) -> Result<(), SessionError> {
        self.calls.push(PortCall::SessionConnect);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.calls.push(PortCall::SessionDisconnect);
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        retain: bool,
    ) -> Result<(), SessionError> {
        if let Some(e) = self.publish_error {
            if self.reject_only.is_none_or(|p| p == payload) {
                return Err(e);
            }
        }
        self.calls.push(PortCall::Publish {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        Ok(())
    }

    fn is_outbound_queue_empty(&self) -> bool {
        self.queue_empty
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
