//! Aggregate adapter: one value that satisfies [`DevicePorts`].
//!
//! The service takes a single `&mut impl DevicePorts` so that sampling the
//! detect line and commanding the radio never need two mutable borrows.
//! This struct just forwards each port to the adapter that owns it.
//!
//! [`DevicePorts`]: crate::app::ports::DevicePorts

use embedded_hal::digital::{InputPin, OutputPin};

use super::hardware::HardwareAdapter;
use super::mqtt::MqttSession;
use super::wifi::WifiAdapter;
use crate::app::ports::{
    DoorSensorPort, HwError, LinkError, LinkPort, PowerPort, Qos, RadioMode, SessionError,
    SessionPort, WakeEdge,
};
use crate::fsm::context::DoorLevel;
use crate::power::WakeReason;

pub struct DeviceAdapter<I, O> {
    pub hw: HardwareAdapter<I, O>,
    pub wifi: WifiAdapter,
    pub mqtt: MqttSession,
}

impl<I: InputPin, O: OutputPin> DeviceAdapter<I, O> {
    pub fn new(hw: HardwareAdapter<I, O>, wifi: WifiAdapter, mqtt: MqttSession) -> Self {
        Self { hw, wifi, mqtt }
    }
}

impl<I: InputPin, O: OutputPin> DoorSensorPort for DeviceAdapter<I, O> {
    fn read_level(&mut self) -> DoorLevel {
        self.hw.read_level()
    }

    fn arm_wake(&mut self, edge: WakeEdge) {
        self.hw.arm_wake(edge);
    }
}

impl<I: InputPin, O: OutputPin> PowerPort for DeviceAdapter<I, O> {
    fn set_hold_rail(&mut self, high: bool) -> Result<(), HwError> {
        self.hw.set_hold_rail(high)
    }

    fn enter_low_power_sleep(&mut self) -> WakeReason {
        self.hw.enter_low_power_sleep()
    }
}

impl<I, O> LinkPort for DeviceAdapter<I, O> {
    fn connect(&mut self) -> Result<(), LinkError> {
        self.wifi.connect()
    }

    fn disconnect(&mut self) {
        self.wifi.disconnect();
    }

    fn set_radio(&mut self, mode: RadioMode) -> Result<(), LinkError> {
        self.wifi.set_radio(mode)
    }
}

impl<I, O> SessionPort for DeviceAdapter<I, O> {
    fn connect(&mut self) -> Result<(), SessionError> {
        self.mqtt.connect()
    }

    fn disconnect(&mut self) {
        self.mqtt.disconnect();
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        retain: bool,
    ) -> Result<(), SessionError> {
        self.mqtt.publish(topic, payload, qos, retain)
    }

    fn is_outbound_queue_empty(&self) -> bool {
        self.mqtt.is_outbound_queue_empty()
    }
}
