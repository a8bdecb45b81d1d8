//! Hardware adapter: bridges the two GPIOs to domain port traits.
//!
//! Owns the detect line and the hold rail through the embedded-hal 1.0
//! pin traits, exposing them as [`DoorSensorPort`] and [`PowerPort`].
//! Sleep and wake registration go through [`crate::power`], which is
//! cfg-gated between ESP-IDF and a host simulation.

use embedded_hal::digital::{InputPin, OutputPin};
use log::{error, info, warn};

use crate::app::ports::{DoorSensorPort, HwError, PowerPort, WakeEdge};
use crate::events::{Event, push_event};
use crate::fsm::context::DoorLevel;
use crate::power::{self, WakeReason};

/// Concrete adapter over the detect input and the hold output.
pub struct HardwareAdapter<I, O> {
    detect: I,
    hold: O,
    /// Raw GPIO number of `detect`, for the sleep/wakeup registers.
    detect_gpio: i32,
    wake_armed: bool,
}

impl<I: InputPin, O: OutputPin> HardwareAdapter<I, O> {
    pub fn new(detect: I, hold: O, detect_gpio: i32) -> Self {
        Self {
            detect,
            hold,
            detect_gpio,
            wake_armed: false,
        }
    }

    fn line_is_low(&mut self) -> bool {
        self.detect.is_low().unwrap_or(false)
    }
}

// ── DoorSensorPort implementation ─────────────────────────────

impl<I: InputPin, O: OutputPin> DoorSensorPort for HardwareAdapter<I, O> {
    fn read_level(&mut self) -> DoorLevel {
        match self.detect.is_high() {
            Ok(high) => DoorLevel::from_line(high),
            Err(_) => {
                // Never report a close we did not see.
                warn!("{} on GPIO{}, assuming open", HwError::GpioRead, self.detect_gpio);
                DoorLevel::Open
            }
        }
    }

    fn arm_wake(&mut self, edge: WakeEdge) {
        match edge {
            WakeEdge::Falling => match power::arm_detect_wake(self.detect_gpio) {
                Ok(()) => self.wake_armed = true,
                Err(rc) => error!("wake arm on GPIO{} failed (rc={})", self.detect_gpio, rc),
            },
        }
    }
}

// ── PowerPort implementation ──────────────────────────────────

impl<I: InputPin, O: OutputPin> PowerPort for HardwareAdapter<I, O> {
    fn set_hold_rail(&mut self, high: bool) -> Result<(), HwError> {
        let result = if high {
            self.hold.set_high()
        } else {
            self.hold.set_low()
        };
        result.map_err(|_| HwError::GpioWrite)
    }

    fn enter_low_power_sleep(&mut self) -> WakeReason {
        if !self.wake_armed {
            warn!("sleeping with no wake source armed");
        }

        let reason = loop {
            let reason = power::light_sleep(self.detect_gpio);
            if reason == WakeReason::DetectLine || self.line_is_low() {
                break reason;
            }
            // Spurious or rejected sleep with the door still open: re-arm
            // the one-shot source and go back down.
            info!("woke without door close ({:?}), sleeping again", reason);
            if reason == WakeReason::Undefined {
                // Rejected sleeps return at once (pending UART output, radio
                // still shutting down); let that settle before retrying.
                power::settle_before_retry();
            }
            if let Err(rc) = power::arm_detect_wake(self.detect_gpio) {
                error!("wake re-arm failed (rc={})", rc);
            }
        };

        self.wake_armed = false;
        push_event(Event::WakeInterrupt);
        reason
    }
}
