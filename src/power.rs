//! Low-power sleep primitives.
//!
//! The detect line is the only wake source: no timer is ever armed, so a
//! sleep lasts until the door closes.  ESP32 light sleep only supports
//! level-triggered GPIO wake, so the falling edge is modelled as "wake
//! while the line is low".  That also covers a door that closed between
//! the last publish and the call to sleep: the device wakes immediately.
//!
//! The registration is one-shot: [`light_sleep`] disarms the GPIO after
//! waking so a line that stays low cannot wake the next sleep early.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Why the last sleep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// The armed detect line fired.
    DetectLine,
    /// Sleep was rejected or returned without a recorded cause.
    Undefined,
    /// Any other wake source (raw platform cause code).
    Other(u32),
}

/// Arm `gpio` to wake the chip from light sleep while it reads low.
#[cfg(target_os = "espidf")]
pub fn arm_detect_wake(gpio: i32) -> Result<(), i32> {
    unsafe {
        // Nothing but the detect line may end the sleep.
        esp_sleep_disable_wakeup_source(esp_sleep_source_t_ESP_SLEEP_WAKEUP_ALL);

        let ret = gpio_wakeup_enable(gpio, gpio_int_type_t_GPIO_INTR_LOW_LEVEL);
        if ret != ESP_OK as i32 {
            return Err(ret);
        }
        let ret = esp_sleep_enable_gpio_wakeup();
        if ret != ESP_OK as i32 {
            return Err(ret);
        }
    }
    log::info!("power: GPIO{} armed as wake source (low level)", gpio);
    Ok(())
}

/// Enter light sleep and block until a wake source fires.
#[cfg(target_os = "espidf")]
pub fn light_sleep(gpio: i32) -> WakeReason {
    let reason = unsafe {
        let ret = esp_light_sleep_start();
        if ret != ESP_OK as i32 {
            log::warn!("power: light sleep rejected ({})", ret);
            WakeReason::Undefined
        } else {
            let cause = esp_sleep_get_wakeup_cause();
            if cause == esp_sleep_source_t_ESP_SLEEP_WAKEUP_GPIO {
                WakeReason::DetectLine
            } else if cause == esp_sleep_source_t_ESP_SLEEP_WAKEUP_UNDEFINED {
                WakeReason::Undefined
            } else {
                WakeReason::Other(cause as u32)
            }
        }
    };
    unsafe {
        gpio_wakeup_disable(gpio);
    }
    reason
}

/// Short pause after a rejected sleep before arming again.
#[cfg(target_os = "espidf")]
pub fn settle_before_retry() {
    esp_idf_hal::delay::FreeRtos::delay_ms(100);
}

// ── Simulation ────────────────────────────────────────────────
//
// Host builds have no sleep: the detect line "fires" at once.

#[cfg(not(target_os = "espidf"))]
pub fn arm_detect_wake(gpio: i32) -> Result<(), i32> {
    log::info!("power(sim): GPIO{} armed as wake source", gpio);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn settle_before_retry() {}

#[cfg(not(target_os = "espidf"))]
pub fn light_sleep(gpio: i32) -> WakeReason {
    log::info!("power(sim): sleeping until GPIO{} goes low", gpio);
    WakeReason::DetectLine
}
