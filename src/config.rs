//! System configuration parameters
//!
//! Network credentials and messaging-session settings for the door sensor.
//! Values are baked in at build time from `DOORSENSE_*` environment
//! variables; nothing is persisted on the device.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::app::ports::Qos;

/// Printable-ASCII check shared by SSID and credential validation.
fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Copy `s` into a fixed-capacity string, truncating at capacity.
fn fixed<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- WiFi station ---
    /// Access point SSID (1-32 printable ASCII bytes)
    pub wifi_ssid: heapless::String<32>,
    /// WPA2 passphrase (8-64 bytes), empty for an open network
    pub wifi_password: heapless::String<64>,

    // --- MQTT broker ---
    pub mqtt_host: heapless::String<64>,
    pub mqtt_port: u16,
    /// Use TLS (`mqtts://`) instead of plain TCP
    pub mqtt_tls: bool,
    pub mqtt_username: heapless::String<32>,
    pub mqtt_password: heapless::String<64>,
    /// Keep-alive interval (seconds)
    pub keepalive_secs: u16,
    pub clean_session: bool,

    // --- Last will ---
    pub lwt_topic: heapless::String<32>,
    pub lwt_message: heapless::String<32>,
    pub lwt_qos: Qos,
    pub lwt_retain: bool,

    // --- Door reports ---
    pub publish_qos: Qos,
    pub publish_retain: bool,
    /// Prepended to the chip id to form the MQTT client id
    pub client_id_prefix: heapless::String<8>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // WiFi
            wifi_ssid: fixed(option_env!("DOORSENSE_WIFI_SSID").unwrap_or("doorsense")),
            wifi_password: fixed(option_env!("DOORSENSE_WIFI_PASS").unwrap_or("")),

            // MQTT
            mqtt_host: fixed(option_env!("DOORSENSE_MQTT_HOST").unwrap_or("192.168.1.2")),
            mqtt_port: option_env!("DOORSENSE_MQTT_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(1883),
            mqtt_tls: matches!(option_env!("DOORSENSE_MQTT_TLS"), Some("1" | "true")),
            mqtt_username: fixed(option_env!("DOORSENSE_MQTT_USER").unwrap_or("")),
            mqtt_password: fixed(option_env!("DOORSENSE_MQTT_PASS").unwrap_or("")),
            keepalive_secs: 120,
            clean_session: true,

            // Last will
            lwt_topic: fixed("/lwt"),
            lwt_message: fixed("offline"),
            lwt_qos: Qos::AtMostOnce,
            lwt_retain: false,

            // Door reports: esp-mqtt only confirms delivery for QoS >= 1
            publish_qos: Qos::AtLeastOnce,
            publish_retain: false,
            client_id_prefix: fixed("door_"),
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_link()?;
        self.validate_broker()
    }

    /// WiFi station credentials.
    pub fn validate_link(&self) -> Result<(), ConfigError> {
        if self.wifi_ssid.is_empty() || !is_printable_ascii(&self.wifi_ssid) {
            return Err(ConfigError::ValidationFailed("wifi_ssid: 1-32 printable ASCII bytes"));
        }
        let pw_len = self.wifi_password.len();
        if pw_len != 0 && !(8..=64).contains(&pw_len) {
            return Err(ConfigError::ValidationFailed("wifi_password: 8-64 bytes or empty"));
        }
        Ok(())
    }

    /// Broker address, session timing and last will.
    pub fn validate_broker(&self) -> Result<(), ConfigError> {
        if self.mqtt_host.is_empty() || !is_printable_ascii(&self.mqtt_host) {
            return Err(ConfigError::ValidationFailed("mqtt_host: must be set"));
        }
        if self.mqtt_port == 0 {
            return Err(ConfigError::ValidationFailed("mqtt_port: must be non-zero"));
        }
        if !self.mqtt_password.is_empty() && self.mqtt_username.is_empty() {
            return Err(ConfigError::ValidationFailed("mqtt_password: set without a username"));
        }
        if self.keepalive_secs == 0 {
            return Err(ConfigError::ValidationFailed("keepalive_secs: must be non-zero"));
        }
        if self.lwt_topic.is_empty() || self.lwt_topic.contains(['#', '+']) {
            return Err(ConfigError::ValidationFailed("lwt_topic: set, without wildcards"));
        }
        Ok(())
    }
}

/// Errors from configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}
