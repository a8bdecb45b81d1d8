//! MQTT messaging-session adapter.
//!
//! Implements [`SessionPort`] on top of the ESP-IDF MQTT client.  The
//! client runs its own task: handshake completion and delivery
//! confirmations come back through its callback and are forwarded into the
//! event queue as [`Event::SessionConnected`] and
//! [`Event::PublishAcknowledged`].
//!
//! ## Outbound queue
//!
//! esp-mqtt keeps its own outbox but does not expose its size, so the
//! adapter counts publishes in flight: incremented on send, decremented
//! when the broker confirms.  QoS 0 messages are never confirmed by the
//! client; they count as delivered once the send returns.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//! - **all other targets**: simulation that connects and confirms at once.

use core::fmt::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use log::{info, warn};

use crate::app::identity::{ClientId, DeviceIdentity};
use crate::app::ports::{Qos, SessionError, SessionPort};
use crate::config::{ConfigError, SystemConfig};
use crate::events::{Event, push_event};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EventPayload, LwtConfiguration, MqttClientConfiguration, MqttProtocolVersion,
    QoS,
};

// ───────────────────────────────────────────────────────────────
// Session settings
// ───────────────────────────────────────────────────────────────

/// Everything needed to open a session, checked once at boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// `mqtt://host:port` or `mqtts://host:port`.
    pub url: heapless::String<96>,
    pub client_id: ClientId,
    pub username: heapless::String<32>,
    pub password: heapless::String<64>,
    pub keepalive_secs: u16,
    pub clean_session: bool,
    pub lwt_topic: heapless::String<32>,
    pub lwt_message: heapless::String<32>,
    pub lwt_qos: Qos,
    pub lwt_retain: bool,
}

impl SessionSettings {
    /// Derive and validate the session settings.
    ///
    /// Returns [`SessionError::UnsupportedConfig`] for settings the client
    /// cannot work with; the caller treats that as a fatal boot error.
    pub fn from_config(
        config: &SystemConfig,
        identity: &DeviceIdentity,
    ) -> Result<Self, SessionError> {
        config
            .validate_broker()
            .map_err(|ConfigError::ValidationFailed(why)| SessionError::UnsupportedConfig(why))?;
        if identity.client_id.is_empty() || identity.client_id.len() > 23 {
            // MQTT 3.1.1 only guarantees 1-23 byte client ids.
            return Err(SessionError::UnsupportedConfig("client id must be 1-23 bytes"));
        }

        let scheme = if config.mqtt_tls { "mqtts" } else { "mqtt" };
        let mut url = heapless::String::new();
        write!(url, "{}://{}:{}", scheme, config.mqtt_host, config.mqtt_port)
            .map_err(|_| SessionError::UnsupportedConfig("broker url too long"))?;

        Ok(Self {
            url,
            client_id: identity.client_id.clone(),
            username: config.mqtt_username.clone(),
            password: config.mqtt_password.clone(),
            keepalive_secs: config.keepalive_secs,
            clean_session: config.clean_session,
            lwt_topic: config.lwt_topic.clone(),
            lwt_message: config.lwt_message.clone(),
            lwt_qos: config.lwt_qos,
            lwt_retain: config.lwt_retain,
        })
    }
}

#[cfg(target_os = "espidf")]
fn to_esp_qos(qos: Qos) -> QoS {
    match qos {
        Qos::AtMostOnce => QoS::AtMostOnce,
        Qos::AtLeastOnce => QoS::AtLeastOnce,
        Qos::ExactlyOnce => QoS::ExactlyOnce,
    }
}

/// Decrement without wrapping below zero.
fn settle(in_flight: &AtomicU32) {
    let _ = in_flight.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
}

// ───────────────────────────────────────────────────────────────
// Session adapter
// ───────────────────────────────────────────────────────────────

pub struct MqttSession {
    settings: SessionSettings,
    /// Publishes sent but not yet confirmed.
    in_flight: Arc<AtomicU32>,
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(not(target_os = "espidf"))]
    connected: bool,
}

impl MqttSession {
    /// Validate the settings.  The client itself is created by the first
    /// [`SessionPort::connect`], once the link is up.
    pub fn open(config: &SystemConfig, identity: &DeviceIdentity) -> Result<Self, SessionError> {
        let settings = SessionSettings::from_config(config, identity)?;
        info!(
            "MQTT: session for '{}' at {}",
            settings.client_id, settings.url
        );
        Ok(Self {
            settings,
            in_flight: Arc::new(AtomicU32::new(0)),
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(not(target_os = "espidf"))]
            connected: false,
        })
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight.load(Ordering::Acquire)
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), SessionError> {
        if self.client.is_some() {
            // esp-mqtt reconnects by itself; a live client is reused so
            // its outbox survives.
            return Ok(());
        }

        let s = &self.settings;
        let conf = MqttClientConfiguration {
            client_id: Some(s.client_id.as_str()),
            username: (!s.username.is_empty()).then_some(s.username.as_str()),
            password: (!s.password.is_empty()).then_some(s.password.as_str()),
            keep_alive_interval: Some(core::time::Duration::from_secs(u64::from(
                s.keepalive_secs,
            ))),
            disable_clean_session: !s.clean_session,
            protocol_version: Some(MqttProtocolVersion::V3_1_1),
            lwt: Some(LwtConfiguration {
                topic: s.lwt_topic.as_str(),
                payload: s.lwt_message.as_bytes(),
                qos: to_esp_qos(s.lwt_qos),
                retain: s.lwt_retain,
            }),
            ..Default::default()
        };

        let in_flight = Arc::clone(&self.in_flight);
        let client = EspMqttClient::new_cb(s.url.as_str(), &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => {
                    push_event(Event::SessionConnected);
                }
                EventPayload::Published(_) => {
                    settle(&in_flight);
                    push_event(Event::PublishAcknowledged);
                }
                EventPayload::Disconnected => {
                    log::info!("MQTT: broker connection dropped");
                }
                EventPayload::Error(e) => {
                    log::warn!("MQTT: client error {:?}", e);
                }
                _ => {}
            }
        })
        .map_err(|e| SessionError::Driver(e.code()))?;

        self.client = Some(client);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), SessionError> {
        if !self.connected {
            self.connected = true;
            info!("MQTT(sim): connected to {}", self.settings.url);
            push_event(Event::SessionConnected);
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        retain: bool,
    ) -> Result<(), SessionError> {
        let client = self.client.as_mut().ok_or(SessionError::NotConnected)?;
        client
            .publish(topic, to_esp_qos(qos), retain, payload)
            .map(|_msg_id| ())
            .map_err(|e| SessionError::PublishFailed(e.code()))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        _retain: bool,
    ) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        info!(
            "MQTT(sim): {} <- {:?} (qos {})",
            topic,
            core::str::from_utf8(payload).unwrap_or("<binary>"),
            qos.level()
        );
        if qos != Qos::AtMostOnce {
            // Broker confirms at once.
            settle(&self.in_flight);
            push_event(Event::PublishAcknowledged);
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        // The client has no pause: it stays alive and reconnects when the
        // link returns, keeping queued messages.
        info!("MQTT: link down, client will reconnect");
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.connected = false;
        info!("MQTT(sim): disconnected");
    }
}

// ───────────────────────────────────────────────────────────────
// SessionPort
// ───────────────────────────────────────────────────────────────

impl SessionPort for MqttSession {
    fn connect(&mut self) -> Result<(), SessionError> {
        self.platform_connect()
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        retain: bool,
    ) -> Result<(), SessionError> {
        let confirmed = qos != Qos::AtMostOnce;
        if confirmed {
            self.in_flight.fetch_add(1, Ordering::AcqRel);
        }

        match self.platform_publish(topic, payload, qos, retain) {
            Ok(()) => {
                if !confirmed {
                    push_event(Event::PublishAcknowledged);
                }
                Ok(())
            }
            Err(e) => {
                if confirmed {
                    settle(&self.in_flight);
                }
                warn!("MQTT: publish to {} failed: {}", topic, e);
                Err(e)
            }
        }
    }

    fn is_outbound_queue_empty(&self) -> bool {
        self.in_flight() == 0
    }
}
