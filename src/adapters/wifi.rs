//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`]: the hexagonal boundary for link association.
//! Status changes are not returned from `connect`; they arrive later from
//! the system event loop and are forwarded into the event queue as
//! [`Event::LinkStatusChanged`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs that report an address at once.
//!
//! ## Reconnection policy
//!
//! None here.  The lifecycle asks for one association per phase and relies
//! on the driver's own retry behaviour.

use log::info;

use crate::app::ports::{LinkError, LinkPort, RadioMode};
use crate::config::{ConfigError, SystemConfig};
use crate::events::{Event, LinkStatus, push_event};

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::{EspSubscription, EspSystemEventLoop, System},
    hal::modem::Modem,
    netif::IpEvent,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi, WifiEvent},
};

/// Forward a classified link status into the event queue.
fn report(status: LinkStatus) {
    push_event(Event::LinkStatusChanged(status));
}

fn check_credentials(config: &SystemConfig) -> Result<(), LinkError> {
    config
        .validate_link()
        .map_err(|ConfigError::ValidationFailed(why)| LinkError::InvalidCredentials(why))
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    ssid: heapless::String<32>,
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    #[cfg(target_os = "espidf")]
    _ip_events: EspSubscription<'static, System>,
    #[cfg(target_os = "espidf")]
    _wifi_events: EspSubscription<'static, System>,
    radio_on: bool,
}

impl WifiAdapter {
    /// Build the station driver and subscribe to its status events.
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &SystemConfig,
    ) -> Result<Self, LinkError> {
        check_credentials(config)?;

        let mut wifi =
            EspWifi::new(modem, sysloop.clone(), nvs).map_err(|e| LinkError::Driver(e.code()))?;

        let auth_method = if config.wifi_password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: config
                .wifi_ssid
                .as_str()
                .try_into()
                .map_err(|_| LinkError::InvalidCredentials("wifi_ssid: too long"))?,
            password: config
                .wifi_password
                .as_str()
                .try_into()
                .map_err(|_| LinkError::InvalidCredentials("wifi_password: too long"))?,
            auth_method,
            ..Default::default()
        }))
        .map_err(|e| LinkError::Driver(e.code()))?;

        let ip_events = sysloop
            .subscribe::<IpEvent, _>(|event| match event {
                IpEvent::DhcpIpAssigned(_) => report(LinkStatus::GotIp),
                IpEvent::DhcpIpDeassigned(_) => report(LinkStatus::Other),
                _ => {}
            })
            .map_err(|e| LinkError::Driver(e.code()))?;

        let wifi_events = sysloop
            .subscribe::<WifiEvent, _>(|event| {
                if let WifiEvent::StaDisconnected(_) = event {
                    report(LinkStatus::Other);
                }
            })
            .map_err(|e| LinkError::Driver(e.code()))?;

        let mut ssid = heapless::String::new();
        let _ = ssid.push_str(&config.wifi_ssid);

        Ok(Self {
            ssid,
            wifi,
            _ip_events: ip_events,
            _wifi_events: wifi_events,
            radio_on: false,
        })
    }

    /// Simulation: validates credentials only.
    #[cfg(not(target_os = "espidf"))]
    pub fn new(config: &SystemConfig) -> Result<Self, LinkError> {
        check_credentials(config)?;
        let mut ssid = heapless::String::new();
        let _ = ssid.push_str(&config.wifi_ssid);
        Ok(Self {
            ssid,
            radio_on: false,
        })
    }

    pub fn is_radio_on(&self) -> bool {
        self.radio_on
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), LinkError> {
        self.wifi.start().map_err(|e| LinkError::Driver(e.code()))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), LinkError> {
        info!("WiFi(sim): radio up");
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&mut self) -> Result<(), LinkError> {
        self.wifi.stop().map_err(|e| LinkError::Driver(e.code()))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&mut self) -> Result<(), LinkError> {
        info!("WiFi(sim): radio down");
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), LinkError> {
        self.wifi.connect().map_err(|e| LinkError::Driver(e.code()))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), LinkError> {
        info!("WiFi(sim): associated with '{}'", self.ssid);
        report(LinkStatus::GotIp);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            log::warn!("WiFi: disconnect failed ({})", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("WiFi(sim): disconnected");
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort
// ───────────────────────────────────────────────────────────────

impl LinkPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), LinkError> {
        if !self.radio_on {
            self.set_radio(RadioMode::Station)?;
        }
        info!("WiFi: connecting to '{}'", self.ssid);
        self.platform_connect()
    }

    fn disconnect(&mut self) {
        if !self.radio_on {
            return;
        }
        self.platform_disconnect();
        info!("WiFi: disconnected");
    }

    fn set_radio(&mut self, mode: RadioMode) -> Result<(), LinkError> {
        match mode {
            RadioMode::Station if !self.radio_on => {
                self.platform_start()?;
                self.radio_on = true;
            }
            RadioMode::Off if self.radio_on => {
                self.platform_stop()?;
                self.radio_on = false;
            }
            _ => {}
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
