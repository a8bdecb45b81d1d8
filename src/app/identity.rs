//! Device identity: messaging client id and publish topic.
//!
//! Both strings are derived once at boot from the factory chip id and are
//! never persisted; the same hardware always yields the same values.

use core::fmt::Write;

use crate::config::SystemConfig;

pub type ClientId = heapless::String<32>;
pub type Topic = heapless::String<32>;

/// Identity strings computed at boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub chip_id: u32,
    /// `<prefix><chip id>`, e.g. `door_12345`.
    pub client_id: ClientId,
    /// `sensor/<chip id>/door`.
    pub topic: Topic,
}

impl DeviceIdentity {
    pub fn new(chip_id: u32, config: &SystemConfig) -> Self {
        let mut client_id = ClientId::new();
        // 8-byte prefix + 10 decimal digits always fits.
        let _ = write!(client_id, "{}{}", config.client_id_prefix, chip_id);

        let mut topic = Topic::new();
        let _ = write!(topic, "sensor/{}/door", chip_id);

        Self {
            chip_id,
            client_id,
            topic,
        }
    }
}
