//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink {
    topic: heapless::String<32>,
}

impl LogEventSink {
    pub fn new(topic: &str) -> Self {
        let mut t = heapless::String::new();
        let _ = t.push_str(topic);
        Self { topic: t }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?} | topic={}", state, self.topic);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::Published(level) => {
                info!("PUBLISH | {} <- \"{}\" (queued)", self.topic, level.as_str());
            }
            AppEvent::SleepEntered => {
                info!("POWER | entering light sleep, waiting for door");
            }
            AppEvent::Woke(reason) => {
                info!("POWER | woke ({:?})", reason);
            }
            AppEvent::PowerCut => {
                info!("POWER | hold rail low, goodbye");
            }
            AppEvent::CommandFailed { command, error } => {
                warn!("FAIL | {:?}: {}", command, error);
            }
        }
    }
}
