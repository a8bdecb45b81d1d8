//! Event channel between the collaborators and the lifecycle core.
//!
//! Events are produced by:
//! - the radio event task (address acquired / lost)
//! - the messaging client task (session up, delivery confirmed)
//! - the sleep primitive (detect-line wake)
//!
//! Events are consumed by the main loop, which blocks until one arrives and
//! runs it to completion before taking the next.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ WiFi task   │────▶│              │     │              │
//! │ MQTT task   │────▶│  Event Queue │────▶│  Main Loop   │
//! │ Wake (GPIO) │────▶│  (bounded)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use std::sync::{Condvar, Mutex, PoisonError};

use heapless::Deque;

/// Maximum number of pending events.
const EVENT_QUEUE_CAP: usize = 16;

/// Two-way classification of link status reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    /// Station associated and holds an IP address.
    GotIp,
    /// Any other status: association failed, address lost, disconnected.
    Other,
}

/// Everything the lifecycle core reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// The link layer reported a connectivity transition.
    LinkStatusChanged(LinkStatus),
    /// The messaging session finished its handshake.
    SessionConnected,
    /// The messaging session confirmed delivery of a publication.
    PublishAcknowledged,
    /// The armed detect-line edge fired while sleeping.
    WakeInterrupt,
}

// ── Bounded MPSC queue ────────────────────────────────────────
//
// Several producer tasks push; only the main loop pops.  The condvar
// lets the consumer block instead of spinning between events.

/// FIFO event queue shared by all producers and the single consumer.
pub struct EventQueue {
    pending: Mutex<Deque<Event, EVENT_QUEUE_CAP>>,
    ready: Condvar,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Deque::new()),
            ready: Condvar::new(),
        }
    }

    /// Push an event.  Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: Event) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.push_back(event).is_err() {
            return false;
        }
        drop(pending);
        self.ready.notify_one();
        true
    }

    /// Block until an event is available and return it.
    pub fn wait(&self) -> Event {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(event) = pending.pop_front() {
                return event;
            }
            pending = self
                .ready
                .wait(pending)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide queue every adapter publishes into.
static EVENTS: EventQueue = EventQueue::new();

/// Push an event into the global queue.
/// Safe to call from any task; returns `false` if the event was dropped.
pub fn push_event(event: Event) -> bool {
    let accepted = EVENTS.push(event);
    if !accepted {
        log::warn!("Event queue full, dropped {:?}", event);
    }
    accepted
}

/// Block the caller until the next event arrives.
pub fn wait_event() -> Event {
    EVENTS.wait()
}
