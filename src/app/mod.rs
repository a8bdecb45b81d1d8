//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the lifecycle rules of the door sensor: when to
//! associate, what to publish, and when it is safe to sleep or cut power.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod identity;
pub mod ports;
pub mod service;
