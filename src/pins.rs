//! GPIO pin assignments for the DoorSense board.
//!
//! Single source of truth: raw sleep/wakeup calls reference these numbers.
//! `main.rs` takes the matching typed pins from `Peripherals`; change both
//! together.

// ---------------------------------------------------------------------------
// Power latch
// ---------------------------------------------------------------------------

/// Digital output: holds the regulator enable (CH_PD) high while the
/// firmware runs. Driving it LOW removes power from the whole board.
pub const HOLD_GPIO: i32 = 0;

// ---------------------------------------------------------------------------
// Door detect line
// ---------------------------------------------------------------------------

/// Digital input: reed switch to ground with external pull-up.
/// LOW = door closed (magnet present), HIGH = door open.
pub const DETECT_GPIO: i32 = 2;
