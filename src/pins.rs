//! GPIO / peripheral pin assignments for the pirwatch board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Sensors — Digital
// ---------------------------------------------------------------------------

/// HC-SR501 PIR motion sensor output.  HIGH = motion detected.
/// Configured as input with the internal pull-up enabled.
pub const PIR_GPIO: i32 = 2;
