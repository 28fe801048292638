//! Calendar date arithmetic for week and month views.
//!
//! # Responsibility
//! - Compute the rolling 7-day week window and full month windows.
//!
//! # Invariants
//! - All functions are pure; none touch storage or the system clock.

pub mod window;
