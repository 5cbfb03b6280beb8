// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Servo Sweep
//!
//! Drives the distance sensor across the configured arc and reduces the readings to one
//! minimum distance per motor sector.
//!
//! ## Modules
//!
//! - [`sector`] - Sector assignment and its coverage check.
//! - [`scheduler`] - Non-blocking move/settle/read state machine and sector aggregation.

pub mod scheduler;
pub mod sector;

pub use scheduler::{Direction, SweepEvent, SweepScheduler};
pub use sector::{CoverageError, Sector, SectorMap};

/// Sweep directionality, fixed per build.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SweepMode {
    /// Measure min → max, then return to min without measuring.
    Forward,
    /// Measure min → max, then max → min.
    Bidirectional,
}
