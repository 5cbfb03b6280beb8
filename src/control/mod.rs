// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control Algorithms
//!
//! Closed-loop pressure control for the motor channels.
//!
//! ## Modules
//!
//! - [`pi`] - N independent PI loops with anti-windup and a friction deadband.
//! - [`safety`] - Distance-driven setpoints and the out-of-range back-off state machine.
//! - [`tick`] - Control tick overrun detection.

pub mod pi;
pub mod safety;
pub mod tick;

pub use pi::{ControlUnits, Gains, PiEngine};
pub use safety::{Directive, DistanceRange, SafetyState, SetpointTable, Supervisor};
pub use tick::TickMonitor;
