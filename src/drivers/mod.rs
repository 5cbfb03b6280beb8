// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! This module contains device-specific drivers that sit above the raw `hw/` layer and below the
//! application logic. They only depend on `embedded-hal` traits and the local [`AdcRead`] trait,
//! so they run unchanged against fakes on the host.
//!
//! ## Existing drivers
//!
//! - [`mux`] – CD74HC4067 16-channel analog multiplexer with averaged reads
//! - [`pressure`] – Resistive pressure pads and their Ro/S calibration
//! - [`servo`] – 50 Hz hobby servo that points the distance sensor
//! - [`tof`] – Serial time-of-flight distance sensor frames

pub mod mux;
pub mod pressure;
pub mod servo;
pub mod tof;

pub use mux::{AdcRead, MuxError, Multiplexer};
pub use pressure::{PadCalibration, PressurePads};
pub use servo::{Servo, ServoActuator};
pub use tof::{RangeSensor, TofParser, TofRanger};
