// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Force Rig Firmware
//!
//! Firmware for a multi-actuator force-control rig: N DC-motor channels track pressure setpoints
//! while a servo-mounted distance sensor sweeps an arc and reports the nearest target in each
//! motor's sector. Written in Rust, targeting an STM32F767 MCU.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`config`] | Build-time constants, feature variants and the runtime sweep configuration |
//! | [`sync`] | Bounded-wait mutex and atomic float used across contexts |
//! | [`shared`] | State published by one context and read by the other |
//! | [`control`] | PI loops, distance-driven setpoints and tick overrun detection |
//! | [`drivers`] | Device-level drivers (multiplexer, pressure pads, servo, TOF sensor) |
//! | [`motors`] | Motor commands and the H-bridge channel |
//! | [`sweep`] | Servo sweep scheduler and sector aggregation |
//! | [`protocol`] | Binary telemetry and the text command interface |
//! | [`tasks`] | The control and I/O contexts wiring everything together |
//! | `hw` | MCU-level wrappers around ADC, USART, timers, etc. (`board` feature) |
//!
//! Everything except `hw` is hardware independent and unit tested on the host.
//!
//! ## Getting Started
//!
//! Run the host tests:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features board --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod control;
pub mod drivers;
pub mod motors;
pub mod protocol;
pub mod shared;
pub mod sweep;
pub mod sync;
pub mod tasks;

#[cfg(feature = "board")]
pub mod hw;
