// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # MCU-Level Wrappers
//!
//! STM32F767 peripherals adapted to the traits the hardware-independent modules use. Only built
//! with the `board` feature.
//!
//! - [`adc`] - ADC1 single conversions behind [`AdcRead`](crate::drivers::AdcRead).
//! - [`clock`] - SysTick milliseconds, busy-wait delay, DWT cycle timing.
//! - [`logger`] - Queued `log` backend on the debug USART.
//! - [`motors`] - The H-bridge channels as one motor bank.
//! - [`pins`] - Board pin map.
//! - [`pwm`] - Timer PWM and GPIO adapters to `embedded-hal` 1.0.
//! - [`usart`] - Serial links and interrupt-fed receive queues.

pub mod adc;
pub mod clock;
pub mod logger;
pub mod motors;
pub mod pins;
pub mod pwm;
pub mod usart;

pub use adc::Adc;
pub use clock::{CycleDelay, CycleTimer};
pub use motors::{board_motor, BoardMotor, BoardMotors};
pub use pins::BoardPins;
pub use pwm::{GpioOutput, PwmOutput};
pub use usart::{RxRing, UsartTx};
