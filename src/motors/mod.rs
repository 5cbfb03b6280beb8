// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Actuator Abstractions
//!
//! Motor-level commands that sit between the control engine and the H-bridge pins.
//!
//! ## Modules
//!
//! - [`hbridge`] - Brushed DC motor on a PWM + IN1/IN2 H-bridge.

pub mod hbridge;

pub use hbridge::HBridgeMotor;

/// Actuation command for one motor channel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Drive {
    /// Extend at the given duty (%).
    Forward(f32),
    /// Retract at the given duty (%).
    Reverse(f32),
    /// Both bridge legs low: motor held.
    Brake,
    /// Both bridge legs high with no drive: motor free-wheels.
    Coast,
}

impl Drive {
    /// Map a signed duty command (−100..=100) onto a drive.
    ///
    /// Exactly zero brakes.
    pub fn from_duty(duty: f32) -> Self {
        if duty > 0.0 {
            Drive::Forward(duty)
        } else if duty < 0.0 {
            Drive::Reverse(-duty)
        } else {
            Drive::Brake
        }
    }

    /// Signed duty equivalent, for telemetry.
    pub fn signed_duty(self) -> f32 {
        match self {
            Drive::Forward(d) => d,
            Drive::Reverse(d) => -d,
            Drive::Brake | Drive::Coast => 0.0,
        }
    }
}

/// A single actuated motor channel.
pub trait Motor {
    fn apply(&mut self, drive: Drive);
}

/// The set of motor channels driven by one control tick.
pub trait MotorBank {
    fn channels(&self) -> usize;

    /// Drive channel `index`. Out-of-range indices are ignored.
    fn drive(&mut self, index: usize, drive: Drive);

    fn stop_all(&mut self) {
        for i in 0..self.channels() {
            self.drive(i, Drive::Brake);
        }
    }
}

impl<M: Motor, const N: usize> MotorBank for [M; N] {
    fn channels(&self) -> usize {
        N
    }

    fn drive(&mut self, index: usize, drive: Drive) {
        if let Some(motor) = self.get_mut(index) {
            motor.apply(drive);
        }
    }
}
