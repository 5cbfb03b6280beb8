// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Hobby servo on a 50 Hz PWM channel (500–2500 µs pulse for 0–180°).

use embedded_hal::pwm::SetDutyCycle;

pub const PERIOD_US: u32 = 20_000;
pub const PULSE_MIN_US: u32 = 500;
pub const PULSE_MAX_US: u32 = 2_500;
pub const ANGLE_MAX: u16 = 180;

/// Anything that can point the distance sensor at an angle.
pub trait ServoActuator {
    /// Command `angle` in degrees, clamped to 0..=180.
    fn set_angle(&mut self, angle: u16);
}

/// Pulse width for `angle`, clamped to the servo range.
#[inline]
pub fn pulse_us(angle: u16) -> u32 {
    let angle = angle.min(ANGLE_MAX) as u32;
    PULSE_MIN_US + angle * (PULSE_MAX_US - PULSE_MIN_US) / ANGLE_MAX as u32
}

pub struct Servo<P> {
    pwm: P,
    angle: u16,
}

impl<P: SetDutyCycle> Servo<P> {
    /// `pwm` must already run at 50 Hz.
    pub fn new(pwm: P, initial_angle: u16) -> Self {
        let mut servo = Self { pwm, angle: 0 };
        servo.set_angle(initial_angle);
        servo
    }

    #[inline]
    pub fn angle(&self) -> u16 {
        self.angle
    }
}

impl<P: SetDutyCycle> ServoActuator for Servo<P> {
    fn set_angle(&mut self, angle: u16) {
        let angle = angle.min(ANGLE_MAX);
        self.pwm
            .set_duty_cycle_fraction(pulse_us(angle) as u16, PERIOD_US as u16)
            .ok();
        self.angle = angle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motors::hbridge::tests::FakePwm;
    use core::cell::Cell;

    #[test]
    fn pulse_spans_half_to_two_and_a_half_ms() {
        assert_eq!(pulse_us(0), 500);
        assert_eq!(pulse_us(90), 1500);
        assert_eq!(pulse_us(180), 2500);
        assert_eq!(pulse_us(250), 2500);
    }

    #[test]
    fn angle_maps_onto_pwm_fraction() {
        let duty = Cell::new(0);
        let mut servo = Servo::new(FakePwm(&duty), 90);
        // 1500 / 20000 of 1023
        assert_eq!(duty.get(), 76);
        servo.set_angle(200);
        assert_eq!(servo.angle(), 180);
        assert_eq!(duty.get(), 127);
    }
}
