// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Brushed DC motor on a PWM + IN1/IN2 H-bridge.
//!
//! | Drive | IN1 | IN2 | PWM |
//! | ----- | --- | --- | --- |
//! | Forward | high | low | duty |
//! | Reverse | low | high | duty |
//! | Brake | low | low | 100 % |
//! | Coast | high | high | 0 % |

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use super::{Drive, Motor};

/// One motor channel: speed PWM plus two direction pins.
pub struct HBridgeMotor<Pwm, In1, In2> {
    pwm: Pwm,
    in1: In1,
    in2: In2,
    last: Drive,
}

impl<Pwm, In1, In2> HBridgeMotor<Pwm, In1, In2>
where
    Pwm: SetDutyCycle,
    In1: OutputPin,
    In2: OutputPin,
{
    /// Wrap the pins and leave the motor braked.
    pub fn new(pwm: Pwm, in1: In1, in2: In2) -> Self {
        let mut motor = Self {
            pwm,
            in1,
            in2,
            last: Drive::Brake,
        };
        motor.apply(Drive::Brake);
        motor
    }

    /// Last drive command applied.
    #[inline]
    pub fn last_drive(&self) -> Drive {
        self.last
    }

    /// Release the pins.
    pub fn free(self) -> (Pwm, In1, In2) {
        (self.pwm, self.in1, self.in2)
    }

    fn set_duty_pct(&mut self, duty_pct: f32) {
        let max = self.pwm.max_duty_cycle();
        let duty = (duty_pct.clamp(0.0, 100.0) / 100.0 * max as f32) as u16;
        self.pwm.set_duty_cycle(duty.min(max)).ok();
    }
}

impl<Pwm, In1, In2> Motor for HBridgeMotor<Pwm, In1, In2>
where
    Pwm: SetDutyCycle,
    In1: OutputPin,
    In2: OutputPin,
{
    fn apply(&mut self, drive: Drive) {
        match drive {
            Drive::Forward(duty) => {
                self.in1.set_high().ok();
                self.in2.set_low().ok();
                self.set_duty_pct(duty);
            }
            Drive::Reverse(duty) => {
                self.in1.set_low().ok();
                self.in2.set_high().ok();
                self.set_duty_pct(duty);
            }
            Drive::Brake => {
                self.in1.set_low().ok();
                self.in2.set_low().ok();
                self.set_duty_pct(100.0);
            }
            Drive::Coast => {
                self.in1.set_high().ok();
                self.in2.set_high().ok();
                self.set_duty_pct(0.0);
            }
        }
        self.last = drive;
    }
}
