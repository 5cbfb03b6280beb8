// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! The rig's H-bridge channels as one [`MotorBank`].
//!
//! Each channel's PWM comes from a different timer channel type, so the bank is a struct with
//! one field per motor rather than an array.

use stm32f7xx_hal::hal::PwmPin;

use crate::hw::pins::DirPins;
use crate::hw::pwm::{GpioOutput, PwmOutput};
use crate::motors::{Drive, HBridgeMotor, Motor, MotorBank};

pub type BoardMotor<P> = HBridgeMotor<PwmOutput<P>, GpioOutput, GpioOutput>;

/// Wire one H-bridge from its timer channel and direction pins. Starts braked.
pub fn board_motor<P: PwmPin<Duty = u16>>(pwm: P, dir: DirPins) -> BoardMotor<P> {
    HBridgeMotor::new(PwmOutput::new(pwm), GpioOutput::new(dir.in1), GpioOutput::new(dir.in2))
}

#[cfg(not(feature = "five-motors"))]
pub struct BoardMotors<P1, P2, P3, P4> {
    pub m1: BoardMotor<P1>,
    pub m2: BoardMotor<P2>,
    pub m3: BoardMotor<P3>,
    pub m4: BoardMotor<P4>,
}

#[cfg(not(feature = "five-motors"))]
impl<P1, P2, P3, P4> MotorBank for BoardMotors<P1, P2, P3, P4>
where
    P1: PwmPin<Duty = u16>,
    P2: PwmPin<Duty = u16>,
    P3: PwmPin<Duty = u16>,
    P4: PwmPin<Duty = u16>,
{
    fn channels(&self) -> usize {
        4
    }

    fn drive(&mut self, index: usize, drive: Drive) {
        match index {
            0 => self.m1.apply(drive),
            1 => self.m2.apply(drive),
            2 => self.m3.apply(drive),
            3 => self.m4.apply(drive),
            _ => {}
        }
    }
}

#[cfg(feature = "five-motors")]
pub struct BoardMotors<P1, P2, P3, P4, P5> {
    pub m1: BoardMotor<P1>,
    pub m2: BoardMotor<P2>,
    pub m3: BoardMotor<P3>,
    pub m4: BoardMotor<P4>,
    pub m5: BoardMotor<P5>,
}

#[cfg(feature = "five-motors")]
impl<P1, P2, P3, P4, P5> MotorBank for BoardMotors<P1, P2, P3, P4, P5>
where
    P1: PwmPin<Duty = u16>,
    P2: PwmPin<Duty = u16>,
    P3: PwmPin<Duty = u16>,
    P4: PwmPin<Duty = u16>,
    P5: PwmPin<Duty = u16>,
{
    fn channels(&self) -> usize {
        5
    }

    fn drive(&mut self, index: usize, drive: Drive) {
        match index {
            0 => self.m1.apply(drive),
            1 => self.m2.apply(drive),
            2 => self.m3.apply(drive),
            3 => self.m4.apply(drive),
            4 => self.m5.apply(drive),
            _ => {}
        }
    }
}
