// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Adapters from HAL timer channels and GPIO pins to the `embedded-hal` 1.0 traits the drivers
//! are written against.

use core::convert::Infallible;

use embedded_hal::{digital, pwm};
use stm32f7xx_hal::{
    gpio::{ErasedPin, Output, PushPull},
    hal::PwmPin,
    prelude::*,
};

/// One timer PWM channel, driven through the HAL's `embedded-hal` 0.2 [`PwmPin`].
pub struct PwmOutput<P>(P);

impl<P: PwmPin<Duty = u16>> PwmOutput<P> {
    /// Wrap and enable `channel` at 0% duty.
    pub fn new(mut channel: P) -> Self {
        channel.set_duty(0);
        channel.enable();
        Self(channel)
    }
}

impl<P> pwm::ErrorType for PwmOutput<P> {
    type Error = Infallible;
}

impl<P: PwmPin<Duty = u16>> pwm::SetDutyCycle for PwmOutput<P> {
    fn max_duty_cycle(&self) -> u16 {
        self.0.get_max_duty()
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.0.set_duty(duty);
        Ok(())
    }
}

/// Push-pull output with its port and pin number erased, so different pins share one type.
pub struct GpioOutput(ErasedPin<Output<PushPull>>);

impl GpioOutput {
    pub fn new(pin: ErasedPin<Output<PushPull>>) -> Self {
        Self(pin)
    }
}

impl digital::ErrorType for GpioOutput {
    type Error = Infallible;
}

impl digital::OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high();
        Ok(())
    }
}
