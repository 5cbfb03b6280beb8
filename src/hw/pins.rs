// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the STM32F767 force rig controller board.

use stm32f7xx_hal::{
    gpio::{gpioa, gpiod, gpioe, Alternate, Analog, ErasedPin, Output, PushPull},
    pac,
    prelude::*,
};

/// All board pins. Construct this once at startup using:
///
/// ```ignore
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOD, dp.GPIOE, dp.GPIOF);
/// ```
pub struct BoardPins {
    pub debug: Usart1Pins,
    pub tof: Usart2Pins,
    pub host: Usart3Pins,
    pub mux: MuxPins,
    pub motor_pwm: MotorPwmPins,
    pub motor_dir: [DirPins; crate::config::NUM_MOTORS],
    /// TIM3_CH1, 50 Hz servo pulse.
    pub servo: gpioa::PA6<Alternate<2>>,
}

pub struct Usart1Pins {
    pub tx: gpioa::PA9<Alternate<7>>,
    pub rx: gpioa::PA10<Alternate<7>>,
}

pub struct Usart2Pins {
    pub tx: gpiod::PD5<Alternate<7>>,
    pub rx: gpiod::PD6<Alternate<7>>,
}

/// Routed to the ST-LINK virtual COM port.
pub struct Usart3Pins {
    pub tx: gpiod::PD8<Alternate<7>>,
    pub rx: gpiod::PD9<Alternate<7>>,
}

/// CD74HC4067 select lines and signal input.
pub struct MuxPins {
    /// S0..S3, LSB first.
    pub select: [ErasedPin<Output<PushPull>>; 4],
    pub sig: gpioa::PA3<Analog>, // ADC123_IN3
}

/// H-bridge enable (PWM) inputs.
pub struct MotorPwmPins {
    pub m1: gpiod::PD12<Alternate<2>>, // TIM4_CH1
    pub m2: gpiod::PD13<Alternate<2>>, // TIM4_CH2
    pub m3: gpiod::PD14<Alternate<2>>, // TIM4_CH3
    pub m4: gpiod::PD15<Alternate<2>>, // TIM4_CH4
    #[cfg(feature = "five-motors")]
    pub m5: gpioe::PE9<Alternate<1>>, // TIM1_CH1
}

/// H-bridge direction inputs of one motor.
pub struct DirPins {
    pub in1: ErasedPin<Output<PushPull>>,
    pub in2: ErasedPin<Output<PushPull>>,
}

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(gpioa: pac::GPIOA, gpiod: pac::GPIOD, gpioe: pac::GPIOE, gpiof: pac::GPIOF) -> Self {
        let gpioa = gpioa.split();
        let gpiod = gpiod.split();
        let gpioe = gpioe.split();
        let gpiof = gpiof.split();

        let out = |pin: ErasedPin<Output<PushPull>>| {
            let mut pin = pin;
            pin.set_low();
            pin
        };

        Self {
            debug: Usart1Pins {
                tx: gpioa.pa9.into_alternate::<7>(),
                rx: gpioa.pa10.into_alternate::<7>(),
            },

            tof: Usart2Pins {
                tx: gpiod.pd5.into_alternate::<7>(),
                rx: gpiod.pd6.into_alternate::<7>(),
            },

            host: Usart3Pins {
                tx: gpiod.pd8.into_alternate::<7>(),
                rx: gpiod.pd9.into_alternate::<7>(),
            },

            mux: MuxPins {
                select: [
                    out(gpiof.pf12.into_push_pull_output().erase()),
                    out(gpiof.pf13.into_push_pull_output().erase()),
                    out(gpiof.pf14.into_push_pull_output().erase()),
                    out(gpiof.pf15.into_push_pull_output().erase()),
                ],
                sig: gpioa.pa3.into_analog(),
            },

            motor_pwm: MotorPwmPins {
                m1: gpiod.pd12.into_alternate::<2>(),
                m2: gpiod.pd13.into_alternate::<2>(),
                m3: gpiod.pd14.into_alternate::<2>(),
                m4: gpiod.pd15.into_alternate::<2>(),
                #[cfg(feature = "five-motors")]
                m5: gpioe.pe9.into_alternate::<1>(),
            },

            motor_dir: [
                DirPins {
                    in1: out(gpioe.pe2.into_push_pull_output().erase()),
                    in2: out(gpioe.pe3.into_push_pull_output().erase()),
                },
                DirPins {
                    in1: out(gpioe.pe4.into_push_pull_output().erase()),
                    in2: out(gpioe.pe5.into_push_pull_output().erase()),
                },
                DirPins {
                    in1: out(gpioe.pe6.into_push_pull_output().erase()),
                    in2: out(gpioe.pe7.into_push_pull_output().erase()),
                },
                DirPins {
                    in1: out(gpioe.pe8.into_push_pull_output().erase()),
                    in2: out(gpioe.pe10.into_push_pull_output().erase()),
                },
                #[cfg(feature = "five-motors")]
                DirPins {
                    in1: out(gpioe.pe11.into_push_pull_output().erase()),
                    in2: out(gpioe.pe12.into_push_pull_output().erase()),
                },
            ],

            servo: gpioa.pa6.into_alternate::<2>(),
        }
    }
}
