// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! ADC1 with blocking single-channel conversions, using direct PAC register access.
//!
//! The multiplexer signal pin is the only analog input, so one converter is enough.
//!
//! Example:
//! ```ignore
//! let adc = Adc::adc1(dp.ADC1);
//! let mux = Multiplexer::new(select, adc, MUX_SIG_ADC_CHANNEL, delay);
//! ```

use stm32f7xx_hal::pac;

use crate::drivers::AdcRead;

pub struct Adc<ADC> {
    adc: ADC,
}

impl<ADC> Adc<ADC> {
    #[inline]
    pub fn free(self) -> ADC {
        self.adc
    }
}

impl Adc<pac::ADC1> {
    /// Power up ADC1: 12-bit, right aligned, software triggered, PCLK2 / 4.
    pub fn adc1(adc1: pac::ADC1) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb2enr.modify(|_, w| w.adc1en().set_bit());

        let common = unsafe { &*pac::ADC_COMMON::ptr() };
        common.ccr.modify(|_, w| w.adcpre().div4());

        adc1.cr2.modify(|_, w| w.adon().clear_bit());
        adc1.cr1.modify(|_, w| w.res().bits(0b00));
        adc1.cr2.modify(|_, w| {
            w.cont().clear_bit();
            w.align().right();
            w.exten().disabled();
            w
        });
        // Sequence length = 1 conversion
        adc1.sqr1.modify(|_, w| w.l().bits(0));
        adc1.cr2.modify(|_, w| w.adon().set_bit());

        Self { adc: adc1 }
    }
}

/// Longest sample time (480 cycles) on `channel`; the multiplexer output is high impedance.
fn set_long_sample_time(adc: &pac::adc1::RegisterBlock, channel: u8) {
    match channel {
        0 => adc.smpr2.modify(|_, w| w.smp0().bits(0b111)),
        1 => adc.smpr2.modify(|_, w| w.smp1().bits(0b111)),
        2 => adc.smpr2.modify(|_, w| w.smp2().bits(0b111)),
        3 => adc.smpr2.modify(|_, w| w.smp3().bits(0b111)),
        4 => adc.smpr2.modify(|_, w| w.smp4().bits(0b111)),
        5 => adc.smpr2.modify(|_, w| w.smp5().bits(0b111)),
        6 => adc.smpr2.modify(|_, w| w.smp6().bits(0b111)),
        7 => adc.smpr2.modify(|_, w| w.smp7().bits(0b111)),
        8 => adc.smpr2.modify(|_, w| w.smp8().bits(0b111)),
        9 => adc.smpr2.modify(|_, w| w.smp9().bits(0b111)),
        _ => {}
    }
}

impl AdcRead for Adc<pac::ADC1> {
    fn read_channel(&mut self, ch: u8) -> u16 {
        let adc = &self.adc;
        set_long_sample_time(adc, ch);

        adc.sqr3.modify(|_, w| unsafe { w.sq1().bits(ch & 0x1F) });
        adc.cr2.modify(|_, w| w.swstart().set_bit());
        while adc.sr.read().eoc().bit_is_clear() {}

        adc.dr.read().data().bits()
    }
}
