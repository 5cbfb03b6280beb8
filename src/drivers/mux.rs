// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! CD74HC4067 16:1 analog multiplexer in front of a single ADC channel.
//!
//! Every read is `select -> settle -> samples × (convert, gap) -> mean`. Latency is fixed by
//! the settle time and sample count; there are no retries.
//!
//! Example:
//! ```ignore
//! let mut mux = Multiplexer::new(select_pins, adc, MUX_SIG_ADC_CHANNEL, delay);
//! let mv = mux.read_millivolts_averaged(6, 8)?;
//! ```

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config;

/// Number of multiplexer inputs.
pub const MUX_CHANNELS: u8 = 16;
/// ADC reference voltage (mV).
pub const VREF_MV: u32 = 3300;
/// Full-scale 12-bit ADC code.
pub const ADC_FULL_SCALE: u32 = 4095;

/// Trait for reading a single channel from an ADC peripheral.
pub trait AdcRead {
    fn read_channel(&mut self, ch: u8) -> u16;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MuxError {
    /// Channel outside 0..=15.
    InvalidChannel(u8),
    ZeroSamples,
}

impl fmt::Display for MuxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MuxError::InvalidChannel(ch) => write!(f, "invalid mux channel {}", ch),
            MuxError::ZeroSamples => f.write_str("sample count must be > 0"),
        }
    }
}

/// Convert a 12-bit ADC code to millivolts.
#[inline]
pub fn code_to_millivolts(code: u16) -> u16 {
    (code as u32 * VREF_MV / ADC_FULL_SCALE) as u16
}

/// Multiplexer select lines S0..S3, the ADC behind the signal pin and a delay source.
pub struct Multiplexer<S, A, D> {
    select: [S; 4],
    adc: A,
    adc_channel: u8,
    delay: D,
    settle_us: u32,
    sample_gap_us: u32,
    last_selected: Option<u8>,
}

impl<S, A, D> Multiplexer<S, A, D>
where
    S: OutputPin,
    A: AdcRead,
    D: DelayNs,
{
    pub fn new(select: [S; 4], adc: A, adc_channel: u8, delay: D) -> Self {
        Self {
            select,
            adc,
            adc_channel,
            delay,
            settle_us: config::MUX_SETTLE_US,
            sample_gap_us: config::MUX_SAMPLE_GAP_US,
            last_selected: None,
        }
    }

    /// Override settle time and inter-sample gap.
    pub fn with_timing(mut self, settle_us: u32, sample_gap_us: u32) -> Self {
        self.settle_us = settle_us;
        self.sample_gap_us = sample_gap_us;
        self
    }

    #[inline]
    pub fn last_selected(&self) -> Option<u8> {
        self.last_selected
    }

    /// Worst-case duration of one averaged read (µs).
    pub const fn latency_us(settle_us: u32, sample_gap_us: u32, samples: u8) -> u32 {
        settle_us + samples as u32 * sample_gap_us
    }

    /// Drive S0..S3 with the channel bits and wait for the analog path to settle.
    pub fn select(&mut self, channel: u8) -> Result<(), MuxError> {
        if channel >= MUX_CHANNELS {
            return Err(MuxError::InvalidChannel(channel));
        }
        for (bit, pin) in self.select.iter_mut().enumerate() {
            if channel & (1 << bit) != 0 {
                pin.set_high().ok();
            } else {
                pin.set_low().ok();
            }
        }
        self.last_selected = Some(channel);
        self.delay.delay_us(self.settle_us);
        Ok(())
    }

    /// Mean raw ADC code over `samples` conversions.
    pub fn read_raw_averaged(&mut self, channel: u8, samples: u8) -> Result<u16, MuxError> {
        if samples == 0 {
            return Err(MuxError::ZeroSamples);
        }
        self.select(channel)?;

        let mut acc: u32 = 0;
        for _ in 0..samples {
            acc += self.adc.read_channel(self.adc_channel) as u32;
            self.delay.delay_us(self.sample_gap_us);
        }
        Ok((acc / samples as u32) as u16)
    }

    /// Mean reading in millivolts over `samples` conversions.
    pub fn read_millivolts_averaged(&mut self, channel: u8, samples: u8) -> Result<u16, MuxError> {
        if samples == 0 {
            return Err(MuxError::ZeroSamples);
        }
        self.select(channel)?;

        let mut acc: u32 = 0;
        for _ in 0..samples {
            acc += code_to_millivolts(self.adc.read_channel(self.adc_channel)) as u32;
            self.delay.delay_us(self.sample_gap_us);
        }
        Ok((acc / samples as u32) as u16)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::motors::hbridge::tests::FakePin;
    use crate::sync::tests::CountingDelay;
    use core::cell::Cell;

    /// Returns the next scripted code, repeating the last one; records the channel read.
    pub(crate) struct ScriptedAdc<'a> {
        pub codes: &'a [u16],
        pub next: usize,
        pub channel: Option<u8>,
    }

    impl<'a> ScriptedAdc<'a> {
        pub(crate) fn new(codes: &'a [u16]) -> Self {
            Self {
                codes,
                next: 0,
                channel: None,
            }
        }
    }

    impl AdcRead for ScriptedAdc<'_> {
        fn read_channel(&mut self, ch: u8) -> u16 {
            self.channel = Some(ch);
            let i = self.next.min(self.codes.len() - 1);
            self.next += 1;
            self.codes[i]
        }
    }

    fn pins(cells: &[Cell<bool>; 4]) -> [FakePin<'_>; 4] {
        [
            FakePin(&cells[0]),
            FakePin(&cells[1]),
            FakePin(&cells[2]),
            FakePin(&cells[3]),
        ]
    }

    #[test]
    fn select_drives_channel_bits() {
        let cells: [Cell<bool>; 4] = Default::default();
        let mut mux = Multiplexer::new(pins(&cells), ScriptedAdc::new(&[0]), 3, CountingDelay::default());

        mux.select(0b1010).unwrap();
        let bits: [bool; 4] = core::array::from_fn(|i| cells[i].get());
        assert_eq!(bits, [false, true, false, true]);
        assert_eq!(mux.last_selected(), Some(10));

        assert_eq!(mux.select(16), Err(MuxError::InvalidChannel(16)));
        assert_eq!(mux.last_selected(), Some(10));
    }

    #[test]
    fn averaged_read_is_mean_with_fixed_latency() {
        let cells: [Cell<bool>; 4] = Default::default();
        let codes = [100, 200, 300, 400];
        let mut mux = Multiplexer::new(pins(&cells), ScriptedAdc::new(&codes), 3, CountingDelay::default());

        assert_eq!(mux.read_raw_averaged(6, 4), Ok(250));
        assert_eq!(mux.adc.channel, Some(3));

        let expected_us = Multiplexer::<FakePin, ScriptedAdc, CountingDelay>::latency_us(
            config::MUX_SETTLE_US,
            config::MUX_SAMPLE_GAP_US,
            4,
        );
        assert_eq!(mux.delay.waited_ns, expected_us as u64 * 1_000);
    }

    #[test]
    fn millivolts_scale_to_reference() {
        let cells: [Cell<bool>; 4] = Default::default();
        let mut mux = Multiplexer::new(pins(&cells), ScriptedAdc::new(&[4095]), 3, CountingDelay::default());
        assert_eq!(mux.read_millivolts_averaged(1, 8), Ok(3300));
        assert_eq!(code_to_millivolts(0), 0);
        assert_eq!(code_to_millivolts(2048), 1650);
    }

    #[test]
    fn zero_samples_is_rejected_before_selecting() {
        let cells: [Cell<bool>; 4] = Default::default();
        let mut mux = Multiplexer::new(pins(&cells), ScriptedAdc::new(&[0]), 3, CountingDelay::default());
        assert_eq!(mux.read_raw_averaged(2, 0), Err(MuxError::ZeroSamples));
        assert_eq!(mux.last_selected(), None);
    }
}
