// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Resistive pressure pads read through the analog multiplexer.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use super::mux::{AdcRead, MuxError, Multiplexer};
use crate::control::ControlUnits;

/// Linear pad model: `mV = Ro + S * force`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PadCalibration {
    /// Unloaded output (mV).
    pub offset_ro_mv: f32,
    /// Sensitivity (mV per N).
    pub slope_mv_per_n: f32,
}

impl PadCalibration {
    pub const fn new(offset_ro_mv: f32, slope_mv_per_n: f32) -> Self {
        Self {
            offset_ro_mv,
            slope_mv_per_n,
        }
    }

    /// Force in newtons, never negative. A non-positive slope reads as zero force.
    pub fn to_newtons(&self, millivolts: f32) -> f32 {
        if self.slope_mv_per_n <= 0.0 {
            return 0.0;
        }
        ((millivolts - self.offset_ro_mv) / self.slope_mv_per_n).max(0.0)
    }
}

/// N pads, one multiplexer channel and calibration pair each.
#[derive(Copy, Clone, Debug)]
pub struct PressurePads<const N: usize> {
    channels: [u8; N],
    calibration: [PadCalibration; N],
    samples: u8,
}

impl<const N: usize> PressurePads<N> {
    pub const fn new(channels: [u8; N], calibration: [PadCalibration; N], samples: u8) -> Self {
        Self {
            channels,
            calibration,
            samples,
        }
    }

    #[inline]
    pub fn channels(&self) -> &[u8; N] {
        &self.channels
    }

    /// Averaged millivolt reading of every pad, in pad order.
    pub fn read_all_mv<S, A, D>(&self, mux: &mut Multiplexer<S, A, D>) -> Result<[u16; N], MuxError>
    where
        S: OutputPin,
        A: AdcRead,
        D: DelayNs,
    {
        let mut out = [0u16; N];
        for (mv, &ch) in out.iter_mut().zip(self.channels.iter()) {
            *mv = mux.read_millivolts_averaged(ch, self.samples)?;
        }
        Ok(out)
    }

    /// Convert raw pad millivolts into the active control units.
    pub fn to_units(&self, millivolts: &[u16; N], units: ControlUnits) -> [f32; N] {
        core::array::from_fn(|i| {
            let mv = millivolts[i] as f32;
            match units {
                ControlUnits::Millivolts => mv,
                ControlUnits::Newtons => self.calibration[i].to_newtons(mv),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::mux::tests::ScriptedAdc;
    use crate::motors::hbridge::tests::FakePin;
    use crate::sync::tests::CountingDelay;
    use core::cell::Cell;

    #[test]
    fn calibration_clamps_at_zero() {
        let cal = PadCalibration::new(120.0, 80.0);
        assert_eq!(cal.to_newtons(120.0), 0.0);
        assert_eq!(cal.to_newtons(40.0), 0.0);
        assert_eq!(cal.to_newtons(280.0), 2.0);
        assert_eq!(PadCalibration::new(0.0, 0.0).to_newtons(500.0), 0.0);
    }

    #[test]
    fn read_all_visits_each_pad_channel() {
        let cells: [Cell<bool>; 4] = Default::default();
        let pins = [
            FakePin(&cells[0]),
            FakePin(&cells[1]),
            FakePin(&cells[2]),
            FakePin(&cells[3]),
        ];
        let mut mux = Multiplexer::new(pins, ScriptedAdc::new(&[4095]), 3, CountingDelay::default());
        let pads = PressurePads::new([1, 2, 3, 6], [PadCalibration::new(120.0, 80.0); 4], 8);

        let mv = pads.read_all_mv(&mut mux).unwrap();
        assert_eq!(mv, [3300; 4]);
        assert_eq!(mux.last_selected(), Some(6));

        let n = pads.to_units(&mv, ControlUnits::Newtons);
        assert_eq!(n, [39.75; 4]);
        let raw = pads.to_units(&mv, ControlUnits::Millivolts);
        assert_eq!(raw, [3300.0; 4]);
    }
}
