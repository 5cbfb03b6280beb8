// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Fixed-rate PI engine for N independent pressure channels.
//!
//! Per channel and tick:
//!
//! ```text
//! e   = setpoint - reading
//! I  += e * dt,             clamped to ±DUTY_MAX / max(Ki, KI_FLOOR)
//! u   = Kp * e + Ki * I,    clamped to ±DUTY_MAX
//! |u| < MIN_RUN  =>  u = 0  (brake)
//! ```
//!
//! Works in `no_std` and does not allocate memory.

#[cfg(not(test))]
use micromath::F32Ext;

use crate::motors::{Drive, MotorBank};

/// Largest duty magnitude (%).
pub const DUTY_MAX: f32 = 100.0;
/// Smallest duty magnitude that overcomes static friction (%).
pub const MIN_RUN: f32 = 40.0;
/// Lower bound on Ki used when sizing the integrator clamp.
pub const KI_FLOOR: f32 = 1e-4;
/// Tick period in seconds (50 Hz).
pub const DT: f32 = 1.0 / 50.0;

/// Units of the pad readings and setpoints fed to the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControlUnits {
    /// Calibrated force.
    Newtons,
    /// Raw pad voltage.
    Millivolts,
}

impl ControlUnits {
    /// Tuned gain pair for these units.
    pub const fn default_gains(self) -> Gains {
        match self {
            ControlUnits::Newtons => Gains { kp: 12.0, ki: 48.0 },
            ControlUnits::Millivolts => Gains { kp: 0.15, ki: 0.60 },
        }
    }
}

/// Gains shared by every channel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Gains {
    pub kp: f32,
    pub ki: f32,
}

/// Zero any command whose magnitude is below `min_run`.
#[inline]
pub fn apply_deadband(duty: f32, min_run: f32) -> f32 {
    if duty.abs() < min_run {
        0.0
    } else {
        duty
    }
}

/// N PI loops sharing one gain pair.
#[derive(Clone, Debug)]
pub struct PiEngine<const N: usize> {
    gains: Gains,
    dt: f32,
    integrators: [f32; N],
    last_duty: [f32; N],
}

impl<const N: usize> PiEngine<N> {
    pub fn new(gains: Gains) -> Self {
        Self {
            gains,
            dt: DT,
            integrators: [0.0; N],
            last_duty: [0.0; N],
        }
    }

    /// Override the tick period (seconds).
    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    #[inline]
    pub fn gains(&self) -> Gains {
        self.gains
    }

    /// Replace the gains. Integrators are kept.
    pub fn set_gains(&mut self, gains: Gains) {
        self.gains = gains;
    }

    #[inline]
    pub fn integrator(&self, channel: usize) -> f32 {
        self.integrators[channel]
    }

    #[inline]
    pub fn last_duty(&self, channel: usize) -> f32 {
        self.last_duty[channel]
    }

    /// Integrator bound: the accumulation that alone would saturate the output.
    #[inline]
    pub fn integrator_limit(&self) -> f32 {
        DUTY_MAX / self.gains.ki.max(KI_FLOOR)
    }

    /// Zero every integrator and the reported duties.
    pub fn reset(&mut self) {
        self.integrators = [0.0; N];
        self.last_duty = [0.0; N];
    }

    /// Advance one channel by one tick and return its duty command. Does not actuate.
    pub fn step_channel(&mut self, channel: usize, setpoint: f32, reading: f32) -> f32 {
        let error = setpoint - reading;
        let limit = self.integrator_limit();

        let integral = (self.integrators[channel] + error * self.dt).clamp(-limit, limit);
        self.integrators[channel] = integral;

        let raw = (self.gains.kp * error + self.gains.ki * integral).clamp(-DUTY_MAX, DUTY_MAX);
        let duty = apply_deadband(raw, MIN_RUN);

        self.last_duty[channel] = duty;
        duty
    }

    /// Take a channel out of closed loop for this tick.
    ///
    /// The integrator is held at zero so the loop restarts clean when tracking resumes.
    pub fn hold_channel(&mut self, channel: usize, drive: Drive) -> f32 {
        self.integrators[channel] = 0.0;
        let duty = drive.signed_duty();
        self.last_duty[channel] = duty;
        duty
    }

    /// Advance every channel by one tick and drive the motors with the result.
    pub fn step<M: MotorBank>(
        &mut self,
        setpoints: &[f32; N],
        readings: &[f32; N],
        motors: &mut M,
    ) -> [f32; N] {
        let mut duties = [0.0; N];
        for (i, duty) in duties.iter_mut().enumerate() {
            *duty = self.step_channel(i, setpoints[i], readings[i]);
            motors.drive(i, Drive::from_duty(*duty));
        }
        duties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motors::tests::RecordingBank;

    #[test]
    fn large_error_saturates_integrator_and_duty() {
        let gains = ControlUnits::Newtons.default_gains();
        let mut pi = PiEngine::<1>::new(gains);
        let mut bank = RecordingBank::<1>::new();

        for _ in 0..500 {
            pi.step(&[50.0], &[0.0], &mut bank);
        }

        assert_eq!(pi.integrator(0), DUTY_MAX / gains.ki);
        assert_eq!(pi.last_duty(0), DUTY_MAX);
        assert_eq!(bank.last[0], Drive::Forward(DUTY_MAX));
    }

    #[test]
    fn negative_saturation_is_symmetric() {
        let mut pi = PiEngine::<1>::new(ControlUnits::Millivolts.default_gains());
        for _ in 0..2000 {
            pi.step_channel(0, 0.0, 5000.0);
        }
        assert_eq!(pi.integrator(0), -pi.integrator_limit());
        assert_eq!(pi.last_duty(0), -DUTY_MAX);
    }

    #[test]
    fn sub_threshold_output_brakes() {
        // Kp only, so the output is exactly Kp * e.
        let mut pi = PiEngine::<2>::new(Gains { kp: 1.0, ki: 0.0 });
        let mut bank = RecordingBank::<2>::new();

        for e in [0.5_f32, 10.0, 39.9] {
            let duties = pi.step(&[e, -e], &[0.0, 0.0], &mut bank);
            assert_eq!(duties, [0.0, 0.0]);
            assert_eq!(bank.last, [Drive::Brake, Drive::Brake]);
            pi.reset();
        }

        let duties = pi.step(&[40.0, -40.0], &[0.0, 0.0], &mut bank);
        assert_eq!(duties, [40.0, -40.0]);
        assert_eq!(bank.last, [Drive::Forward(40.0), Drive::Reverse(40.0)]);
    }

    #[test]
    fn zero_error_stays_braked() {
        let mut pi = PiEngine::<4>::new(ControlUnits::Newtons.default_gains());
        let mut bank = RecordingBank::<4>::new();
        for _ in 0..100 {
            let duties = pi.step(&[100.0; 4], &[100.0; 4], &mut bank);
            assert_eq!(duties, [0.0; 4]);
        }
        for i in 0..4 {
            assert_eq!(pi.integrator(i), 0.0);
        }
        assert_eq!(bank.last, [Drive::Brake; 4]);
    }

    #[test]
    fn channels_are_independent() {
        let mut pi = PiEngine::<2>::new(ControlUnits::Newtons.default_gains());
        pi.step_channel(0, 10.0, 0.0);
        assert!(pi.integrator(0) > 0.0);
        assert_eq!(pi.integrator(1), 0.0);
        assert_eq!(pi.last_duty(1), 0.0);
    }

    #[test]
    fn hold_clears_integrator_and_reports_override_duty() {
        let mut pi = PiEngine::<1>::new(ControlUnits::Newtons.default_gains());
        pi.step_channel(0, 10.0, 0.0);
        let duty = pi.hold_channel(0, Drive::Reverse(60.0));
        assert_eq!(duty, -60.0);
        assert_eq!(pi.integrator(0), 0.0);
        assert_eq!(pi.last_duty(0), -60.0);
    }

    #[test]
    fn reset_clears_integrators_and_reported_duty() {
        let mut pi = PiEngine::<2>::new(ControlUnits::Newtons.default_gains());
        for _ in 0..50 {
            pi.step_channel(0, 10.0, 0.0);
            pi.step_channel(1, 0.0, 10.0);
        }
        assert!(pi.last_duty(0) > 0.0);
        assert!(pi.last_duty(1) < 0.0);

        pi.reset();
        for ch in 0..2 {
            assert_eq!(pi.integrator(ch), 0.0);
            assert_eq!(pi.last_duty(ch), 0.0);
        }
    }

    #[test]
    fn gains_are_replaceable() {
        let mut pi = PiEngine::<1>::new(ControlUnits::Newtons.default_gains());
        pi.set_gains(Gains { kp: 1.0, ki: 2.0 });
        assert_eq!(pi.gains(), Gains { kp: 1.0, ki: 2.0 });
        assert_eq!(pi.integrator_limit(), 50.0);
    }
}
