// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Sweep parameters that the host may retune while running.
//!
//! The whole struct lives behind one [`TimedMutex`] so that the sweep scheduler always sees a
//! consistent min/max pair, never a new min with a stale max.

use crate::config;
use crate::sync::TimedMutex;

/// Runtime-mutable sweep configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub sweep_enabled: bool,
    pub min_angle: u16,
    pub max_angle: u16,
    pub step: u16,
    pub settle_ms: u32,
    pub reading_delay_ms: u32,
    /// Servo angle held while `sweep_enabled` is false.
    pub manual_angle: u16,
}

impl RuntimeConfig {
    /// Startup values taken from the build-time constants.
    pub const fn from_build() -> Self {
        Self {
            sweep_enabled: true,
            min_angle: config::SERVO_MIN_ANGLE,
            max_angle: config::SERVO_MAX_ANGLE,
            step: config::SERVO_STEP,
            settle_ms: config::SERVO_SETTLE_MS,
            reading_delay_ms: config::SERVO_READING_DELAY_MS,
            manual_angle: config::SERVO_MANUAL_ANGLE,
        }
    }

    /// Clamp `angle` into the configured sweep bounds.
    #[inline]
    pub fn clamp_angle(&self, angle: i32) -> u16 {
        angle.clamp(self.min_angle as i32, self.max_angle as i32) as u16
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_build()
    }
}

/// Runtime configuration shared between the command interface and the sweep scheduler.
pub type SharedConfig = TimedMutex<RuntimeConfig>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_values_come_from_build_constants() {
        let cfg = RuntimeConfig::default();
        assert!(cfg.sweep_enabled);
        assert_eq!(cfg.min_angle, config::SERVO_MIN_ANGLE);
        assert_eq!(cfg.max_angle, config::SERVO_MAX_ANGLE);
        assert_eq!(cfg.step, config::SERVO_STEP);
        assert_eq!(cfg.manual_angle, config::SERVO_MANUAL_ANGLE);
    }

    #[test]
    fn clamp_angle_respects_bounds() {
        let cfg = RuntimeConfig {
            min_angle: 10,
            max_angle: 100,
            ..RuntimeConfig::default()
        };
        assert_eq!(cfg.clamp_angle(-4), 10);
        assert_eq!(cfg.clamp_angle(50), 50);
        assert_eq!(cfg.clamp_angle(104), 100);
    }
}
