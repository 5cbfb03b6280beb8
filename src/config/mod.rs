// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Build-Time Configuration
//!
//! Fixed deployment constants for the rig. Variants are picked with Cargo features:
//!
//! | Feature | Effect |
//! | ------- | ------ |
//! | `five-motors` | 5 motor channels instead of 4 |
//! | `millivolts` | control on raw pad millivolts instead of calibrated newtons |
//! | `forward-sweep` | forward-only sweep instead of bidirectional |
//! | `telemetry-10hz` / `telemetry-25hz` / `telemetry-100hz` | telemetry rate (default 50 Hz) |
//!
//! The selected variants are collected in [`PROFILE`], read once at startup.
//!
//! ## Modules
//!
//! - [`runtime`] - Sweep parameters that the host may retune while running.

pub mod runtime;

pub use runtime::{RuntimeConfig, SharedConfig};

use crate::control::safety::SetpointTable;
use crate::control::ControlUnits;
use crate::drivers::pressure::PadCalibration;
use crate::protocol::telemetry::TelemetryRate;
use crate::sweep::sector::{check_coverage, Sector};
use crate::sweep::SweepMode;

#[cfg(any(
    all(feature = "telemetry-10hz", feature = "telemetry-25hz"),
    all(feature = "telemetry-10hz", feature = "telemetry-100hz"),
    all(feature = "telemetry-25hz", feature = "telemetry-100hz"),
))]
compile_error!("select at most one telemetry-* rate feature");

// ----- Motors -----

#[cfg(not(feature = "five-motors"))]
pub const NUM_MOTORS: usize = 4;
#[cfg(feature = "five-motors")]
pub const NUM_MOTORS: usize = 5;

/// H-bridge PWM carrier frequency.
pub const PWM_FREQ_HZ: u32 = 20_000;
/// H-bridge PWM resolution (10 bit: 0..=1023).
pub const PWM_RES_BITS: u8 = 10;

// ----- Control loop -----

pub const CONTROL_RATE_HZ: u32 = 50;
pub const CONTROL_PERIOD_MS: u32 = 1000 / CONTROL_RATE_HZ;

/// Reverse duty applied while backing off from an out-of-range target (%).
pub const REVERSE_DUTY_PCT: f32 = 60.0;
/// How long a channel reverses before waiting for a valid reading again.
pub const REVERSE_TIME_MS: u32 = 1300;

// ----- Distance ranges / setpoints -----

/// `Close` band [min, max) in cm; its max is where `Medium` starts.
pub const CLOSE_RANGE_CM: (f32, f32) = (50.0, 100.0);
/// `Far` band [min, max] in cm; its min is where `Medium` ends.
pub const FAR_RANGE_CM: (f32, f32) = (200.0, 300.0);

/// Security offset, medium and close setpoints (N).
pub const SETPOINTS_NEWTONS: SetpointTable = SetpointTable::new(0.5, 2.0, 4.0);
/// Security offset, medium and close setpoints (mV).
pub const SETPOINTS_MILLIVOLTS: SetpointTable = SetpointTable::new(40.0, 160.0, 320.0);

// ----- Multiplexer / pressure pads -----

/// Settle time after switching the multiplexer channel.
pub const MUX_SETTLE_US: u32 = 100;
/// Gap between consecutive ADC samples on the same channel.
pub const MUX_SAMPLE_GAP_US: u32 = 50;
/// ADC channel wired to the multiplexer signal pin.
pub const MUX_SIG_ADC_CHANNEL: u8 = 3;
/// Samples averaged per pad reading.
pub const PAD_SAMPLES: u8 = 8;

#[cfg(not(feature = "five-motors"))]
pub const PAD_CHANNELS: [u8; NUM_MOTORS] = [1, 2, 3, 6];
#[cfg(feature = "five-motors")]
pub const PAD_CHANNELS: [u8; NUM_MOTORS] = [1, 2, 3, 6, 7];

/// Per-pad calibration pair (Ro offset in mV, S slope in mV/N).
pub const PAD_CALIBRATION: [PadCalibration; NUM_MOTORS] =
    [PadCalibration::new(120.0, 80.0); NUM_MOTORS];

// ----- Servo sweep -----

pub const SERVO_MIN_ANGLE: u16 = 5;
pub const SERVO_MAX_ANGLE: u16 = 175;
pub const SERVO_STEP: u16 = 5;
pub const SERVO_SETTLE_MS: u32 = 5;
pub const SERVO_READING_DELAY_MS: u32 = 5;
/// Angle held while the sweep is disabled, until the host commands another one.
pub const SERVO_MANUAL_ANGLE: u16 = 90;
/// Pause after the forward-only return move before the next pass starts.
pub const SERVO_RETURN_MS: u32 = 100;

#[cfg(not(feature = "five-motors"))]
pub const SECTORS: [Sector; NUM_MOTORS] = [
    Sector::new(5, 45),
    Sector::new(45, 90),
    Sector::new(90, 135),
    Sector::new(135, 175),
];
#[cfg(feature = "five-motors")]
pub const SECTORS: [Sector; NUM_MOTORS] = [
    Sector::new(5, 39),
    Sector::new(39, 73),
    Sector::new(73, 107),
    Sector::new(107, 141),
    Sector::new(141, 175),
];

const _: () = assert!(
    check_coverage(&SECTORS, SERVO_MIN_ANGLE, SERVO_MAX_ANGLE).is_ok(),
    "sector assignment must partition [SERVO_MIN_ANGLE, SERVO_MAX_ANGLE]"
);
const _: () = assert!(SERVO_STEP > 0, "SERVO_STEP must be > 0");
const _: () = assert!(SERVO_MAX_ANGLE <= 180, "servo range ends at 180 degrees");

// ----- Serial links -----

/// Host link (telemetry out, commands in).
pub const HOST_BAUD: u32 = 115_200;
/// Debug log output.
pub const DEBUG_BAUD: u32 = 115_200;
pub const TOF_BAUD: u32 = 921_600;

// ----- Command interface -----

pub const ANGLE_LIMIT: u16 = 180;
pub const STEP_RANGE: (u16, u16) = (1, 20);
pub const SETTLE_RANGE_MS: (u32, u32) = (1, 200);
pub const DELAY_RANGE_MS: (u32, u32) = (0, 200);
/// Bounded wait for the runtime configuration lock.
pub const CONFIG_LOCK_TIMEOUT_MS: u32 = 10;
/// Longest accepted command line, excluding the terminator.
pub const COMMAND_LINE_MAX: usize = 48;

// ----- Variant selection -----

/// Build variants resolved once at startup.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BuildProfile {
    pub units: ControlUnits,
    pub sweep_mode: SweepMode,
    pub telemetry_rate: TelemetryRate,
}

pub const PROFILE: BuildProfile = BuildProfile {
    units: if cfg!(feature = "millivolts") {
        ControlUnits::Millivolts
    } else {
        ControlUnits::Newtons
    },
    sweep_mode: if cfg!(feature = "forward-sweep") {
        SweepMode::Forward
    } else {
        SweepMode::Bidirectional
    },
    telemetry_rate: if cfg!(feature = "telemetry-10hz") {
        TelemetryRate::Hz10
    } else if cfg!(feature = "telemetry-25hz") {
        TelemetryRate::Hz25
    } else if cfg!(feature = "telemetry-100hz") {
        TelemetryRate::Hz100
    } else {
        TelemetryRate::Hz50
    },
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::SectorMap;

    #[test]
    fn static_sectors_cover_servo_range() {
        let map = SectorMap::new(SECTORS, SERVO_MIN_ANGLE, SERVO_MAX_ANGLE);
        assert!(map.is_ok());
    }

    #[test]
    fn default_profile_matches_features() {
        #[cfg(not(any(
            feature = "telemetry-10hz",
            feature = "telemetry-25hz",
            feature = "telemetry-100hz"
        )))]
        assert_eq!(PROFILE.telemetry_rate, TelemetryRate::Hz50);
        #[cfg(not(feature = "millivolts"))]
        assert_eq!(PROFILE.units, ControlUnits::Newtons);
        #[cfg(not(feature = "forward-sweep"))]
        assert_eq!(PROFILE.sweep_mode, SweepMode::Bidirectional);
    }
}
