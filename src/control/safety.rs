// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Distance-driven setpoints and the per-motor out-of-range state machine.
//!
//! Each motor looks at the finalized minimum distance of its own sector:
//!
//! | Range | Distance (cm) | Setpoint |
//! | ----- | ------------- | -------- |
//! | `Close` | [50, 100) | fixed, highest |
//! | `Medium` | [100, 200) | fixed |
//! | `Far` | [200, 300] | pressure on entering `Far` + security offset |
//! | `OutOfBounds` | anything else | none: back off |
//! | `Unknown` | no target / invalid | none: hold |
//!
//! ```text
//! Tracking --OutOfBounds--> Reversing --REVERSE_TIME_MS--> Waiting --valid range--> Tracking
//! Tracking --Unknown------------------------------------> Waiting
//! ```

use crate::config;
use crate::motors::Drive;
use crate::shared::NO_TARGET_CM;

use super::ControlUnits;

/// Classification of one sector's minimum distance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DistanceRange {
    Unknown,
    Close,
    Medium,
    Far,
    OutOfBounds,
}

impl DistanceRange {
    pub fn classify(distance_cm: f32) -> Self {
        if !distance_cm.is_finite() || distance_cm < 0.0 || distance_cm >= NO_TARGET_CM {
            return DistanceRange::Unknown;
        }
        let (close_min, medium_min) = config::CLOSE_RANGE_CM;
        let (far_min, far_max) = config::FAR_RANGE_CM;
        if (far_min..=far_max).contains(&distance_cm) {
            DistanceRange::Far
        } else if (medium_min..far_min).contains(&distance_cm) {
            DistanceRange::Medium
        } else if (close_min..medium_min).contains(&distance_cm) {
            DistanceRange::Close
        } else {
            DistanceRange::OutOfBounds
        }
    }

    /// Whether a setpoint exists for this range.
    #[inline]
    pub fn is_trackable(self) -> bool {
        matches!(
            self,
            DistanceRange::Close | DistanceRange::Medium | DistanceRange::Far
        )
    }
}

/// Setpoints per range, in the active control units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SetpointTable {
    /// Added to the captured baseline in `Far`.
    pub security_offset: f32,
    pub medium: f32,
    pub close: f32,
}

impl SetpointTable {
    pub const fn new(security_offset: f32, medium: f32, close: f32) -> Self {
        Self {
            security_offset,
            medium,
            close,
        }
    }

    pub const fn for_units(units: ControlUnits) -> Self {
        match units {
            ControlUnits::Newtons => config::SETPOINTS_NEWTONS,
            ControlUnits::Millivolts => config::SETPOINTS_MILLIVOLTS,
        }
    }

    /// Setpoint for `range`, `None` when the range has none.
    pub fn setpoint(&self, range: DistanceRange, far_baseline: f32) -> Option<f32> {
        match range {
            DistanceRange::Far => Some(far_baseline + self.security_offset),
            DistanceRange::Medium => Some(self.medium),
            DistanceRange::Close => Some(self.close),
            DistanceRange::Unknown | DistanceRange::OutOfBounds => None,
        }
    }
}

/// Per-motor safety state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SafetyState {
    Tracking,
    /// Backing off since the given time (ms).
    Reversing { since_ms: u32 },
    Waiting,
}

/// What the control tick does with one channel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Directive {
    /// Closed loop on this setpoint.
    Track(f32),
    /// Open loop: apply this drive and keep the integrator cleared.
    Hold(Drive),
}

impl Directive {
    /// Setpoint reported in telemetry (zero while holding).
    #[inline]
    pub fn setpoint(self) -> f32 {
        match self {
            Directive::Track(sp) => sp,
            Directive::Hold(_) => 0.0,
        }
    }
}

/// Turns sector distances into per-motor directives.
#[derive(Clone, Debug)]
pub struct Supervisor<const N: usize> {
    table: SetpointTable,
    states: [SafetyState; N],
    ranges: [DistanceRange; N],
    baselines: [f32; N],
    reverse_duty: f32,
    reverse_ms: u32,
}

impl<const N: usize> Supervisor<N> {
    pub fn new(table: SetpointTable) -> Self {
        Self {
            table,
            states: [SafetyState::Tracking; N],
            ranges: [DistanceRange::Unknown; N],
            baselines: [0.0; N],
            reverse_duty: config::REVERSE_DUTY_PCT,
            reverse_ms: config::REVERSE_TIME_MS,
        }
    }

    #[inline]
    pub fn state(&self, channel: usize) -> SafetyState {
        self.states[channel]
    }

    #[inline]
    pub fn range(&self, channel: usize) -> DistanceRange {
        self.ranges[channel]
    }

    /// Advance every channel's state machine for one control tick.
    ///
    /// `readings` are the pad readings of this tick, in the units of the table.
    pub fn update(
        &mut self,
        now_ms: u32,
        distances_cm: &[f32; N],
        readings: &[f32; N],
    ) -> [Directive; N] {
        core::array::from_fn(|i| self.update_channel(i, now_ms, distances_cm[i], readings[i]))
    }

    fn update_channel(&mut self, i: usize, now_ms: u32, distance_cm: f32, reading: f32) -> Directive {
        let range = DistanceRange::classify(distance_cm);
        if range == DistanceRange::Far && self.ranges[i] != DistanceRange::Far {
            self.baselines[i] = reading;
        }
        self.ranges[i] = range;

        let setpoint = self.table.setpoint(range, self.baselines[i]);

        match self.states[i] {
            SafetyState::Tracking => match setpoint {
                Some(sp) if sp >= 0.0 => Directive::Track(sp),
                _ if range == DistanceRange::Unknown => {
                    log::info!("motor {}: no target, holding", i);
                    self.states[i] = SafetyState::Waiting;
                    Directive::Hold(Drive::Brake)
                }
                _ => {
                    log::warn!("motor {}: out of range at {} cm, reversing", i, distance_cm);
                    self.states[i] = SafetyState::Reversing { since_ms: now_ms };
                    Directive::Hold(Drive::Reverse(self.reverse_duty))
                }
            },
            SafetyState::Reversing { since_ms } => {
                if now_ms.wrapping_sub(since_ms) >= self.reverse_ms {
                    self.states[i] = SafetyState::Waiting;
                    Directive::Hold(Drive::Brake)
                } else {
                    Directive::Hold(Drive::Reverse(self.reverse_duty))
                }
            }
            SafetyState::Waiting => match setpoint {
                Some(sp) if range.is_trackable() && sp > 0.0 => {
                    log::info!("motor {}: target back in range, tracking", i);
                    self.states[i] = SafetyState::Tracking;
                    Directive::Track(sp)
                }
                _ => Directive::Hold(Drive::Brake),
            },
        }
    }
}
