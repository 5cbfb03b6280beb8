// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! State shared between the control and I/O contexts.
//!
//! Every field has exactly one writer:
//!
//! | Group | Writer | Readers |
//! | ----- | ------ | ------- |
//! | [`ControlOutputs`] | control tick | telemetry |
//! | [`SweepOutputs`] | sweep scheduler | control tick, telemetry |
//! | [`ControlRequests`] | command interface | control tick |
//!
//! Values are word-sized atomics, so readers see either the old or the new value of a field,
//! never a mix. Readers may see fields from two different ticks; that staleness is accepted for
//! monitoring.

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};

use crate::sync::AtomicF32;

/// Distance published for a sector that got no valid reading during its pass (cm).
pub const NO_TARGET_CM: f32 = 999.0;

/// Latest per-motor values produced by the control tick.
#[derive(Debug)]
pub struct ControlOutputs<const N: usize> {
    pub setpoints: [AtomicF32; N],
    /// Pad readings in the active control units.
    pub pressures: [AtomicF32; N],
    pub duties: [AtomicF32; N],
    /// Ticks that overran their period since boot.
    pub overruns: AtomicU32,
}

impl<const N: usize> ControlOutputs<N> {
    pub const fn new() -> Self {
        Self {
            setpoints: [const { AtomicF32::new(0.0) }; N],
            pressures: [const { AtomicF32::new(0.0) }; N],
            duties: [const { AtomicF32::new(0.0) }; N],
            overruns: AtomicU32::new(0),
        }
    }

    pub fn publish(&self, setpoints: &[f32; N], pressures: &[f32; N], duties: &[f32; N]) {
        for i in 0..N {
            self.setpoints[i].store(setpoints[i]);
            self.pressures[i].store(pressures[i]);
            self.duties[i].store(duties[i]);
        }
    }

    pub fn setpoints(&self) -> [f32; N] {
        core::array::from_fn(|i| self.setpoints[i].load())
    }

    pub fn pressures(&self) -> [f32; N] {
        core::array::from_fn(|i| self.pressures[i].load())
    }

    pub fn duties(&self) -> [f32; N] {
        core::array::from_fn(|i| self.duties[i].load())
    }
}

impl<const N: usize> Default for ControlOutputs<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Finalized sector minima and the live reading produced by the sweep scheduler.
#[derive(Debug)]
pub struct SweepOutputs<const N: usize> {
    pub sector_min_cm: [AtomicF32; N],
    /// Latest reading at the current servo angle, [`NO_TARGET_CM`] when it was invalid.
    pub live_cm: AtomicF32,
    pub angle: AtomicU16,
}

impl<const N: usize> SweepOutputs<N> {
    pub const fn new() -> Self {
        Self {
            sector_min_cm: [const { AtomicF32::new(NO_TARGET_CM) }; N],
            live_cm: AtomicF32::new(NO_TARGET_CM),
            angle: AtomicU16::new(0),
        }
    }

    /// Commit the finalized minimum of one sector.
    #[inline]
    pub fn publish_sector(&self, sector: usize, min_cm: f32) {
        self.sector_min_cm[sector].store(min_cm);
    }

    #[inline]
    pub fn publish_live(&self, angle: u16, distance_cm: f32) {
        self.angle.store(angle, Ordering::Relaxed);
        self.live_cm.store(distance_cm);
    }

    pub fn sector_minima(&self) -> [f32; N] {
        core::array::from_fn(|i| self.sector_min_cm[i].load())
    }

    #[inline]
    pub fn live(&self) -> f32 {
        self.live_cm.load()
    }

    #[inline]
    pub fn angle(&self) -> u16 {
        self.angle.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for SweepOutputs<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot requests posted by the command interface for the control tick.
#[derive(Debug, Default)]
pub struct ControlRequests {
    reset_integrators: AtomicBool,
}

impl ControlRequests {
    pub const fn new() -> Self {
        Self {
            reset_integrators: AtomicBool::new(false),
        }
    }

    pub fn request_reset(&self) {
        self.reset_integrators.store(true, Ordering::Release);
    }

    /// Consume a pending reset request.
    pub fn take_reset(&self) -> bool {
        self.reset_integrators.swap(false, Ordering::Acquire)
    }
}

/// Everything both contexts touch, gathered for a single `static`.
#[derive(Debug)]
pub struct SharedState<const N: usize> {
    pub control: ControlOutputs<N>,
    pub sweep: SweepOutputs<N>,
    pub requests: ControlRequests,
}

impl<const N: usize> SharedState<N> {
    pub const fn new() -> Self {
        Self {
            control: ControlOutputs::new(),
            sweep: SweepOutputs::new(),
            requests: ControlRequests::new(),
        }
    }
}

impl<const N: usize> Default for SharedState<N> {
    fn default() -> Self {
        Self::new()
    }
}
