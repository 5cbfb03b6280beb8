// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Control tick overrun detection.
//!
//! A tick that runs longer than its period is logged and counted, and the following tick is
//! skipped so the loop re-aligns to the next period boundary instead of running back-to-back.

/// Tracks tick durations against the control period.
#[derive(Debug)]
pub struct TickMonitor {
    period_us: u32,
    overruns: u32,
    skip_next: bool,
}

impl TickMonitor {
    pub const fn new(period_us: u32) -> Self {
        Self {
            period_us,
            overruns: 0,
            skip_next: false,
        }
    }

    /// Whether this tick should run. Consumes a pending skip.
    pub fn begin(&mut self) -> bool {
        if self.skip_next {
            self.skip_next = false;
            return false;
        }
        true
    }

    /// Record how long the tick took. Returns `true` on overrun.
    pub fn finish(&mut self, elapsed_us: u32) -> bool {
        if elapsed_us <= self.period_us {
            return false;
        }
        self.overruns = self.overruns.wrapping_add(1);
        self.skip_next = true;
        log::warn!(
            "control tick overran: {} us > {} us ({} total)",
            elapsed_us,
            self.period_us,
            self.overruns
        );
        true
    }

    #[inline]
    pub fn overruns(&self) -> u32 {
        self.overruns
    }
}
