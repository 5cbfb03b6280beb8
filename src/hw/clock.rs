// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Time base: a 1 kHz SysTick millisecond counter, busy-wait delays and DWT cycle timing.
//!
//! The SysTick exception handler lives in the binary and calls [`tick`].

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::peripheral::{syst::SystClkSource, DWT, SYST};
use embedded_hal::delay::DelayNs;

static MILLIS: AtomicU32 = AtomicU32::new(0);

/// Start SysTick at 1 kHz from the core clock.
pub fn start_systick(syst: &mut SYST, sysclk_hz: u32) {
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(sysclk_hz / 1000 - 1);
    syst.clear_current();
    syst.enable_counter();
    syst.enable_interrupt();
}

/// Advance the millisecond counter. Returns the new value.
#[inline]
pub fn tick() -> u32 {
    MILLIS.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
}

/// Milliseconds since [`start_systick`], wrapping after ~49 days.
#[inline]
pub fn millis() -> u32 {
    MILLIS.load(Ordering::Relaxed)
}

/// Busy-wait delay calibrated to the core clock.
#[derive(Copy, Clone, Debug)]
pub struct CycleDelay {
    cycles_per_us: u32,
}

impl CycleDelay {
    pub fn new(sysclk_hz: u32) -> Self {
        Self {
            cycles_per_us: (sysclk_hz / 1_000_000).max(1),
        }
    }
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (ns as u64 * self.cycles_per_us as u64 / 1000) as u32;
        cortex_m::asm::delay(cycles.max(1));
    }
}

/// Measures durations with the DWT cycle counter. Requires the counter to be enabled.
#[derive(Copy, Clone, Debug)]
pub struct CycleTimer {
    cycles_per_us: u32,
}

impl CycleTimer {
    pub fn new(sysclk_hz: u32) -> Self {
        Self {
            cycles_per_us: (sysclk_hz / 1_000_000).max(1),
        }
    }

    #[inline]
    pub fn now(&self) -> u32 {
        DWT::cycle_count()
    }

    #[inline]
    pub fn elapsed_us(&self, since: u32) -> u32 {
        DWT::cycle_count().wrapping_sub(since) / self.cycles_per_us
    }
}
