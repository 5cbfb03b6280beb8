// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Lock-free and bounded-wait primitives shared by the control and I/O contexts.
//!
//! - [`AtomicF32`] - word-sized float cell for single-writer telemetry values.
//! - [`TimedMutex`] - critical-section mutex with try-lock and a bounded wait; never blocks
//!   indefinitely.
//! - [`ByteQueue`] - bounded byte FIFO between an interrupt and the main loop.

use core::cell::RefCell;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embedded_hal::delay::DelayNs;
use heapless::Deque;

/// Poll interval while waiting for a contended lock.
pub const LOCK_POLL_US: u32 = 100;

/// `f32` stored in an `AtomicU32`.
///
/// Loads and stores are single word accesses, so a reader never observes a torn value.
pub struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    pub const fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl fmt::Debug for AtomicF32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.load())
    }
}

/// Returned when a [`TimedMutex`] could not be taken within the allowed wait.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LockTimeout;

impl fmt::Display for LockTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("lock not acquired within timeout")
    }
}

/// Guard returned by [`TimedMutex`]; the lock is released on drop.
pub type TimedGuard<'a, T> = MutexGuard<'a, CriticalSectionRawMutex, T>;

/// Mutex that only offers non-blocking and bounded-wait acquisition.
///
/// There is no `lock()`: a caller either gets the value within its budget or
/// gets [`LockTimeout`] back and decides what to report.
pub struct TimedMutex<T> {
    inner: Mutex<CriticalSectionRawMutex, T>,
}

impl<T> TimedMutex<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Take the lock if it is free right now.
    pub fn try_lock(&self) -> Option<TimedGuard<'_, T>> {
        self.inner.try_lock().ok()
    }

    /// Take the lock, polling every [`LOCK_POLL_US`] for at most `timeout_ms`.
    pub fn lock_within<D: DelayNs>(
        &self,
        timeout_ms: u32,
        delay: &mut D,
    ) -> Result<TimedGuard<'_, T>, LockTimeout> {
        let budget_us = timeout_ms.saturating_mul(1000);
        let mut waited_us = 0u32;

        loop {
            if let Some(guard) = self.try_lock() {
                return Ok(guard);
            }
            if waited_us >= budget_us {
                return Err(LockTimeout);
            }
            delay.delay_us(LOCK_POLL_US);
            waited_us += LOCK_POLL_US;
        }
    }
}

impl<T: Copy> TimedMutex<T> {
    /// Copy the protected value out without waiting.
    pub fn try_snapshot(&self) -> Option<T> {
        self.try_lock().map(|guard| *guard)
    }
}

struct QueueState<const CAP: usize> {
    bytes: Deque<u8, CAP>,
    dropped: u32,
}

/// Bounded byte FIFO shared between a producer and a consumer context.
///
/// Every operation holds the critical section only while bytes are copied; nothing in here
/// waits on a peripheral. A full queue refuses input and counts what it refused.
pub struct ByteQueue<const CAP: usize> {
    inner: BlockingMutex<CriticalSectionRawMutex, RefCell<QueueState<CAP>>>,
}

impl<const CAP: usize> ByteQueue<CAP> {
    pub const fn new() -> Self {
        Self {
            inner: BlockingMutex::new(RefCell::new(QueueState {
                bytes: Deque::new(),
                dropped: 0,
            })),
        }
    }

    /// Append one byte. Returns `false` and counts a drop if the queue is full.
    pub fn push(&self, b: u8) -> bool {
        self.inner.lock(|cell| {
            let mut q = cell.borrow_mut();
            let ok = q.bytes.push_back(b).is_ok();
            if !ok {
                q.dropped = q.dropped.wrapping_add(1);
            }
            ok
        })
    }

    /// Append all `parts` back to back, or nothing if they do not fit together.
    pub fn push_all(&self, parts: &[&[u8]]) -> bool {
        let len: usize = parts.iter().map(|p| p.len()).sum();
        self.inner.lock(|cell| {
            let mut q = cell.borrow_mut();
            if q.bytes.capacity() - q.bytes.len() < len {
                q.dropped = q.dropped.wrapping_add(len as u32);
                return false;
            }
            for &b in parts.iter().flat_map(|p| p.iter()) {
                let _ = q.bytes.push_back(b);
            }
            true
        })
    }

    /// Move up to `buf.len()` bytes out in order. Returns the byte count.
    pub fn drain(&self, buf: &mut [u8]) -> usize {
        self.inner.lock(|cell| {
            let mut q = cell.borrow_mut();
            let mut n = 0;
            while n < buf.len() {
                match q.bytes.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            n
        })
    }

    /// Offer bytes to `accept` in order until it refuses one or the queue is empty. A refused
    /// byte stays at the front.
    pub fn send_while<F: FnMut(u8) -> bool>(&self, mut accept: F) -> usize {
        self.inner.lock(|cell| {
            let mut q = cell.borrow_mut();
            let mut sent = 0;
            while let Some(&b) = q.bytes.front() {
                if !accept(b) {
                    break;
                }
                q.bytes.pop_front();
                sent += 1;
            }
            sent
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().bytes.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes refused because the queue was full, since start.
    pub fn dropped(&self) -> u32 {
        self.inner.lock(|cell| cell.borrow().dropped)
    }
}

impl<const CAP: usize> Default for ByteQueue<CAP> {
    fn default() -> Self {
        Self::new()
    }
}
