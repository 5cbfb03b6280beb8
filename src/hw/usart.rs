// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART abstraction layer.
//!
//! Three links are in use:
//!
//! | USART | Role | Direction |
//! | ----- | ---- | --------- |
//! | USART1 | debug log text | TX only, drained by the logger |
//! | USART2 | TOF distance sensor frames | RX only, interrupt driven |
//! | USART3 | host link: telemetry frames out, command lines in | TX blocking, RX interrupt driven |
//!
//! Reception never depends on the main loop keeping up: each receiving link has an [`RxRing`]
//! filled from its USART interrupt, and the main loop drains it.
//!
//! To access the host link on the host machine, connect to the ST-LINK USB port and use
//! ```text
//! $ screen /dev/tty.usbmodem* 115200
//! ```

use core::cell::RefCell;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::interrupt::{self, Mutex};
use nb::block;
use stm32f7xx_hal::{
    prelude::*,
    serial::{Instance, Rx, Tx},
};

use crate::protocol::ByteSink;
use crate::sync::ByteQueue;

/// Transmit half with blocking writes.
pub struct UsartTx<U: Instance> {
    tx: Tx<U>,
}

impl<U: Instance> UsartTx<U> {
    pub fn new(tx: Tx<U>) -> Self {
        Self { tx }
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        let _ = block!(self.tx.write(b));
    }

    pub fn write_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            self.write_byte(b);
        }
    }

    /// Block until the hardware TX FIFO/drain is flushed.
    #[inline]
    pub fn flush(&mut self) {
        let _ = block!(self.tx.flush());
    }
}

impl<U: Instance> ByteSink for UsartTx<U> {
    fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write_byte(b);
        }
    }
}

impl<U: Instance> fmt::Write for UsartTx<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        UsartTx::write_str(self, s);
        Ok(())
    }
}

/// Receive queue shared between a USART interrupt and the main loop.
///
/// ```ignore
/// static TOF_RX: RxRing<pac::USART2, 256> = RxRing::new();
///
/// #[interrupt]
/// fn USART2() {
///     TOF_RX.on_interrupt();
/// }
/// ```
pub struct RxRing<U: Instance, const CAP: usize> {
    rx: Mutex<RefCell<Option<Rx<U>>>>,
    bytes: ByteQueue<CAP>,
    errors: AtomicU32,
}

impl<U: Instance, const CAP: usize> RxRing<U, CAP> {
    pub const fn new() -> Self {
        Self {
            rx: Mutex::new(RefCell::new(None)),
            bytes: ByteQueue::new(),
            errors: AtomicU32::new(0),
        }
    }

    /// Hand over the receiver. Call before unmasking the interrupt.
    pub fn attach(&self, rx: Rx<U>) {
        interrupt::free(|cs| self.rx.borrow(cs).replace(Some(rx)));
    }

    /// Move everything the receiver holds into the queue. Call from the USART interrupt.
    pub fn on_interrupt(&self) {
        interrupt::free(|cs| {
            let mut rx = self.rx.borrow(cs).borrow_mut();
            let Some(rx) = rx.as_mut() else {
                return;
            };
            loop {
                match rx.read() {
                    Ok(b) => {
                        self.bytes.push(b);
                    }
                    Err(nb::Error::WouldBlock) => break,
                    Err(nb::Error::Other(_)) => {
                        self.errors.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        });
    }

    /// Copy queued bytes into `buf`. Returns the byte count.
    #[inline]
    pub fn drain(&self, buf: &mut [u8]) -> usize {
        self.bytes.drain(buf)
    }

    /// `(line errors, bytes dropped on a full queue)` since start.
    pub fn error_counts(&self) -> (u32, u32) {
        (self.errors.load(Ordering::Relaxed), self.bytes.dropped())
    }
}
