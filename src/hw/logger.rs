// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! `log` backend writing one text line per record to the debug USART.
//!
//! Records may come from the main loop and from the control exception. A record is formatted
//! outside any critical section and only its bytes are queued; [`drain`] then feeds the
//! transmitter from the main loop without waiting on it. Lines that do not fit in the queue are
//! dropped whole.

use core::cell::RefCell;
use core::fmt::Write;

use cortex_m::interrupt::{self, Mutex};
use heapless::String;
use log::{LevelFilter, Log, Metadata, Record};
use stm32f7xx_hal::{pac, prelude::*, serial::Tx};

use crate::sync::ByteQueue;

/// Longest line kept; longer records are truncated.
const LINE_CAP: usize = 128;
/// Bytes buffered ahead of the transmitter.
const QUEUE_CAP: usize = 1024;

struct UsartLogger {
    tx: Mutex<RefCell<Option<Tx<pac::USART1>>>>,
    queue: ByteQueue<QUEUE_CAP>,
}

static LOGGER: UsartLogger = UsartLogger {
    tx: Mutex::new(RefCell::new(None)),
    queue: ByteQueue::new(),
};

impl Log for UsartLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut line: String<LINE_CAP> = String::new();
        // Overflow only truncates.
        let _ = write!(line, "[{}] {}: {}", record.level(), record.target(), record.args());
        self.queue.push_all(&[line.as_bytes(), b"\r\n"]);
    }

    fn flush(&self) {}
}

/// Install the USART1 logger. A second call only replaces the transmitter.
pub fn init(tx: Tx<pac::USART1>, level: LevelFilter) {
    interrupt::free(|cs| {
        LOGGER.tx.borrow(cs).replace(Some(tx));
    });
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Hand queued bytes to USART1 while its data register is free. Never waits.
pub fn drain() {
    interrupt::free(|cs| {
        if let Some(tx) = LOGGER.tx.borrow(cs).borrow_mut().as_mut() {
            LOGGER.queue.send_while(|b| tx.write(b).is_ok());
        }
    });
}
