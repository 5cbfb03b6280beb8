// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Host Link Protocols
//!
//! Both protocols share the host serial link: binary telemetry frames go out at a fixed rate,
//! and text command lines come in with one text reply each. They are never interleaved
//! mid-frame because both are written from the same cooperative I/O loop.
//!
//! ## Modules
//!
//! - [`telemetry`] - Fixed-size binary state frame with CRC-16/CCITT, encoder and receiver.
//! - [`messages`] - Command, reply and error types of the text protocol.
//! - [`parser`] - Line assembly and command parsing.
//! - [`command`] - Validation and application of commands to the runtime configuration.

pub mod command;
pub mod messages;
pub mod parser;
pub mod telemetry;

pub use command::CommandHandler;
pub use messages::{Ack, Command, ErrorKind, Response};
pub use parser::{parse_command, LineReader, ParseError};
pub use telemetry::{FrameScanner, PressureEncoding, TelemetryFrame, TelemetryRate};

/// Outbound byte stream of the host link.
pub trait ByteSink {
    fn write_bytes(&mut self, bytes: &[u8]);

    /// Write `line` followed by the protocol line terminator.
    fn write_line(&mut self, line: &str) {
        self.write_bytes(line.as_bytes());
        self.write_bytes(messages::LINE_END.as_bytes());
    }
}

impl<const CAP: usize> ByteSink for heapless::Vec<u8, CAP> {
    /// Bytes beyond the capacity are dropped.
    fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.push(b).is_err() {
                break;
            }
        }
    }
}
