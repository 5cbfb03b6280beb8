// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Text command protocol spoken with the host.
//!
//! Requests are `<NAMESPACE>:<VERB>[:<ARG>]` lines. Replies are one line each:
//!
//! - `ACK:<echo>` when the command was applied,
//! - `ERR:<category>:<detail>` when it was rejected (nothing changed),
//! - `STATUS:SWEEP:ENABLED:<min>:<max>:<step>` or `STATUS:SWEEP:DISABLED:<manual>`.

use core::fmt::{self, Write};

use heapless::String;

use crate::config::RuntimeConfig;

/// Line terminator used for every reply.
pub const LINE_END: &str = "\r\n";
/// Capacity of an error detail.
pub const DETAIL_CAP: usize = 64;

/// Parsed host command. Numeric arguments are carried unvalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SweepEnable,
    SweepDisable,
    SweepMin(i32),
    SweepMax(i32),
    SweepStep(i32),
    SweepSettle(i32),
    SweepDelay(i32),
    SweepStatus,
    ServoAngle(i32),
    PiReset,
}

impl Command {
    /// `NAMESPACE:VERB` used as the detail of a lock timeout.
    pub fn path(&self) -> &'static str {
        match self {
            Command::SweepEnable => "SWEEP:ENABLE",
            Command::SweepDisable => "SWEEP:DISABLE",
            Command::SweepMin(_) => "SWEEP:MIN",
            Command::SweepMax(_) => "SWEEP:MAX",
            Command::SweepStep(_) => "SWEEP:STEP",
            Command::SweepSettle(_) => "SWEEP:SETTLE",
            Command::SweepDelay(_) => "SWEEP:DELAY",
            Command::SweepStatus => "SWEEP:STATUS",
            Command::ServoAngle(_) => "SERVO:ANGLE",
            Command::PiReset => "PI:RESET",
        }
    }
}

/// Rejection categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    OutOfRange,
    InvalidRange,
    Mutex,
    InvalidCommand,
    SweepActive,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::OutOfRange => "OUT_OF_RANGE",
            ErrorKind::InvalidRange => "INVALID_RANGE",
            ErrorKind::Mutex => "MUTEX",
            ErrorKind::InvalidCommand => "INVALID_COMMAND",
            ErrorKind::SweepActive => "SWEEP_ACTIVE",
        }
    }
}

/// Echo of an applied command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    SweepEnabled,
    SweepDisabled,
    SweepMin(u16),
    SweepMax(u16),
    SweepStep(u16),
    SweepSettle(u32),
    SweepDelay(u32),
    ServoAngle(u16),
    PiReset,
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ack::SweepEnabled => f.write_str("SWEEP:ENABLED"),
            Ack::SweepDisabled => f.write_str("SWEEP:DISABLED"),
            Ack::SweepMin(v) => write!(f, "SWEEP:MIN:{}", v),
            Ack::SweepMax(v) => write!(f, "SWEEP:MAX:{}", v),
            Ack::SweepStep(v) => write!(f, "SWEEP:STEP:{}", v),
            Ack::SweepSettle(v) => write!(f, "SWEEP:SETTLE:{}", v),
            Ack::SweepDelay(v) => write!(f, "SWEEP:DELAY:{}", v),
            Ack::ServoAngle(v) => write!(f, "SERVO:ANGLE:{}", v),
            Ack::PiReset => f.write_str("PI:RESET"),
        }
    }
}

/// Reply to one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ack(Ack),
    Err {
        kind: ErrorKind,
        detail: String<DETAIL_CAP>,
    },
    Status(RuntimeConfig),
}

impl Response {
    /// Build an error reply; an over-long detail is truncated.
    pub fn error(kind: ErrorKind, detail: fmt::Arguments<'_>) -> Self {
        let mut s = String::new();
        let _ = Truncating(&mut s).write_fmt(detail);
        Response::Err { kind, detail: s }
    }

    #[inline]
    pub fn is_ack(&self) -> bool {
        matches!(self, Response::Ack(_))
    }
}

/// Writer that keeps what fits and silently drops the rest.
struct Truncating<'a, const N: usize>(&'a mut String<N>);

impl<const N: usize> Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ack(ack) => write!(f, "ACK:{}", ack),
            Response::Err { kind, detail } => write!(f, "ERR:{}:{}", kind.as_str(), detail),
            Response::Status(cfg) if cfg.sweep_enabled => write!(
                f,
                "STATUS:SWEEP:ENABLED:{}:{}:{}",
                cfg.min_angle, cfg.max_angle, cfg.step
            ),
            Response::Status(cfg) => write!(f, "STATUS:SWEEP:DISABLED:{}", cfg.manual_angle),
        }
    }
}
