// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Line assembly and command parsing for the host text protocol.

use core::fmt;

use heapless::String;

use crate::protocol::messages::Command;

/// Why a line could not be turned into a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Unknown namespace or verb.
    Unknown,
    /// Verb needs an integer argument and none (or garbage) was given.
    BadArgument,
    /// Line exceeded the receive buffer and was discarded.
    TooLong,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Unknown => f.write_str("unknown command"),
            ParseError::BadArgument => f.write_str("bad argument"),
            ParseError::TooLong => f.write_str("line too long"),
        }
    }
}

enum State {
    Collecting,
    /// Overflowed; drop bytes until the end of the line.
    Discarding,
}

/// Assembles newline-terminated lines from a byte stream.
pub struct LineReader<const CAP: usize> {
    state: State,
    line: String<CAP>,
}

impl<const CAP: usize> LineReader<CAP> {
    pub fn new() -> Self {
        Self {
            state: State::Collecting,
            line: String::new(),
        }
    }

    /// Process a single incoming byte. Returns a trimmed, non-empty line once `\n` or `\r`
    /// is seen.
    pub fn push(&mut self, byte: u8) -> Option<Result<String<CAP>, ParseError>> {
        let end = byte == b'\n' || byte == b'\r';
        match self.state {
            State::Discarding => {
                if end {
                    self.state = State::Collecting;
                    self.line.clear();
                    return Some(Err(ParseError::TooLong));
                }
            }
            State::Collecting if end => {
                let line = core::mem::take(&mut self.line);
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    return None;
                }
                if trimmed.len() == line.len() {
                    return Some(Ok(line));
                }
                let mut out = String::new();
                let _ = out.push_str(trimmed);
                return Some(Ok(out));
            }
            State::Collecting => {
                // Non-ASCII bytes cannot be part of a valid command.
                let c = if byte.is_ascii() { byte as char } else { '?' };
                if self.line.push(c).is_err() {
                    self.state = State::Discarding;
                }
            }
        }
        None
    }
}

impl<const CAP: usize> Default for LineReader<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

fn arg(s: &str) -> Result<i32, ParseError> {
    s.trim().parse::<i32>().map_err(|_| ParseError::BadArgument)
}

/// Parse one command line (without terminator).
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let (namespace, rest) = line.trim().split_once(':').ok_or(ParseError::Unknown)?;
    let (verb, value) = match rest.split_once(':') {
        Some((verb, value)) => (verb, Some(value)),
        None => (rest, None),
    };

    let cmd = match (namespace, verb, value) {
        ("SWEEP", "ENABLE", None) => Command::SweepEnable,
        ("SWEEP", "DISABLE", None) => Command::SweepDisable,
        ("SWEEP", "STATUS", None) => Command::SweepStatus,
        ("SWEEP", "MIN", Some(v)) => Command::SweepMin(arg(v)?),
        ("SWEEP", "MAX", Some(v)) => Command::SweepMax(arg(v)?),
        ("SWEEP", "STEP", Some(v)) => Command::SweepStep(arg(v)?),
        ("SWEEP", "SETTLE", Some(v)) => Command::SweepSettle(arg(v)?),
        ("SWEEP", "DELAY", Some(v)) => Command::SweepDelay(arg(v)?),
        ("SERVO", "ANGLE", Some(v)) => Command::ServoAngle(arg(v)?),
        ("PI", "RESET", None) => Command::PiReset,
        ("SWEEP", "MIN" | "MAX" | "STEP" | "SETTLE" | "DELAY", None)
        | ("SERVO", "ANGLE", None) => return Err(ParseError::BadArgument),
        _ => return Err(ParseError::Unknown),
    };
    Ok(cmd)
}
