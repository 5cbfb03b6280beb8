// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Serial time-of-flight distance sensor frame decoder.
//!
//! Frame layout (16 bytes, little endian):
//!
//! | Offset | Size | Field |
//! | ------ | ---- | ----- |
//! | 0 | 2 | header `0x57 0x00` |
//! | 2 | 1 | reserved |
//! | 3 | 1 | sensor id |
//! | 4 | 4 | sensor system time (ms) |
//! | 8 | 3 | distance (mm, signed 24 bit) |
//! | 11 | 1 | distance status |
//! | 12 | 2 | signal strength |
//! | 14 | 1 | range precision |
//! | 15 | 1 | sum of bytes 0..=14, truncated |

use core::fmt;

pub const FRAME_LEN: usize = 16;
pub const HEADER: [u8; 2] = [0x57, 0x00];

/// Source of distance readings for the sweep.
pub trait RangeSensor {
    /// One distance reading in centimetres, or `None` if no valid reading is available.
    fn read_cm(&mut self) -> Option<f32>;

    /// Drop anything measured before now. Called right after the servo is commanded so the
    /// next reading belongs to the new angle.
    fn discard(&mut self) {}
}

/// One decoded sensor frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TofFrame {
    pub id: u8,
    pub system_time_ms: u32,
    pub distance_mm: i32,
    pub status: u8,
    pub signal_strength: u16,
    pub precision: u8,
}

impl TofFrame {
    /// Distance in centimetres, `None` unless positive.
    pub fn distance_cm(&self) -> Option<f32> {
        if self.distance_mm > 0 {
            Some(self.distance_mm as f32 / 10.0)
        } else {
            None
        }
    }

    fn decode(buf: &[u8; FRAME_LEN]) -> Self {
        // Sign-extend the 24-bit distance by shifting it into the top of an i32.
        let distance_mm = i32::from_le_bytes([0, buf[8], buf[9], buf[10]]) >> 8;
        Self {
            id: buf[3],
            system_time_ms: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            distance_mm,
            status: buf[11],
            signal_strength: u16::from_le_bytes([buf[12], buf[13]]),
            precision: buf[14],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TofError {
    Checksum { expected: u8, got: u8 },
}

impl fmt::Display for TofError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TofError::Checksum { expected, got } => {
                write!(f, "tof checksum 0x{:02X} != 0x{:02X}", got, expected)
            }
        }
    }
}

enum State {
    WaitHeader0,
    WaitHeader1,
    Body { len: usize },
}

/// Byte-wise frame parser; resynchronises on the header after any error.
pub struct TofParser {
    state: State,
    buf: [u8; FRAME_LEN],
}

impl TofParser {
    pub fn new() -> Self {
        Self {
            state: State::WaitHeader0,
            buf: [0; FRAME_LEN],
        }
    }

    /// Process a single incoming byte. Returns `Some` once a full frame has been received.
    pub fn push(&mut self, byte: u8) -> Option<Result<TofFrame, TofError>> {
        match self.state {
            State::WaitHeader0 => {
                if byte == HEADER[0] {
                    self.buf[0] = byte;
                    self.state = State::WaitHeader1;
                }
            }
            State::WaitHeader1 => {
                self.state = match byte {
                    b if b == HEADER[1] => {
                        self.buf[1] = byte;
                        State::Body { len: 2 }
                    }
                    b if b == HEADER[0] => State::WaitHeader1,
                    _ => State::WaitHeader0,
                };
            }
            State::Body { len } => {
                self.buf[len] = byte;
                let len = len + 1;
                if len < FRAME_LEN {
                    self.state = State::Body { len };
                    return None;
                }

                self.state = State::WaitHeader0;
                let expected = self.buf[..FRAME_LEN - 1]
                    .iter()
                    .fold(0u8, |acc, &b| acc.wrapping_add(b));
                let got = self.buf[FRAME_LEN - 1];
                if expected != got {
                    return Some(Err(TofError::Checksum { expected, got }));
                }
                return Some(Ok(TofFrame::decode(&self.buf)));
            }
        }
        None
    }
}

impl Default for TofParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps the most recent valid distance from a byte stream of sensor frames.
#[derive(Default)]
pub struct TofRanger {
    parser: TofParser,
    latest_cm: Option<f32>,
    checksum_errors: u32,
}

impl TofRanger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed received bytes.
    pub fn feed(&mut self, bytes: &[u8]) {
        for &b in bytes {
            match self.parser.push(b) {
                Some(Ok(frame)) => self.latest_cm = frame.distance_cm(),
                Some(Err(e)) => {
                    self.checksum_errors = self.checksum_errors.wrapping_add(1);
                    log::debug!("{}", e);
                }
                None => {}
            }
        }
    }

    #[inline]
    pub fn checksum_errors(&self) -> u32 {
        self.checksum_errors
    }
}

impl RangeSensor for TofRanger {
    /// Consume the latest reading so that each frame is used at most once.
    fn read_cm(&mut self) -> Option<f32> {
        self.latest_cm.take()
    }

    /// Forget the held reading and any partly received frame.
    fn discard(&mut self) {
        self.latest_cm = None;
        self.parser = TofParser::new();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn frame(distance_mm: i32) -> [u8; FRAME_LEN] {
        let d = distance_mm.to_le_bytes();
        let mut f = [
            0x57, 0x00, 0xFF, 0x01, 0x10, 0x27, 0x00, 0x00, d[0], d[1], d[2], 0x00, 0x34, 0x12,
            0x05, 0x00,
        ];
        f[15] = f[..15].iter().fold(0u8, |a, &b| a.wrapping_add(b));
        f
    }

    fn feed(parser: &mut TofParser, bytes: &[u8]) -> Option<Result<TofFrame, TofError>> {
        let mut out = None;
        for &b in bytes {
            if let Some(r) = parser.push(b) {
                out = Some(r);
            }
        }
        out
    }

    #[test]
    fn decodes_valid_frame() {
        let mut p = TofParser::new();
        let f = feed(&mut p, &frame(1234)).unwrap().unwrap();
        assert_eq!(f.id, 1);
        assert_eq!(f.system_time_ms, 10_000);
        assert_eq!(f.distance_mm, 1234);
        assert_eq!(f.signal_strength, 0x1234);
        assert_eq!(f.distance_cm(), Some(123.4));
    }

    #[test]
    fn negative_distance_is_sign_extended_and_invalid() {
        let mut p = TofParser::new();
        let f = feed(&mut p, &frame(-5)).unwrap().unwrap();
        assert_eq!(f.distance_mm, -5);
        assert_eq!(f.distance_cm(), None);
    }

    #[test]
    fn bad_checksum_is_reported_and_parser_resyncs() {
        let mut p = TofParser::new();
        let mut bad = frame(500);
        bad[9] ^= 0x01;
        assert!(matches!(feed(&mut p, &bad), Some(Err(TofError::Checksum { .. }))));

        // Leading garbage and a repeated first header byte before a good frame.
        assert!(feed(&mut p, &[0x12, 0x57]).is_none());
        assert_eq!(feed(&mut p, &frame(500)).unwrap().unwrap().distance_mm, 500);
    }

    #[test]
    fn ranger_hands_out_each_reading_once() {
        let mut r = TofRanger::new();
        assert_eq!(r.read_cm(), None);
        r.feed(&frame(800));
        let mut bad = frame(900);
        bad[15] = bad[15].wrapping_add(1);
        r.feed(&bad);
        assert_eq!(r.checksum_errors(), 1);
        assert_eq!(r.read_cm(), Some(80.0));
        assert_eq!(r.read_cm(), None);
    }

    #[test]
    fn discard_drops_held_reading_and_partial_frame() {
        let mut r = TofRanger::new();
        r.feed(&frame(800));
        let next = frame(600);
        r.feed(&next[..10]);

        r.discard();
        assert_eq!(r.read_cm(), None);

        // The tail of the interrupted frame alone is not a frame.
        r.feed(&next[10..]);
        assert_eq!(r.read_cm(), None);
        r.feed(&frame(600));
        assert_eq!(r.read_cm(), Some(60.0));
    }
}
