// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Fixed-size binary telemetry frame.
//!
//! Layout (little endian, no padding), with `w` = 2 for millivolt builds and 4 for force builds:
//!
//! | Offset | Size | Field |
//! | ------ | ---- | ----- |
//! | 0 | 2 | sync word `0xAA55` (u16), so `0x55 0xAA` on the wire |
//! | 2 | 4 | timestamp (ms, u32) |
//! | 6 | 4·N | setpoints (f32) |
//! | 6 + 4N | w·N | pressures (u16 mV or f32 N) |
//! | 6 + (4+w)N | 4·N | duties (f32, %) |
//! | 6 + (8+w)N | 4·(N+1) | sector minima (f32, cm), then the live distance |
//! | len − 2 | 2 | CRC-16/CCITT-FALSE over bytes `2..len-2` (u16) |
//!
//! Frames are fire-and-forget: a receiver drops anything that fails the CRC and carries on.

use core::fmt;

use heapless::Vec;

use super::ByteSink;
use crate::control::ControlUnits;

pub const SYNC_WORD: u16 = 0xAA55;
/// [`SYNC_WORD`] as it appears on the wire.
pub const SYNC: [u8; 2] = SYNC_WORD.to_le_bytes();
pub const HEADER_LEN: usize = SYNC.len() + 4;
pub const CRC_LEN: usize = 2;
/// Upper bound over every supported build (N ≤ 5, f32 pressures).
pub const MAX_FRAME_LEN: usize = frame_len(5, PressureEncoding::F32Newtons);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    BufferTooSmall,
    BadSync,
    LengthMismatch,
    InvalidCrc,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BufferTooSmall => f.write_str("buffer too small"),
            Error::BadSync => f.write_str("missing sync header"),
            Error::LengthMismatch => f.write_str("frame length mismatch"),
            Error::InvalidCrc => f.write_str("crc mismatch"),
        }
    }
}

/// Wire representation of the pressure fields.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PressureEncoding {
    U16Millivolts,
    F32Newtons,
}

impl PressureEncoding {
    pub const fn for_units(units: ControlUnits) -> Self {
        match units {
            ControlUnits::Millivolts => PressureEncoding::U16Millivolts,
            ControlUnits::Newtons => PressureEncoding::F32Newtons,
        }
    }

    #[inline]
    pub const fn width(self) -> usize {
        match self {
            PressureEncoding::U16Millivolts => 2,
            PressureEncoding::F32Newtons => 4,
        }
    }
}

/// Total frame length for `n` motors.
pub const fn frame_len(n: usize, enc: PressureEncoding) -> usize {
    HEADER_LEN + 4 * n + enc.width() * n + 4 * n + 4 * (n + 1) + CRC_LEN
}

/// Telemetry rates selectable at build time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TelemetryRate {
    Hz10,
    Hz25,
    Hz50,
    Hz100,
}

impl TelemetryRate {
    pub const fn period_ms(self) -> u32 {
        match self {
            TelemetryRate::Hz10 => 100,
            TelemetryRate::Hz25 => 40,
            TelemetryRate::Hz50 => 20,
            TelemetryRate::Hz100 => 10,
        }
    }
}

/// State snapshot carried by one frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TelemetryFrame<const N: usize> {
    pub timestamp_ms: u32,
    pub setpoints: [f32; N],
    /// In control units; truncated to whole millivolts on the wire in millivolt builds.
    pub pressures: [f32; N],
    pub duties: [f32; N],
    pub sector_min_cm: [f32; N],
    pub live_cm: f32,
}

pub fn crc16_ccitt(bytes: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &b in bytes {
        crc ^= (b as u16) << 8;
        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl Writer<'_> {
    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn put_f32s(&mut self, values: &[f32]) {
        for v in values {
            self.put(&v.to_le_bytes());
        }
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn take<const K: usize>(&mut self) -> [u8; K] {
        let mut out = [0u8; K];
        out.copy_from_slice(&self.buf[self.pos..self.pos + K]);
        self.pos += K;
        out
    }

    fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.take())
    }

    fn f32s<const N: usize>(&mut self) -> [f32; N] {
        core::array::from_fn(|_| self.f32())
    }
}

/// Serialize `frame` into `out` and stamp the CRC. Returns the frame length.
pub fn encode<const N: usize>(
    frame: &TelemetryFrame<N>,
    enc: PressureEncoding,
    out: &mut [u8],
) -> Result<usize, Error> {
    let len = frame_len(N, enc);
    if out.len() < len {
        return Err(Error::BufferTooSmall);
    }

    let mut w = Writer { buf: out, pos: 0 };
    w.put(&SYNC);
    w.put(&frame.timestamp_ms.to_le_bytes());
    w.put_f32s(&frame.setpoints);
    match enc {
        PressureEncoding::U16Millivolts => {
            for p in &frame.pressures {
                // `as` saturates: negative reads as 0, overflow as u16::MAX.
                w.put(&(*p as u16).to_le_bytes());
            }
        }
        PressureEncoding::F32Newtons => w.put_f32s(&frame.pressures),
    }
    w.put_f32s(&frame.duties);
    w.put_f32s(&frame.sector_min_cm);
    w.put(&frame.live_cm.to_le_bytes());

    let crc = crc16_ccitt(&out[SYNC.len()..len - CRC_LEN]);
    out[len - CRC_LEN..len].copy_from_slice(&crc.to_le_bytes());
    Ok(len)
}

/// Validate and parse one complete frame.
pub fn decode<const N: usize>(buf: &[u8], enc: PressureEncoding) -> Result<TelemetryFrame<N>, Error> {
    let len = frame_len(N, enc);
    if buf.len() != len {
        return Err(Error::LengthMismatch);
    }
    if buf[..SYNC.len()] != SYNC {
        return Err(Error::BadSync);
    }
    let stored = u16::from_le_bytes([buf[len - 2], buf[len - 1]]);
    if crc16_ccitt(&buf[SYNC.len()..len - CRC_LEN]) != stored {
        return Err(Error::InvalidCrc);
    }

    let mut r = Reader {
        buf,
        pos: SYNC.len(),
    };
    let timestamp_ms = u32::from_le_bytes(r.take());
    let setpoints = r.f32s();
    let pressures = match enc {
        PressureEncoding::U16Millivolts => {
            core::array::from_fn(|_| u16::from_le_bytes(r.take()) as f32)
        }
        PressureEncoding::F32Newtons => r.f32s(),
    };
    let duties = r.f32s();
    let sector_min_cm = r.f32s();
    let live_cm = r.f32();

    Ok(TelemetryFrame {
        timestamp_ms,
        setpoints,
        pressures,
        duties,
        sector_min_cm,
        live_cm,
    })
}

/// Encode `frame` and write the exact byte image to `sink`.
pub fn transmit<const N: usize, S: ByteSink>(
    frame: &TelemetryFrame<N>,
    enc: PressureEncoding,
    sink: &mut S,
) -> Result<usize, Error> {
    let mut buf = [0u8; MAX_FRAME_LEN];
    let len = encode(frame, enc, &mut buf)?;
    sink.write_bytes(&buf[..len]);
    Ok(len)
}

/// Fixed-rate trigger for the telemetry tick.
///
/// A late poll sends once and re-arms one period later; missed ticks are not caught up.
#[derive(Debug)]
pub struct RateTimer {
    period_ms: u32,
    next_ms: u32,
}

impl RateTimer {
    pub const fn new(rate: TelemetryRate, start_ms: u32) -> Self {
        Self {
            period_ms: rate.period_ms(),
            next_ms: start_ms,
        }
    }

    pub fn poll(&mut self, now_ms: u32) -> bool {
        if (now_ms.wrapping_sub(self.next_ms) as i32) < 0 {
            return false;
        }
        let next = self.next_ms.wrapping_add(self.period_ms);
        self.next_ms = if (now_ms.wrapping_sub(next) as i32) >= 0 {
            now_ms.wrapping_add(self.period_ms)
        } else {
            next
        };
        true
    }
}

/// Receiver side: pulls frames out of an arbitrary byte stream.
pub struct FrameScanner<const N: usize> {
    enc: PressureEncoding,
    buf: Vec<u8, MAX_FRAME_LEN>,
    dropped: u32,
}

impl<const N: usize> FrameScanner<N> {
    pub fn new(enc: PressureEncoding) -> Self {
        Self {
            enc,
            buf: Vec::new(),
            dropped: 0,
        }
    }

    /// Frames discarded for a CRC mismatch.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Process a single incoming byte. Returns `Some` when it completes a valid frame.
    pub fn push(&mut self, byte: u8) -> Option<TelemetryFrame<N>> {
        if self.buf.push(byte).is_err() {
            self.buf.clear();
            return None;
        }
        self.resync();

        let len = frame_len(N, self.enc);
        if self.buf.len() < len {
            return None;
        }

        match decode(&self.buf[..len], self.enc) {
            Ok(frame) => {
                self.consume(len);
                Some(frame)
            }
            Err(e) => {
                log::debug!("telemetry frame dropped: {}", e);
                self.dropped = self.dropped.wrapping_add(1);
                self.consume(1);
                self.resync();
                None
            }
        }
    }

    /// Strip leading bytes until the buffer starts with (a prefix of) the sync header.
    fn resync(&mut self) {
        loop {
            match self.buf.as_slice() {
                [] => return,
                [a, ..] if *a != SYNC[0] => self.consume(1),
                [_, b, ..] if *b != SYNC[1] => self.consume(1),
                _ => return,
            }
        }
    }

    fn consume(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        self.buf.rotate_left(n);
        self.buf.truncate(self.buf.len() - n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TelemetryFrame<4> {
        TelemetryFrame {
            timestamp_ms: 123_456,
            setpoints: [2.0, 2.0, 4.0, 0.0],
            pressures: [1.5, 2.25, 0.0, 3.75],
            duties: [45.0, -60.0, 0.0, 100.0],
            sector_min_cm: [150.0, 999.0, 80.5, 220.0],
            live_cm: 81.0,
        }
    }

    #[test]
    fn crc_matches_ccitt_false_check_value() {
        assert_eq!(crc16_ccitt(b"123456789"), 0x29B1);
    }

    #[test]
    fn frame_lengths_match_layout() {
        assert_eq!(frame_len(4, PressureEncoding::F32Newtons), 76);
        assert_eq!(frame_len(4, PressureEncoding::U16Millivolts), 68);
        assert_eq!(MAX_FRAME_LEN, 92);
    }

    #[test]
    fn encoded_frame_carries_its_own_crc() {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = encode(&sample(), PressureEncoding::F32Newtons, &mut buf).unwrap();
        assert_eq!(&buf[..2], &[0x55, 0xAA]);
        assert_eq!(&buf[2..6], &123_456u32.to_le_bytes());
        assert_eq!(&buf[6..10], &2.0f32.to_le_bytes());

        let stored = u16::from_le_bytes([buf[len - 2], buf[len - 1]]);
        assert_eq!(crc16_ccitt(&buf[2..len - 2]), stored);

        // Any single payload bit flip changes the CRC.
        for byte in 2..len - 2 {
            for bit in 0..8 {
                buf[byte] ^= 1 << bit;
                assert_ne!(crc16_ccitt(&buf[2..len - 2]), stored);
                buf[byte] ^= 1 << bit;
            }
        }
    }

    #[test]
    fn decode_restores_encoded_frame() {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = encode(&sample(), PressureEncoding::F32Newtons, &mut buf).unwrap();
        let back: TelemetryFrame<4> = decode(&buf[..len], PressureEncoding::F32Newtons).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn millivolt_pressures_use_two_bytes() {
        let mut frame = sample();
        frame.pressures = [812.9, 0.0, -5.0, 70_000.0];
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = encode(&frame, PressureEncoding::U16Millivolts, &mut buf).unwrap();
        assert_eq!(len, 68);
        assert_eq!(&buf[22..24], &812u16.to_le_bytes());

        let back: TelemetryFrame<4> = decode(&buf[..len], PressureEncoding::U16Millivolts).unwrap();
        assert_eq!(back.pressures, [812.0, 0.0, 0.0, 65_535.0]);
        assert_eq!(back.duties, frame.duties);
    }

    #[test]
    fn encode_rejects_small_buffer() {
        let mut buf = [0u8; 40];
        assert_eq!(
            encode(&sample(), PressureEncoding::F32Newtons, &mut buf),
            Err(Error::BufferTooSmall)
        );
    }

    #[test]
    fn decode_rejects_corruption() {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = encode(&sample(), PressureEncoding::F32Newtons, &mut buf).unwrap();
        buf[10] ^= 0x40;
        assert_eq!(
            decode::<4>(&buf[..len], PressureEncoding::F32Newtons),
            Err(Error::InvalidCrc)
        );
        assert_eq!(
            decode::<4>(&buf[..len - 1], PressureEncoding::F32Newtons),
            Err(Error::LengthMismatch)
        );
        buf[0] = 0;
        assert_eq!(
            decode::<4>(&buf[..len], PressureEncoding::F32Newtons),
            Err(Error::BadSync)
        );
    }

    #[test]
    fn scanner_skips_noise_and_drops_corrupt_frames() {
        let enc = PressureEncoding::F32Newtons;
        let mut good = [0u8; MAX_FRAME_LEN];
        let len = encode(&sample(), enc, &mut good).unwrap();
        let mut bad = good;
        bad[20] ^= 0x01;

        let mut stream: std::vec::Vec<u8> = vec![0x00, 0x55, 0x13, 0xAA];
        stream.extend_from_slice(&bad[..len]);
        stream.extend_from_slice(&good[..len]);
        stream.extend_from_slice(&good[..len]);

        let mut scanner = FrameScanner::<4>::new(enc);
        let frames: std::vec::Vec<_> = stream.iter().filter_map(|&b| scanner.push(b)).collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], sample());
        assert_eq!(scanner.dropped(), 1);
    }

    #[test]
    fn rate_timer_fires_once_per_period() {
        let mut t = RateTimer::new(TelemetryRate::Hz50, 0);
        let fired: usize = (0..100).filter(|&now| t.poll(now)).count();
        assert_eq!(fired, 5);

        // Late poll does not trigger a burst.
        let mut t = RateTimer::new(TelemetryRate::Hz10, 0);
        assert!(t.poll(0));
        assert!(t.poll(350));
        assert!(!t.poll(351));
        assert!(t.poll(450));
    }
}
