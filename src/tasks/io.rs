// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Cooperative I/O context: servo sweep, host commands and telemetry.
//!
//! One [`IoTask::poll`] call advances each sub-task by at most one step and never waits on
//! anything except the bounded configuration lock taken by commands.

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use heapless::String;

use crate::config::{BuildProfile, SharedConfig, COMMAND_LINE_MAX};
use crate::drivers::{RangeSensor, ServoActuator};
use crate::protocol::messages::DETAIL_CAP;
use crate::protocol::telemetry::{self, RateTimer};
use crate::protocol::{ByteSink, CommandHandler, LineReader, PressureEncoding, Response, TelemetryFrame};
use crate::shared::SharedState;
use crate::sweep::{SectorMap, SweepEvent, SweepScheduler};

/// Longest reply line: `ERR:` + category + `:` + detail.
const REPLY_CAP: usize = DETAIL_CAP + 32;

pub struct IoTask<'a, const N: usize> {
    shared: &'a SharedState<N>,
    sweep: SweepScheduler<N>,
    lines: LineReader<COMMAND_LINE_MAX>,
    commands: CommandHandler<'a, N>,
    telemetry: RateTimer,
    encoding: PressureEncoding,
    frames_sent: u32,
}

impl<'a, const N: usize> IoTask<'a, N> {
    pub fn new(
        profile: &BuildProfile,
        map: SectorMap<N>,
        config: &'a SharedConfig,
        shared: &'a SharedState<N>,
        now_ms: u32,
    ) -> Self {
        let initial = config.try_snapshot().unwrap_or_default();
        Self {
            shared,
            sweep: SweepScheduler::new(profile.sweep_mode, map, initial),
            lines: LineReader::new(),
            commands: CommandHandler::new(config, &shared.requests, map),
            telemetry: RateTimer::new(profile.telemetry_rate, now_ms),
            encoding: PressureEncoding::for_units(profile.units),
            frames_sent: 0,
        }
    }

    #[inline]
    pub fn sweep(&self) -> &SweepScheduler<N> {
        &self.sweep
    }

    #[inline]
    pub fn frames_sent(&self) -> u32 {
        self.frames_sent
    }

    /// Advance the sweep, answer any complete command lines in `rx` and send telemetry when due.
    pub fn poll<S, R, K, D>(
        &mut self,
        now_ms: u32,
        rx: &[u8],
        servo: &mut S,
        sensor: &mut R,
        host: &mut K,
        delay: &mut D,
    ) -> Option<SweepEvent>
    where
        S: ServoActuator,
        R: RangeSensor,
        K: ByteSink,
        D: DelayNs,
    {
        let event = self
            .sweep
            .poll(now_ms, self.commands.config(), servo, sensor, &self.shared.sweep);

        for &byte in rx {
            let response = match self.lines.push(byte) {
                Some(Ok(line)) => self.commands.handle_line(&line, delay),
                Some(Err(e)) => self.commands.reject_line("", e),
                None => continue,
            };
            reply(host, &response);
        }

        if self.telemetry.poll(now_ms) {
            let frame = self.frame(now_ms);
            match telemetry::transmit(&frame, self.encoding, host) {
                Ok(_) => self.frames_sent = self.frames_sent.wrapping_add(1),
                Err(e) => log::error!("telemetry encode failed: {}", e),
            }
        }

        event
    }

    /// Snapshot of the shared state as one telemetry frame.
    pub fn frame(&self, now_ms: u32) -> TelemetryFrame<N> {
        let control = &self.shared.control;
        TelemetryFrame {
            timestamp_ms: now_ms,
            setpoints: control.setpoints(),
            pressures: control.pressures(),
            duties: control.duties(),
            sector_min_cm: self.shared.sweep.sector_minima(),
            live_cm: self.shared.sweep.live(),
        }
    }
}

fn reply<K: ByteSink>(host: &mut K, response: &Response) {
    let mut line: String<REPLY_CAP> = String::new();
    if write!(line, "{}", response).is_err() {
        log::warn!("reply truncated");
    }
    host.write_line(&line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::control::ControlUnits;
    use crate::protocol::{FrameScanner, TelemetryRate};
    use crate::sweep::sector::Sector;
    use crate::sweep::SweepMode;
    use crate::sync::tests::CountingDelay;
    use crate::sync::TimedMutex;

    const PROFILE: BuildProfile = BuildProfile {
        units: ControlUnits::Newtons,
        sweep_mode: SweepMode::Bidirectional,
        telemetry_rate: TelemetryRate::Hz50,
    };

    const SECTORS: [Sector; 2] = [Sector::new(0, 90), Sector::new(90, 180)];

    struct FixedServo(u16);

    impl ServoActuator for FixedServo {
        fn set_angle(&mut self, angle: u16) {
            self.0 = angle;
        }
    }

    struct FixedSensor(Option<f32>);

    impl RangeSensor for FixedSensor {
        fn read_cm(&mut self) -> Option<f32> {
            self.0
        }
    }

    fn cfg() -> RuntimeConfig {
        RuntimeConfig {
            sweep_enabled: true,
            min_angle: 0,
            max_angle: 180,
            step: 10,
            settle_ms: 1,
            reading_delay_ms: 1,
            manual_angle: 90,
        }
    }

    /// Splits host output into text lines, ignoring anything that is not printable ASCII.
    fn text_lines(bytes: &[u8]) -> std::vec::Vec<std::string::String> {
        std::string::String::from_utf8_lossy(bytes)
            .split("\r\n")
            .filter(|l| l.starts_with("ACK:") || l.starts_with("ERR:") || l.starts_with("STATUS:"))
            .map(|l| l.to_owned())
            .collect()
    }

    #[test]
    fn commands_are_answered_one_line_each() {
        let config = TimedMutex::new(cfg());
        let shared = SharedState::<2>::new();
        let mut io = IoTask::new(&PROFILE, SectorMap::from_checked(SECTORS), &config, &shared, 1000);
        let mut host = heapless::Vec::<u8, 512>::new();
        let mut delay = CountingDelay::default();

        io.poll(
            0,
            b"SWEEP:STEP:3\r\nSWEEP:STATUS\r\nBOGUS\r\n",
            &mut FixedServo(0),
            &mut FixedSensor(None),
            &mut host,
            &mut delay,
        );

        assert_eq!(
            text_lines(&host),
            ["ACK:SWEEP:STEP:3", "STATUS:SWEEP:ENABLED:0:180:3", "ERR:INVALID_COMMAND:BOGUS"]
        );
        assert_eq!(config.try_snapshot().map(|c| c.step), Some(3));
    }

    #[test]
    fn telemetry_goes_out_at_the_configured_rate() {
        let config = TimedMutex::new(cfg());
        let shared = SharedState::<2>::new();
        shared.control.publish(&[1.0, 2.0], &[0.5, 0.25], &[40.0, -50.0]);
        let mut io = IoTask::new(&PROFILE, SectorMap::from_checked(SECTORS), &config, &shared, 0);
        let mut host = heapless::Vec::<u8, 1024>::new();
        let mut delay = CountingDelay::default();
        let mut servo = FixedServo(0);
        let mut sensor = FixedSensor(Some(120.0));

        for now in 0..=100 {
            io.poll(now, &[], &mut servo, &mut sensor, &mut host, &mut delay);
        }

        // 0, 20, 40, 60, 80, 100 ms
        assert_eq!(io.frames_sent(), 6);

        let mut scanner = FrameScanner::<2>::new(PressureEncoding::F32Newtons);
        let frames: std::vec::Vec<_> = host.iter().filter_map(|&b| scanner.push(b)).collect();
        assert_eq!(frames.len(), 6);
        assert_eq!(frames[0].timestamp_ms, 0);
        assert_eq!(frames[5].timestamp_ms, 100);
        assert_eq!(frames[5].setpoints, [1.0, 2.0]);
        assert_eq!(frames[5].duties, [40.0, -50.0]);
        assert_eq!(frames[5].live_cm, 120.0);
    }

    #[test]
    fn overlong_line_is_rejected() {
        let config = TimedMutex::new(cfg());
        let shared = SharedState::<2>::new();
        let mut io = IoTask::new(&PROFILE, SectorMap::from_checked(SECTORS), &config, &shared, 1000);
        let mut host = heapless::Vec::<u8, 256>::new();
        let mut delay = CountingDelay::default();

        let mut rx = std::vec::Vec::new();
        rx.extend_from_slice(&[b'X'; 100]);
        rx.extend_from_slice(b"\nPI:RESET\n");
        io.poll(0, &rx, &mut FixedServo(0), &mut FixedSensor(None), &mut host, &mut delay);

        assert_eq!(text_lines(&host), ["ERR:INVALID_COMMAND:TOO_LONG", "ACK:PI:RESET"]);
        assert!(shared.requests.take_reset());
    }
}
