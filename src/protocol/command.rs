// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Applies host commands to the shared runtime configuration.
//!
//! Arguments are range-checked before the lock is taken. Checks that depend on the current
//! configuration (min < max, sector coverage, sweep state) run under the same lock as the
//! mutation, so each command is all-or-nothing. A lock that cannot be taken within
//! [`CONFIG_LOCK_TIMEOUT_MS`](crate::config::CONFIG_LOCK_TIMEOUT_MS) yields `ERR:MUTEX` and
//! the command is dropped.

use embedded_hal::delay::DelayNs;

use crate::config::{self, RuntimeConfig, SharedConfig};
use crate::protocol::messages::{Ack, Command, ErrorKind, Response};
use crate::protocol::parser::{parse_command, ParseError};
use crate::shared::ControlRequests;
use crate::sweep::SectorMap;

fn out_of_range(what: &str, value: i32) -> Response {
    Response::error(ErrorKind::OutOfRange, format_args!("{}:{}", what, value))
}

fn check_angle(value: i32) -> Result<u16, Response> {
    if (0..=config::ANGLE_LIMIT as i32).contains(&value) {
        Ok(value as u16)
    } else {
        Err(out_of_range("ANGLE", value))
    }
}

fn check_u32(what: &str, value: i32, (lo, hi): (u32, u32)) -> Result<u32, Response> {
    if value >= 0 && (lo..=hi).contains(&(value as u32)) {
        Ok(value as u32)
    } else {
        Err(out_of_range(what, value))
    }
}

/// Command interface state for `N` motor sectors.
pub struct CommandHandler<'a, const N: usize> {
    config: &'a SharedConfig,
    requests: &'a ControlRequests,
    sectors: SectorMap<N>,
}

impl<'a, const N: usize> CommandHandler<'a, N> {
    pub fn new(config: &'a SharedConfig, requests: &'a ControlRequests, sectors: SectorMap<N>) -> Self {
        Self {
            config,
            requests,
            sectors,
        }
    }

    /// The configuration this handler mutates.
    #[inline]
    pub fn config(&self) -> &'a SharedConfig {
        self.config
    }

    /// Parse and execute one line.
    pub fn handle_line<D: DelayNs>(&mut self, line: &str, delay: &mut D) -> Response {
        match parse_command(line) {
            Ok(cmd) => self.execute(cmd, delay),
            Err(e) => self.reject_line(line, e),
        }
    }

    /// Reply for a line that could not be parsed.
    pub fn reject_line(&self, line: &str, err: ParseError) -> Response {
        log::warn!("rejected command {:?}: {}", line, err);
        match err {
            ParseError::TooLong => Response::error(ErrorKind::InvalidCommand, format_args!("TOO_LONG")),
            _ => Response::error(ErrorKind::InvalidCommand, format_args!("{}", line.trim())),
        }
    }

    pub fn execute<D: DelayNs>(&mut self, cmd: Command, delay: &mut D) -> Response {
        let response = match cmd {
            Command::SweepStatus => self.status(cmd, delay),
            Command::PiReset => {
                self.requests.request_reset();
                Response::Ack(Ack::PiReset)
            }
            _ => match self.update(cmd, delay) {
                Ok(ack) => Response::Ack(ack),
                Err(reply) => reply,
            },
        };
        match &response {
            Response::Err { .. } => log::warn!("{} -> {}", cmd.path(), response),
            _ => log::info!("{} -> {}", cmd.path(), response),
        }
        response
    }

    /// Validate, lock, re-validate against the current values, then commit.
    fn update<D: DelayNs>(&mut self, cmd: Command, delay: &mut D) -> Result<Ack, Response> {
        match cmd {
            Command::SweepMin(v) | Command::SweepMax(v) | Command::ServoAngle(v) => {
                check_angle(v)?;
            }
            Command::SweepStep(v) => {
                let (lo, hi) = config::STEP_RANGE;
                check_u32("STEP", v, (lo as u32, hi as u32))?;
            }
            Command::SweepSettle(v) => {
                check_u32("SETTLE", v, config::SETTLE_RANGE_MS)?;
            }
            Command::SweepDelay(v) => {
                check_u32("DELAY", v, config::DELAY_RANGE_MS)?;
            }
            _ => {}
        }

        let mut cfg = self
            .config
            .lock_within(config::CONFIG_LOCK_TIMEOUT_MS, delay)
            .map_err(|_| Response::error(ErrorKind::Mutex, format_args!("{}", cmd.path())))?;

        let mut next: RuntimeConfig = *cfg;
        let ack = match cmd {
            Command::SweepEnable => {
                next.sweep_enabled = true;
                Ack::SweepEnabled
            }
            Command::SweepDisable => {
                next.sweep_enabled = false;
                Ack::SweepDisabled
            }
            Command::SweepMin(v) => {
                let min = v as u16;
                self.check_range(min, next.max_angle)?;
                next.min_angle = min;
                Ack::SweepMin(min)
            }
            Command::SweepMax(v) => {
                let max = v as u16;
                self.check_range(next.min_angle, max)?;
                next.max_angle = max;
                Ack::SweepMax(max)
            }
            Command::SweepStep(v) => {
                next.step = v as u16;
                Ack::SweepStep(next.step)
            }
            Command::SweepSettle(v) => {
                next.settle_ms = v as u32;
                Ack::SweepSettle(next.settle_ms)
            }
            Command::SweepDelay(v) => {
                next.reading_delay_ms = v as u32;
                Ack::SweepDelay(next.reading_delay_ms)
            }
            Command::ServoAngle(v) => {
                if next.sweep_enabled {
                    return Err(Response::error(ErrorKind::SweepActive, format_args!("SERVO:ANGLE")));
                }
                next.manual_angle = v as u16;
                Ack::ServoAngle(next.manual_angle)
            }
            Command::SweepStatus | Command::PiReset => {
                return Err(Response::error(ErrorKind::InvalidCommand, format_args!("{}", cmd.path())));
            }
        };

        *cfg = next;
        Ok(ack)
    }

    fn check_range(&self, min: u16, max: u16) -> Result<(), Response> {
        if min >= max {
            return Err(Response::error(
                ErrorKind::InvalidRange,
                format_args!("MIN:{} >= MAX:{}", min, max),
            ));
        }
        self.sectors.check_range(min, max).map_err(|e| {
            Response::error(
                ErrorKind::InvalidRange,
                format_args!("MIN:{} MAX:{} {}", min, max, e),
            )
        })
    }

    fn status<D: DelayNs>(&self, cmd: Command, delay: &mut D) -> Response {
        match self.config.lock_within(config::CONFIG_LOCK_TIMEOUT_MS, delay) {
            Ok(cfg) => Response::Status(*cfg),
            Err(_) => Response::error(ErrorKind::Mutex, format_args!("{}", cmd.path())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::Sector;
    use crate::sync::tests::CountingDelay;
    use crate::sync::TimedMutex;

    const SECTORS: [Sector; 4] = [
        Sector::new(0, 30),
        Sector::new(30, 60),
        Sector::new(60, 90),
        Sector::new(90, 120),
    ];

    fn shared() -> SharedConfig {
        TimedMutex::new(RuntimeConfig {
            sweep_enabled: true,
            min_angle: 0,
            max_angle: 120,
            step: 2,
            settle_ms: 5,
            reading_delay_ms: 5,
            manual_angle: 90,
        })
    }

    fn run(cfg: &SharedConfig, line: &str) -> std::string::String {
        let requests = ControlRequests::new();
        let mut handler = CommandHandler::new(cfg, &requests, SectorMap::from_checked(SECTORS));
        let mut delay = CountingDelay::default();
        format!("{}", handler.handle_line(line, &mut delay))
    }

    #[test]
    fn min_above_max_is_invalid_range_and_leaves_config() {
        let cfg = shared();
        assert_eq!(run(&cfg, "SWEEP:MIN:130"), "ERR:INVALID_RANGE:MIN:130 >= MAX:120");
        assert_eq!(cfg.try_snapshot().unwrap().min_angle, 0);
    }

    #[test]
    fn step_bounds_are_enforced() {
        let cfg = shared();
        assert_eq!(run(&cfg, "SWEEP:STEP:0"), "ERR:OUT_OF_RANGE:STEP:0");
        assert_eq!(run(&cfg, "SWEEP:STEP:21"), "ERR:OUT_OF_RANGE:STEP:21");
        assert_eq!(cfg.try_snapshot().unwrap().step, 2);
        assert_eq!(run(&cfg, "SWEEP:STEP:3"), "ACK:SWEEP:STEP:3");
        assert_eq!(cfg.try_snapshot().unwrap().step, 3);
    }

    #[test]
    fn angles_outside_servo_range_are_rejected() {
        let cfg = shared();
        assert_eq!(run(&cfg, "SWEEP:MAX:181"), "ERR:OUT_OF_RANGE:ANGLE:181");
        assert_eq!(run(&cfg, "SWEEP:MIN:-1"), "ERR:OUT_OF_RANGE:ANGLE:-1");
        assert_eq!(run(&cfg, "SWEEP:MIN:10"), "ACK:SWEEP:MIN:10");
        assert_eq!(run(&cfg, "SWEEP:MAX:100"), "ACK:SWEEP:MAX:100");
        let snap = cfg.try_snapshot().unwrap();
        assert_eq!((snap.min_angle, snap.max_angle), (10, 100));
    }

    #[test]
    fn range_that_empties_an_end_sector_is_rejected() {
        let cfg = shared();
        let reply = run(&cfg, "SWEEP:MIN:30");
        assert!(reply.starts_with("ERR:INVALID_RANGE:"), "{}", reply);
        let reply = run(&cfg, "SWEEP:MAX:90");
        assert!(reply.starts_with("ERR:INVALID_RANGE:"), "{}", reply);
        let snap = cfg.try_snapshot().unwrap();
        assert_eq!((snap.min_angle, snap.max_angle), (0, 120));
    }

    #[test]
    fn manual_angle_requires_disabled_sweep() {
        let cfg = shared();
        assert_eq!(run(&cfg, "SERVO:ANGLE:45"), "ERR:SWEEP_ACTIVE:SERVO:ANGLE");
        assert_eq!(run(&cfg, "SWEEP:DISABLE"), "ACK:SWEEP:DISABLED");
        assert_eq!(run(&cfg, "SERVO:ANGLE:45"), "ACK:SERVO:ANGLE:45");
        assert_eq!(run(&cfg, "SWEEP:STATUS"), "STATUS:SWEEP:DISABLED:45");
        assert_eq!(run(&cfg, "SWEEP:ENABLE"), "ACK:SWEEP:ENABLED");
        assert_eq!(run(&cfg, "SWEEP:STATUS"), "STATUS:SWEEP:ENABLED:0:120:2");
    }

    #[test]
    fn timing_commands_use_their_own_bounds() {
        let cfg = shared();
        assert_eq!(run(&cfg, "SWEEP:SETTLE:0"), "ERR:OUT_OF_RANGE:SETTLE:0");
        assert_eq!(run(&cfg, "SWEEP:SETTLE:50"), "ACK:SWEEP:SETTLE:50");
        assert_eq!(run(&cfg, "SWEEP:DELAY:0"), "ACK:SWEEP:DELAY:0");
        assert_eq!(run(&cfg, "SWEEP:DELAY:201"), "ERR:OUT_OF_RANGE:DELAY:201");
        let snap = cfg.try_snapshot().unwrap();
        assert_eq!((snap.settle_ms, snap.reading_delay_ms), (50, 0));
    }

    #[test]
    fn held_lock_yields_mutex_error_after_bounded_wait() {
        let cfg = shared();
        let requests = ControlRequests::new();
        let mut handler = CommandHandler::new(&cfg, &requests, SectorMap::from_checked(SECTORS));
        let mut delay = CountingDelay::default();

        let _held = cfg.try_lock().unwrap();
        let reply = handler.handle_line("SWEEP:MIN:10", &mut delay);
        assert_eq!(format!("{}", reply), "ERR:MUTEX:SWEEP:MIN");
        assert_eq!(delay.waited_ns, config::CONFIG_LOCK_TIMEOUT_MS as u64 * 1_000_000);
    }

    #[test]
    fn validation_failure_never_waits_for_the_lock() {
        let cfg = shared();
        let requests = ControlRequests::new();
        let mut handler = CommandHandler::new(&cfg, &requests, SectorMap::from_checked(SECTORS));
        let mut delay = CountingDelay::default();

        let _held = cfg.try_lock().unwrap();
        let reply = handler.handle_line("SWEEP:STEP:0", &mut delay);
        assert_eq!(format!("{}", reply), "ERR:OUT_OF_RANGE:STEP:0");
        assert_eq!(delay.waited_ns, 0);
    }

    #[test]
    fn pi_reset_posts_request() {
        let cfg = shared();
        let requests = ControlRequests::new();
        let mut handler = CommandHandler::new(&cfg, &requests, SectorMap::from_checked(SECTORS));
        let mut delay = CountingDelay::default();
        assert_eq!(
            handler.handle_line("PI:RESET", &mut delay),
            Response::Ack(Ack::PiReset)
        );
        assert!(requests.take_reset());
    }

    #[test]
    fn unknown_lines_echo_as_invalid_command() {
        let cfg = shared();
        assert_eq!(run(&cfg, "MOTOR:SPIN"), "ERR:INVALID_COMMAND:MOTOR:SPIN");
        assert_eq!(run(&cfg, "SWEEP:MIN:ten"), "ERR:INVALID_COMMAND:SWEEP:MIN:ten");
    }
}
