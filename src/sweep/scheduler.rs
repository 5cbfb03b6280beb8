// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Non-blocking servo sweep with per-sector minimum aggregation.
//!
//! One step is `move -> settle -> read -> inter-reading delay -> advance`. [`SweepScheduler::poll`]
//! performs at most one transition per call and never waits, so it can share the I/O loop with
//! telemetry and the command line.
//!
//! The runtime configuration is snapshotted at the start of every step. If the lock is held
//! by the command interface at that moment, the previous snapshot is reused; a change therefore
//! applies from the next step on and an in-flight step always runs to completion.
//!
//! Each reading is folded into the running minimum of the sector containing the current
//! angle. A sector's minimum is published when the sweep leaves it in the direction of travel,
//! and all sectors still open are published at the end of the pass. A sector that saw no valid
//! reading publishes [`NO_TARGET_CM`].

use crate::config::{self, RuntimeConfig, SharedConfig};
use crate::drivers::servo::{ServoActuator, ANGLE_MAX};
use crate::drivers::tof::RangeSensor;
use crate::shared::{SweepOutputs, NO_TARGET_CM};

use super::sector::SectorMap;
use super::SweepMode;

/// Direction of the current pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Observable outcome of one [`SweepScheduler::poll`] call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SweepEvent {
    /// A reading was taken at `angle`; `None` if the sensor had no valid distance.
    Reading {
        angle: u16,
        distance_cm: Option<f32>,
    },
    /// A pass ended and every sector of it has been published.
    PassComplete { direction: Direction },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    /// Snapshot the configuration and command the servo.
    Start,
    Settling { until: u32 },
    Delaying { until: u32 },
    /// Forward-only return move to the minimum angle.
    Returning { until: u32 },
}

/// `true` once `now` has reached `deadline`, across `millis` wrap-around.
#[inline]
fn reached(now: u32, deadline: u32) -> bool {
    now.wrapping_sub(deadline) as i32 >= 0
}

pub struct SweepScheduler<const N: usize> {
    mode: SweepMode,
    map: SectorMap<N>,
    cfg: RuntimeConfig,
    phase: Phase,
    angle: u16,
    direction: Direction,
    /// Holding the manual angle because the sweep is disabled.
    manual: bool,
    running_min: [f32; N],
    /// Sector of the last reading in this pass.
    current_sector: Option<usize>,
    passes: u32,
}

impl<const N: usize> SweepScheduler<N> {
    pub fn new(mode: SweepMode, map: SectorMap<N>, initial: RuntimeConfig) -> Self {
        Self {
            mode,
            map,
            cfg: initial,
            phase: Phase::Start,
            angle: initial.min_angle,
            direction: Direction::Forward,
            manual: false,
            running_min: [NO_TARGET_CM; N],
            current_sector: None,
            passes: 0,
        }
    }

    #[inline]
    pub fn angle(&self) -> u16 {
        self.angle
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Completed passes since start.
    #[inline]
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Configuration snapshot used by the current step.
    #[inline]
    pub fn config(&self) -> &RuntimeConfig {
        &self.cfg
    }

    /// Advance the state machine if its current wait has elapsed.
    pub fn poll<S, R>(
        &mut self,
        now_ms: u32,
        config: &SharedConfig,
        servo: &mut S,
        sensor: &mut R,
        out: &SweepOutputs<N>,
    ) -> Option<SweepEvent>
    where
        S: ServoActuator,
        R: RangeSensor,
    {
        match self.phase {
            Phase::Start => {
                self.start_step(now_ms, config, servo, sensor);
                None
            }
            Phase::Settling { until } if reached(now_ms, until) => {
                let reading = sensor.read_cm().filter(|d| *d > 0.0);
                out.publish_live(self.angle, reading.unwrap_or(NO_TARGET_CM));
                if !self.manual {
                    self.fold(reading, out);
                }
                self.phase = Phase::Delaying {
                    until: now_ms.wrapping_add(self.cfg.reading_delay_ms),
                };
                Some(SweepEvent::Reading {
                    angle: self.angle,
                    distance_cm: reading,
                })
            }
            Phase::Delaying { until } if reached(now_ms, until) => {
                if self.manual {
                    self.phase = Phase::Start;
                    return None;
                }
                self.advance(now_ms, servo, out)
            }
            Phase::Returning { until } if reached(now_ms, until) => {
                self.phase = Phase::Start;
                None
            }
            _ => None,
        }
    }

    fn start_step<S, R>(&mut self, now_ms: u32, config: &SharedConfig, servo: &mut S, sensor: &mut R)
    where
        S: ServoActuator,
        R: RangeSensor,
    {
        if let Some(cfg) = config.try_snapshot() {
            self.cfg = cfg;
        }
        let cfg = self.cfg;

        if !cfg.sweep_enabled {
            if !self.manual {
                log::info!("sweep disabled, holding {} deg", cfg.manual_angle);
                self.manual = true;
            }
            self.angle = cfg.manual_angle.min(ANGLE_MAX);
        } else {
            if self.manual {
                log::info!("sweep enabled, {}..{} step {}", cfg.min_angle, cfg.max_angle, cfg.step);
                self.manual = false;
                self.begin_pass(Direction::Forward);
                self.angle = cfg.min_angle;
            }
            self.angle = cfg.clamp_angle(self.angle as i32);
        }

        servo.set_angle(self.angle);
        sensor.discard();
        self.phase = Phase::Settling {
            until: now_ms.wrapping_add(cfg.settle_ms),
        };
    }

    /// Fold one reading into its sector, publishing any sectors left behind.
    fn fold(&mut self, reading: Option<f32>, out: &SweepOutputs<N>) {
        let sector = self.map.locate(self.angle);

        if let Some(prev) = self.current_sector {
            match self.direction {
                Direction::Forward if sector > prev => {
                    for s in prev..sector {
                        self.finalize(s, out);
                    }
                }
                Direction::Backward if sector < prev => {
                    for s in (sector + 1..=prev).rev() {
                        self.finalize(s, out);
                    }
                }
                _ => {}
            }
        }
        self.current_sector = Some(sector);

        if let Some(d) = reading {
            self.running_min[sector] = self.running_min[sector].min(d);
        }
    }

    fn finalize(&mut self, sector: usize, out: &SweepOutputs<N>) {
        out.publish_sector(sector, self.running_min[sector]);
        self.running_min[sector] = NO_TARGET_CM;
    }

    fn begin_pass(&mut self, direction: Direction) {
        self.direction = direction;
        self.running_min = [NO_TARGET_CM; N];
        self.current_sector = None;
    }

    fn advance<S: ServoActuator>(
        &mut self,
        now_ms: u32,
        servo: &mut S,
        out: &SweepOutputs<N>,
    ) -> Option<SweepEvent> {
        let cfg = self.cfg;
        let at_end = match self.direction {
            Direction::Forward => self.angle >= cfg.max_angle,
            Direction::Backward => self.angle <= cfg.min_angle,
        };

        if !at_end {
            self.angle = match self.direction {
                Direction::Forward => self.angle.saturating_add(cfg.step).min(cfg.max_angle),
                Direction::Backward => self.angle.saturating_sub(cfg.step).max(cfg.min_angle),
            };
            self.phase = Phase::Start;
            return None;
        }

        self.end_pass(now_ms, servo, out)
    }

    fn end_pass<S: ServoActuator>(
        &mut self,
        now_ms: u32,
        servo: &mut S,
        out: &SweepOutputs<N>,
    ) -> Option<SweepEvent> {
        let finished = self.direction;
        match finished {
            Direction::Forward => {
                for s in self.current_sector.unwrap_or(0)..N {
                    self.finalize(s, out);
                }
            }
            Direction::Backward => {
                for s in (0..=self.current_sector.unwrap_or(N - 1)).rev() {
                    self.finalize(s, out);
                }
            }
        }
        self.passes = self.passes.wrapping_add(1);
        log::debug!("sweep pass {} ({:?}) complete", self.passes, finished);

        let cfg = self.cfg;
        match self.mode {
            SweepMode::Bidirectional => {
                let next = finished.reversed();
                self.begin_pass(next);
                // The extremity was just measured; the new pass starts one step in.
                self.angle = match next {
                    Direction::Forward => cfg.min_angle.saturating_add(cfg.step).min(cfg.max_angle),
                    Direction::Backward => cfg.max_angle.saturating_sub(cfg.step).max(cfg.min_angle),
                };
                self.phase = Phase::Start;
            }
            SweepMode::Forward => {
                self.begin_pass(Direction::Forward);
                self.angle = cfg.min_angle;
                servo.set_angle(self.angle);
                self.phase = Phase::Returning {
                    until: now_ms.wrapping_add(config::SERVO_RETURN_MS),
                };
            }
        }

        Some(SweepEvent::PassComplete { direction: finished })
    }
}
