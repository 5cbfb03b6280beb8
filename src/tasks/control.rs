// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Fixed-rate control context: acquisition, safety supervision and the PI loops.

use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::config::{self, BuildProfile};
use crate::control::{ControlUnits, Directive, PiEngine, SetpointTable, Supervisor, TickMonitor};
use crate::drivers::{AdcRead, Multiplexer, PressurePads};
use crate::motors::{Drive, MotorBank};
use crate::shared::SharedState;

/// Everything the control tick owns. Nothing here is touched by the I/O context.
pub struct ControlTask<const N: usize> {
    units: ControlUnits,
    pads: PressurePads<N>,
    engine: PiEngine<N>,
    supervisor: Supervisor<N>,
    monitor: TickMonitor,
}

impl<const N: usize> ControlTask<N> {
    pub fn new(units: ControlUnits, pads: PressurePads<N>, table: SetpointTable) -> Self {
        Self {
            units,
            pads,
            engine: PiEngine::new(units.default_gains()),
            supervisor: Supervisor::new(table),
            monitor: TickMonitor::new(config::CONTROL_PERIOD_MS * 1000),
        }
    }

    /// Control task for the resolved build profile and the static pad wiring.
    pub fn from_profile(profile: &BuildProfile, pads: PressurePads<N>) -> Self {
        Self::new(profile.units, pads, SetpointTable::for_units(profile.units))
    }

    #[inline]
    pub fn engine(&self) -> &PiEngine<N> {
        &self.engine
    }

    #[inline]
    pub fn supervisor(&self) -> &Supervisor<N> {
        &self.supervisor
    }

    /// Run one control tick.
    ///
    /// Returns the duties applied, or `None` when the tick was skipped after an overrun or the
    /// pads could not be read (all motors are stopped in that case).
    pub fn tick<S, A, D, M>(
        &mut self,
        now_ms: u32,
        mux: &mut Multiplexer<S, A, D>,
        motors: &mut M,
        shared: &SharedState<N>,
    ) -> Option<[f32; N]>
    where
        S: OutputPin,
        A: AdcRead,
        D: DelayNs,
        M: MotorBank,
    {
        if !self.monitor.begin() {
            return None;
        }

        if shared.requests.take_reset() {
            log::info!("PI integrators reset");
            self.engine.reset();
        }

        let millivolts = match self.pads.read_all_mv(mux) {
            Ok(mv) => mv,
            Err(e) => {
                log::error!("pad acquisition failed: {}", e);
                motors.stop_all();
                return None;
            }
        };
        let readings = self.pads.to_units(&millivolts, self.units);

        let distances = shared.sweep.sector_minima();
        let directives = self.supervisor.update(now_ms, &distances, &readings);

        let mut setpoints = [0.0; N];
        let mut duties = [0.0; N];
        for (i, directive) in directives.iter().enumerate() {
            let drive = match *directive {
                Directive::Track(sp) => {
                    let duty = self.engine.step_channel(i, sp, readings[i]);
                    Drive::from_duty(duty)
                }
                Directive::Hold(drive) => {
                    self.engine.hold_channel(i, drive);
                    drive
                }
            };
            motors.drive(i, drive);
            setpoints[i] = directive.setpoint();
            duties[i] = self.engine.last_duty(i);
        }

        shared.control.publish(&setpoints, &readings, &duties);
        Some(duties)
    }

    /// Record how long the last tick took and publish the overrun count.
    pub fn finish(&mut self, elapsed_us: u32, shared: &SharedState<N>) -> bool {
        let overran = self.monitor.finish(elapsed_us);
        if overran {
            shared
                .control
                .overruns
                .store(self.monitor.overruns(), core::sync::atomic::Ordering::Relaxed);
        }
        overran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::safety::SafetyState;
    use crate::drivers::mux::tests::ScriptedAdc;
    use crate::drivers::PadCalibration;
    use crate::motors::hbridge::tests::FakePin;
    use crate::motors::tests::RecordingBank;
    use crate::sync::tests::CountingDelay;
    use core::cell::Cell;

    const TABLE: SetpointTable = SetpointTable::new(0.5, 2.0, 4.0);

    fn task() -> ControlTask<2> {
        let pads = PressurePads::new([1, 2], [PadCalibration::new(0.0, 100.0); 2], 1);
        ControlTask::new(ControlUnits::Newtons, pads, TABLE)
    }

    #[test]
    fn close_target_tracks_and_publishes() {
        let cells: [Cell<bool>; 4] = Default::default();
        // 1241 counts ~ 1000 mV ~ 10 N on both pads.
        let codes = [1241u16; 64];
        let mut mux = Multiplexer::new(
            [FakePin(&cells[0]), FakePin(&cells[1]), FakePin(&cells[2]), FakePin(&cells[3])],
            ScriptedAdc::new(&codes),
            3,
            CountingDelay::default(),
        );
        let mut bank = RecordingBank::<2>::new();
        let shared = SharedState::<2>::new();
        shared.sweep.publish_sector(0, 75.0);
        shared.sweep.publish_sector(1, 75.0);

        let mut t = task();
        let duties = t.tick(0, &mut mux, &mut bank, &shared).unwrap();

        // Pads read well above the close setpoint, so both channels back off.
        assert!(duties.iter().all(|d| *d < 0.0));
        assert_eq!(shared.control.setpoints(), [4.0, 4.0]);
        assert!(shared.control.pressures()[0] > 9.0);
        assert_eq!(t.supervisor().state(0), SafetyState::Tracking);
        assert_eq!(bank.commands, 2);
    }

    #[test]
    fn reset_request_clears_integrators() {
        let cells: [Cell<bool>; 4] = Default::default();
        let codes = [0u16; 64];
        let mut mux = Multiplexer::new(
            [FakePin(&cells[0]), FakePin(&cells[1]), FakePin(&cells[2]), FakePin(&cells[3])],
            ScriptedAdc::new(&codes),
            3,
            CountingDelay::default(),
        );
        let mut bank = RecordingBank::<2>::new();
        let shared = SharedState::<2>::new();
        shared.sweep.publish_sector(0, 75.0);
        shared.sweep.publish_sector(1, 75.0);

        let mut t = task();
        t.tick(0, &mut mux, &mut bank, &shared);
        let one_tick = t.engine().integrator(0);
        assert!(one_tick > 0.0);

        t.tick(20, &mut mux, &mut bank, &shared);
        assert!(t.engine().integrator(0) > one_tick);

        shared.requests.request_reset();
        t.tick(40, &mut mux, &mut bank, &shared);
        assert_eq!(t.engine().integrator(0), one_tick);
        assert!(!shared.requests.take_reset());
    }

    #[test]
    fn overrun_skips_next_tick_and_is_published() {
        let cells: [Cell<bool>; 4] = Default::default();
        let codes = [0u16; 64];
        let mut mux = Multiplexer::new(
            [FakePin(&cells[0]), FakePin(&cells[1]), FakePin(&cells[2]), FakePin(&cells[3])],
            ScriptedAdc::new(&codes),
            3,
            CountingDelay::default(),
        );
        let mut bank = RecordingBank::<2>::new();
        let shared = SharedState::<2>::new();

        let mut t = task();
        assert!(t.tick(0, &mut mux, &mut bank, &shared).is_some());
        assert!(t.finish(25_000, &shared));
        assert_eq!(shared.control.overruns.load(core::sync::atomic::Ordering::Relaxed), 1);

        assert!(t.tick(20, &mut mux, &mut bank, &shared).is_none());
        assert!(t.tick(40, &mut mux, &mut bank, &shared).is_some());
    }
}
