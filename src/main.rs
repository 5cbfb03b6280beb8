// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Firmware entry point.
//!
//! - SysTick (highest priority) keeps the millisecond clock and pends PendSV every control
//!   period.
//! - PendSV (lowest exception priority) is the control context: one [`ControlTask`] tick.
//! - USART2 (TOF) and USART3 (host) receive interrupts sit between the two and only queue
//!   bytes.
//! - Thread mode is the I/O context: the servo sweep, host commands, telemetry and the log
//!   queue, polled in a loop.

#![no_main]
#![no_std]

use core::cell::RefCell;

use cortex_m::interrupt::Mutex;
use cortex_m::peripheral::{scb::SystemHandler, NVIC, SCB};
use cortex_m_rt::{entry, exception};
use panic_halt as _;

use hal::{
    pac::{self, interrupt},
    prelude::*,
    serial::{self, Config, Serial},
    timer::PwmChannel,
};
use stm32f7xx_hal as hal;

use forcerig::config::{self, RuntimeConfig, SharedConfig, NUM_MOTORS, PROFILE};
use forcerig::drivers::{Multiplexer, PressurePads, Servo, TofRanger};
use forcerig::hw::{
    self, board_motor, clock, Adc, BoardMotors, BoardPins, CycleDelay, CycleTimer, GpioOutput,
    PwmOutput, RxRing, UsartTx,
};
use forcerig::shared::SharedState;
use forcerig::sweep::SectorMap;
use forcerig::tasks::{ControlTask, IoTask};

type BoardMux = Multiplexer<GpioOutput, Adc<pac::ADC1>, CycleDelay>;

#[cfg(not(feature = "five-motors"))]
type Motors = BoardMotors<
    PwmChannel<pac::TIM4, 0>,
    PwmChannel<pac::TIM4, 1>,
    PwmChannel<pac::TIM4, 2>,
    PwmChannel<pac::TIM4, 3>,
>;
#[cfg(feature = "five-motors")]
type Motors = BoardMotors<
    PwmChannel<pac::TIM4, 0>,
    PwmChannel<pac::TIM4, 1>,
    PwmChannel<pac::TIM4, 2>,
    PwmChannel<pac::TIM4, 3>,
    PwmChannel<pac::TIM1, 0>,
>;

/// Everything the control exception owns.
struct ControlContext {
    task: ControlTask<NUM_MOTORS>,
    mux: BoardMux,
    motors: Motors,
    timer: CycleTimer,
}

static SHARED: SharedState<NUM_MOTORS> = SharedState::new();
static CONFIG: SharedConfig = SharedConfig::new(RuntimeConfig::from_build());
/// Handed from `main` to the first PendSV.
static CONTROL: Mutex<RefCell<Option<ControlContext>>> = Mutex::new(RefCell::new(None));
static TOF_RX: RxRing<pac::USART2, 256> = RxRing::new();
static HOST_RX: RxRing<pac::USART3, 128> = RxRing::new();

/// Receive interrupts preempt the control tick but not SysTick.
const RX_IRQ_PRIORITY: u8 = 0x40;

#[entry]
fn main() -> ! {
    // Peripherals
    let dp = pac::Peripherals::take().unwrap();
    let mut cp = cortex_m::Peripherals::take().unwrap();

    // Clocks
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();
    let sysclk = clocks.sysclk().raw();

    let BoardPins {
        debug,
        tof,
        host,
        mux,
        motor_pwm,
        motor_dir,
        servo,
    } = BoardPins::new(dp.GPIOA, dp.GPIOD, dp.GPIOE, dp.GPIOF);

    let serial_cfg = |baud: u32| Config {
        baud_rate: baud.bps(),
        ..Default::default()
    };

    // USART1 (DBG)
    let (debug_tx, _) = Serial::new(
        dp.USART1,
        (debug.tx, debug.rx),
        &clocks,
        serial_cfg(config::DEBUG_BAUD),
    )
    .split();
    hw::logger::init(debug_tx, log::LevelFilter::Info);
    log::info!("forcerig: {} motors, {:?}", NUM_MOTORS, PROFILE);

    // USART3 (host link), USART2 (TOF): receive by interrupt
    let mut host_serial = Serial::new(
        dp.USART3,
        (host.tx, host.rx),
        &clocks,
        serial_cfg(config::HOST_BAUD),
    );
    host_serial.listen(serial::Event::Rxne);
    let (host_tx, host_rx) = host_serial.split();
    HOST_RX.attach(host_rx);
    let mut host = UsartTx::new(host_tx);

    let mut tof_serial = Serial::new(
        dp.USART2,
        (tof.tx, tof.rx),
        &clocks,
        serial_cfg(config::TOF_BAUD),
    );
    tof_serial.listen(serial::Event::Rxne);
    let (_, tof_rx) = tof_serial.split();
    TOF_RX.attach(tof_rx);

    // Multiplexer and pressure pads
    let [s0, s1, s2, s3] = mux.select;
    let mux = Multiplexer::new(
        [
            GpioOutput::new(s0),
            GpioOutput::new(s1),
            GpioOutput::new(s2),
            GpioOutput::new(s3),
        ],
        Adc::adc1(dp.ADC1),
        config::MUX_SIG_ADC_CHANNEL,
        CycleDelay::new(sysclk),
    )
    .with_timing(config::MUX_SETTLE_US, config::MUX_SAMPLE_GAP_US);
    let pads = PressurePads::new(config::PAD_CHANNELS, config::PAD_CALIBRATION, config::PAD_SAMPLES);

    // Motors: TIM4 CH1..4 (+ TIM1 CH1)
    let (c1, c2, c3, c4) = dp
        .TIM4
        .pwm_hz(
            (motor_pwm.m1, motor_pwm.m2, motor_pwm.m3, motor_pwm.m4),
            config::PWM_FREQ_HZ.Hz(),
            &clocks,
        )
        .split();

    #[cfg(not(feature = "five-motors"))]
    let motors = {
        let [d1, d2, d3, d4] = motor_dir;
        BoardMotors {
            m1: board_motor(c1, d1),
            m2: board_motor(c2, d2),
            m3: board_motor(c3, d3),
            m4: board_motor(c4, d4),
        }
    };
    #[cfg(feature = "five-motors")]
    let motors = {
        let c5 = dp.TIM1.pwm_hz(motor_pwm.m5, config::PWM_FREQ_HZ.Hz(), &clocks).split();
        let [d1, d2, d3, d4, d5] = motor_dir;
        BoardMotors {
            m1: board_motor(c1, d1),
            m2: board_motor(c2, d2),
            m3: board_motor(c3, d3),
            m4: board_motor(c4, d4),
            m5: board_motor(c5, d5),
        }
    };

    // Servo: TIM3 CH1 at 50 Hz
    let servo_pwm = dp.TIM3.pwm_hz(servo, 50.Hz(), &clocks).split();
    let mut servo = Servo::new(PwmOutput::new(servo_pwm), config::SERVO_MANUAL_ANGLE);
    let mut ranger = TofRanger::new();

    // Control context
    cp.DCB.enable_trace();
    cp.DWT.enable_cycle_counter();
    unsafe {
        cp.SCB.set_priority(SystemHandler::SysTick, 0x00);
        cp.SCB.set_priority(SystemHandler::PendSV, 0xF0);
        cp.NVIC.set_priority(pac::Interrupt::USART2, RX_IRQ_PRIORITY);
        cp.NVIC.set_priority(pac::Interrupt::USART3, RX_IRQ_PRIORITY);
        NVIC::unmask(pac::Interrupt::USART2);
        NVIC::unmask(pac::Interrupt::USART3);
    }
    let control = ControlContext {
        task: ControlTask::from_profile(&PROFILE, pads),
        mux,
        motors,
        timer: CycleTimer::new(sysclk),
    };
    cortex_m::interrupt::free(|cs| CONTROL.borrow(cs).replace(Some(control)));
    clock::start_systick(&mut cp.SYST, sysclk);

    // I/O context
    let sectors = SectorMap::from_checked(config::SECTORS);
    let mut io = IoTask::new(&PROFILE, sectors, &CONFIG, &SHARED, clock::millis());
    let mut delay = CycleDelay::new(sysclk);
    let mut host_rx = [0u8; 64];
    let mut tof_rx = [0u8; 64];
    let mut rx_faults = [(0u32, 0u32); 2];

    loop {
        hw::logger::drain();

        let n = TOF_RX.drain(&mut tof_rx);
        ranger.feed(&tof_rx[..n]);

        let faults = [TOF_RX.error_counts(), HOST_RX.error_counts()];
        if faults != rx_faults {
            log::warn!("rx faults (line, dropped): tof {:?}, host {:?}", faults[0], faults[1]);
            rx_faults = faults;
        }

        let n = HOST_RX.drain(&mut host_rx);
        io.poll(
            clock::millis(),
            &host_rx[..n],
            &mut servo,
            &mut ranger,
            &mut host,
            &mut delay,
        );
    }
}

#[interrupt]
fn USART2() {
    TOF_RX.on_interrupt();
}

#[interrupt]
fn USART3() {
    HOST_RX.on_interrupt();
}

#[exception]
fn SysTick() {
    if clock::tick() % config::CONTROL_PERIOD_MS == 0 {
        SCB::set_pendsv();
    }
}

#[exception]
fn PendSV() {
    static mut CTX: Option<ControlContext> = None;

    if CTX.is_none() {
        *CTX = cortex_m::interrupt::free(|cs| CONTROL.borrow(cs).borrow_mut().take());
    }
    if let Some(ctx) = CTX.as_mut() {
        let start = ctx.timer.now();
        ctx.task
            .tick(clock::millis(), &mut ctx.mux, &mut ctx.motors, &SHARED);
        ctx.task.finish(ctx.timer.elapsed_us(start), &SHARED);
    }
}
