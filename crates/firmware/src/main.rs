//! IO coprocessor firmware - Main Entry Point
//!
//! Hardware-only entry point for STM32F103C8.
//!
//! Two executors:
//! - thread mode: the supervisory loop and the input tasks
//! - USART3 interrupt (unused peripheral vector): the deadline timer
//!   dispatcher, so bus poll and watchdog recovery preempt a stalled cycle

#![no_std]
#![no_main]

use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_time::Timer;
use platform::{ElapsedPerf, LiveRegisters, SystemClock};
use static_cell::StaticCell;

use firmware::hardware::{
    BoardPins, DefmtConsole, I2c2, I2cBus, LinkPoll, MixerTick, ServoBoard,
};
use firmware::{
    bring_up, BusPoll, BusWatchdog, DeadlineTimer, IsrDiagnostics, Shared, Supervisor,
    SupervisorConfig, WakeupSignal, TIMER_SLOTS,
};

// Logging transport + panic handler
use defmt_rtt as _;
use panic_probe as _;

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

// Justification for statics:
// Everything below is shared between the interrupt executor (timer dispatch,
// callouts) and thread mode (loop, input tasks). All of it is either atomic
// or guarded by a critical-section mutex internally, so plain `static` with
// `&'static` borrows is sufficient; no `static mut` anywhere.
static TIMER: DeadlineTimer<'static, SystemClock, TIMER_SLOTS> = DeadlineTimer::new(SystemClock);
static DIAGNOSTICS: IsrDiagnostics = IsrDiagnostics::new();
static REGISTERS: LiveRegisters = LiveRegisters::new();
static WAKEUP: WakeupSignal = WakeupSignal::new();
static LINK_POLL: LinkPoll = LinkPoll::new();
static WATCHDOG: StaticCell<BusWatchdog<'static, I2cBus>> = StaticCell::new();

#[interrupt]
unsafe fn USART3() {
    // SAFETY: USART3 is reserved for the executor; nothing else enables or
    // services this vector.
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

#[embassy_executor::task]
async fn timer_dispatch() {
    TIMER.run().await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    defmt::info!("{=str} v{=str}", platform::config::APP_NAME, platform::config::APP_VERSION);
    defmt::info!("Initializing STM32F103C8, Cortex-M3 @ 72 MHz");

    let p = embassy_stm32::init(Default::default());
    let config = SupervisorConfig::default();

    // Timer dispatch preempts thread mode.
    interrupt::USART3.set_priority(Priority::P6);
    let high = EXECUTOR_HIGH.start(interrupt::USART3);
    if high.spawn(timer_dispatch()).is_err() {
        defmt::error!("timer dispatcher spawn failed");
        halt().await;
    }

    let (Ok(poll_handle), Ok(watchdog_handle)) = (TIMER.allocate(), TIMER.allocate()) else {
        defmt::error!("timer handles exhausted");
        halt().await
    };

    let pins = BoardPins {
        led_blue: Output::new(p.PB14, Level::Low, Speed::Low).degrade(),
        led_amber: Output::new(p.PB15, Level::Low, Speed::Low).degrade(),
        servo_power: Output::new(p.PC13, Level::Low, Speed::Low).degrade(),
        safety: ExtiInput::new(Input::new(p.PB5, Pull::Up).degrade(), p.EXTI5.degrade()),
        ppm: ExtiInput::new(Input::new(p.PA0, Pull::None).degrade(), p.EXTI0.degrade()),
    };
    let mut board = ServoBoard::new(spawner, pins, &WAKEUP);
    let mut console = DefmtConsole;

    let poll = BusPoll {
        handle: poll_handle,
        callout: &LINK_POLL,
    };
    let started = bring_up(
        &mut board,
        &TIMER,
        poll,
        &config,
        &REGISTERS,
        &DIAGNOSTICS,
        &mut console,
    );
    if started.is_err() {
        halt().await;
    }

    let watchdog: &'static BusWatchdog<'static, I2cBus> = WATCHDOG.init(BusWatchdog::new(
        &TIMER,
        watchdog_handle,
        I2cBus::new(I2c2),
        &DIAGNOSTICS,
        config.watchdog_timeout,
    ));

    let shared = Shared {
        watchdog,
        wakeup: &WAKEUP,
        diagnostics: &DIAGNOSTICS,
        registers: &REGISTERS,
    };
    let mut supervisor = Supervisor::new(
        config,
        SystemClock,
        shared,
        MixerTick::new(),
        ElapsedPerf::new("mix"),
        console,
    );

    defmt::info!("Entering supervisory loop");
    supervisor.run().await
}

/// Park forever after a fatal startup error. Outputs stay as bring-up left
/// them; nothing drives them.
async fn halt() -> ! {
    loop {
        Timer::after_secs(1).await;
    }
}
