//! STM32F103 Blue Pill RTC Logbook with OLED Display and EEPROM History
//! =============================================================================================
//!
//! This firmware implements a settable clock that logs "save" presses using:
//! - SSD1306 OLED display (128x64) via I2C1
//! - 24C32 EEPROM via I2C2 holding the last two saved times
//! - Four push buttons on EXTI lines
//!
//! Hardware Connections:
//!   OLED Display -> Blue Pill
//!      GND  -> GND
//!      VCC  -> 5V
//!      SDA  -> PB7 (I2C1)
//!      SCL  -> PB6 (I2C1)
//!
//!   24C32 EEPROM -> Blue Pill (A0..A2 to GND, address 0x50)
//!      SDA  -> PB11 (I2C2)
//!      SCL  -> PB10 (I2C2)
//!
//!   Buttons (to GND, internal pull-up):
//!      SAVE      -> PB12  log the current time
//!      TOGGLE    -> PB13  switch between clock and history
//!      CYCLE     -> PB14  start editing / select hour, minute, second
//!      INCREMENT -> PB15  start editing / bump the selected field
//!
//! Button handlers run on an interrupt-priority executor and only touch the
//! shared mode machine. The thread-mode refresh loop does every bus transfer.
//!
//! Build: `cargo build --release --features firmware --target thumbv7m-none-eabi`

#![no_std]
#![no_main]

use defmt::*;
use defmt_rtt as _; // Global logger
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::{
    bind_interrupts,
    exti::ExtiInput,
    gpio::{Level, Output, Pull, Speed},
    i2c::{self, ErrorInterruptHandler, EventInterruptHandler},
    interrupt,
    interrupt::{InterruptExt, Priority},
    mode::Async,
    peripherals,
    time::Hertz,
};
use embassy_time::{Delay, Duration, Ticker};
use panic_probe as _; // Panic handler

use rtc_logbook::{
    config::Config,
    controller::Controller,
    hardware::{
        debounced_button::DebouncedButton,
        eeprom::Eeprom24x,
        oled::OledRenderer,
        traits::ClockSource,
        uptime_clock::{self, ClockCell, UptimeClock},
    },
    machine::{self, ButtonEvent, Mode, SharedMachine},
    view::NaiveDateTimeFmt,
};

type Bus = i2c::I2c<'static, Async>;
type LogController = Controller<UptimeClock, Eeprom24x<Bus, Delay>>;

// Mode, edit state and pending write-back, shared by handlers and the loop
static MACHINE: SharedMachine = machine::shared_machine();

// Wall clock, readable from handler context without I/O
static WALL_CLOCK: ClockCell = uptime_clock::clock_cell();

// Executor for the button handlers, preempts thread mode
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

bind_interrupts!(struct Irqs {
    I2C1_EV => EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => ErrorInterruptHandler<peripherals::I2C1>;
    I2C2_EV => EventInterruptHandler<peripherals::I2C2>;
    I2C2_ER => ErrorInterruptHandler<peripherals::I2C2>;
});

#[interrupt]
unsafe fn USART3() {
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

/// Main application entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_stm32::init(Default::default());
    let config = Config::default();
    info!("RTC logbook started");

    let clock = UptimeClock::start(&WALL_CLOCK, config.initial_time);

    // OLED on I2C1 at 400kHz
    let display_bus = i2c::I2c::new(
        p.I2C1,
        p.PB6,
        p.PB7,
        Irqs,
        p.DMA1_CH6,
        p.DMA1_CH7,
        Hertz::khz(400),
        Default::default(),
    );

    // EEPROM on I2C2 at 400kHz
    let eeprom_bus = i2c::I2c::new(
        p.I2C2,
        p.PB10,
        p.PB11,
        Irqs,
        p.DMA1_CH4,
        p.DMA1_CH5,
        Hertz::khz(400),
        Default::default(),
    );

    // Buttons to GND with pull-up, pressed on the falling edge
    let rearm = config.debounce_rearm_ms;
    let buttons = [
        (
            DebouncedButton::new(ExtiInput::new(p.PB12, p.EXTI12, Pull::Up), rearm),
            ButtonEvent::SaveButtonPressed,
        ),
        (
            DebouncedButton::new(ExtiInput::new(p.PB13, p.EXTI13, Pull::Up), rearm),
            ButtonEvent::ToggleButtonPressed,
        ),
        (
            DebouncedButton::new(ExtiInput::new(p.PB14, p.EXTI14, Pull::Up), rearm),
            ButtonEvent::CycleButtonPressed,
        ),
        (
            DebouncedButton::new(ExtiInput::new(p.PB15, p.EXTI15, Pull::Up), rearm),
            ButtonEvent::IncrementButtonPressed,
        ),
    ];

    // Start the handler executor on a spare interrupt
    interrupt::USART3.set_priority(Priority::P6);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::USART3);
    for (button, event) in buttons {
        high_spawner
            .spawn(button_handler(button, event, clock))
            .unwrap();
    }

    let controller = Controller::new(clock, Eeprom24x::new(eeprom_bus, Delay, config.eeprom));
    let renderer = OledRenderer::new(display_bus);

    spawner
        .spawn(refresh_loop(
            controller,
            renderer,
            Duration::from_millis(config.refresh_interval_ms),
        ))
        .unwrap();

    // Configure onboard LED (PC13) as heartbeat indicator
    let mut led = Output::new(p.PC13, Level::High, Speed::Low);
    let mut ticker = Ticker::every(Duration::from_millis(500));

    loop {
        led.toggle();
        ticker.next().await;
    }
}

/// Button Handler Task
///
/// Waits for debounced presses and feeds them to the mode machine.
/// Never performs bus I/O.
#[embassy_executor::task(pool_size = 4)]
async fn button_handler(mut button: DebouncedButton<'static>, event: ButtonEvent, clock: UptimeClock) {
    loop {
        button.pressed().await;
        let mode = machine::dispatch(&MACHINE, event, clock.get_time());
        debug!("{} -> {}", event, mode);
    }
}

/// Refresh Loop Task
///
/// Responsibilities:
/// 1. Write back a dirty edit to the clock
/// 2. Perform the pending commit to EEPROM
/// 3. Read history when it is on screen
/// 4. Render the current mode
#[embassy_executor::task]
async fn refresh_loop(
    mut controller: LogController,
    mut renderer: OledRenderer<Bus>,
    interval: Duration,
) {
    let mut ticker = Ticker::every(interval);
    let mut last_mode = Mode::Idle;

    loop {
        let report = controller.tick_and_render(&MACHINE, &mut renderer).await;

        if let Some(time) = report.flushed {
            info!("Clock set to {}", NaiveDateTimeFmt(time));
        }
        if let Some(record) = report.committed {
            info!("Saved time to EEPROM: {}", record);
        }
        for fault in &report.faults {
            warn!("Log store fault: {}", fault);
        }
        if report.mode != last_mode {
            info!("Mode {} -> {}", last_mode, report.mode);
            last_mode = report.mode;
        }

        ticker.next().await;
    }
}
