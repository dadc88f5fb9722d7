use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32 as hal;
use embassy_stm32::adc::{Adc, AdcChannel};
use embassy_stm32::can;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::peripherals::FDCAN1;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use pms_core::can::CanFrame;
use pms_core::capture::CaptureLayer;
use pms_core::config::PmsConfig;
use pms_core::timing::TickSource;

use crate::board::{Board, CAN_BITRATE, Outputs, Switches};

mod can_task;
mod control_task;
mod tick_task;

pub const TX_QUEUE_DEPTH: usize = 4;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

hal::bind_interrupts!(struct CanIrqs {
    TIM16_FDCAN_IT0 => can::IT0InterruptHandler<FDCAN1>;
    TIM17_FDCAN_IT1 => can::IT1InterruptHandler<FDCAN1>;
});

pub(super) static CAPTURE: CaptureLayer = CaptureLayer::new();
pub(super) static TICK: TickSource = TickSource::new(PmsConfig::DEFAULT.telemetry_period);
pub(super) static TX_QUEUE: Channel<CriticalSectionRawMutex, CanFrame, TX_QUEUE_DEPTH> =
    Channel::new();

/// Runs the tick and receive tasks above thread mode so they keep firing
/// while the control loop busy-waits.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[hal::interrupt]
unsafe fn TIM14() {
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA2,
        PA3,
        PA4,
        PA5,
        PA6,
        PA7,
        PA11,
        PA12,
        PB0,
        PB1,
        PB3,
        PB4,
        PB5,
        PB6,
        ADC1,
        FDCAN1,
        ..
    } = hal::init(config);

    let switches = Switches {
        array_enable: Input::new(PB4, Pull::Down),
        motor_enable: Input::new(PB5, Pull::Down),
        brake: Input::new(PB6, Pull::Down),
    };
    let outputs = Outputs {
        array: Output::new(PB1, Level::Low, Speed::Low),
        motor: Output::new(PA7, Level::Low, Speed::Low),
        precharge: Output::new(PA6, Level::Low, Speed::Low),
        horn: Output::new(PB3, Level::Low, Speed::Low),
        measure_enable: Output::new(PA4, Level::Low, Speed::Low),
    };
    let status_led = Output::new(PA5, Level::Low, Speed::Low);

    let adc = Adc::new(ADC1);
    let channels = [
        PA0.degrade_adc(),
        PA1.degrade_adc(),
        PA2.degrade_adc(),
        PA3.degrade_adc(),
        PB0.degrade_adc(),
    ];

    let mut configurator = can::CanConfigurator::new(FDCAN1, PA11, PA12, CanIrqs);
    configurator.set_bitrate(CAN_BITRATE);
    let (can_tx, can_rx, _properties) = configurator.into_normal_mode().split();

    let board = Board::new(switches, outputs, adc, channels, TX_QUEUE.sender());

    hal::interrupt::TIM14.set_priority(Priority::P1);
    let high = EXECUTOR_HIGH.start(hal::interrupt::TIM14);
    high.spawn(tick_task::run(status_led))
        .expect("failed to spawn tick task");
    high.spawn(can_task::receive(can_rx))
        .expect("failed to spawn CAN receive task");

    spawner
        .spawn(can_task::transmit(can_tx))
        .expect("failed to spawn CAN transmit task");
    spawner
        .spawn(control_task::run(board))
        .expect("failed to spawn control task");

    defmt::info!("pms: started, CAN at {} bit/s", CAN_BITRATE);

    core::future::pending::<()>().await;
}
