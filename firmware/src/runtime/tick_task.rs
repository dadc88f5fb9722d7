use embassy_stm32::gpio::Output;
use embassy_time::{Duration, Ticker};

use super::TICK;

/// 1 ms timer body. Raises the telemetry request and blinks the status LED
/// once per period.
#[embassy_executor::task]
pub async fn run(mut status_led: Output<'static>) -> ! {
    let mut ticker = Ticker::every(Duration::from_millis(1));
    loop {
        ticker.next().await;
        if let Some(level) = TICK.on_tick().heartbeat {
            status_led.set_level(level.into());
        }
    }
}
