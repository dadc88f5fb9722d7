use embassy_futures::yield_now;
use pms_core::config::PmsConfig;
use pms_core::machine::{Pms, SystemState};

use super::{CAPTURE, TICK};
use crate::board::Board;
use crate::log::DefmtEventSink;

/// Thread-mode polling loop. Yields between iterations so the transmit task
/// can drain queued frames.
#[embassy_executor::task]
pub async fn run(mut board: Board) -> ! {
    let mut pms = Pms::with_sink(PmsConfig::DEFAULT, &CAPTURE, &TICK, DefmtEventSink::new());
    pms.start(&mut board);

    let mut previous = pms.state();
    loop {
        let next = pms.poll(&mut board);
        if next != previous && next == SystemState::BpsTrip {
            defmt::error!(
                "pms: halted after {} events, power cycle to recover",
                pms.events().recent().total()
            );
            for event in pms.events().recent().oldest_first() {
                defmt::error!("pms:   {}", defmt::Display2Format(event));
            }
        }
        previous = next;
        yield_now().await;
    }
}
