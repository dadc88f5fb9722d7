use embassy_stm32::can::frame::Frame;
use embassy_stm32::can::{CanRx, CanTx};
use embedded_can::Id;
use pms_core::can::{CanFrame, RxBuffer};

use super::{CAPTURE, TX_QUEUE};

/// Receive body. FDCAN merges both FIFOs into one stream, so frames are
/// routed to a capture buffer by identifier.
#[embassy_executor::task]
pub async fn receive(mut rx: CanRx<'static>) -> ! {
    loop {
        match rx.read().await {
            Ok(envelope) => {
                let Some(frame) = to_core_frame(&envelope.frame) else {
                    defmt::debug!("can: ignoring extended or oversized frame");
                    continue;
                };
                CAPTURE.record(RxBuffer::for_identifier(frame.id()), Some(frame));
            }
            Err(err) => defmt::warn!("can: receive error {}", defmt::Debug2Format(&err)),
        }
    }
}

/// Drains frames queued by the control loop onto the bus.
#[embassy_executor::task]
pub async fn transmit(mut tx: CanTx<'static>) -> ! {
    loop {
        let frame = TX_QUEUE.receive().await;
        let Some(hw_frame) = to_hw_frame(&frame) else {
            defmt::error!("can: unencodable frame id={=u32:#x}", frame.id());
            continue;
        };
        if tx.write(&hw_frame).await.is_some() {
            defmt::warn!("can: pending frame displaced by id={=u32:#x}", frame.id());
        }
    }
}

fn to_core_frame(frame: &Frame) -> Option<CanFrame> {
    let Id::Standard(id) = frame.id() else {
        return None;
    };
    CanFrame::new(u32::from(id.as_raw()), frame.data()).ok()
}

fn to_hw_frame(frame: &CanFrame) -> Option<Frame> {
    let id = u16::try_from(frame.id()).ok()?;
    Frame::new_standard(id, frame.payload()).ok()
}
