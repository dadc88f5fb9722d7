//! Interrupt-to-main-loop handoff for received CAN frames.
//!
//! Each hardware receive buffer owns one [`CaptureCell`]. The receive
//! interrupt is the only writer and the polling loop the only reader. A cell
//! holds at most one unconsumed frame; a newer arrival overwrites it in place.
//!
//! The cell is a seqlock over the frame words plus two generation counters.
//! `sequence` is odd while the producer is writing and even otherwise, so
//! every completed publish leaves a distinct even generation behind.
//! `acknowledged` is the newest generation that has been consumed or
//! discarded. A frame is pending while the two differ. The consumer claims a
//! generation with a single `fetch_max`, so a frame that lands between the
//! copy and the claim stays pending instead of being silently cleared.

use core::hint::spin_loop;

use portable_atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering, fence};

use crate::can::{CanFrame, CanReceive, RxBuffer};

/// Lock-free single-producer/single-consumer holding buffer for one frame.
pub struct CaptureCell {
    sequence: AtomicU64,
    acknowledged: AtomicU64,
    id: AtomicU32,
    data: AtomicU64,
    len: AtomicU8,
}

impl CaptureCell {
    pub const fn new() -> Self {
        Self {
            sequence: AtomicU64::new(0),
            acknowledged: AtomicU64::new(0),
            id: AtomicU32::new(0),
            data: AtomicU64::new(0),
            len: AtomicU8::new(0),
        }
    }

    /// Stores `frame`, replacing any unconsumed frame. Producer side only.
    pub fn publish(&self, frame: &CanFrame) {
        let start = self.sequence.load(Ordering::Relaxed);
        self.sequence.store(start.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        self.id.store(frame.id(), Ordering::Relaxed);
        self.data
            .store(u64::from_le_bytes(frame.raw_data()), Ordering::Relaxed);
        self.len.store(frame.len(), Ordering::Relaxed);

        self.sequence.store(start.wrapping_add(2), Ordering::Release);
    }

    /// Drops any unconsumed frame. Producer side, used when the driver
    /// reports a failed read.
    pub fn discard(&self) {
        let current = self.sequence.load(Ordering::Acquire);
        self.acknowledged.fetch_max(current, Ordering::AcqRel);
    }

    /// Returns `true` when a frame is waiting to be taken.
    pub fn is_pending(&self) -> bool {
        let published = self.sequence.load(Ordering::Acquire);
        published & 1 == 1 || published != self.acknowledged.load(Ordering::Acquire)
    }

    /// Copies out and consumes the pending frame, if any. Consumer side only.
    pub fn take(&self) -> Option<CanFrame> {
        loop {
            let start = self.sequence.load(Ordering::Acquire);
            if start & 1 == 1 {
                spin_loop();
                continue;
            }
            if start == self.acknowledged.load(Ordering::Acquire) {
                return None;
            }

            let id = self.id.load(Ordering::Relaxed);
            let data = self.data.load(Ordering::Relaxed).to_le_bytes();
            let len = self.len.load(Ordering::Relaxed);
            fence(Ordering::Acquire);

            if self.sequence.load(Ordering::Relaxed) != start {
                continue;
            }

            // A discard that raced past this generation wins.
            if self.acknowledged.fetch_max(start, Ordering::AcqRel) >= start {
                return None;
            }

            return Some(CanFrame::from_raw(id, data, len));
        }
    }
}

impl Default for CaptureCell {
    fn default() -> Self {
        Self::new()
    }
}

/// The two receive-buffer cells shared between the CAN interrupts and the
/// state machine.
pub struct CaptureLayer {
    cells: [CaptureCell; 2],
}

impl CaptureLayer {
    pub const fn new() -> Self {
        Self {
            cells: [CaptureCell::new(), CaptureCell::new()],
        }
    }

    pub fn cell(&self, buffer: RxBuffer) -> &CaptureCell {
        &self.cells[buffer.as_index()]
    }

    /// Receive-interrupt body: pull the frame from the driver and publish it.
    pub fn on_rx<R: CanReceive>(&self, buffer: RxBuffer, driver: &mut R) {
        self.record(buffer, driver.receive(buffer));
    }

    /// Publishes a received frame, or clears the buffer when the read failed.
    pub fn record(&self, buffer: RxBuffer, frame: Option<CanFrame>) {
        let cell = self.cell(buffer);
        match frame {
            Some(frame) => cell.publish(&frame),
            None => cell.discard(),
        }
    }

    /// Takes the next frame in fixed buffer priority order.
    pub fn take_next(&self) -> Option<(RxBuffer, CanFrame)> {
        RxBuffer::ALL
            .into_iter()
            .find_map(|buffer| self.cell(buffer).take().map(|frame| (buffer, frame)))
    }
}

impl Default for CaptureLayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: u32, payload: &[u8]) -> CanFrame {
        CanFrame::new(id, payload).expect("test frame")
    }

    #[test]
    fn empty_cell_has_nothing_pending() {
        let cell = CaptureCell::new();
        assert!(!cell.is_pending());
        assert_eq!(cell.take(), None);
    }

    #[test]
    fn newest_frame_wins_until_consumed() {
        let cell = CaptureCell::new();
        cell.publish(&frame(0x608, &[1, 2, 3]));
        cell.publish(&frame(0x609, &[4]));
        cell.publish(&frame(0x60A, &[5, 6]));

        assert!(cell.is_pending());
        assert_eq!(cell.take(), Some(frame(0x60A, &[5, 6])));
        assert!(!cell.is_pending());
        assert_eq!(cell.take(), None);
    }

    #[test]
    fn failed_read_discards_unconsumed_frame() {
        let layer = CaptureLayer::new();
        layer.record(RxBuffer::Rx1, Some(frame(0x608, &[9])));
        layer.record(RxBuffer::Rx1, None);

        assert!(!layer.cell(RxBuffer::Rx1).is_pending());
        assert_eq!(layer.take_next(), None);
    }

    #[test]
    fn publish_after_discard_is_pending_again() {
        let cell = CaptureCell::new();
        cell.discard();
        cell.publish(&frame(0x780, &[]));
        assert_eq!(cell.take(), Some(CanFrame::empty(0x780)));
    }

    #[test]
    fn buffer_zero_drains_before_buffer_one() {
        let layer = CaptureLayer::new();
        layer.record(RxBuffer::Rx1, Some(frame(0x608, &[1])));
        layer.record(RxBuffer::Rx0, Some(CanFrame::empty(0x780)));

        assert_eq!(
            layer.take_next(),
            Some((RxBuffer::Rx0, CanFrame::empty(0x780)))
        );
        assert_eq!(
            layer.take_next(),
            Some((RxBuffer::Rx1, frame(0x608, &[1])))
        );
        assert_eq!(layer.take_next(), None);
    }

    struct ScriptedDriver {
        next: Option<CanFrame>,
    }

    impl CanReceive for ScriptedDriver {
        fn receive(&mut self, _: RxBuffer) -> Option<CanFrame> {
            self.next.take()
        }
    }

    #[test]
    fn on_rx_pulls_from_driver() {
        let layer = CaptureLayer::new();
        let mut driver = ScriptedDriver {
            next: Some(frame(0x609, &[7, 7])),
        };

        layer.on_rx(RxBuffer::Rx0, &mut driver);
        assert!(layer.cell(RxBuffer::Rx0).is_pending());
        assert!(!layer.cell(RxBuffer::Rx1).is_pending());

        // The driver has nothing left: the buffer is cleared.
        layer.on_rx(RxBuffer::Rx0, &mut driver);
        assert!(!layer.cell(RxBuffer::Rx0).is_pending());
    }
}
