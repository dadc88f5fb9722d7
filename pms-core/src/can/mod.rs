//! CAN frame model, identifier catalog, and driver collaborator traits.
//!
//! The PMS only speaks a handful of fixed standard-identifier messages on the
//! shared vehicle bus. The catalog below is the protocol contract with the BPS
//! and the rest of the car; the driver traits are the narrow surface the core
//! needs from whatever controller sits underneath (two-buffer receive
//! hardware, or FDCAN with identifier routing).

use core::fmt;

/// Largest classic CAN payload.
pub const MAX_PAYLOAD: usize = 8;

/// Battery temperature group 1 published by the BPS.
pub const BPS_TEMPERATURE_1_ID: u32 = 0x608;
/// Battery temperature group 2 published by the BPS.
pub const BPS_TEMPERATURE_2_ID: u32 = 0x609;
/// Battery temperature group 3 published by the BPS.
pub const BPS_TEMPERATURE_3_ID: u32 = 0x60A;
/// Periodic PMS telemetry page.
pub const PMS_DATA_ID: u32 = 0x60E;
/// Brake-light notification emitted on every confirmed brake edge.
pub const BRAKE_LIGHT_ID: u32 = 0x60F;
/// Command instructing the PMS to open the array contactor and latch a trip.
pub const DISCONNECT_ARRAY_ID: u32 = 0x777;
/// Command requesting a horn pulse.
pub const ENABLE_HORN_ID: u32 = 0x780;

/// Direction of a catalogued message relative to the PMS.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// One row of the fixed identifier table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CanIdEntry {
    pub name: &'static str,
    pub id: u32,
    pub len: u8,
    pub direction: Direction,
}

impl CanIdEntry {
    pub const fn new(name: &'static str, id: u32, len: u8, direction: Direction) -> Self {
        Self {
            name,
            id,
            len,
            direction,
        }
    }
}

/// Compile-time catalog of every message the PMS sends or understands.
pub const CAN_ID_TABLE: [CanIdEntry; 7] = [
    CanIdEntry::new("BPS_TEMPERATURE1", BPS_TEMPERATURE_1_ID, 8, Direction::Inbound),
    CanIdEntry::new("BPS_TEMPERATURE2", BPS_TEMPERATURE_2_ID, 8, Direction::Inbound),
    CanIdEntry::new("BPS_TEMPERATURE3", BPS_TEMPERATURE_3_ID, 8, Direction::Inbound),
    CanIdEntry::new("PMS_DATA", PMS_DATA_ID, 8, Direction::Outbound),
    CanIdEntry::new("PMS_BRAKE_LIGHT", BRAKE_LIGHT_ID, 0, Direction::Outbound),
    CanIdEntry::new("COMMAND_PMS_DISCONNECT_ARRAY", DISCONNECT_ARRAY_ID, 0, Direction::Inbound),
    CanIdEntry::new("COMMAND_PMS_ENABLE_HORN", ENABLE_HORN_ID, 0, Direction::Inbound),
];

/// Looks up the catalog entry for an identifier.
pub fn catalog_entry(id: u32) -> Option<&'static CanIdEntry> {
    CAN_ID_TABLE.iter().find(|entry| entry.id == id)
}

/// Meaning of a received identifier, as far as the state machine cares.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InboundMessage {
    DisconnectArray,
    EnableHorn,
    /// Battery temperature telemetry, carrying the group number (1-3).
    BatteryTemperature(u8),
    Unrecognized(u32),
}

impl InboundMessage {
    #[must_use]
    pub const fn classify(id: u32) -> Self {
        match id {
            DISCONNECT_ARRAY_ID => InboundMessage::DisconnectArray,
            ENABLE_HORN_ID => InboundMessage::EnableHorn,
            BPS_TEMPERATURE_1_ID => InboundMessage::BatteryTemperature(1),
            BPS_TEMPERATURE_2_ID => InboundMessage::BatteryTemperature(2),
            BPS_TEMPERATURE_3_ID => InboundMessage::BatteryTemperature(3),
            other => InboundMessage::Unrecognized(other),
        }
    }
}

/// Failure building a frame from raw parts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FrameError {
    PayloadTooLong(usize),
    IdentifierOutOfRange(u32),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::PayloadTooLong(len) => write!(f, "payload of {len} bytes exceeds 8"),
            FrameError::IdentifierOutOfRange(id) => {
                write!(f, "identifier {id:#x} is not a standard 11-bit id")
            }
        }
    }
}

/// Largest standard (11-bit) identifier.
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// A classic CAN data frame with a standard identifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CanFrame {
    id: u32,
    data: [u8; MAX_PAYLOAD],
    len: u8,
}

impl CanFrame {
    /// Builds a frame, rejecting oversized payloads and extended identifiers.
    pub fn new(id: u32, payload: &[u8]) -> Result<Self, FrameError> {
        if id > MAX_STANDARD_ID {
            return Err(FrameError::IdentifierOutOfRange(id));
        }
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLong(payload.len()));
        }

        let mut data = [0; MAX_PAYLOAD];
        data[..payload.len()].copy_from_slice(payload);
        #[allow(clippy::cast_possible_truncation)]
        let len = payload.len() as u8;
        Ok(Self { id, data, len })
    }

    /// Zero-length frame, used for acknowledgements and notifications.
    #[must_use]
    pub const fn empty(id: u32) -> Self {
        Self {
            id,
            data: [0; MAX_PAYLOAD],
            len: 0,
        }
    }

    /// Full eight-byte frame.
    #[must_use]
    pub const fn with_data(id: u32, data: [u8; MAX_PAYLOAD]) -> Self {
        Self {
            id,
            data,
            len: MAX_PAYLOAD as u8,
        }
    }

    /// Rebuilds a frame from raw words, clamping the length to the buffer.
    pub(crate) const fn from_raw(id: u32, data: [u8; MAX_PAYLOAD], len: u8) -> Self {
        let len = if len as usize > MAX_PAYLOAD {
            MAX_PAYLOAD as u8
        } else {
            len
        };
        Self { id, data, len }
    }

    pub const fn id(&self) -> u32 {
        self.id
    }

    pub const fn len(&self) -> u8 {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The valid bytes of the payload.
    pub fn payload(&self) -> &[u8] {
        &self.data[..usize::from(self.len)]
    }

    /// The full eight-byte buffer, including bytes past `len`.
    pub const fn raw_data(&self) -> [u8; MAX_PAYLOAD] {
        self.data
    }

    pub const fn message(&self) -> InboundMessage {
        InboundMessage::classify(self.id)
    }
}

/// Hardware receive buffer a frame was captured from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RxBuffer {
    Rx0,
    Rx1,
}

impl RxBuffer {
    pub const ALL: [RxBuffer; 2] = [RxBuffer::Rx0, RxBuffer::Rx1];

    pub const fn as_index(self) -> usize {
        match self {
            RxBuffer::Rx0 => 0,
            RxBuffer::Rx1 => 1,
        }
    }

    /// Buffer used for an identifier on controllers that expose a single
    /// receive queue. Commands take buffer 0 so they drain first.
    #[must_use]
    pub const fn for_identifier(id: u32) -> Self {
        match InboundMessage::classify(id) {
            InboundMessage::DisconnectArray | InboundMessage::EnableHorn => RxBuffer::Rx0,
            InboundMessage::BatteryTemperature(_) | InboundMessage::Unrecognized(_) => {
                RxBuffer::Rx1
            }
        }
    }
}

/// Header bits passed with every transmitted frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TxOptions {
    pub priority: u8,
    pub extended: bool,
    pub remote: bool,
}

impl TxOptions {
    /// Priority 3, standard identifier, data frame.
    pub const DEFAULT: Self = Self {
        priority: 3,
        extended: false,
        remote: false,
    };
}

impl Default for TxOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Failure reported by the transmit side of the CAN driver.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TransmitError {
    /// No free transmit buffer.
    BufferFull,
    /// The controller is bus-off or otherwise refused the frame.
    Rejected,
}

impl fmt::Display for TransmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransmitError::BufferFull => f.write_str("transmit buffer full"),
            TransmitError::Rejected => f.write_str("frame rejected by controller"),
        }
    }
}

/// Receive side of the CAN driver, called from interrupt context.
pub trait CanReceive {
    /// Pulls the frame that landed in `buffer`, if the controller has one.
    fn receive(&mut self, buffer: RxBuffer) -> Option<CanFrame>;
}

/// Transmit side of the CAN driver, called from the polling loop.
pub trait CanTransmit {
    /// Queues a frame for transmission.
    fn transmit(&mut self, frame: &CanFrame, options: TxOptions) -> Result<(), TransmitError>;

    /// Returns `true` when a transmit buffer is free.
    fn transmit_ready(&self) -> bool;
}
