//! Wire-level packet type catalog.
//!
//! Only the subset of the Gearman binary protocol this endpoint needs to
//! recognize is modeled here. Anything else decodes to [`PacketType::Unknown`],
//! which the packet router treats as a protocol violation.

/// Packet type codes, as carried in the 12-byte Gearman frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    JobCreated,
    NoJob,
    JobAssign,
    WorkStatus,
    WorkComplete,
    WorkFail,
    OptionRes,
    Error,
    Noop,
    WorkException,
    /// Any type code this endpoint does not handle.
    Unknown(u32),
}

impl PacketType {
    pub fn from_code(code: u32) -> Self {
        match code {
            8 => Self::JobCreated,
            10 => Self::NoJob,
            11 => Self::JobAssign,
            12 => Self::WorkStatus,
            13 => Self::WorkComplete,
            14 => Self::WorkFail,
            19 => Self::Error,
            6 => Self::Noop,
            25 => Self::WorkException,
            27 => Self::OptionRes,
            other => Self::Unknown(other),
        }
    }
}

/// A decoded response packet: its type and raw argument payload.
#[derive(Debug, Clone)]
pub struct Packet {
    pub kind: PacketType,
    pub payload: Vec<u8>,
}

impl Packet {
    /// Split a `\0`-joined payload into its arguments.
    pub fn args(&self) -> Vec<&[u8]> {
        self.payload.split(|b| *b == 0).collect()
    }
}
