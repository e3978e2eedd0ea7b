//! Line-framed serial protocol

pub mod transport;

pub use transport::{LinkStats, MessageHandler, SerialLink, UsartPort};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// The message filled the receive buffer before a terminator arrived
    Truncated,
    /// The previous message has not been picked up yet
    InboxFull,
}

pub type Result<T> = core::result::Result<T, ProtocolError>;

/// Bytes that end an inbound message
#[inline]
pub fn is_terminator(byte: u8) -> bool {
    matches!(byte, 0x00 | b'\r' | b'\n')
}
