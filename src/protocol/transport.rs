//! Interrupt-driven framed USART transport
//!
//! Inbound bytes are collected until a NUL, CR or LF and handed to a
//! [`MessageHandler`] from the receive interrupt. Outbound messages are sent one
//! at a time: `send` copies the payload, appends LF, writes the first byte and
//! arms the data-register-empty interrupt, which drains the rest.

use core::convert::Infallible;

use heapless::Vec;

use super::{is_terminator, Result};

/// Register access the transport needs from a USART.
pub trait UsartPort {
    fn write_data(&mut self, byte: u8);
    fn enable_drain_interrupt(&mut self);
    fn disable_drain_interrupt(&mut self);
}

/// Receives each framed inbound message.
///
/// Called from the receive interrupt: implementations must return quickly and
/// must not call `send` on the link. The slice is only valid for the call.
/// `completed` is false when the buffer filled up before a terminator.
pub trait MessageHandler {
    fn handle(&mut self, message: &[u8], completed: bool) -> Result<()>;
}

impl<F> MessageHandler for F
where
    F: FnMut(&[u8], bool) -> Result<()>,
{
    fn handle(&mut self, message: &[u8], completed: bool) -> Result<()> {
        self(message, completed)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub messages: u16,
    pub truncated: u16,
    pub handler_errors: u16,
    pub rejected_sends: u16,
}

pub struct SerialLink<P, H, const RX: usize, const TX: usize> {
    port: P,
    handler: H,
    rx: Vec<u8, RX>,
    tx: Vec<u8, TX>,
    // payload plus the LF terminator, zero while idle
    tx_size: usize,
    tx_pos: usize,
    stats: LinkStats,
}

impl<P, H, const RX: usize, const TX: usize> SerialLink<P, H, RX, TX>
where
    P: UsartPort,
    H: MessageHandler,
{
    pub fn new(port: P, handler: H) -> Self {
        Self {
            port,
            handler,
            rx: Vec::new(),
            tx: Vec::new(),
            tx_size: 0,
            tx_pos: 0,
            stats: LinkStats::default(),
        }
    }

    /// Receive interrupt body.
    pub fn on_receive(&mut self, byte: u8) {
        if is_terminator(byte) {
            self.dispatch(true);
        } else if self.rx.is_full() {
            self.dispatch(false);
            // the byte that did not fit opens the next message
            let _ = self.rx.push(byte);
        } else {
            let _ = self.rx.push(byte);
        }
    }

    fn dispatch(&mut self, completed: bool) {
        if completed {
            self.stats.messages = self.stats.messages.wrapping_add(1);
        } else {
            self.stats.truncated = self.stats.truncated.wrapping_add(1);
        }
        if self.handler.handle(&self.rx, completed).is_err() {
            self.stats.handler_errors = self.stats.handler_errors.wrapping_add(1);
        }
        self.rx.clear();
    }

    /// Queue one message for transmission.
    ///
    /// Copies at most `TX` bytes, stopping at a NUL, and appends LF. Fails with
    /// `WouldBlock` without touching the buffer while a message is still
    /// draining. An empty payload is accepted and sends nothing.
    pub fn send(&mut self, message: &[u8]) -> nb::Result<(), Infallible> {
        if self.is_busy() {
            self.stats.rejected_sends = self.stats.rejected_sends.wrapping_add(1);
            return Err(nb::Error::WouldBlock);
        }

        self.tx.clear();
        for &byte in message.iter().take_while(|&&b| b != 0) {
            if self.tx.push(byte).is_err() {
                break;
            }
        }
        if self.tx.is_empty() {
            return Ok(());
        }

        self.tx_size = self.tx.len() + 1;
        self.tx_pos = 0;
        self.port.enable_drain_interrupt();

        // Prime the register now instead of waiting a drain cycle
        let first = self.byte_at(self.tx_pos);
        self.tx_pos += 1;
        self.port.write_data(first);
        Ok(())
    }

    /// Data-register-empty interrupt body.
    pub fn on_data_register_empty(&mut self) {
        if self.tx_pos >= self.tx_size {
            self.port.disable_drain_interrupt();
            self.tx_pos = 0;
            self.tx_size = 0;
        } else {
            let byte = self.byte_at(self.tx_pos);
            self.tx_pos += 1;
            self.port.write_data(byte);
        }
    }

    fn byte_at(&self, pos: usize) -> u8 {
        self.tx.get(pos).copied().unwrap_or(b'\n')
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.tx_size > 0
    }

    /// Bytes of the message currently being received.
    pub fn rx_pending(&self) -> usize {
        self.rx.len()
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}
