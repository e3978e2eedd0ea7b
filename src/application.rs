//! Demo application tying the serial link, the displays and the buttons together
//!
//! The receive interrupt only parks messages in an [`Inbox`]; everything that
//! touches a display runs from the main loop.

use heapless::Vec;

use crate::drivers::lcd::{CharLcd, LcdInterface, LCD_COLUMNS};
use crate::gfx::{font, FrameBuffer};
use crate::logger::Truncating;
use crate::protocol::{self, ProtocolError};

pub const REPLY_ACK: &[u8] = b"ACK";
pub const REPLY_ERR: &[u8] = b"ERR";

const MESSAGE_ROW: u8 = 0;
const BUTTON_ROW: u8 = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Received<const N: usize> {
    pub message: Vec<u8, N>,
    pub completed: bool,
}

/// Single-slot mailbox between the receive interrupt and the main loop.
pub struct Inbox<const N: usize> {
    slot: Option<Received<N>>,
}

impl<const N: usize> Inbox<N> {
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Park a message. A message arriving while the slot is still full is
    /// dropped. A truncated message is kept but reported.
    pub fn deliver(&mut self, message: &[u8], completed: bool) -> protocol::Result<()> {
        if self.slot.is_some() {
            return Err(ProtocolError::InboxFull);
        }

        let mut stored = Vec::new();
        for &byte in message.iter().take(N) {
            let _ = stored.push(byte);
        }
        self.slot = Some(Received {
            message: stored,
            completed,
        });

        if completed {
            Ok(())
        } else {
            Err(ProtocolError::Truncated)
        }
    }

    pub fn take(&mut self) -> Option<Received<N>> {
        self.slot.take()
    }

    pub fn is_full(&self) -> bool {
        self.slot.is_some()
    }
}

impl<const N: usize> Default for Inbox<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
pub struct Application {
    messages: u16,
    presses: u16,
}

impl Application {
    pub const fn new() -> Self {
        Self {
            messages: 0,
            presses: 0,
        }
    }

    /// Show a received message on the LCD and in the matrix framebuffer and
    /// pick the reply for the sender.
    pub fn on_message<I, const M: usize, const N: usize>(
        &mut self,
        received: &Received<M>,
        lcd: &mut CharLcd<I>,
        fb: &mut FrameBuffer<N>,
    ) -> &'static [u8]
    where
        I: LcdInterface,
    {
        self.messages = self.messages.wrapping_add(1);

        lcd.print(MESSAGE_ROW, 0, &[b' '; LCD_COLUMNS]);
        lcd.print(MESSAGE_ROW, 0, &received.message[..received.message.len().min(LCD_COLUMNS)]);
        lcd.repaint();

        fb.clear();
        font::draw_text(fb, 0, 0, &received.message);

        if received.completed {
            REPLY_ACK
        } else {
            REPLY_ERR
        }
    }

    /// Count a debounced button report and show it on the last LCD line.
    pub fn on_buttons<I: LcdInterface>(&mut self, mask: u8, lcd: &mut CharLcd<I>) {
        self.presses = self.presses.wrapping_add(1);

        let mut line = Truncating::<LCD_COLUMNS>::new();
        let _ = ufmt::uwrite!(&mut line, "B{} #{}", mask, self.presses);

        lcd.print(BUTTON_ROW, 0, &[b' '; LCD_COLUMNS]);
        lcd.print(BUTTON_ROW, 0, line.as_bytes());
        lcd.repaint();
    }

    pub fn messages(&self) -> u16 {
        self.messages
    }

    pub fn presses(&self) -> u16 {
        self.presses
    }
}
