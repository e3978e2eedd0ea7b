//! HB10401 character LCD (4 lines of 10) on a 4 bit HD44780-style bus
//!
//! Text goes into a video buffer first. [`CharLcd::poll`] copies the buffer to
//! the controller one transfer per call, and only once the controller has had
//! its settle time, so the main loop never waits on the display.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::digital::v2::OutputPin;

use crate::config::LCD_DISP_WAIT;
use crate::os::{is_after, TaskTimer};

pub const LCD_COLUMNS: usize = 10;
pub const LCD_ROWS: usize = 4;
pub const LCD_BUFFER_LEN: usize = LCD_COLUMNS * LCD_ROWS;

const LINE_ADDRESSES: [u8; LCD_ROWS] = [0x00, 0x40, 0x0A, 0x4A];

pub const COMMAND_CLEAR: u8 = 0x01;
pub const COMMAND_HOME: u8 = 0x02;
pub const COMMAND_ENTRYMODE: u8 = 0x04;
pub const COMMAND_DISPONOFF: u8 = 0x08;
pub const COMMAND_FNSET: u8 = 0x20;
pub const COMMAND_SET_DDRAM: u8 = 0x80;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    Command,
    Data,
}

/// Nibble-level access to the controller.
pub trait LcdInterface {
    type Error;

    fn select(&mut self, register: Register) -> Result<(), Self::Error>;

    /// Put the upper four bits of `nibble` on D7..D4 and strobe EN.
    fn write_nibble(&mut self, nibble: u8) -> Result<(), Self::Error>;

    fn command(&mut self, command: u8) -> Result<(), Self::Error> {
        self.select(Register::Command)?;
        self.write_nibble(command)?;
        self.write_nibble(command << 4)
    }

    fn data(&mut self, data: u8) -> Result<(), Self::Error> {
        self.select(Register::Data)?;
        self.write_nibble(data)?;
        self.write_nibble(data << 4)
    }
}

/// The 4 bit parallel bus: RS, EN and D4..D7 on plain output pins.
pub struct ParallelBus<RS, EN, D4, D5, D6, D7> {
    rs: RS,
    en: EN,
    d4: D4,
    d5: D5,
    d6: D6,
    d7: D7,
}

impl<RS, EN, D4, D5, D6, D7, E> ParallelBus<RS, EN, D4, D5, D6, D7>
where
    RS: OutputPin<Error = E>,
    EN: OutputPin<Error = E>,
    D4: OutputPin<Error = E>,
    D5: OutputPin<Error = E>,
    D6: OutputPin<Error = E>,
    D7: OutputPin<Error = E>,
{
    pub fn new(rs: RS, en: EN, d4: D4, d5: D5, d6: D6, d7: D7) -> Self {
        Self { rs, en, d4, d5, d6, d7 }
    }

    pub fn release(self) -> (RS, EN, D4, D5, D6, D7) {
        (self.rs, self.en, self.d4, self.d5, self.d6, self.d7)
    }
}

fn set<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), P::Error> {
    if high {
        pin.set_high()
    } else {
        pin.set_low()
    }
}

impl<RS, EN, D4, D5, D6, D7, E> LcdInterface for ParallelBus<RS, EN, D4, D5, D6, D7>
where
    RS: OutputPin<Error = E>,
    EN: OutputPin<Error = E>,
    D4: OutputPin<Error = E>,
    D5: OutputPin<Error = E>,
    D6: OutputPin<Error = E>,
    D7: OutputPin<Error = E>,
{
    type Error = E;

    fn select(&mut self, register: Register) -> Result<(), E> {
        set(&mut self.rs, register == Register::Data)
    }

    fn write_nibble(&mut self, nibble: u8) -> Result<(), E> {
        self.en.set_high()?;
        set(&mut self.d7, nibble & 0x80 != 0)?;
        set(&mut self.d6, nibble & 0x40 != 0)?;
        set(&mut self.d5, nibble & 0x20 != 0)?;
        set(&mut self.d4, nibble & 0x10 != 0)?;
        // the controller latches on the falling edge
        self.en.set_low()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepaintStatus {
    Running,
    Idle,
}

/// Progress of a repaint pass. `since` is the timer value of the last transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Repaint {
    Idle,
    Positioned { line: u8, since: u16 },
    Emitted { pos: u8, since: u16 },
}

pub struct CharLcd<I> {
    interface: I,
    video: [u8; LCD_BUFFER_LEN],
    repaint_requested: bool,
    state: Repaint,
    settle_ticks: u16,
}

impl<I: LcdInterface> CharLcd<I> {
    pub fn new(interface: I) -> Self {
        Self {
            interface,
            video: [b' '; LCD_BUFFER_LEN],
            repaint_requested: false,
            state: Repaint::Idle,
            settle_ticks: LCD_DISP_WAIT,
        }
    }

    pub fn with_settle_ticks(mut self, ticks: u16) -> Self {
        self.settle_ticks = ticks;
        self
    }

    /// Power-on initialisation into 4 bit mode, blocking on `delay`.
    pub fn setup<D>(&mut self, delay: &mut D) -> Result<(), I::Error>
    where
        D: DelayMs<u8> + DelayUs<u8>,
    {
        delay.delay_ms(20);
        self.interface.select(Register::Command)?;
        self.clear();

        // three times 8 bit mode so the controller syncs whatever state it is in
        self.interface.write_nibble(0x30)?;
        delay.delay_ms(6);
        self.interface.write_nibble(0x30)?;
        delay.delay_ms(1);
        self.interface.write_nibble(0x30)?;
        delay.delay_ms(1);

        self.interface.write_nibble(COMMAND_FNSET)?;
        delay.delay_us(50);

        // 4 bit, 2 line mode
        self.interface.command(COMMAND_FNSET | 0x08)?;
        delay.delay_us(37);
        // display on, cursor off
        self.interface.command(COMMAND_DISPONOFF | 0x04)?;
        delay.delay_us(37);
        self.interface.command(COMMAND_CLEAR)?;
        delay.delay_ms(50);

        self.interface.command(COMMAND_SET_DDRAM | LINE_ADDRESSES[0])?;
        delay.delay_us(37);
        self.set_position(0, 0)?;
        delay.delay_us(37);
        Ok(())
    }

    /// Move the controller cursor. Rows past the last line are ignored.
    pub fn set_position(&mut self, row: u8, column: u8) -> Result<(), I::Error> {
        match LINE_ADDRESSES.get(usize::from(row)) {
            Some(&address) => self
                .interface
                .command(COMMAND_SET_DDRAM | address.wrapping_add(column)),
            None => Ok(()),
        }
    }

    /// Copy `text` into the video buffer from (row, column) on, stopping at a
    /// NUL or the end of the buffer. Text runs on into the next line.
    /// Nothing is shown before [`repaint`](Self::repaint).
    pub fn print(&mut self, row: u8, column: u8, text: &[u8]) {
        let start = usize::from(row) * LCD_COLUMNS + usize::from(column);
        if start >= LCD_BUFFER_LEN {
            return;
        }
        for (slot, &c) in self.video[start..]
            .iter_mut()
            .zip(text.iter().take_while(|&&c| c != 0))
        {
            *slot = c;
        }
    }

    pub fn clear(&mut self) {
        self.video = [b' '; LCD_BUFFER_LEN];
    }

    /// Ask for the video buffer to be sent. Requests during a pass start one
    /// more pass after it.
    pub fn repaint(&mut self) {
        self.repaint_requested = true;
    }

    pub fn is_repainting(&self) -> bool {
        self.state != Repaint::Idle
    }

    pub fn video_buffer(&self) -> &[u8; LCD_BUFFER_LEN] {
        &self.video
    }

    pub fn interface(&self) -> &I {
        &self.interface
    }

    /// Advance the repaint by at most one transfer.
    pub fn poll<T: TaskTimer>(&mut self, timer: &T) -> Result<RepaintStatus, I::Error> {
        let (next, since) = match self.state {
            Repaint::Idle => {
                if !self.repaint_requested {
                    return Ok(RepaintStatus::Idle);
                }
                self.repaint_requested = false;
                self.set_position(0, 0)?;
                self.state = Repaint::Positioned {
                    line: 0,
                    since: timer.now(),
                };
                return Ok(RepaintStatus::Running);
            }
            Repaint::Positioned { line, since } => (usize::from(line) * LCD_COLUMNS, since),
            Repaint::Emitted { pos, since } => (usize::from(pos) + 1, since),
        };

        if !is_after(since, self.settle_ticks, timer.now(), T::OVERFLOW) {
            return Ok(RepaintStatus::Running);
        }

        let after_char = matches!(self.state, Repaint::Emitted { .. });
        if after_char && next >= LCD_BUFFER_LEN {
            self.state = Repaint::Idle;
            return Ok(RepaintStatus::Idle);
        }

        self.state = if after_char && next % LCD_COLUMNS == 0 {
            let line = (next / LCD_COLUMNS) as u8;
            self.set_position(line, 0)?;
            Repaint::Positioned {
                line,
                since: timer.now(),
            }
        } else {
            self.interface.data(self.video[next])?;
            Repaint::Emitted {
                pos: next as u8,
                since: timer.now(),
            }
        };
        Ok(RepaintStatus::Running)
    }
}
