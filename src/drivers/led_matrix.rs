//! Daisy-chained MAX7219 8x8 LED matrix modules

use embedded_hal::digital::v2::OutputPin;

use crate::gfx::FrameBuffer;

pub const CMD_NO_OP: u8 = 0x00;
pub const CMD_DIGIT_0: u8 = 0x01;
pub const CMD_DECODE_MODE: u8 = 0x09;
pub const CMD_INTENSITY: u8 = 0x0A;
pub const CMD_SCAN_LIMIT: u8 = 0x0B;
pub const CMD_DISPLAY: u8 = 0x0C;
pub const CMD_DISPLAY_TEST: u8 = 0x0F;

pub const DECODE_MODE_NONE: u8 = 0x00;
pub const DISPLAY_ON: u8 = 0x01;
pub const DISPLAY_OFF: u8 = 0x00;

/// Bit-banged MAX7219 chain. Every frame carries one (command, data) pair
/// per module, the first pair ending up in the module furthest down the chain.
pub struct LedMatrix<CLK, DATA, CS> {
    clk: CLK,
    data: DATA,
    cs: CS,
    modules: u8,
}

impl<CLK, DATA, CS, E> LedMatrix<CLK, DATA, CS>
where
    CLK: OutputPin<Error = E>,
    DATA: OutputPin<Error = E>,
    CS: OutputPin<Error = E>,
{
    pub fn new(clk: CLK, data: DATA, cs: CS, modules: u8) -> Self {
        Self {
            clk,
            data,
            cs,
            modules,
        }
    }

    pub fn modules(&self) -> u8 {
        self.modules
    }

    /// No decoding, all eight digits scanned and blanked, display on.
    pub fn init(&mut self) -> Result<(), E> {
        self.broadcast(CMD_DECODE_MODE, DECODE_MODE_NONE)?;
        self.broadcast(CMD_SCAN_LIMIT, 0x07)?;
        for digit in 0..8 {
            self.broadcast(CMD_DIGIT_0 + digit, 0x00)?;
        }
        self.broadcast(CMD_DISPLAY, DISPLAY_ON)
    }

    pub fn set_intensity(&mut self, level: u8) -> Result<(), E> {
        self.broadcast(CMD_INTENSITY, level & 0x0F)
    }

    pub fn start_frame(&mut self) -> Result<(), E> {
        self.clk.set_low()?;
        self.data.set_low()?;
        self.cs.set_low()
    }

    pub fn send(&mut self, command: u8, data: u8) -> Result<(), E> {
        self.send_byte(command)?;
        self.send_byte(data)
    }

    /// Rising CS latches the shifted pairs.
    pub fn end_frame(&mut self) -> Result<(), E> {
        self.cs.set_high()
    }

    /// Copy the framebuffer, one byte per module and row, switching the
    /// display off while the rows change.
    pub fn render<const N: usize>(&mut self, fb: &FrameBuffer<N>) -> Result<(), E> {
        self.broadcast(CMD_DISPLAY, DISPLAY_OFF)?;

        let mut bytes = fb.as_bytes().iter().copied();
        for row in 0..8 {
            self.start_frame()?;
            for _ in 0..self.modules {
                self.send(CMD_DIGIT_0 + row, bytes.next().unwrap_or(0))?;
            }
            self.end_frame()?;
        }

        self.broadcast(CMD_DISPLAY, DISPLAY_ON)
    }

    pub fn release(self) -> (CLK, DATA, CS) {
        (self.clk, self.data, self.cs)
    }

    fn broadcast(&mut self, command: u8, data: u8) -> Result<(), E> {
        self.start_frame()?;
        for _ in 0..self.modules {
            self.send(command, data)?;
        }
        self.end_frame()
    }

    fn send_byte(&mut self, mut byte: u8) -> Result<(), E> {
        for _ in 0..8 {
            self.clk.set_low()?;
            if byte & 0x80 != 0 {
                self.data.set_high()?;
            } else {
                self.data.set_low()?;
            }
            self.clk.set_high()?;
            byte <<= 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PinEvent, PinLog, RecordingPin};

    fn matrix(log: &PinLog, modules: u8) -> LedMatrix<RecordingPin, RecordingPin, RecordingPin> {
        LedMatrix::new(log.pin("clk"), log.pin("data"), log.pin("cs"), modules)
    }

    fn frames(log: &PinLog) -> Vec<Vec<u8>> {
        log.frames("clk", "data", "cs", true)
    }

    #[test]
    fn test_send_is_msb_first() {
        let log = PinLog::new();
        let mut m = matrix(&log, 1);
        m.start_frame().unwrap();
        m.send(0x0A, 0x81).unwrap();
        m.end_frame().unwrap();

        assert_eq!(frames(&log), vec![vec![0x0A, 0x81]]);
        assert_eq!(log.count(PinEvent::High("clk")), 16);
    }

    #[test]
    fn test_init_frames() {
        let log = PinLog::new();
        let mut m = matrix(&log, 2);
        m.init().unwrap();

        let frames = frames(&log);
        assert_eq!(frames.len(), 11);
        assert_eq!(frames[0], vec![0x09, 0x00, 0x09, 0x00]);
        assert_eq!(frames[1], vec![0x0B, 0x07, 0x0B, 0x07]);
        for digit in 0..8u8 {
            assert_eq!(frames[2 + digit as usize], vec![digit + 1, 0, digit + 1, 0]);
        }
        assert_eq!(frames[10], vec![0x0C, 0x01, 0x0C, 0x01]);
    }

    #[test]
    fn test_render_rows() {
        let log = PinLog::new();
        let mut m = matrix(&log, 2);
        let mut fb = FrameBuffer::<16>::new(16, 8);
        fb.set_pixel(0, 0, true);
        fb.set_pixel(15, 0, true);
        fb.set_pixel(8, 7, true);

        m.render(&fb).unwrap();

        let frames = frames(&log);
        assert_eq!(frames.len(), 10);
        assert_eq!(frames[0], vec![0x0C, 0x00, 0x0C, 0x00]);
        assert_eq!(frames[1], vec![0x01, 0x80, 0x01, 0x01]);
        assert_eq!(frames[4], vec![0x04, 0x00, 0x04, 0x00]);
        assert_eq!(frames[8], vec![0x08, 0x00, 0x08, 0x80]);
        assert_eq!(frames[9], vec![0x0C, 0x01, 0x0C, 0x01]);
    }

    #[test]
    fn test_intensity_is_masked() {
        let log = PinLog::new();
        let mut m = matrix(&log, 1);
        m.set_intensity(0x1F).unwrap();
        assert_eq!(frames(&log), vec![vec![0x0A, 0x0F]]);
    }
}
