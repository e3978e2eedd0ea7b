//! SSD1306 128x64 OLED in horizontal addressing mode, text in a 6x8 grid

use embedded_hal::blocking::i2c::Write;

use crate::gfx::font::glyph;

pub const I2C_ADDRESS: u8 = 0x3C;

pub const CONTROL_ONE_COMMAND: u8 = 0x00;
pub const CONTROL_MULTIPLE_COMMANDS: u8 = 0x80;
pub const CONTROL_ONE_DATA: u8 = 0x40;
pub const CONTROL_MULTIPLE_DATA: u8 = 0xC0;

pub const SET_CONTRAST: u8 = 0x81;
pub const DISPLAY_ALL_ON_RESUME: u8 = 0xA4;
pub const NORMAL_DISPLAY: u8 = 0xA6;
pub const DISPLAY_OFF: u8 = 0xAE;
pub const DISPLAY_ON: u8 = 0xAF;
pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
pub const SET_COM_PINS: u8 = 0xDA;
pub const SET_VCOM_DETECT: u8 = 0xDB;
pub const SET_DISPLAY_CLOCK_DIV: u8 = 0xD5;
pub const SET_PRECHARGE: u8 = 0xD9;
pub const SET_MULTIPLEX: u8 = 0xA8;
pub const SET_START_LINE: u8 = 0x40;
pub const MEMORY_MODE: u8 = 0x20;
pub const COLUMN_ADDR: u8 = 0x21;
pub const PAGE_ADDR: u8 = 0x22;
pub const COM_SCAN_INC: u8 = 0xC0;
pub const CHARGE_PUMP: u8 = 0x8D;

pub const WIDTH: u8 = 128;
pub const HEIGHT: u8 = 64;
pub const PAGES: u8 = HEIGHT / 8;
pub const GLYPH_WIDTH: u8 = 6;

/// Control/value pairs per I2C transaction.
const MAX_PAIRS: usize = 16;

const INIT_SEQUENCE: [u8; 24] = [
    DISPLAY_OFF,
    SET_DISPLAY_CLOCK_DIV,
    0x80,
    SET_MULTIPLEX,
    HEIGHT - 1,
    SET_DISPLAY_OFFSET,
    0x00,
    SET_START_LINE,
    COM_SCAN_INC,
    CHARGE_PUMP,
    0x14,
    MEMORY_MODE,
    0x00,
    SET_COM_PINS,
    0x12,
    SET_CONTRAST,
    0x5F,
    SET_PRECHARGE,
    0xF1,
    SET_VCOM_DETECT,
    0x20,
    DISPLAY_ALL_ON_RESUME,
    NORMAL_DISPLAY,
    DISPLAY_ON,
];

pub struct Ssd1306<I> {
    i2c: I,
}

impl<I: Write> Ssd1306<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    pub fn release(self) -> I {
        self.i2c
    }

    pub fn init(&mut self) -> Result<(), I::Error> {
        self.send_multiple_commands(&INIT_SEQUENCE)
    }

    pub fn send_single_command(&mut self, command: u8) -> Result<(), I::Error> {
        self.i2c.write(I2C_ADDRESS, &[CONTROL_ONE_COMMAND, command])
    }

    pub fn send_multiple_commands(&mut self, commands: &[u8]) -> Result<(), I::Error> {
        self.send_pairs(CONTROL_MULTIPLE_COMMANDS, CONTROL_ONE_COMMAND, commands)
    }

    /// Use the whole panel as the drawing window.
    pub fn setup_gdram(&mut self) -> Result<(), I::Error> {
        self.send_multiple_commands(&[COLUMN_ADDR, 0, WIDTH - 1])?;
        self.send_multiple_commands(&[PAGE_ADDR, 0, PAGES - 1])
    }

    pub fn send_single_data(&mut self, data: u8) -> Result<(), I::Error> {
        self.i2c.write(I2C_ADDRESS, &[CONTROL_ONE_DATA, data])
    }

    pub fn send_multiple_data(&mut self, data: &[u8]) -> Result<(), I::Error> {
        self.send_pairs(CONTROL_MULTIPLE_DATA, CONTROL_ONE_DATA, data)
    }

    /// Start writing at page `bank`, pixel column `column`.
    pub fn set_bank_col_pos(&mut self, bank: u8, column: u8) -> Result<(), I::Error> {
        self.send_multiple_commands(&[PAGE_ADDR, bank, PAGES - 1, COLUMN_ADDR, column, WIDTH - 1])
    }

    pub fn clear_display(&mut self) -> Result<(), I::Error> {
        self.set_bank_col_pos(0, 0)?;
        let zeros = [0u8; MAX_PAIRS];
        for _ in 0..(usize::from(WIDTH) * usize::from(PAGES) / MAX_PAIRS) {
            self.send_multiple_data(&zeros)?;
        }
        Ok(())
    }

    /// One blank column, then the glyph.
    pub fn print_char(&mut self, c: u8) -> Result<(), I::Error> {
        let mut columns = [0u8; GLYPH_WIDTH as usize];
        columns[1..].copy_from_slice(glyph(c));
        self.send_multiple_data(&columns)
    }

    /// Move to text cell (row, column) of the 6x8 grid.
    pub fn set_cursor_pos(&mut self, row: u8, column: u8) -> Result<(), I::Error> {
        self.set_bank_col_pos(row, column.wrapping_mul(GLYPH_WIDTH))
    }

    pub fn print(&mut self, text: &[u8]) -> Result<(), I::Error> {
        for &c in text.iter().take_while(|&&c| c != 0) {
            self.print_char(c)?;
        }
        Ok(())
    }

    fn send_pairs(&mut self, more: u8, last: u8, values: &[u8]) -> Result<(), I::Error> {
        let mut buffer = [0u8; 2 * MAX_PAIRS];
        for chunk in values.chunks(MAX_PAIRS) {
            for (i, &value) in chunk.iter().enumerate() {
                buffer[2 * i] = if i + 1 == chunk.len() { last } else { more };
                buffer[2 * i + 1] = value;
            }
            self.i2c.write(I2C_ADDRESS, &buffer[..2 * chunk.len()])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::i2c::{Mock, Transaction};
    use embedded_hal_mock::MockError;
    use std::io::ErrorKind;

    fn pairs(more: u8, last: u8, values: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for (i, &v) in values.iter().enumerate() {
            bytes.push(if i + 1 == values.len() { last } else { more });
            bytes.push(v);
        }
        bytes
    }

    fn run(expectations: &[Transaction], f: impl FnOnce(&mut Ssd1306<Mock>)) {
        let mut oled = Ssd1306::new(Mock::new(expectations));
        f(&mut oled);
        oled.release().done();
    }

    #[test]
    fn test_single_command_and_data() {
        run(
            &[
                Transaction::write(0x3C, vec![0x00, 0xAF]),
                Transaction::write(0x3C, vec![0x40, 0x55]),
            ],
            |oled| {
                oled.send_single_command(DISPLAY_ON).unwrap();
                oled.send_single_data(0x55).unwrap();
            },
        );
    }

    #[test]
    fn test_init_is_split_into_transactions() {
        run(
            &[
                Transaction::write(0x3C, pairs(0x80, 0x00, &INIT_SEQUENCE[..16])),
                Transaction::write(0x3C, pairs(0x80, 0x00, &INIT_SEQUENCE[16..])),
            ],
            |oled| oled.init().unwrap(),
        );
        assert_eq!(INIT_SEQUENCE[4], 0x3F);
    }

    #[test]
    fn test_bank_and_cursor_position() {
        run(
            &[
                Transaction::write(
                    0x3C,
                    vec![0x80, 0x22, 0x80, 0x02, 0x80, 0x07, 0x80, 0x21, 0x80, 0x0C, 0x00, 0x7F],
                ),
                Transaction::write(
                    0x3C,
                    vec![0x80, 0x22, 0x80, 0x01, 0x80, 0x07, 0x80, 0x21, 0x80, 0x12, 0x00, 0x7F],
                ),
            ],
            |oled| {
                oled.set_bank_col_pos(2, 12).unwrap();
                oled.set_cursor_pos(1, 3).unwrap();
            },
        );
    }

    #[test]
    fn test_setup_gdram() {
        run(
            &[
                Transaction::write(0x3C, vec![0x80, 0x21, 0x80, 0x00, 0x00, 0x7F]),
                Transaction::write(0x3C, vec![0x80, 0x22, 0x80, 0x00, 0x00, 0x07]),
            ],
            |oled| oled.setup_gdram().unwrap(),
        );
    }

    #[test]
    fn test_print_stops_at_nul() {
        let a = vec![0xC0, 0x00, 0xC0, 0x7C, 0xC0, 0x12, 0xC0, 0x11, 0xC0, 0x12, 0x40, 0x7C];
        run(&[Transaction::write(0x3C, a)], |oled| {
            oled.print(b"A\0B").unwrap()
        });
    }

    #[test]
    fn test_unprintable_renders_caret() {
        run(
            &[Transaction::write(
                0x3C,
                pairs(0xC0, 0x40, &[0x00, 0xFF, 0x81, 0x81, 0x81, 0xFF]),
            )],
            |oled| oled.print_char(0x07).unwrap(),
        );
    }

    #[test]
    fn test_clear_display_sends_full_ram() {
        let mut expectations = vec![Transaction::write(
            0x3C,
            pairs(0x80, 0x00, &[0x22, 0, 7, 0x21, 0, 127]),
        )];
        for _ in 0..64 {
            expectations.push(Transaction::write(0x3C, pairs(0xC0, 0x40, &[0; 16])));
        }
        run(&expectations, |oled| oled.clear_display().unwrap());
    }

    #[test]
    fn test_empty_list_sends_nothing() {
        run(&[], |oled| {
            oled.send_multiple_commands(&[]).unwrap();
            oled.send_multiple_data(&[]).unwrap();
        });
    }

    #[test]
    fn test_bus_error_stops_the_sequence() {
        let expectations = [Transaction::write(0x3C, pairs(0x80, 0x00, &INIT_SEQUENCE[..16]))
            .with_error(MockError::Io(ErrorKind::Other))];
        let mut oled = Ssd1306::new(Mock::new(&expectations));
        assert!(oled.init().is_err());
        oled.release().done();
    }
}
