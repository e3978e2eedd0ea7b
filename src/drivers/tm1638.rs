//! TM1638 LED and 7-segment module, output only

use embedded_hal::digital::v2::OutputPin;

pub const CMD_AUTO_INCREMENT: u8 = 0x40;
pub const CMD_FIXED_ADDRESS: u8 = 0x44;
pub const CMD_SET_ADDRESS: u8 = 0xC0;
pub const CMD_SET_BRIGHTNESS: u8 = 0x80;

/// Display on, pulse width 4/16.
pub const DEFAULT_BRIGHTNESS: u8 = 0x0B;

const SEGMENTS: [u8; 16] = [
    0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x67, 0x77, 0x7C, 0x39, 0x5E, 0x79, 0x71,
];

/// Segment pattern for the low nibble of `value`.
pub fn to_7seg(value: u8) -> u8 {
    SEGMENTS[usize::from(value & 0x0F)]
}

pub struct Tm1638<STB, CLK, DIO> {
    stb: STB,
    clk: CLK,
    dio: DIO,
}

impl<STB, CLK, DIO, E> Tm1638<STB, CLK, DIO>
where
    STB: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
    DIO: OutputPin<Error = E>,
{
    pub fn new(stb: STB, clk: CLK, dio: DIO) -> Self {
        Self { stb, clk, dio }
    }

    /// Idle the bus, switch the display on and blank all 16 registers.
    pub fn init(&mut self) -> Result<(), E> {
        self.stb.set_high()?;
        self.clk.set_low()?;
        self.dio.set_low()?;

        self.send_command(CMD_SET_BRIGHTNESS | DEFAULT_BRIGHTNESS)?;
        self.send_command(CMD_AUTO_INCREMENT)?;

        self.start_data_frame(0)?;
        for _ in 0..16 {
            self.send_data_byte(0x00)?;
        }
        self.end_data_frame()
    }

    pub fn send_command(&mut self, command: u8) -> Result<(), E> {
        self.stb.set_low()?;
        self.send_data_byte(command)?;
        self.stb.set_high()
    }

    pub fn start_data_frame(&mut self, address: u8) -> Result<(), E> {
        self.stb.set_low()?;
        self.send_data_byte(CMD_SET_ADDRESS | (address & 0x0F))
    }

    /// LSB first, DIO sampled on the rising clock.
    pub fn send_data_byte(&mut self, mut data: u8) -> Result<(), E> {
        for _ in 0..8 {
            self.clk.set_low()?;
            if data & 0x01 != 0 {
                self.dio.set_high()?;
            } else {
                self.dio.set_low()?;
            }
            self.clk.set_high()?;
            data >>= 1;
        }
        Ok(())
    }

    pub fn end_data_frame(&mut self) -> Result<(), E> {
        self.stb.set_high()
    }

    /// Raw segments of digit `position` (0..8).
    pub fn set_digit(&mut self, position: u8, segments: u8) -> Result<(), E> {
        self.write_fixed(position.wrapping_mul(2), segments)
    }

    pub fn set_led(&mut self, position: u8, on: bool) -> Result<(), E> {
        self.write_fixed(position.wrapping_mul(2).wrapping_add(1), u8::from(on))
    }

    pub fn release(self) -> (STB, CLK, DIO) {
        (self.stb, self.clk, self.dio)
    }

    fn write_fixed(&mut self, address: u8, data: u8) -> Result<(), E> {
        self.send_command(CMD_FIXED_ADDRESS)?;
        self.start_data_frame(address)?;
        self.send_data_byte(data)?;
        self.end_data_frame()
    }
}
