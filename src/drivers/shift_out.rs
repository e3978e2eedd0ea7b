//! 74HC164 style debug output register

use embedded_hal::digital::v2::OutputPin;

/// Shows a byte on eight LEDs behind a serial-in shift register.
pub struct DebugShiftOut<CLK, DATA> {
    clk: CLK,
    data: DATA,
}

impl<CLK, DATA, E> DebugShiftOut<CLK, DATA>
where
    CLK: OutputPin<Error = E>,
    DATA: OutputPin<Error = E>,
{
    pub fn new(clk: CLK, data: DATA) -> Self {
        Self { clk, data }
    }

    /// Bit 0 is shifted first and ends up on the last output.
    pub fn write(&mut self, mut value: u8) -> Result<(), E> {
        for _ in 0..8 {
            self.clk.set_low()?;
            if value & 0x01 != 0 {
                self.data.set_high()?;
            } else {
                self.data.set_low()?;
            }
            self.clk.set_high()?;
            value >>= 1;
        }
        self.clk.set_low()
    }

    pub fn release(self) -> (CLK, DATA) {
        (self.clk, self.data)
    }
}
