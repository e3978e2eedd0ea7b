use core::convert::Infallible;
use core::marker::PhantomData;

use avr_device::attiny1614::{PORTA, PORTB, PORTC};
use embedded_hal::digital::v2::{InputPin, OutputPin};

pub trait PinMode {}
pub struct Input;
pub struct Output;
impl PinMode for Input {}
impl PinMode for Output {}

const PULLUPEN: u8 = 0x08;

#[derive(Debug)]
pub struct Pin<PORT, const PIN: u8, MODE> {
    _port: PhantomData<PORT>,
    _mode: PhantomData<MODE>,
}

// Pins come out of reset as inputs
impl<PORT, const P: u8> Default for Pin<PORT, P, Input> {
    fn default() -> Self {
        Pin {
            _port: PhantomData,
            _mode: PhantomData,
        }
    }
}

macro_rules! impl_port {
    ($PORT:ident) => {
        impl<const P: u8, MODE: PinMode> Pin<$PORT, P, MODE> {
            pub fn into_output(self) -> Pin<$PORT, P, Output> {
                unsafe {
                    (*$PORT::ptr()).dirset.write(|w| w.bits(1 << P));
                }
                Pin {
                    _port: PhantomData,
                    _mode: PhantomData,
                }
            }

            pub fn into_input(self) -> Pin<$PORT, P, Input> {
                unsafe {
                    (*$PORT::ptr()).dirclr.write(|w| w.bits(1 << P));
                }
                Self::set_pullup(false);
                Pin {
                    _port: PhantomData,
                    _mode: PhantomData,
                }
            }

            pub fn into_pull_up_input(self) -> Pin<$PORT, P, Input> {
                unsafe {
                    (*$PORT::ptr()).dirclr.write(|w| w.bits(1 << P));
                }
                Self::set_pullup(true);
                Pin {
                    _port: PhantomData,
                    _mode: PhantomData,
                }
            }

            fn set_pullup(enabled: bool) {
                let update = |bits: u8| {
                    if enabled {
                        bits | PULLUPEN
                    } else {
                        bits & !PULLUPEN
                    }
                };
                unsafe {
                    let port = &*$PORT::ptr();
                    match P {
                        0 => port.pin0ctrl.modify(|r, w| w.bits(update(r.bits()))),
                        1 => port.pin1ctrl.modify(|r, w| w.bits(update(r.bits()))),
                        2 => port.pin2ctrl.modify(|r, w| w.bits(update(r.bits()))),
                        3 => port.pin3ctrl.modify(|r, w| w.bits(update(r.bits()))),
                        4 => port.pin4ctrl.modify(|r, w| w.bits(update(r.bits()))),
                        5 => port.pin5ctrl.modify(|r, w| w.bits(update(r.bits()))),
                        6 => port.pin6ctrl.modify(|r, w| w.bits(update(r.bits()))),
                        _ => port.pin7ctrl.modify(|r, w| w.bits(update(r.bits()))),
                    }
                }
            }
        }

        impl<const P: u8> OutputPin for Pin<$PORT, P, Output> {
            type Error = Infallible;

            #[inline]
            fn set_high(&mut self) -> Result<(), Self::Error> {
                unsafe {
                    (*$PORT::ptr()).outset.write(|w| w.bits(1 << P));
                }
                Ok(())
            }

            #[inline]
            fn set_low(&mut self) -> Result<(), Self::Error> {
                unsafe {
                    (*$PORT::ptr()).outclr.write(|w| w.bits(1 << P));
                }
                Ok(())
            }
        }

        impl<const P: u8> InputPin for Pin<$PORT, P, Input> {
            type Error = Infallible;

            #[inline]
            fn is_high(&self) -> Result<bool, Self::Error> {
                Ok(unsafe { (*$PORT::ptr()).in_.read().bits() } & (1 << P) != 0)
            }

            #[inline]
            fn is_low(&self) -> Result<bool, Self::Error> {
                self.is_high().map(|high| !high)
            }
        }
    };
}

impl_port!(PORTA);
impl_port!(PORTB);
impl_port!(PORTC);

// Pin assignment of the demo board
#[allow(non_camel_case_types)]
pub mod board {
    use super::*;

    // HB10401 LCD, 4 bit bus
    pub type LCD_RS = Pin<PORTA, 5, Input>;
    pub type LCD_EN = Pin<PORTA, 4, Input>;
    pub type LCD_D4 = Pin<PORTC, 3, Input>;
    pub type LCD_D5 = Pin<PORTC, 2, Input>;
    pub type LCD_D6 = Pin<PORTC, 1, Input>;
    pub type LCD_D7 = Pin<PORTC, 0, Input>;

    // MAX7219 chain
    pub type MATRIX_CLK = Pin<PORTA, 3, Input>;
    pub type MATRIX_DATA = Pin<PORTA, 2, Input>;
    pub type MATRIX_CS = Pin<PORTA, 1, Input>;

    // Push buttons to GND
    pub type BTN0 = Pin<PORTA, 6, Input>;
    pub type BTN1 = Pin<PORTA, 7, Input>;

    // 74HC164 debug LEDs
    pub type DEBUG_CLK = Pin<PORTB, 4, Input>;
    pub type DEBUG_DATA = Pin<PORTB, 5, Input>;
}
