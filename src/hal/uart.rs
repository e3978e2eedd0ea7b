//! USART0 on PB2 (TX) and PB3 (RX), owned by the framed serial link

use core::cell::RefCell;
use core::convert::Infallible;

use avr_device::attiny1614::{PORTB, USART0};
use avr_device::interrupt::{self, Mutex};

use crate::config::{usart_baud_register, CPU_FREQ_HZ, UART_BAUD, USART_RX_BUFSIZE, USART_TX_BUFSIZE};
use crate::logger::LogSink;
use crate::protocol::{self, LinkStats, SerialLink, UsartPort};

pub type Handler = fn(&[u8], bool) -> protocol::Result<()>;
pub type Link = SerialLink<Usart0, Handler, USART_RX_BUFSIZE, USART_TX_BUFSIZE>;

// The one link instance, shared by the main loop and both interrupts
static LINK: Mutex<RefCell<Option<Link>>> = Mutex::new(RefCell::new(None));

// CTRLA
const RXCIE: u8 = 0x80;
const DREIE: u8 = 0x20;
// CTRLB
const RXEN: u8 = 0x80;
const TXEN: u8 = 0x40;
// CTRLC: asynchronous, even parity, 1 stop bit, 8 bit characters
const FRAME_8E1: u8 = 0x23;

const TX_PIN: u8 = 1 << 2;
const RX_PIN: u8 = 1 << 3;

pub struct Usart0 {
    _private: (),
}

impl UsartPort for Usart0 {
    fn write_data(&mut self, byte: u8) {
        unsafe { (*USART0::ptr()).txdatal.write(|w| w.bits(byte)) }
    }

    fn enable_drain_interrupt(&mut self) {
        unsafe { (*USART0::ptr()).ctrla.modify(|r, w| w.bits(r.bits() | DREIE)) }
    }

    fn disable_drain_interrupt(&mut self) {
        unsafe { (*USART0::ptr()).ctrla.modify(|r, w| w.bits(r.bits() & !DREIE)) }
    }
}

/// Configure USART0 and install the link. Interrupts must still be disabled.
pub fn init(handler: Handler) {
    unsafe {
        let port = PORTB::ptr();
        (*port).dirset.write(|w| w.bits(TX_PIN));
        (*port).dirclr.write(|w| w.bits(RX_PIN));

        let usart = USART0::ptr();
        (*usart).baud.write(|w| w.bits(usart_baud_register(CPU_FREQ_HZ, UART_BAUD)));
        (*usart).ctrlc.write(|w| w.bits(FRAME_8E1));
        (*usart).ctrla.write(|w| w.bits(RXCIE));
        (*usart).ctrlb.write(|w| w.bits(RXEN | TXEN));
    }

    interrupt::free(|cs| {
        LINK.borrow(cs)
            .replace(Some(SerialLink::new(Usart0 { _private: () }, handler)));
    });
}

/// Queue a message on the link. Must not be called from the message handler.
pub fn send(message: &[u8]) -> nb::Result<(), Infallible> {
    interrupt::free(|cs| match LINK.borrow(cs).borrow_mut().as_mut() {
        Some(link) => link.send(message),
        None => Ok(()),
    })
}

pub fn is_busy() -> bool {
    interrupt::free(|cs| {
        LINK.borrow(cs)
            .borrow()
            .as_ref()
            .map_or(false, |link| link.is_busy())
    })
}

pub fn stats() -> LinkStats {
    interrupt::free(|cs| {
        LINK.borrow(cs)
            .borrow()
            .as_ref()
            .map(|link| link.stats())
            .unwrap_or_default()
    })
}

/// Log sink writing each line as one message, waiting for the transmitter.
pub struct UsartConsole;

impl LogSink for UsartConsole {
    fn write_line(&mut self, line: &[u8]) {
        let _ = nb::block!(send(line));
    }
}

#[avr_device::interrupt(attiny1614)]
fn USART0_RXC() {
    let byte = unsafe { (*USART0::ptr()).rxdatal.read().bits() };
    interrupt::free(|cs| {
        if let Some(link) = LINK.borrow(cs).borrow_mut().as_mut() {
            link.on_receive(byte);
        }
    });
}

#[avr_device::interrupt(attiny1614)]
fn USART0_DRE() {
    interrupt::free(|cs| {
        if let Some(link) = LINK.borrow(cs).borrow_mut().as_mut() {
            link.on_data_register_empty();
        }
    });
}
