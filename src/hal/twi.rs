//! TWI (I2C) master with bounded polling

use embedded_hal::blocking::i2c::{Read, Write};

use crate::config::{TWI_READ_TIMEOUT, TWI_WRITE_TIMEOUT};

// MSTATUS
pub const RIF: u8 = 0x80;
pub const WIF: u8 = 0x40;
pub const CLKHOLD: u8 = 0x20;
pub const RXACK: u8 = 0x10;
pub const ARBLOST: u8 = 0x08;
pub const BUSERR: u8 = 0x04;
pub const BUSSTATE_MASK: u8 = 0x03;
pub const BUSSTATE_IDLE: u8 = 0x01;
pub const BUSSTATE_OWNER: u8 = 0x02;

// MCTRLA
pub const ENABLE: u8 = 0x01;
pub const TIMEOUT_200US: u8 = 0x0C;

// MCTRLB
pub const ACKACT_NACK: u8 = 0x04;
pub const MCMD_MASK: u8 = 0x03;
pub const MCMD_RECVTRANS: u8 = 0x02;
pub const MCMD_STOP: u8 = 0x03;

/// Master-side TWI registers.
pub trait TwiRegisters {
    fn set_mctrla(&mut self, value: u8);
    fn mctrlb(&self) -> u8;
    fn set_mctrlb(&mut self, value: u8);
    fn mstatus(&self) -> u8;
    fn set_mstatus(&mut self, value: u8);
    fn set_mbaud(&mut self, value: u8);
    fn set_maddr(&mut self, value: u8);
    fn mdata(&self) -> u8;
    fn set_mdata(&mut self, value: u8);
}

/// Failures carry the MSTATUS value seen when the transfer gave up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TwiError {
    Timeout { status: u8 },
    Nack { status: u8 },
    Bus { status: u8 },
}

impl TwiError {
    pub fn status(&self) -> u8 {
        match *self {
            TwiError::Timeout { status } | TwiError::Nack { status } | TwiError::Bus { status } => {
                status
            }
        }
    }
}

pub type Result<T> = core::result::Result<T, TwiError>;

pub struct Twi<R> {
    regs: R,
    write_timeout: u16,
    read_timeout: u16,
}

impl<R: TwiRegisters> Twi<R> {
    pub fn new(mut regs: R, baud: u8) -> Self {
        regs.set_mbaud(baud);
        regs.set_mctrla(ENABLE | TIMEOUT_200US);
        regs.set_mstatus(BUSSTATE_IDLE);
        let status = regs.mstatus();
        regs.set_mstatus(status | RIF | WIF | BUSERR);

        Self {
            regs,
            write_timeout: TWI_WRITE_TIMEOUT,
            read_timeout: TWI_READ_TIMEOUT,
        }
    }

    /// Use the same poll bound for every handshake.
    pub fn with_timeout(mut self, polls: u16) -> Self {
        self.write_timeout = polls;
        self.read_timeout = polls;
        self
    }

    fn wait_for(&self, mask: u8, polls: u16) -> Result<u8> {
        let mut remaining = polls;
        loop {
            let status = self.regs.mstatus();
            if status & mask != 0 {
                return Ok(status);
            }
            remaining = remaining.saturating_sub(1);
            if remaining == 0 {
                return Err(TwiError::Timeout { status });
            }
        }
    }

    fn clear_flags(&mut self) {
        let status = self.regs.mstatus();
        self.regs.set_mstatus(status | WIF | RIF);
    }

    fn check_ack(status: u8) -> Result<()> {
        if status & (ARBLOST | BUSERR) != 0 {
            Err(TwiError::Bus { status })
        } else if status & RXACK != 0 {
            Err(TwiError::Nack { status })
        } else {
            Ok(())
        }
    }

    pub fn start_write(&mut self, address: u8) -> Result<()> {
        self.clear_flags();
        self.regs.set_maddr(address << 1);
        let status = self.wait_for(WIF | RIF, self.write_timeout)?;
        Self::check_ack(status)
    }

    pub fn start_read(&mut self, address: u8) -> Result<()> {
        self.clear_flags();
        self.regs.set_maddr((address << 1) | 1);
        let status = self.wait_for(WIF | RIF, self.write_timeout)?;
        if status & RIF != 0 {
            Ok(())
        } else {
            // WIF alone on a read means the address was refused or the bus failed
            Self::check_ack(status).and(Err(TwiError::Bus { status }))
        }
    }

    pub fn write_byte(&mut self, data: u8) -> Result<()> {
        self.regs.set_mdata(data);
        let status = self.wait_for(WIF | RIF, self.write_timeout)?;
        Self::check_ack(status)
    }

    /// Read `buffer.len()` bytes, answering the last one with NACK.
    pub fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<()> {
        let last = buffer.len().saturating_sub(1);
        for (i, slot) in buffer.iter_mut().enumerate() {
            let status = self.wait_for(WIF | RIF, self.read_timeout)?;
            if status & RIF == 0 {
                return Err(TwiError::Bus { status });
            }

            *slot = self.regs.mdata();
            let ctrl = self.regs.mctrlb();
            if i == last {
                self.regs.set_mctrlb(ctrl | ACKACT_NACK);
            } else {
                self.regs.set_mctrlb((ctrl & !ACKACT_NACK) | MCMD_RECVTRANS);
            }
        }
        Ok(())
    }

    /// Issue STOP and wait for the bus to go idle. If it never does, the bus
    /// state is forced to idle.
    pub fn stop(&mut self) {
        let ctrl = self.regs.mctrlb();
        self.regs.set_mctrlb(ctrl | MCMD_STOP);

        let mut remaining = self.read_timeout;
        while self.regs.mstatus() & BUSSTATE_MASK != BUSSTATE_IDLE {
            remaining = remaining.saturating_sub(1);
            if remaining == 0 {
                self.regs.set_mstatus(BUSERR | BUSSTATE_IDLE);
                return;
            }
        }
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }
}

impl<R: TwiRegisters> Write for Twi<R> {
    type Error = TwiError;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<()> {
        let result = self
            .start_write(address)
            .and_then(|()| bytes.iter().try_for_each(|&byte| self.write_byte(byte)));
        self.stop();
        result
    }
}

impl<R: TwiRegisters> Read for Twi<R> {
    type Error = TwiError;

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<()> {
        let result = self
            .start_read(address)
            .and_then(|()| self.read_bytes(buffer));
        self.stop();
        result
    }
}

#[cfg(target_arch = "avr")]
pub use self::twi0::Twi0Registers;

#[cfg(target_arch = "avr")]
mod twi0 {
    use avr_device::attiny1614::{PORTB, TWI0};

    use super::TwiRegisters;

    const PULLUPEN: u8 = 0x08;

    /// TWI0 on PB0 (SCL) and PB1 (SDA).
    pub struct Twi0Registers {
        _private: (),
    }

    impl Twi0Registers {
        pub fn new() -> Self {
            unsafe {
                let port = PORTB::ptr();
                (*port).pin0ctrl.modify(|r, w| w.bits(r.bits() | PULLUPEN));
                (*port).pin1ctrl.modify(|r, w| w.bits(r.bits() | PULLUPEN));
            }
            Self { _private: () }
        }
    }

    impl Default for Twi0Registers {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TwiRegisters for Twi0Registers {
        fn set_mctrla(&mut self, value: u8) {
            unsafe { (*TWI0::ptr()).mctrla.write(|w| w.bits(value)) }
        }

        fn mctrlb(&self) -> u8 {
            unsafe { (*TWI0::ptr()).mctrlb.read().bits() }
        }

        fn set_mctrlb(&mut self, value: u8) {
            unsafe { (*TWI0::ptr()).mctrlb.write(|w| w.bits(value)) }
        }

        fn mstatus(&self) -> u8 {
            unsafe { (*TWI0::ptr()).mstatus.read().bits() }
        }

        fn set_mstatus(&mut self, value: u8) {
            unsafe { (*TWI0::ptr()).mstatus.write(|w| w.bits(value)) }
        }

        fn set_mbaud(&mut self, value: u8) {
            unsafe { (*TWI0::ptr()).mbaud.write(|w| w.bits(value)) }
        }

        fn set_maddr(&mut self, value: u8) {
            unsafe { (*TWI0::ptr()).maddr.write(|w| w.bits(value)) }
        }

        fn mdata(&self) -> u8 {
            unsafe { (*TWI0::ptr()).mdata.read().bits() }
        }

        fn set_mdata(&mut self, value: u8) {
            unsafe { (*TWI0::ptr()).mdata.write(|w| w.bits(value)) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    const FLAGS: u8 = RIF | WIF | ARBLOST | BUSERR;

    /// Simulated master that answers immediately, or never.
    #[derive(Default)]
    struct FakeTwi {
        responsive: bool,
        nack_address: bool,
        nack_after: Option<usize>,
        status: u8,
        mctrla: u8,
        mctrlb: u8,
        mbaud: u8,
        data: u8,
        addresses: Vec<u8>,
        written: Vec<u8>,
        to_read: VecDeque<u8>,
        stops: usize,
    }

    impl FakeTwi {
        fn responsive() -> Self {
            Self {
                responsive: true,
                ..Self::default()
            }
        }

        fn next_byte(&mut self) {
            self.data = self.to_read.pop_front().unwrap_or(0xFF);
            self.status = BUSSTATE_OWNER | RIF;
        }
    }

    impl TwiRegisters for FakeTwi {
        fn set_mctrla(&mut self, value: u8) {
            self.mctrla = value;
        }

        fn mctrlb(&self) -> u8 {
            self.mctrlb
        }

        fn set_mctrlb(&mut self, value: u8) {
            self.mctrlb = value & !MCMD_MASK;
            if !self.responsive {
                return;
            }
            match value & MCMD_MASK {
                MCMD_RECVTRANS => self.next_byte(),
                MCMD_STOP => {
                    self.stops += 1;
                    self.status = BUSSTATE_IDLE;
                }
                _ => {}
            }
        }

        fn mstatus(&self) -> u8 {
            self.status
        }

        fn set_mstatus(&mut self, value: u8) {
            self.status &= !(value & FLAGS);
            if value & BUSSTATE_MASK != 0 {
                self.status = (self.status & !BUSSTATE_MASK) | (value & BUSSTATE_MASK);
            }
        }

        fn set_mbaud(&mut self, value: u8) {
            self.mbaud = value;
        }

        fn set_maddr(&mut self, value: u8) {
            self.addresses.push(value);
            if !self.responsive {
                return;
            }
            if self.nack_address {
                self.status = BUSSTATE_OWNER | WIF | RXACK;
            } else if value & 1 == 1 {
                self.next_byte();
            } else {
                self.status = BUSSTATE_OWNER | WIF;
            }
        }

        fn mdata(&self) -> u8 {
            self.data
        }

        fn set_mdata(&mut self, value: u8) {
            self.written.push(value);
            if !self.responsive {
                return;
            }
            let nack = self.nack_after.map_or(false, |n| self.written.len() > n);
            self.status = BUSSTATE_OWNER | WIF | if nack { RXACK } else { 0 };
        }
    }

    #[test]
    fn test_setup_programs_baud_and_idle_bus() {
        let twi = Twi::new(FakeTwi::responsive(), 45);
        let regs = twi.registers();
        assert_eq!(regs.mbaud, 45);
        assert_eq!(regs.mctrla, ENABLE | TIMEOUT_200US);
        assert_eq!(regs.status & BUSSTATE_MASK, BUSSTATE_IDLE);
    }

    #[test]
    fn test_write_sends_address_data_and_stop() {
        let mut twi = Twi::new(FakeTwi::responsive(), 45);
        twi.write(0x3C, &[0x00, 0xAF]).unwrap();

        let regs = twi.registers();
        assert_eq!(regs.addresses, vec![0x78]);
        assert_eq!(regs.written, vec![0x00, 0xAF]);
        assert_eq!(regs.stops, 1);
    }

    #[test]
    fn test_data_nack_is_reported_and_bus_released() {
        let mut fake = FakeTwi::responsive();
        fake.nack_after = Some(1);
        let mut twi = Twi::new(fake, 45);

        let err = twi.write(0x3C, &[0x80, 0xAE, 0x00]).unwrap_err();
        assert!(matches!(err, TwiError::Nack { status } if status & RXACK != 0));
        assert_eq!(twi.registers().written, vec![0x80, 0xAE]);
        assert_eq!(twi.registers().stops, 1);
    }

    #[test]
    fn test_address_nack() {
        let mut fake = FakeTwi::responsive();
        fake.nack_address = true;
        let mut twi = Twi::new(fake, 45);

        assert!(matches!(twi.write(0x27, &[1]), Err(TwiError::Nack { .. })));
        assert!(matches!(
            twi.read(0x27, &mut [0u8; 2]),
            Err(TwiError::Nack { .. })
        ));
    }

    #[test]
    fn test_silent_hardware_times_out() {
        let mut twi = Twi::new(FakeTwi::default(), 45).with_timeout(8);

        assert_eq!(
            twi.start_write(0x3C),
            Err(TwiError::Timeout { status: BUSSTATE_IDLE })
        );
        assert!(matches!(twi.write_byte(0x55), Err(TwiError::Timeout { .. })));
    }

    #[test]
    fn test_stop_forces_idle_when_bus_never_settles() {
        let mut twi = Twi::new(FakeTwi::default(), 45).with_timeout(4);
        twi.regs.status = BUSSTATE_OWNER | CLKHOLD;

        twi.stop();
        assert_eq!(twi.registers().status & BUSSTATE_MASK, BUSSTATE_IDLE);
    }

    #[test]
    fn test_read_acks_all_but_last_byte() {
        let mut fake = FakeTwi::responsive();
        fake.to_read.extend([0x12, 0x34, 0x56]);
        let mut twi = Twi::new(fake, 45);

        let mut buffer = [0u8; 3];
        twi.read(0x68, &mut buffer).unwrap();

        assert_eq!(buffer, [0x12, 0x34, 0x56]);
        assert_eq!(twi.registers().addresses, vec![0xD1]);
        assert_eq!(twi.registers().mctrlb & ACKACT_NACK, ACKACT_NACK);
        assert_eq!(twi.registers().stops, 1);
    }
}
