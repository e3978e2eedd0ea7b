//! Host-side fakes shared by the unit tests

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::digital::v2::OutputPin;

use crate::os::TaskTimer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinEvent {
    High(&'static str),
    Low(&'static str),
}

/// A log of pin transitions shared by several [`RecordingPin`]s.
#[derive(Clone, Default)]
pub struct PinLog(Rc<RefCell<Vec<PinEvent>>>);

impl PinLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pin(&self, name: &'static str) -> RecordingPin {
        RecordingPin {
            name,
            log: self.clone(),
        }
    }

    pub fn events(&self) -> Vec<PinEvent> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Bytes clocked in on each rising edge of `clk`, grouped by the
    /// active-low select line `cs`.
    pub fn frames(&self, clk: &str, data: &str, cs: &str, msb_first: bool) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        let mut bits: Option<Vec<bool>> = None;
        let mut level = false;

        for event in self.0.borrow().iter() {
            match *event {
                PinEvent::Low(name) if name == cs => bits = Some(Vec::new()),
                PinEvent::High(name) if name == cs => {
                    if let Some(done) = bits.take() {
                        frames.push(pack(&done, msb_first));
                    }
                }
                PinEvent::High(name) if name == data => level = true,
                PinEvent::Low(name) if name == data => level = false,
                PinEvent::High(name) if name == clk => {
                    if let Some(open) = bits.as_mut() {
                        open.push(level);
                    }
                }
                _ => {}
            }
        }
        frames
    }

    /// Bytes clocked in on each rising edge of `clk`, ignoring any select line.
    pub fn clocked_bytes(&self, clk: &str, data: &str, msb_first: bool) -> Vec<u8> {
        let mut bits = Vec::new();
        let mut level = false;
        for event in self.0.borrow().iter() {
            match *event {
                PinEvent::High(name) if name == data => level = true,
                PinEvent::Low(name) if name == data => level = false,
                PinEvent::High(name) if name == clk => bits.push(level),
                _ => {}
            }
        }
        pack(&bits, msb_first)
    }

    /// Count of events for one pin.
    pub fn count(&self, event: PinEvent) -> usize {
        self.0.borrow().iter().filter(|e| **e == event).count()
    }
}

fn pack(bits: &[bool], msb_first: bool) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk.iter().enumerate().fold(0u8, |byte, (i, &bit)| {
                if !bit {
                    byte
                } else if msb_first {
                    byte | (0x80 >> i)
                } else {
                    byte | (1 << i)
                }
            })
        })
        .collect()
}

pub struct RecordingPin {
    name: &'static str,
    log: PinLog,
}

impl OutputPin for RecordingPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.0.borrow_mut().push(PinEvent::Low(self.name));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.0.borrow_mut().push(PinEvent::High(self.name));
        Ok(())
    }
}

/// Task timer whose counter is set by the test, optionally advancing on
/// every read.
pub struct FakeTimer {
    value: Cell<u16>,
    step: u16,
}

impl FakeTimer {
    pub fn new(start: u16) -> Self {
        Self {
            value: Cell::new(start),
            step: 0,
        }
    }

    pub fn with_step(mut self, step: u16) -> Self {
        self.step = step;
        self
    }

    pub fn set(&self, value: u16) {
        self.value.set(value % Self::OVERFLOW);
    }

    pub fn advance(&self, ticks: u16) {
        let next = (u32::from(self.value.get()) + u32::from(ticks)) % u32::from(Self::OVERFLOW);
        self.value.set(next as u16);
    }

    pub fn value(&self) -> u16 {
        self.value.get()
    }
}

impl TaskTimer for FakeTimer {
    const OVERFLOW: u16 = crate::config::TASK_TIMER_OVERFLOW;

    fn now(&self) -> u16 {
        let now = self.value.get();
        self.advance(self.step);
        now
    }
}
