//! TCB0 as the free-running task timer

use core::cell::Cell;

use avr_device::attiny1614::TCB0;
use avr_device::interrupt::{self, Mutex};

use crate::config::TASK_TIMER_OVERFLOW;
use crate::os::{TaskFlags, TaskTimer};

static TASK_FLAGS: Mutex<Cell<TaskFlags>> = Mutex::new(Cell::new(TaskFlags::new()));

// CTRLA: enabled, CLK_PER / 1
const ENABLE: u8 = 0x01;
// CTRLB: periodic interrupt mode
const CNTMODE_INT: u8 = 0x00;
// INTCTRL / INTFLAGS
const CAPT: u8 = 0x01;

#[derive(Clone, Copy)]
pub struct Tcb0 {
    _private: (),
}

impl Tcb0 {
    /// Start counting 0..TASK_TIMER_OVERFLOW with a compare interrupt at the top.
    pub fn new() -> Self {
        unsafe {
            let p = TCB0::ptr();
            (*p).ctrlb.write(|w| w.bits(CNTMODE_INT));
            (*p).ccmp.write(|w| w.bits(TASK_TIMER_OVERFLOW - 1));
            (*p).cnt.write(|w| w.bits(0));
            (*p).intctrl.write(|w| w.bits(CAPT));
            (*p).ctrla.write(|w| w.bits(ENABLE));
        }
        Self { _private: () }
    }
}

impl Default for Tcb0 {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskTimer for Tcb0 {
    const OVERFLOW: u16 = TASK_TIMER_OVERFLOW;

    #[inline]
    fn now(&self) -> u16 {
        unsafe { (*TCB0::ptr()).cnt.read().bits() }
    }
}

/// True once per timer period for each task bit.
pub fn take_task_tick(task: u8) -> bool {
    interrupt::free(|cs| {
        let cell = TASK_FLAGS.borrow(cs);
        let mut flags = cell.get();
        let hit = flags.take(task);
        cell.set(flags);
        hit
    })
}

#[avr_device::interrupt(attiny1614)]
fn TCB0_INT() {
    unsafe { (*TCB0::ptr()).intflags.write(|w| w.bits(CAPT)) };
    interrupt::free(|cs| {
        let cell = TASK_FLAGS.borrow(cs);
        let mut flags = cell.get();
        flags.trigger_all();
        cell.set(flags);
    });
}
