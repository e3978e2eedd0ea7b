//! Task timer plumbing for the cooperative main loop

use embedded_hal::blocking::delay::{DelayMs, DelayUs};

use crate::config::TICKS_PER_US;

/// A free-running counter that wraps to zero after `OVERFLOW` ticks.
pub trait TaskTimer {
    const OVERFLOW: u16;

    fn now(&self) -> u16;
}

/// Whether `duration` ticks have passed since `snapshot`.
///
/// Only meaningful for durations well below the timer period. When the target
/// lies beyond the period it is only reached after the counter wrapped, so the
/// counter must also be back below `snapshot`.
pub fn is_after(snapshot: u16, duration: u16, now: u16, period: u16) -> bool {
    let first_after = u32::from(snapshot) + u32::from(duration) + 1;
    let period = u32::from(period);
    let now = u32::from(now);

    if first_after >= period {
        now >= first_after - period && now < u32::from(snapshot)
    } else {
        now >= first_after
    }
}

/// Ticks between two counter readings, allowing for one wrap.
pub fn ticks_between(earlier: u16, later: u16, period: u16) -> u16 {
    if later >= earlier {
        later - earlier
    } else {
        (u32::from(later) + u32::from(period) - u32::from(earlier)) as u16
    }
}

/// Per-task "a tick happened" bits.
///
/// The timer interrupt raises every bit, each main-loop task consumes its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskFlags(u8);

impl TaskFlags {
    pub const fn new() -> Self {
        Self(0)
    }

    #[inline]
    pub fn trigger_all(&mut self) {
        self.0 = 0xFF;
    }

    /// Returns true once per trigger for the given task bit.
    pub fn take(&mut self, task: u8) -> bool {
        let mask = 1 << (task & 0x07);
        let pending = self.0 & mask != 0;
        self.0 &= !mask;
        pending
    }

    pub fn bits(&self) -> u8 {
        self.0
    }
}

/// Busy-wait delay counting task timer ticks.
pub struct Delay<'a, T> {
    timer: &'a T,
}

impl<'a, T: TaskTimer> Delay<'a, T> {
    pub fn new(timer: &'a T) -> Self {
        Self { timer }
    }

    pub fn wait_ticks(&mut self, ticks: u32) {
        let mut remaining = ticks;
        let mut last = self.timer.now();
        while remaining > 0 {
            let now = self.timer.now();
            let step = ticks_between(last, now, T::OVERFLOW);
            remaining = remaining.saturating_sub(u32::from(step));
            last = now;
        }
    }
}

impl<T: TaskTimer> DelayUs<u16> for Delay<'_, T> {
    fn delay_us(&mut self, us: u16) {
        self.wait_ticks(u32::from(us) * TICKS_PER_US);
    }
}

impl<T: TaskTimer> DelayUs<u8> for Delay<'_, T> {
    fn delay_us(&mut self, us: u8) {
        self.delay_us(u16::from(us));
    }
}

impl<T: TaskTimer> DelayMs<u16> for Delay<'_, T> {
    fn delay_ms(&mut self, ms: u16) {
        for _ in 0..ms {
            self.wait_ticks(1_000 * TICKS_PER_US);
        }
    }
}

impl<T: TaskTimer> DelayMs<u8> for Delay<'_, T> {
    fn delay_ms(&mut self, ms: u8) {
        self.delay_ms(u16::from(ms));
    }
}
