//! Release-debounced button mask

/// Collects pressed buttons and reports them once all are released.
///
/// Feed the current button mask once per task tick. Bits seen while any button
/// is down accumulate; after the mask reads zero for more than the debounce
/// count, the accumulated set is reported once.
pub struct ButtonHandler {
    debounce_ticks: u8,
    counter: u8,
    last: u8,
    callback: Option<fn(u8)>,
}

impl ButtonHandler {
    pub const fn new(debounce_ticks: u8) -> Self {
        Self {
            debounce_ticks,
            counter: 0,
            last: 0,
            callback: None,
        }
    }

    pub fn set_callback(&mut self, callback: fn(u8)) {
        self.callback = Some(callback);
    }

    pub fn check(&mut self, current: u8) -> Option<u8> {
        if current != 0 {
            self.counter = 0;
            self.last |= current;
            return None;
        }
        if self.last == 0 {
            return None;
        }
        if self.counter < self.debounce_ticks {
            self.counter += 1;
            return None;
        }

        let pressed = self.last;
        self.last = 0;
        self.counter = 0;
        if let Some(callback) = self.callback {
            callback(pressed);
        }
        Some(pressed)
    }

    /// Buttons seen since the last report
    pub fn pending(&self) -> u8 {
        self.last
    }
}
