//! Leveled line logger formatting with `ufmt`
//!
//! A log line is formatted into a fixed buffer and handed to a [`LogSink`] as
//! one unit, so on the chip every line travels as one serial message.

use heapless::String;
use ufmt::uWrite;

use crate::config::LOG_LINE_LEN;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl Level {
    pub fn tag(self) -> &'static str {
        match self {
            Level::Error => "[ERR] ",
            Level::Warn => "[WRN] ",
            Level::Info => "[INF] ",
            Level::Debug => "[DBG] ",
        }
    }
}

/// Where finished log lines go.
pub trait LogSink {
    fn write_line(&mut self, line: &[u8]);
}

/// Fixed-capacity `ufmt` target. Text past the capacity is dropped.
pub struct Truncating<const N: usize> {
    text: String<N>,
}

impl<const N: usize> Truncating<N> {
    pub const fn new() -> Self {
        Self { text: String::new() }
    }

    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }
}

impl<const N: usize> Default for Truncating<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> uWrite for Truncating<N> {
    type Error = ();

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        for c in s.chars() {
            self.text.push(c).map_err(|_| ())?;
        }
        Ok(())
    }
}

/// One log line being formatted, starting with the level tag.
pub struct LogLine {
    text: Truncating<LOG_LINE_LEN>,
}

impl LogLine {
    pub fn new(level: Level) -> Self {
        let mut text = Truncating::new();
        let _ = text.write_str(level.tag());
        Self { text }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }
}

impl uWrite for LogLine {
    type Error = ();

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.text.write_str(s)
    }
}

pub struct Logger<S> {
    sink: S,
    max_level: Level,
}

impl<S: LogSink> Logger<S> {
    pub const fn new(sink: S, max_level: Level) -> Self {
        Self { sink, max_level }
    }

    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.max_level
    }

    pub fn set_level(&mut self, level: Level) {
        self.max_level = level;
    }

    pub fn emit(&mut self, line: &LogLine) {
        self.sink.write_line(line.as_bytes());
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

/// Formats and emits one line if `$level` passes the logger's filter.
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let level = $level;
        let logger = &mut $logger;
        if logger.enabled(level) {
            let mut line = $crate::logger::LogLine::new(level);
            let _ = ufmt::uwrite!(&mut line, $($arg)+);
            logger.emit(&line);
        }
    }};
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::logger::Level::Error, $($arg)+) };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::logger::Level::Warn, $($arg)+) };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::logger::Level::Info, $($arg)+) };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::logger::Level::Debug, $($arg)+) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Lines(Vec<Vec<u8>>);

    impl LogSink for Lines {
        fn write_line(&mut self, line: &[u8]) {
            self.0.push(line.to_vec());
        }
    }

    #[test]
    fn test_line_has_level_tag_and_values() {
        let mut logger = Logger::new(Lines::default(), Level::Info);
        crate::log_info!(logger, "boot {}", 3u8);
        crate::log_error!(logger, "twi {:?}", 0x42u8);

        assert_eq!(logger.sink().0[0], b"[INF] boot 3");
        assert_eq!(logger.sink().0[1], b"[ERR] twi 66");
    }

    #[test]
    fn test_levels_above_limit_are_dropped() {
        let mut logger = Logger::new(Lines::default(), Level::Warn);
        crate::log_debug!(logger, "noise");
        crate::log_info!(logger, "noise");
        crate::log_warn!(logger, "kept");

        assert_eq!(logger.sink().0.len(), 1);
        assert_eq!(logger.sink().0[0], b"[WRN] kept");

        logger.set_level(Level::Debug);
        crate::log_debug!(logger, "now {}", 1u16);
        assert_eq!(logger.sink().0[1], b"[DBG] now 1");
    }

    #[test]
    fn test_long_line_is_cut_at_capacity() {
        let mut logger = Logger::new(Lines::default(), Level::Debug);
        crate::log_info!(logger, "{}{}{}", "0123456789", "0123456789", "0123456789");

        let line = &logger.sink().0[0];
        assert_eq!(line.len(), LOG_LINE_LEN);
        assert!(line.starts_with(b"[INF] 0123456789"));
    }

    #[test]
    fn test_truncating_keeps_whole_chars_up_to_capacity() {
        let mut text = Truncating::<5>::new();
        assert_eq!(ufmt::uwrite!(&mut text, "ab{}", 12345u16), Err(()));
        assert_eq!(text.as_str(), "ab123");

        let mut text = Truncating::<4>::default();
        assert_eq!(text.write_str("xyz"), Ok(()));
        assert_eq!(text.write_str("\u{e9}"), Err(()));
        assert_eq!(text.as_bytes(), b"xyz");
    }
}
