//! Configuration constants for the ATtiny1614 driver set

use crate::logger::Level;

/// CPU frequency in Hz
pub const CPU_FREQ_HZ: u32 = 10_000_000;

/// USART baud rate (even parity, 8N1 framing otherwise)
pub const UART_BAUD: u32 = 19_200;

/// Inbound message capacity of the serial link
pub const USART_RX_BUFSIZE: usize = 16;

/// Outbound payload capacity of the serial link, excluding the LF terminator
pub const USART_TX_BUFSIZE: usize = 32;

/// Period of the free-running task timer. At 10 MHz one period is 0.5 ms.
pub const TASK_TIMER_OVERFLOW: u16 = 5000;

/// Task timer ticks per microsecond
pub const TICKS_PER_US: u32 = CPU_FREQ_HZ / 1_000_000;

/// Ticks the LCD controller needs per command or character, about 48 us
pub const LCD_DISP_WAIT: u16 = 480;

/// Task ticks a released button mask must stay zero before it is reported
pub const BUTTON_DEBOUNCE_TICKS: u8 = 20;

/// TWI clock and bus rise time
pub const TWI_SCL_HZ: u32 = 100_000;
pub const TWI_RISE_NS: u32 = 0;

/// Poll bounds for TWI handshakes
pub const TWI_WRITE_TIMEOUT: u16 = 0xF300;
pub const TWI_READ_TIMEOUT: u16 = 0xFFFF;

/// Daisy-chained MAX7219 modules and the matching framebuffer size
pub const MAX7219_MODULES: u8 = 4;
pub const MATRIX_BUFFER_LEN: usize = MAX7219_MODULES as usize * 8;

#[cfg(feature = "debug")]
pub const LOG_LEVEL: Level = Level::Debug;
#[cfg(not(feature = "debug"))]
pub const LOG_LEVEL: Level = Level::Info;

/// Longest formatted log line, matching what one serial message can carry
pub const LOG_LINE_LEN: usize = USART_TX_BUFSIZE;

/// USART BAUD register value for normal speed mode: 64 * f_cpu / (16 * baud), rounded
pub const fn usart_baud_register(cpu_hz: u32, baud: u32) -> u16 {
    ((cpu_hz * 4 + baud / 2) / baud) as u16
}

/// TWI MBAUD register value for the given SCL frequency and rise time
pub const fn twi_baud_register(cpu_hz: u32, scl_hz: u32, rise_ns: u32) -> u8 {
    let cycles = cpu_hz / scl_hz;
    let rise = (cpu_hz / 1_000) * rise_ns / 1_000_000;
    let baud = cycles.saturating_sub(10).saturating_sub(rise) / 2;
    if baud > 0xFF {
        0xFF
    } else {
        baud as u8
    }
}
