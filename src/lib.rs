//! Peripheral drivers for a tinyAVR 1-series board: framed USART link,
//! character LCD, MAX7219 matrix, TM1638 module, SSD1306 OLED over TWI,
//! debounced buttons and a small framebuffer/tile graphics layer.
//!
//! Register-level code is only built for AVR. Everything else runs on the host
//! behind `embedded-hal` traits and the small register traits in [`hal`].

#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

pub mod config;
pub mod logger;
pub mod os;

pub mod application;
pub mod drivers;
pub mod gfx;
pub mod hal;
pub mod protocol;

#[cfg(test)]
mod testing;
