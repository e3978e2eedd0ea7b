pub mod twi;

#[cfg(target_arch = "avr")]
pub mod gpio;
#[cfg(target_arch = "avr")]
pub mod timer;
#[cfg(target_arch = "avr")]
pub mod uart;

pub use twi::{Twi, TwiError, TwiRegisters};

#[cfg(target_arch = "avr")]
pub use gpio::{board, Input, Output, Pin};
#[cfg(target_arch = "avr")]
pub use timer::Tcb0;
#[cfg(target_arch = "avr")]
pub use twi::Twi0Registers;
#[cfg(target_arch = "avr")]
pub use uart::{Usart0, UsartConsole};
