pub mod button_handler;
pub mod lcd;
pub mod led_matrix;
pub mod shift_out;
pub mod ssd1306;
pub mod tm1638;

pub use button_handler::ButtonHandler;
pub use lcd::{CharLcd, LcdInterface, ParallelBus, RepaintStatus};
pub use led_matrix::LedMatrix;
pub use shift_out::DebugShiftOut;
pub use ssd1306::Ssd1306;
pub use tm1638::Tm1638;
