#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]

#[cfg(target_arch = "avr")]
use panic_halt as _;

#[cfg(target_arch = "avr")]
mod firmware {
    use core::cell::RefCell;

    use avr_device::interrupt::{self, Mutex};
    use embedded_hal::digital::v2::InputPin;

    use attiny1614_drivers::application::{Application, Inbox};
    use attiny1614_drivers::config::{
        twi_baud_register, BUTTON_DEBOUNCE_TICKS, CPU_FREQ_HZ, LOG_LEVEL, MATRIX_BUFFER_LEN,
        MAX7219_MODULES, TWI_RISE_NS, TWI_SCL_HZ, USART_RX_BUFSIZE,
    };
    use attiny1614_drivers::drivers::{ButtonHandler, CharLcd, LedMatrix, ParallelBus, Ssd1306};
    use attiny1614_drivers::gfx::FrameBuffer;
    use attiny1614_drivers::hal::{board, timer, uart, Tcb0, Twi, Twi0Registers, UsartConsole};
    use attiny1614_drivers::logger::Logger;
    use attiny1614_drivers::os::Delay;
    use attiny1614_drivers::protocol;
    use attiny1614_drivers::{log_debug, log_error, log_info, log_warn};

    const BUTTON_TASK: u8 = 0;

    static INBOX: Mutex<RefCell<Inbox<USART_RX_BUFSIZE>>> = Mutex::new(RefCell::new(Inbox::new()));

    // Runs inside the receive interrupt
    fn on_message(message: &[u8], completed: bool) -> protocol::Result<()> {
        interrupt::free(|cs| INBOX.borrow(cs).borrow_mut().deliver(message, completed))
    }

    pub fn run() -> ! {
        let timer = Tcb0::new();
        let mut delay = Delay::new(&timer);
        uart::init(on_message);
        unsafe { interrupt::enable() };

        let mut logger = Logger::new(UsartConsole, LOG_LEVEL);
        log_info!(logger, "boot {}MHz", CPU_FREQ_HZ / 1_000_000);

        let bus = ParallelBus::new(
            board::LCD_RS::default().into_output(),
            board::LCD_EN::default().into_output(),
            board::LCD_D4::default().into_output(),
            board::LCD_D5::default().into_output(),
            board::LCD_D6::default().into_output(),
            board::LCD_D7::default().into_output(),
        );
        let mut lcd = CharLcd::new(bus);
        let _ = lcd.setup(&mut delay);
        lcd.print(1, 0, b"ready");
        lcd.repaint();

        let mut matrix = LedMatrix::new(
            board::MATRIX_CLK::default().into_output(),
            board::MATRIX_DATA::default().into_output(),
            board::MATRIX_CS::default().into_output(),
            MAX7219_MODULES,
        );
        let _ = matrix.init();

        let twi = Twi::new(
            Twi0Registers::new(),
            twi_baud_register(CPU_FREQ_HZ, TWI_SCL_HZ, TWI_RISE_NS),
        );
        let mut oled = Ssd1306::new(twi);
        if let Err(e) = oled.init().and_then(|_| oled.clear_display()) {
            log_error!(logger, "oled {}", e.status());
        }

        #[cfg(feature = "debug")]
        let mut leds = attiny1614_drivers::drivers::DebugShiftOut::new(
            board::DEBUG_CLK::default().into_output(),
            board::DEBUG_DATA::default().into_output(),
        );

        let btn0 = board::BTN0::default().into_pull_up_input();
        let btn1 = board::BTN1::default().into_pull_up_input();
        let mut buttons = ButtonHandler::new(BUTTON_DEBOUNCE_TICKS);

        let mut fb = FrameBuffer::<MATRIX_BUFFER_LEN>::new(MAX7219_MODULES * 8, 8);
        let mut app = Application::new();

        loop {
            let _ = lcd.poll(&timer);

            if timer::take_task_tick(BUTTON_TASK) {
                let mut mask = 0;
                if matches!(btn0.is_low(), Ok(true)) {
                    mask |= 0x01;
                }
                if matches!(btn1.is_low(), Ok(true)) {
                    mask |= 0x02;
                }
                if let Some(pressed) = buttons.check(mask) {
                    app.on_buttons(pressed, &mut lcd);
                    log_debug!(logger, "buttons {}", pressed);
                    #[cfg(feature = "debug")]
                    let _ = leds.write(pressed);
                }
            }

            let received = interrupt::free(|cs| INBOX.borrow(cs).borrow_mut().take());
            if let Some(received) = received {
                let reply = app.on_message(&received, &mut lcd, &mut fb);
                let _ = nb::block!(uart::send(reply));

                if matrix.render(&fb).is_err() {
                    log_warn!(logger, "matrix");
                }
                let shown = oled
                    .set_cursor_pos(0, 0)
                    .and_then(|_| oled.print(&received.message));
                if let Err(e) = shown {
                    log_error!(logger, "oled {}", e.status());
                }

                let stats = uart::stats();
                log_debug!(
                    logger,
                    "rx {} cut {} err {}",
                    stats.messages,
                    stats.truncated,
                    stats.handler_errors
                );
            }
        }
    }
}

#[cfg(target_arch = "avr")]
#[avr_device::entry]
fn main() -> ! {
    firmware::run()
}

#[cfg(not(target_arch = "avr"))]
fn main() {
    eprintln!("attiny1614_drivers: the firmware only runs on the ATtiny1614");
}
