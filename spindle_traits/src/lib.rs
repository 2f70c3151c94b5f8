pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Digital level of a synchronous input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// PWM-driven motor output (ESC). Duty commands are pulse widths in
/// nanoseconds; the driver owns the carrier frequency.
pub trait MotorDriver {
    fn arm(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_duty_ns(
        &mut self,
        duty_ns: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn disarm(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Text display, addressed by row. `draw_line` writes into a frame buffer;
/// nothing is visible until `present` is called.
pub trait Panel {
    fn clear(&mut self);
    fn draw_line(&mut self, row: u8, text: &str);
    fn present(&mut self);
}

/// Piezo buzzer. Implementations may block for `duration_ms`; callers must
/// only invoke this from loop context, never from an edge handler.
pub trait Buzzer {
    fn tone(&mut self, freq_hz: u32, duration_ms: u32);
}

/// Single status LED (run indicator).
pub trait StatusLed {
    fn set(&mut self, on: bool);
    fn toggle(&mut self);
}

/// Synchronous, non-blocking read of a digital input (mode switch,
/// quadrature phase pins).
pub trait LevelSource {
    fn level(&mut self) -> Level;
}

/// Edge-triggered input line (tachometer, encoder, button). The callback
/// receives no payload beyond "an edge occurred now" and must be short and
/// non-blocking.
pub trait EdgeSource {
    fn on_edge(&mut self, callback: Box<dyn FnMut() + Send>);
}

impl<T: MotorDriver + ?Sized> MotorDriver for Box<T> {
    fn arm(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).arm()
    }
    fn set_duty_ns(
        &mut self,
        duty_ns: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_duty_ns(duty_ns)
    }
    fn disarm(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).disarm()
    }
}

impl<T: Panel + ?Sized> Panel for Box<T> {
    fn clear(&mut self) {
        (**self).clear();
    }
    fn draw_line(&mut self, row: u8, text: &str) {
        (**self).draw_line(row, text);
    }
    fn present(&mut self) {
        (**self).present();
    }
}

impl<T: Buzzer + ?Sized> Buzzer for Box<T> {
    fn tone(&mut self, freq_hz: u32, duration_ms: u32) {
        (**self).tone(freq_hz, duration_ms);
    }
}

impl<T: StatusLed + ?Sized> StatusLed for Box<T> {
    fn set(&mut self, on: bool) {
        (**self).set(on);
    }
    fn toggle(&mut self) {
        (**self).toggle();
    }
}

impl<T: LevelSource + ?Sized> LevelSource for Box<T> {
    fn level(&mut self) -> Level {
        (**self).level()
    }
}
