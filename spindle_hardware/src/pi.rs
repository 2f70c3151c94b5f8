//! Raspberry Pi GPIO/PWM bindings via rppal. Only compiled with the
//! `hardware` feature on Linux.

use std::time::Duration;

use rppal::gpio::{Gpio, InputPin, OutputPin, Trigger};
use rppal::pwm::{Channel, Polarity, Pwm};

use crate::error::HwError;
use spindle_traits::{EdgeSource, Level, LevelSource, MotorDriver, StatusLed};

/// ESC refresh period: standard 50 Hz servo PWM.
const ESC_PERIOD: Duration = Duration::from_millis(20);

/// Hardware ESC on a PWM channel. Duty commands are pulse widths in ns.
pub struct PiEsc {
    pwm: Pwm,
}

impl PiEsc {
    pub fn new(channel: Channel) -> Result<Self, HwError> {
        let pwm = Pwm::with_period(
            channel,
            ESC_PERIOD,
            Duration::ZERO,
            Polarity::Normal,
            false,
        )
        .map_err(|e| HwError::Pwm(e.to_string()))?;
        Ok(Self { pwm })
    }
}

impl MotorDriver for PiEsc {
    fn arm(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pwm
            .enable()
            .map_err(|e| Box::new(HwError::Pwm(e.to_string())) as _)
    }

    fn set_duty_ns(
        &mut self,
        duty_ns: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pwm
            .set_pulse_width(Duration::from_nanos(u64::from(duty_ns)))
            .map_err(|e| Box::new(HwError::Pwm(e.to_string())) as _)
    }

    fn disarm(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pwm
            .disable()
            .map_err(|e| Box::new(HwError::Pwm(e.to_string())) as _)
    }
}

/// Falling-edge input line (tachometer, encoder DT, buttons), pulled up.
pub struct PiEdge {
    pin: InputPin,
}

impl PiEdge {
    pub fn new(gpio: &Gpio, bcm_pin: u8) -> Result<Self, HwError> {
        let pin = gpio
            .get(bcm_pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_input_pullup();
        Ok(Self { pin })
    }
}

impl EdgeSource for PiEdge {
    fn on_edge(&mut self, mut callback: Box<dyn FnMut() + Send>) {
        if let Err(e) = self
            .pin
            .set_async_interrupt(Trigger::FallingEdge, move |_| callback())
        {
            tracing::error!(error = %e, pin = self.pin.pin(), "edge interrupt registration failed");
        }
    }
}

/// Synchronous level input (mode switch, quadrature CLK), pulled up.
pub struct PiLevel {
    pin: InputPin,
}

impl PiLevel {
    pub fn new(gpio: &Gpio, bcm_pin: u8) -> Result<Self, HwError> {
        let pin = gpio
            .get(bcm_pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_input_pullup();
        Ok(Self { pin })
    }
}

impl LevelSource for PiLevel {
    fn level(&mut self) -> Level {
        if self.pin.is_high() {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Run-indicator LED on an output pin.
pub struct PiLed {
    pin: OutputPin,
}

impl PiLed {
    pub fn new(gpio: &Gpio, bcm_pin: u8) -> Result<Self, HwError> {
        let pin = gpio
            .get(bcm_pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_output_low();
        Ok(Self { pin })
    }
}

impl StatusLed for PiLed {
    fn set(&mut self, on: bool) {
        if on {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }

    fn toggle(&mut self) {
        self.pin.toggle();
    }
}
