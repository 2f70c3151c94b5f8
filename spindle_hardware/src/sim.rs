//! Simulated hardware: an ESC + rotor physics model and console-backed
//! panel/buzzer/LED, enough to run full spin cycles without a centrifuge on
//! the desk.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use spindle_traits::{Buzzer, EdgeSource, Level, LevelSource, MotorDriver, Panel, StatusLed};

/// Tunables for the rotor response model.
#[derive(Debug, Clone, Copy)]
pub struct RotorSimCfg {
    /// Duty at and below which the rotor coasts to a stop.
    pub start_duty_ns: u32,
    /// Steady-state slope: nanoseconds of pulse width per RPM above the
    /// start duty.
    pub ns_per_rpm: f64,
    /// First-order response per window, in (0, 1].
    pub response: f64,
    /// Tachometer pulses per revolution.
    pub pulses_per_rev: u32,
}

impl Default for RotorSimCfg {
    fn default() -> Self {
        Self {
            start_duty_ns: 1_360_000,
            ns_per_rpm: 27.5,
            response: 0.5,
            pulses_per_rev: 6,
        }
    }
}

/// Motor driver half of the simulation: stores the commanded duty where the
/// rotor model can see it.
pub struct SimulatedEsc {
    duty_ns: Arc<AtomicU32>,
    armed: bool,
}

impl MotorDriver for SimulatedEsc {
    fn arm(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.armed = true;
        tracing::debug!("esc armed (simulated)");
        Ok(())
    }

    fn set_duty_ns(
        &mut self,
        duty_ns: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !self.armed {
            tracing::trace!(duty_ns, "duty command before arm; simulated esc accepts it");
        }
        self.duty_ns.store(duty_ns, Ordering::Relaxed);
        Ok(())
    }

    fn disarm(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.armed = false;
        self.duty_ns.store(0, Ordering::Relaxed);
        Ok(())
    }
}

/// Rotor half of the simulation: integrates the commanded duty into an RPM
/// trajectory and emits tachometer pulse counts per window.
pub struct RotorSim {
    duty_ns: Arc<AtomicU32>,
    cfg: RotorSimCfg,
    rpm: f64,
    pulse_carry: f64,
}

impl RotorSim {
    /// Create the coupled ESC/rotor pair.
    pub fn new(cfg: RotorSimCfg) -> (SimulatedEsc, RotorSim) {
        let duty_ns = Arc::new(AtomicU32::new(0));
        (
            SimulatedEsc {
                duty_ns: Arc::clone(&duty_ns),
                armed: false,
            },
            RotorSim {
                duty_ns,
                cfg,
                rpm: 0.0,
                pulse_carry: 0.0,
            },
        )
    }

    pub fn rpm(&self) -> f64 {
        self.rpm
    }

    /// Advance the model by one sampling window and return the tachometer
    /// pulse count it produced. Fractional pulses carry into the next
    /// window so long windows don't lose revolutions.
    pub fn advance(&mut self, window_ms: u32) -> u32 {
        let duty = self.duty_ns.load(Ordering::Relaxed);
        let target_rpm = if duty <= self.cfg.start_duty_ns {
            0.0
        } else {
            f64::from(duty - self.cfg.start_duty_ns) / self.cfg.ns_per_rpm
        };
        self.rpm += (target_rpm - self.rpm) * self.cfg.response;

        let revs = self.rpm * f64::from(window_ms) / 60_000.0;
        let pulses = revs * f64::from(self.cfg.pulses_per_rev) + self.pulse_carry;
        let whole = pulses.floor().max(0.0);
        self.pulse_carry = pulses - whole;
        whole as u32
    }
}

/// Panel that prints each presented frame to stdout.
#[derive(Debug, Default)]
pub struct ConsolePanel {
    lines: Vec<(u8, String)>,
}

impl Panel for ConsolePanel {
    fn clear(&mut self) {
        self.lines.clear();
    }

    fn draw_line(&mut self, row: u8, text: &str) {
        self.lines.retain(|(r, _)| *r != row);
        self.lines.push((row, text.to_string()));
    }

    fn present(&mut self) {
        self.lines.sort_by_key(|(r, _)| *r);
        for (_, text) in &self.lines {
            println!("{text}");
        }
        if !self.lines.is_empty() {
            println!("---");
        }
    }
}

/// Buzzer that narrates its tones.
#[derive(Debug, Default)]
pub struct ConsoleBuzzer;

impl Buzzer for ConsoleBuzzer {
    fn tone(&mut self, freq_hz: u32, duration_ms: u32) {
        println!("(buzzer) {freq_hz} Hz for {duration_ms} ms");
    }
}

/// LED backed by a shared flag; observable from tests.
#[derive(Debug, Clone, Default)]
pub struct SimLed {
    on: Arc<AtomicBool>,
}

impl SimLed {
    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::Relaxed)
    }
}

impl StatusLed for SimLed {
    fn set(&mut self, on: bool) {
        self.on.store(on, Ordering::Relaxed);
    }

    fn toggle(&mut self) {
        self.on.fetch_xor(true, Ordering::Relaxed);
    }
}

/// Level input backed by a shared flag (mode switch, quadrature phases).
#[derive(Debug, Clone, Default)]
pub struct SharedLevel {
    high: Arc<AtomicBool>,
}

impl SharedLevel {
    pub fn new(high: bool) -> Self {
        Self {
            high: Arc::new(AtomicBool::new(high)),
        }
    }

    pub fn set_high(&self, high: bool) {
        self.high.store(high, Ordering::Relaxed);
    }
}

impl LevelSource for SharedLevel {
    fn level(&mut self) -> Level {
        if self.high.load(Ordering::Relaxed) {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Edge input that fires its registered callback on demand.
#[derive(Default)]
pub struct EdgeLine {
    callback: Option<Box<dyn FnMut() + Send>>,
}

impl EdgeLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate one electrical edge on the line.
    pub fn pulse(&mut self) {
        if let Some(cb) = self.callback.as_mut() {
            cb();
        }
    }
}

impl EdgeSource for EdgeLine {
    fn on_edge(&mut self, callback: Box<dyn FnMut() + Send>) {
        self.callback = Some(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotor_tracks_duty_and_coasts_down() {
        let (mut esc, mut rotor) = RotorSim::new(RotorSimCfg::default());
        esc.arm().expect("arm");
        // 1_360_000 + 27_500 → 1000 RPM steady state.
        esc.set_duty_ns(1_387_500).expect("duty");
        for _ in 0..20 {
            rotor.advance(500);
        }
        assert!((rotor.rpm() - 1000.0).abs() < 5.0, "rpm {}", rotor.rpm());

        esc.set_duty_ns(1_300_000).expect("stop duty");
        for _ in 0..30 {
            rotor.advance(500);
        }
        assert!(rotor.rpm() < 1.0, "rotor must coast to rest");
    }

    #[test]
    fn pulse_counts_match_speed() {
        let (mut esc, mut rotor) = RotorSim::new(RotorSimCfg {
            response: 1.0,
            ..RotorSimCfg::default()
        });
        esc.set_duty_ns(1_360_000 + 55_000).expect("duty"); // 2000 RPM
        let _ = rotor.advance(500);
        // 2000 RPM over 500 ms at 6 pulses/rev ≈ 100 pulses.
        let pulses = rotor.advance(500);
        assert!((99..=101).contains(&pulses), "pulses {pulses}");
    }

    #[test]
    fn edge_line_drives_its_callback() {
        let mut line = EdgeLine::new();
        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&count);
        line.on_edge(Box::new(move || {
            seen.fetch_add(1, Ordering::Relaxed);
        }));
        line.pulse();
        line.pulse();
        assert_eq!(count.load(Ordering::Relaxed), 2);
    }
}
