//! Test and wiring helpers for spindle_core.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use spindle_traits::{Buzzer, Clock, Level, LevelSource, Panel, StatusLed};

/// Deterministic clock whose time is advanced manually. Clones share the
/// same offset, so a copy handed to an edge handler stays in lockstep with
/// the copy driving the loop. `sleep` advances time instead of sleeping.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
        self.origin + off
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }

    fn epoch_secs(&self) -> u64 {
        self.offset
            .lock()
            .map(|g| g.as_secs())
            .unwrap_or(0)
    }
}

/// Panel that discards every frame.
#[derive(Debug, Default)]
pub struct NullPanel;

impl Panel for NullPanel {
    fn clear(&mut self) {}
    fn draw_line(&mut self, _row: u8, _text: &str) {}
    fn present(&mut self) {}
}

/// Buzzer that swallows every tone.
#[derive(Debug, Default)]
pub struct SilentBuzzer;

impl Buzzer for SilentBuzzer {
    fn tone(&mut self, _freq_hz: u32, _duration_ms: u32) {}
}

/// LED that goes nowhere.
#[derive(Debug, Default)]
pub struct NullLed;

impl StatusLed for NullLed {
    fn set(&mut self, _on: bool) {}
    fn toggle(&mut self) {}
}

/// Level source pinned to a fixed level, or shared for toggling from tests.
#[derive(Debug, Clone)]
pub struct StaticLevel {
    level: Arc<Mutex<Level>>,
}

impl StaticLevel {
    pub fn new(level: Level) -> Self {
        Self {
            level: Arc::new(Mutex::new(level)),
        }
    }

    pub fn set(&self, level: Level) {
        if let Ok(mut l) = self.level.lock() {
            *l = level;
        }
    }
}

impl LevelSource for StaticLevel {
    fn level(&mut self) -> Level {
        self.level.lock().map(|l| *l).unwrap_or(Level::Low)
    }
}
