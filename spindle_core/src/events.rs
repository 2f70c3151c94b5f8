//! Edge-handler → control-loop plumbing.
//!
//! Edge callbacks run preemptively and must stay short and non-blocking, so
//! they only debounce, decode, and push a small event onto a bounded
//! channel. The control loop drains the channel once per tick and applies
//! the events; audible feedback flows the other way as `Feedback` values
//! sounded by the loop, never from handler context.

use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel as xch;
use spindle_traits::{Clock, LevelSource};

use crate::debounce::DebounceGate;
use crate::encoder::{Direction, EncoderInput};

/// One debounced operator input, as seen by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    SpeedStep(Direction),
    TimeStep(Direction),
    SpeedCommit,
    TimeCommit,
    StartStop,
}

/// Which encoder a handler feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderChannel {
    Speed,
    Time,
}

/// Which push button a handler feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    StartStop,
    SpeedCommit,
    TimeCommit,
}

/// Audible confirmations, drained and sounded by the loop each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// Manual start/stop or setpoint commit press.
    ButtonAck,
    /// Setpoint commit acknowledged.
    CommitAck,
    /// Countdown reached zero; the run was stopped automatically.
    RunExpired,
    /// Startup calibration finished.
    Ready,
}

impl Feedback {
    /// (frequency Hz, duration ms) for this confirmation.
    pub fn tone(self) -> (u32, u32) {
        match self {
            Feedback::ButtonAck | Feedback::CommitAck => (1000, 200),
            Feedback::RunExpired => (500, 2000),
            Feedback::Ready => (500, 1000),
        }
    }
}

/// Bounded event queue between edge handlers and the control loop.
///
/// Handlers use `try_send`: when the queue is full the event is dropped
/// rather than ever blocking in handler context. The capacity is generous
/// against a human turning knobs within one 500 ms tick.
pub struct InputHub {
    tx: xch::Sender<InputEvent>,
    rx: xch::Receiver<InputEvent>,
    epoch: Instant,
}

impl InputHub {
    pub fn new(clock: &Arc<dyn Clock + Send + Sync>) -> Self {
        Self::with_capacity(clock, 32)
    }

    pub fn with_capacity(clock: &Arc<dyn Clock + Send + Sync>, capacity: usize) -> Self {
        let (tx, rx) = xch::bounded(capacity);
        Self {
            tx,
            rx,
            epoch: clock.now(),
        }
    }

    /// Raw sender, for wiring custom sources (tests, signal handlers).
    pub fn sender(&self) -> xch::Sender<InputEvent> {
        self.tx.clone()
    }

    /// Drain everything queued since the previous tick.
    pub fn drain(&self) -> impl Iterator<Item = InputEvent> + '_ {
        self.rx.try_iter()
    }

    /// Build the edge callback for one rotary encoder. The quadrature phase
    /// pins are read at the edge instant; the gate filters contact bounce.
    pub fn encoder_handler<C, D>(
        &self,
        channel: EncoderChannel,
        mut clk: C,
        mut dt: D,
        gate: DebounceGate,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> impl FnMut() + Send + use<C, D>
    where
        C: LevelSource + Send + 'static,
        D: LevelSource + Send + 'static,
    {
        let tx = self.tx.clone();
        let epoch = self.epoch;
        let mut encoder = EncoderInput::new(gate);
        move || {
            let now_ms = clock.ms_since(epoch);
            if let Some(dir) = encoder.on_edge(clk.level(), dt.level(), now_ms) {
                let event = match channel {
                    EncoderChannel::Speed => InputEvent::SpeedStep(dir),
                    EncoderChannel::Time => InputEvent::TimeStep(dir),
                };
                // Queue full: drop the step; never block here.
                let _ = tx.try_send(event);
            }
        }
    }

    /// Build the edge callback for one push button.
    pub fn button_handler(
        &self,
        button: ButtonKind,
        mut gate: DebounceGate,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> impl FnMut() + Send + use<> {
        let tx = self.tx.clone();
        let epoch = self.epoch;
        move || {
            let now_ms = clock.ms_since(epoch);
            if gate.accept(now_ms) {
                let event = match button {
                    ButtonKind::StartStop => InputEvent::StartStop,
                    ButtonKind::SpeedCommit => InputEvent::SpeedCommit,
                    ButtonKind::TimeCommit => InputEvent::TimeCommit,
                };
                let _ = tx.try_send(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::Retrigger;
    use crate::mocks::{ManualClock, StaticLevel};
    use spindle_traits::Level;

    fn clock() -> (Arc<dyn Clock + Send + Sync>, ManualClock) {
        let manual = ManualClock::new();
        (Arc::new(manual.clone()), manual)
    }

    #[test]
    fn button_edges_are_debounced_into_events() {
        let (clock_dyn, manual) = clock();
        let hub = InputHub::new(&clock_dyn);
        let mut press = hub.button_handler(
            ButtonKind::StartStop,
            DebounceGate::new(200, Retrigger::Always),
            clock_dyn.clone(),
        );

        manual.advance_ms(201);
        press();
        press(); // same instant: filtered
        manual.advance_ms(300);
        press();

        let events: Vec<_> = hub.drain().collect();
        assert_eq!(events, vec![InputEvent::StartStop, InputEvent::StartStop]);
    }

    #[test]
    fn encoder_steps_carry_direction() {
        let (clock_dyn, manual) = clock();
        let hub = InputHub::new(&clock_dyn);
        let mut step = hub.encoder_handler(
            EncoderChannel::Speed,
            StaticLevel::new(Level::High),
            StaticLevel::new(Level::High),
            DebounceGate::new(100, Retrigger::Always),
            clock_dyn.clone(),
        );

        manual.advance_ms(101);
        step();
        manual.advance_ms(101);
        step();

        let events: Vec<_> = hub.drain().collect();
        assert_eq!(
            events,
            vec![
                InputEvent::SpeedStep(Direction::Up),
                InputEvent::SpeedStep(Direction::Up)
            ]
        );
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (clock_dyn, _manual) = clock();
        let hub = InputHub::with_capacity(&clock_dyn, 2);
        let tx = hub.sender();
        for _ in 0..5 {
            let _ = tx.try_send(InputEvent::StartStop);
        }
        assert_eq!(hub.drain().count(), 2);
    }
}
