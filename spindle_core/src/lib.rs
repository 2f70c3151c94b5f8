#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core centrifuge control logic (hardware-agnostic).
//!
//! This crate provides the real-time control core of a motorized centrifuge.
//! All hardware interactions go through the `spindle_traits` traits
//! (`MotorDriver`, `Panel`, `Buzzer`, edge/level sources, `Clock`).
//!
//! ## Architecture
//!
//! - **Units**: pure RPM ⇄ RCF conversion (`units` module)
//! - **Inputs**: debounced encoder/button edges queued to the loop
//!   (`debounce`, `encoder`, `events` modules)
//! - **Setpoints**: staged/committed values, speed-domain union (`setpoint`)
//! - **Sampling**: atomic pulse counter, windowed RPM estimate (`tacho`)
//! - **Control**: proportional duty ramp with kick-start bands (`controller`)
//! - **Run cycle**: state machine and countdown timer (`state`, `timer`)
//!
//! ## Concurrency
//!
//! Edge handlers are the only preemptive writers, one handler per shared
//! field: the tachometer handler increments an atomic counter that the loop
//! drains with an atomic swap, and every operator input travels through a
//! bounded channel. No event can be lost or double-applied across a tick
//! boundary, and nothing in handler context blocks.

// Module declarations
pub mod config;
pub mod controller;
pub mod conversions;
pub mod debounce;
pub mod encoder;
pub mod error;
pub mod events;
pub mod mocks;
pub mod runner;
pub mod setpoint;
pub mod state;
pub mod tacho;
pub mod timer;
pub mod units;
pub mod util;

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use spindle_traits::clock::{Clock, MonotonicClock};
use spindle_traits::{Buzzer, Level, LevelSource, MotorDriver, Panel, StatusLed};

pub use crate::config::{
    ControlCfg, DebounceCfg, DutyCfg, KickBand, LimitCfg, LimitsCfg, RotorCfg, SamplerCfg,
    StartupCfg,
};
pub use crate::controller::{ControlState, SpeedController, rpm_error_percent};
pub use crate::debounce::{DebounceGate, Retrigger};
pub use crate::encoder::{Direction, EncoderInput};
pub use crate::error::{BuildError, Result, SpinError};
pub use crate::events::{ButtonKind, EncoderChannel, Feedback, InputEvent, InputHub};
pub use crate::setpoint::{Setpoint, SpeedMode, SpeedReadout, SpeedTarget};
pub use crate::state::{RunPhase, RunStateMachine, StopCause, Transition};
pub use crate::tacho::{PulseCounter, RpmEstimate, TachoSampler};
pub use crate::timer::RunTimer;

use crate::state::Transition as RunTransition;

/// Snapshot of one control tick, for telemetry and the CLI.
#[derive(Debug, Clone, Copy)]
pub struct TickReport {
    pub phase: RunPhase,
    pub estimate: RpmEstimate,
    /// Internal ramp duty after this tick (ns of pulse width).
    pub duty_ns: u32,
    /// Committed setpoint projected into the RPM domain.
    pub target_rpm: i32,
    /// Countdown seconds left; `None` while stopped. May be negative on the
    /// tick that observes expiry.
    pub remaining_secs: Option<i64>,
}

/// The periodic control engine, generic over the hardware collaborators.
pub struct SpinCore<M: MotorDriver, P: Panel, B: Buzzer> {
    motor: M,
    panel: P,
    buzzer: B,
    led: Option<Box<dyn StatusLed>>,
    mode_switch: Option<Box<dyn LevelSource>>,
    clock: Arc<dyn Clock + Send + Sync>,

    rotor: RotorCfg,
    startup: StartupCfg,
    window_ms: u32,
    duty_cfg: DutyCfg,

    counter: PulseCounter,
    sampler: TachoSampler,
    hub: InputHub,

    speed: SpeedTarget,
    time_set: Setpoint,
    timer: RunTimer,
    run: RunStateMachine,
    controller: SpeedController,

    // Feedback tones queued during event processing, sounded at tick end.
    feedback: Vec<Feedback>,
    last_estimate: RpmEstimate,
}

impl<M: MotorDriver, P: Panel, B: Buzzer> core::fmt::Debug for SpinCore<M, P, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpinCore")
            .field("phase", &self.run.phase())
            .field("smoothed_rpm", &self.last_estimate.smoothed)
            .field("duty_ns", &self.controller.duty_ns())
            .finish()
    }
}

impl<M: MotorDriver, P: Panel, B: Buzzer> SpinCore<M, P, B> {
    /// Handle for the tachometer edge callback. Clones share the counter.
    pub fn pulse_counter(&self) -> PulseCounter {
        self.counter.clone()
    }

    /// Sender for injecting operator events (tests, signal handlers).
    pub fn input_sender(&self) -> crossbeam_channel::Sender<InputEvent> {
        self.hub.sender()
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        Arc::clone(&self.clock)
    }

    /// The sampling window, which is also the control tick period.
    pub fn window(&self) -> Duration {
        Duration::from_millis(u64::from(self.window_ms))
    }

    pub fn phase(&self) -> RunPhase {
        self.run.phase()
    }

    pub fn last_estimate(&self) -> RpmEstimate {
        self.last_estimate
    }

    /// Startup/ESC-arming sequence: hold the stop duty so the ESC arms, then
    /// step to the start baseline and sound the ready tone. Blocks for the
    /// configured arm delay; call once before entering the tick loop.
    pub fn calibrate(&mut self) -> Result<()> {
        self.panel.clear();
        self.panel.draw_line(0, "Calibrating.");
        self.panel.draw_line(1, "Set Min Speed.");
        self.panel.present();

        self.motor
            .arm()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("arm motor")?;
        self.motor
            .set_duty_ns(self.controller_duty().stop_ns)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("set stop duty")?;
        self.clock
            .sleep(Duration::from_millis(self.startup.esc_arm_ms));
        self.motor
            .set_duty_ns(self.controller_duty().start_ns)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("set start duty")?;

        self.panel.clear();
        self.panel.present();

        let (freq, dur) = Feedback::Ready.tone();
        self.buzzer.tone(freq, dur);
        tracing::info!("calibration complete");
        Ok(())
    }

    fn controller_duty(&self) -> DutyCfg {
        // The controller owns the canonical duty endpoints.
        self.duty_cfg
    }

    /// One control tick: drain the pulse window, apply queued operator
    /// input, advance the countdown, command the motor, sound feedback,
    /// and render a display frame.
    pub fn tick(&mut self) -> Result<TickReport> {
        let pulses = self.counter.take();
        let estimate = self.sampler.ingest(pulses);
        self.last_estimate = estimate;

        // The mode switch is a level, sampled once per tick. Low reads as
        // RPM (pull-up, switch closed), high as RCF.
        if let Some(sw) = self.mode_switch.as_mut() {
            let mode = match sw.level() {
                Level::Low => SpeedMode::Rpm,
                Level::High => SpeedMode::Rcf,
            };
            self.speed.switch_mode(mode)?;
        }

        let now_secs = self.clock.epoch_secs();
        let events: Vec<InputEvent> = self.hub.drain().collect();
        for event in events {
            self.apply_event(event, now_secs);
        }

        // Countdown: polled while running; the first observed expiry stops
        // the run and queues the long alert tone.
        let mut remaining = None;
        if self.run.is_running()
            && let Some(rem) = self
                .timer
                .remaining(i64::from(self.time_set.committed()), now_secs)
        {
            if RunTimer::has_expired(rem) {
                if let Some(tr) = self.run.expire() {
                    self.timer.stop();
                    self.feedback.push(tr.feedback());
                    tracing::info!("countdown expired, stopping");
                }
            }
            remaining = Some(rem);
        }

        let target_rpm = self.speed.control_rpm()?;
        let enabled = self.run.is_running();
        if let Some(duty) = self.controller.tick(estimate.smoothed, target_rpm, enabled) {
            self.motor
                .set_duty_ns(duty)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err("set duty")?;
        }

        if let Some(pct) = rpm_error_percent(target_rpm, estimate.smoothed) {
            tracing::trace!(
                target_rpm,
                smoothed = estimate.smoothed,
                error_pct = pct,
                "speed error"
            );
        }
        tracing::debug!(
            pulses,
            rpm = estimate.rounded,
            duty_ns = self.controller.duty_ns(),
            phase = ?self.run.phase(),
            "tick"
        );

        // Run indicator: solid while stopped, flashing at tick cadence.
        if let Some(led) = self.led.as_mut() {
            match self.run.phase() {
                RunPhase::Stopped => led.set(true),
                RunPhase::Running => led.toggle(),
            }
        }

        // Feedback tones are sounded here, in loop context, never from the
        // edge handlers that caused them.
        for fb in std::mem::take(&mut self.feedback) {
            let (freq, dur) = fb.tone();
            self.buzzer.tone(freq, dur);
        }

        self.render(estimate, remaining)?;

        Ok(TickReport {
            phase: self.run.phase(),
            estimate,
            duty_ns: self.controller.duty_ns(),
            target_rpm,
            remaining_secs: remaining,
        })
    }

    fn apply_event(&mut self, event: InputEvent, now_secs: u64) {
        match event {
            InputEvent::SpeedStep(dir) => self.speed.nudge(dir),
            InputEvent::TimeStep(dir) => self.time_set.nudge(dir),
            InputEvent::SpeedCommit => {
                // The press is acknowledged either way; the value only
                // latches while stopped.
                self.feedback.push(Feedback::CommitAck);
                if let Err(e) = self.speed.commit(self.run.phase()) {
                    tracing::debug!(error = %e, "speed commit ignored");
                }
            }
            InputEvent::TimeCommit => {
                self.feedback.push(Feedback::CommitAck);
                if let Err(e) = self.time_set.commit(self.run.phase()) {
                    tracing::debug!(error = %e, "time commit ignored");
                }
            }
            InputEvent::StartStop => {
                let transition = self.run.toggle();
                match transition {
                    RunTransition::Started => {
                        self.timer.start(now_secs);
                        tracing::info!(secs = self.time_set.committed(), "run started");
                    }
                    RunTransition::Stopped(cause) => {
                        self.timer.stop();
                        tracing::info!(?cause, "run stopped");
                    }
                }
                self.feedback.push(transition.feedback());
            }
        }
    }

    fn render(&mut self, estimate: RpmEstimate, remaining: Option<i64>) -> Result<()> {
        self.panel.clear();

        let (rpm_text, rcf_text) = match self.run.phase() {
            RunPhase::Stopped => {
                let r = self.speed.readout()?;
                (format!("RPM  : {}", r.rpm), format!("RCF  : {:.0}", r.rcf))
            }
            RunPhase::Running => {
                let rcf = units::rpm_to_rcf(estimate.rounded, self.rotor.radius_cm);
                (
                    format!("RPM  : {}", estimate.rounded),
                    format!("RCF  : {rcf:.0}"),
                )
            }
        };
        // The live-edited domain takes the top row.
        let (top, second) = match self.speed.mode() {
            SpeedMode::Rpm => (rpm_text, rcf_text),
            SpeedMode::Rcf => (rcf_text, rpm_text),
        };

        let time_secs = match self.run.phase() {
            RunPhase::Stopped => i64::from(self.time_set.staged()),
            RunPhase::Running => remaining.unwrap_or(0),
        };

        self.panel.draw_line(0, &top);
        self.panel.draw_line(1, &second);
        self.panel
            .draw_line(2, &format!("Time : {}", util::format_hms(time_secs)));
        self.panel.present();
        Ok(())
    }
}

// Map a boxed hardware error to the typed core error.
fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> SpinError {
    SpinError::Hardware(e.to_string())
}

/// Public dynamic (boxed) engine that preserves a simple API via composition.
pub struct Spin {
    inner: SpinCore<Box<dyn MotorDriver>, Box<dyn Panel>, Box<dyn Buzzer>>,
}

impl core::fmt::Debug for Spin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.inner, f)
    }
}

impl Spin {
    /// Start building a Spin engine.
    pub fn builder() -> SpinBuilder<Missing, Missing, Missing> {
        SpinBuilder::default()
    }

    pub fn tick(&mut self) -> Result<TickReport> {
        self.inner.tick()
    }

    pub fn calibrate(&mut self) -> Result<()> {
        self.inner.calibrate()
    }

    pub fn pulse_counter(&self) -> PulseCounter {
        self.inner.pulse_counter()
    }

    pub fn input_sender(&self) -> crossbeam_channel::Sender<InputEvent> {
        self.inner.input_sender()
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        self.inner.clock()
    }

    pub fn window(&self) -> Duration {
        self.inner.window()
    }

    pub fn phase(&self) -> RunPhase {
        self.inner.phase()
    }

    pub fn last_estimate(&self) -> RpmEstimate {
        self.inner.last_estimate()
    }
}

// Type-state markers for the builder
pub struct Missing;
pub struct Set;

/// Builder for `Spin`. Hardware is mandatory and tracked in the type state;
/// everything else falls back to the reference-hardware defaults.
pub struct SpinBuilder<M, P, B> {
    motor: Option<Box<dyn MotorDriver>>,
    panel: Option<Box<dyn Panel>>,
    buzzer: Option<Box<dyn Buzzer>>,
    led: Option<Box<dyn StatusLed>>,
    mode_switch: Option<Box<dyn LevelSource>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    hub: Option<InputHub>,
    sampler: Option<SamplerCfg>,
    control: Option<ControlCfg>,
    limits: Option<LimitsCfg>,
    rotor: Option<RotorCfg>,
    startup: Option<StartupCfg>,
    initial_mode: SpeedMode,
    initial_rpm: i32,
    initial_rcf: i32,
    initial_secs: i32,
    _m: PhantomData<M>,
    _p: PhantomData<P>,
    _b: PhantomData<B>,
}

impl Default for SpinBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            motor: None,
            panel: None,
            buzzer: None,
            led: None,
            mode_switch: None,
            clock: None,
            hub: None,
            sampler: None,
            control: None,
            limits: None,
            rotor: None,
            startup: None,
            initial_mode: SpeedMode::Rpm,
            initial_rpm: 1000,
            initial_rcf: 100,
            initial_secs: 30,
            _m: PhantomData,
            _p: PhantomData,
            _b: PhantomData,
        }
    }
}

impl<M, P, B> SpinBuilder<M, P, B> {
    // Move every field into a new type-state without repeating the list at
    // each mandatory setter.
    fn transition<M2, P2, B2>(self) -> SpinBuilder<M2, P2, B2> {
        SpinBuilder {
            motor: self.motor,
            panel: self.panel,
            buzzer: self.buzzer,
            led: self.led,
            mode_switch: self.mode_switch,
            clock: self.clock,
            hub: self.hub,
            sampler: self.sampler,
            control: self.control,
            limits: self.limits,
            rotor: self.rotor,
            startup: self.startup,
            initial_mode: self.initial_mode,
            initial_rpm: self.initial_rpm,
            initial_rcf: self.initial_rcf,
            initial_secs: self.initial_secs,
            _m: PhantomData,
            _p: PhantomData,
            _b: PhantomData,
        }
    }

    pub fn with_led(mut self, led: impl StatusLed + 'static) -> Self {
        self.led = Some(Box::new(led));
        self
    }

    pub fn with_mode_switch(mut self, sw: impl LevelSource + 'static) -> Self {
        self.mode_switch = Some(Box::new(sw));
        self
    }

    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Provide the input hub whose handlers are already wired to hardware.
    pub fn with_input_hub(mut self, hub: InputHub) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn with_sampler(mut self, sampler: SamplerCfg) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn with_control(mut self, control: ControlCfg) -> Self {
        self.control = Some(control);
        self
    }

    pub fn with_limits(mut self, limits: LimitsCfg) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn with_rotor(mut self, rotor: RotorCfg) -> Self {
        self.rotor = Some(rotor);
        self
    }

    pub fn with_startup(mut self, startup: StartupCfg) -> Self {
        self.startup = Some(startup);
        self
    }

    pub fn with_initial_mode(mut self, mode: SpeedMode) -> Self {
        self.initial_mode = mode;
        self
    }

    /// Initial staged+committed values for the three setpoints.
    pub fn with_initial_setpoints(mut self, rpm: i32, rcf: i32, secs: i32) -> Self {
        self.initial_rpm = rpm;
        self.initial_rcf = rcf;
        self.initial_secs = secs;
        self
    }

    /// Fallible build available in any type-state; returns a detailed
    /// `BuildError` for missing pieces.
    pub fn try_build(self) -> Result<Spin> {
        let motor = self
            .motor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingMotor))?;
        let panel = self
            .panel
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPanel))?;
        let buzzer = self
            .buzzer
            .ok_or_else(|| eyre::Report::new(BuildError::MissingBuzzer))?;

        let sampler = self.sampler.unwrap_or_default();
        let control = self.control.unwrap_or_default();
        let limits = self.limits.unwrap_or_default();
        let rotor = self.rotor.unwrap_or_default();
        let startup = self.startup.unwrap_or_default();
        validate_cfg(&sampler, &control, &limits, &rotor)?;

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };
        let hub = self
            .hub
            .unwrap_or_else(|| InputHub::new(&clock));

        let speed = SpeedTarget::new(
            self.initial_mode,
            self.initial_rpm,
            self.initial_rcf,
            &limits,
            rotor.radius_cm,
        );
        let time_set = Setpoint::new(self.initial_secs, limits.time_secs);

        Ok(Spin {
            inner: SpinCore {
                motor,
                panel,
                buzzer,
                led: self.led,
                mode_switch: self.mode_switch,
                clock,
                rotor,
                startup,
                window_ms: sampler.window_ms,
                duty_cfg: control.duty,
                counter: PulseCounter::new(),
                sampler: TachoSampler::new(sampler),
                hub,
                speed,
                time_set,
                timer: RunTimer::new(),
                run: RunStateMachine::new(),
                controller: SpeedController::new(control),
                feedback: Vec::new(),
                last_estimate: RpmEstimate::default(),
            },
        })
    }
}

// Setters that advance the type-state when providing mandatory hardware.
impl<P, B> SpinBuilder<Missing, P, B> {
    pub fn with_motor(mut self, motor: impl MotorDriver + 'static) -> SpinBuilder<Set, P, B> {
        self.motor = Some(Box::new(motor));
        self.transition()
    }
}

impl<M, B> SpinBuilder<M, Missing, B> {
    pub fn with_panel(mut self, panel: impl Panel + 'static) -> SpinBuilder<M, Set, B> {
        self.panel = Some(Box::new(panel));
        self.transition()
    }
}

impl<M, P> SpinBuilder<M, P, Missing> {
    pub fn with_buzzer(mut self, buzzer: impl Buzzer + 'static) -> SpinBuilder<M, P, Set> {
        self.buzzer = Some(Box::new(buzzer));
        self.transition()
    }
}

impl SpinBuilder<Set, Set, Set> {
    /// Validate and build. Only available once motor, panel and buzzer are
    /// all provided.
    pub fn build(self) -> Result<Spin> {
        self.try_build()
    }
}

fn validate_cfg(
    sampler: &SamplerCfg,
    control: &ControlCfg,
    limits: &LimitsCfg,
    rotor: &RotorCfg,
) -> Result<()> {
    if sampler.window_ms == 0 || sampler.window_ms > 60_000 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sampler.window_ms must be in 1..=60000",
        )));
    }
    if sampler.pulses_per_rev == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sampler.pulses_per_rev must be > 0",
        )));
    }
    if sampler.max_pulses_per_window == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sampler.max_pulses_per_window must be > 0",
        )));
    }
    let duty = control.duty;
    if !(duty.stop_ns <= duty.start_ns && duty.start_ns <= duty.max_ns) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "duty endpoints must satisfy stop <= start <= max",
        )));
    }
    for band in &control.kick_bands {
        if band.multiplier == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "kick band multiplier must be > 0",
            )));
        }
    }
    if control.kick_multiplier_above == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "kick_multiplier_above must be > 0",
        )));
    }
    for limit in [limits.rpm, limits.rcf, limits.time_secs] {
        if limit.min > limit.max {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "limit min must not exceed max",
            )));
        }
        if limit.min < 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "limit min must be >= 0",
            )));
        }
        if limit.step <= 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "limit step must be > 0",
            )));
        }
    }
    if !rotor.radius_cm.is_finite() || rotor.radius_cm <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "rotor radius must be positive",
        )));
    }
    Ok(())
}
