//! Operator setpoints: staged/committed values and the speed-domain union.

use crate::config::{LimitCfg, LimitsCfg};
use crate::encoder::Direction;
use crate::error::SpinError;
use crate::state::RunPhase;
use crate::units;

/// A bounded value with a staged copy edited by an encoder and a committed
/// copy consumed by control. The staged value is clamped on every mutation;
/// the committed value only changes through an explicit commit while the
/// motor is stopped.
#[derive(Debug, Clone, Copy)]
pub struct Setpoint {
    committed: i32,
    staged: i32,
    limits: LimitCfg,
}

impl Setpoint {
    pub fn new(initial: i32, limits: LimitCfg) -> Self {
        let v = limits.clamp(initial);
        Self {
            committed: v,
            staged: v,
            limits,
        }
    }

    #[inline]
    pub fn staged(&self) -> i32 {
        self.staged
    }

    #[inline]
    pub fn committed(&self) -> i32 {
        self.committed
    }

    #[inline]
    pub fn limits(&self) -> LimitCfg {
        self.limits
    }

    /// Apply one accepted encoder step to the staged value.
    pub fn nudge(&mut self, dir: Direction) {
        let delta = match dir {
            Direction::Up => self.limits.step,
            Direction::Down => -self.limits.step,
        };
        self.staged = self.limits.clamp(self.staged.saturating_add(delta));
    }

    /// Copy staged → committed. Refused while the motor is running so the
    /// control target can never change mid-run except via the stop path.
    pub fn commit(&mut self, phase: RunPhase) -> Result<(), SpinError> {
        if phase != RunPhase::Stopped {
            return Err(SpinError::Rejected(
                "cannot change setpoint while running",
            ));
        }
        self.committed = self.staged;
        Ok(())
    }

    /// Replace both values, e.g. when the staged value is re-derived after a
    /// mode switch. Inputs are quantized to this domain's step and clamped.
    fn replace_quantized(&mut self, staged: i32, committed: i32) {
        self.staged = self.limits.quantize_floor(staged);
        self.committed = self.limits.quantize_floor(committed);
    }
}

/// Which speed domain the operator is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedMode {
    Rpm,
    Rcf,
}

/// Staged speed values projected into both domains for display.
#[derive(Debug, Clone, Copy)]
pub struct SpeedReadout {
    pub rpm: i32,
    pub rcf: f64,
}

#[derive(Debug)]
enum SpeedSp {
    Rpm(Setpoint),
    Rcf(Setpoint),
}

/// The speed target as a tagged union: exactly one domain is authoritative
/// and live-edited at a time, the other is derived through the unit
/// converter on demand. Switching modes converts the current values into
/// the new domain and re-quantizes them to that domain's encoder step.
#[derive(Debug)]
pub struct SpeedTarget {
    sp: SpeedSp,
    rpm_limits: LimitCfg,
    rcf_limits: LimitCfg,
    radius_cm: f64,
}

impl SpeedTarget {
    pub fn new(
        mode: SpeedMode,
        initial_rpm: i32,
        initial_rcf: i32,
        limits: &LimitsCfg,
        radius_cm: f64,
    ) -> Self {
        let sp = match mode {
            SpeedMode::Rpm => SpeedSp::Rpm(Setpoint::new(initial_rpm, limits.rpm)),
            SpeedMode::Rcf => SpeedSp::Rcf(Setpoint::new(initial_rcf, limits.rcf)),
        };
        Self {
            sp,
            rpm_limits: limits.rpm,
            rcf_limits: limits.rcf,
            radius_cm,
        }
    }

    pub fn mode(&self) -> SpeedMode {
        match self.sp {
            SpeedSp::Rpm(_) => SpeedMode::Rpm,
            SpeedSp::Rcf(_) => SpeedMode::Rcf,
        }
    }

    fn live(&mut self) -> &mut Setpoint {
        match &mut self.sp {
            SpeedSp::Rpm(sp) | SpeedSp::Rcf(sp) => sp,
        }
    }

    /// One accepted encoder step on the live domain.
    pub fn nudge(&mut self, dir: Direction) {
        self.live().nudge(dir);
    }

    /// Commit the staged value; subject to the stopped-only rule.
    pub fn commit(&mut self, phase: RunPhase) -> Result<(), SpinError> {
        self.live().commit(phase)
    }

    /// The committed target projected into the controller's RPM domain,
    /// quantized to the RPM encoder step.
    pub fn control_rpm(&self) -> Result<i32, SpinError> {
        match &self.sp {
            SpeedSp::Rpm(sp) => Ok(sp.committed()),
            SpeedSp::Rcf(sp) => {
                let rpm = units::rcf_to_rpm(sp.committed() as f64, self.radius_cm)?;
                Ok(self.rpm_limits.quantize_floor(rpm))
            }
        }
    }

    /// Staged values in both domains, for rendering.
    pub fn readout(&self) -> Result<SpeedReadout, SpinError> {
        match &self.sp {
            SpeedSp::Rpm(sp) => Ok(SpeedReadout {
                rpm: sp.staged(),
                rcf: units::rpm_to_rcf(sp.staged(), self.radius_cm),
            }),
            SpeedSp::Rcf(sp) => Ok(SpeedReadout {
                rpm: units::rcf_to_rpm(sp.staged() as f64, self.radius_cm)?,
                rcf: sp.staged() as f64,
            }),
        }
    }

    /// Follow the external mode switch. A no-op when the mode is unchanged;
    /// otherwise the staged and committed values are converted into the new
    /// domain and floored to its step, so they land on that domain's
    /// encoder grid.
    pub fn switch_mode(&mut self, mode: SpeedMode) -> Result<(), SpinError> {
        if mode == self.mode() {
            return Ok(());
        }
        match (&self.sp, mode) {
            (SpeedSp::Rpm(sp), SpeedMode::Rcf) => {
                let mut next = Setpoint::new(0, self.rcf_limits);
                next.replace_quantized(
                    units::rpm_to_rcf(sp.staged(), self.radius_cm) as i32,
                    units::rpm_to_rcf(sp.committed(), self.radius_cm) as i32,
                );
                self.sp = SpeedSp::Rcf(next);
            }
            (SpeedSp::Rcf(sp), SpeedMode::Rpm) => {
                let mut next = Setpoint::new(0, self.rpm_limits);
                next.replace_quantized(
                    units::rcf_to_rpm(sp.staged() as f64, self.radius_cm)?,
                    units::rcf_to_rpm(sp.committed() as f64, self.radius_cm)?,
                );
                self.sp = SpeedSp::Rpm(next);
            }
            _ => {}
        }
        Ok(())
    }
}
