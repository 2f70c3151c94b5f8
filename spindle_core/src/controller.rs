//! Closed-loop speed control: RPM error to ESC duty command.
//!
//! This is deliberately a crude proportional-only controller with no
//! integrator and a zero-width dead zone, preserved from the source
//! hardware where it is well matched to the ESC's own response.

use crate::config::ControlCfg;

/// Controller phase. `Disabled` whenever the run state is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Disabled,
    Ramping,
    Holding,
}

pub struct SpeedController {
    cfg: ControlCfg,
    duty_ns: u32,
    state: ControlState,
}

impl SpeedController {
    pub fn new(mut cfg: ControlCfg) -> Self {
        cfg.kick_bands.sort_by_key(|b| b.up_to_rpm);
        let duty_ns = cfg.duty.start_ns;
        Self {
            cfg,
            duty_ns,
            state: ControlState::Disabled,
        }
    }

    #[inline]
    pub fn state(&self) -> ControlState {
        self.state
    }

    /// The internal duty the ramp is tracking (not necessarily the last
    /// issued command: while disabled the command is the stop duty).
    #[inline]
    pub fn duty_ns(&self) -> u32 {
        self.duty_ns
    }

    /// Kick-start duty multiplier for a given setpoint, from the band table.
    fn kick_multiplier(&self, target_rpm: i32) -> u32 {
        for band in &self.cfg.kick_bands {
            if target_rpm <= band.up_to_rpm {
                return band.multiplier;
            }
        }
        self.cfg.kick_multiplier_above
    }

    /// One control evaluation. Returns the duty command to issue, or `None`
    /// when on target (the previously issued command stays in effect).
    pub fn tick(&mut self, smoothed_rpm: i32, target_rpm: i32, enabled: bool) -> Option<u32> {
        let duty = self.cfg.duty;

        if !enabled {
            // Reset the ramp baseline for the next run.
            self.state = ControlState::Disabled;
            self.duty_ns = duty.start_ns;
            return Some(duty.stop_ns);
        }

        if smoothed_rpm == 0 {
            // Rotor not yet spinning: kick-start proportional to the target.
            let mult = self.kick_multiplier(target_rpm);
            let kick = (target_rpm.max(0) as u32).saturating_mul(mult);
            self.duty_ns = duty.start_ns.saturating_add(kick).min(duty.max_ns);
            self.state = ControlState::Ramping;
            return Some(self.duty_ns);
        }

        if smoothed_rpm < target_rpm {
            // Under speed: add the error, clamp after the add.
            let err = (target_rpm - smoothed_rpm) as u32;
            self.duty_ns = self.duty_ns.saturating_add(err).min(duty.max_ns);
            self.state = ControlState::Ramping;
            return Some(self.duty_ns);
        }

        if smoothed_rpm > target_rpm {
            // Over speed: subtract the error, never coast below the baseline.
            let err = (smoothed_rpm - target_rpm) as u32;
            self.duty_ns = self.duty_ns.saturating_sub(err).max(duty.start_ns);
            self.state = ControlState::Ramping;
            return Some(self.duty_ns);
        }

        // On target: hold the previous command.
        self.state = ControlState::Holding;
        None
    }
}

/// Diagnostic error metric in percent of the setpoint; not fed back into
/// control. `None` when the setpoint is zero.
#[inline]
pub fn rpm_error_percent(target_rpm: i32, smoothed_rpm: i32) -> Option<f64> {
    if target_rpm <= 0 {
        return None;
    }
    Some(((target_rpm - smoothed_rpm) as f64 / target_rpm as f64) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DutyCfg;

    fn controller() -> SpeedController {
        SpeedController::new(ControlCfg::default())
    }

    const DUTY: DutyCfg = DutyCfg {
        stop_ns: 1_300_000,
        start_ns: 1_360_000,
        max_ns: 1_470_000,
    };

    #[test]
    fn disabled_commands_stop_and_resets_ramp() {
        let mut c = controller();
        // Wind the ramp up first.
        c.tick(500, 2000, true);
        assert!(c.duty_ns() > DUTY.start_ns);
        assert_eq!(c.tick(500, 2000, false), Some(DUTY.stop_ns));
        assert_eq!(c.state(), ControlState::Disabled);
        assert_eq!(c.duty_ns(), DUTY.start_ns);
    }

    #[test]
    fn kick_start_uses_band_table() {
        // ≤1000 → ×12.
        let mut c = controller();
        assert_eq!(c.tick(0, 1000, true), Some(DUTY.start_ns + 12_000));
        // 1001–2000 → ×10.
        let mut c = controller();
        assert_eq!(c.tick(0, 2000, true), Some(DUTY.start_ns + 20_000));
        // 2001–3000 → ×12.
        let mut c = controller();
        assert_eq!(c.tick(0, 3000, true), Some(DUTY.start_ns + 36_000));
        // >3000 → ×10.
        let mut c = controller();
        assert_eq!(c.tick(0, 4000, true), Some(DUTY.start_ns + 40_000));
    }

    #[test]
    fn kick_start_clamps_to_max() {
        let mut c = SpeedController::new(ControlCfg {
            duty: DUTY,
            kick_bands: Vec::new(),
            kick_multiplier_above: 1000,
        });
        assert_eq!(c.tick(0, 4000, true), Some(DUTY.max_ns));
    }

    #[test]
    fn under_speed_adds_error_with_ceiling() {
        let mut c = controller();
        let d1 = c.tick(1800, 2000, true).expect("command");
        assert_eq!(d1, DUTY.start_ns + 200);
        let d2 = c.tick(1900, 2000, true).expect("command");
        assert_eq!(d2, d1 + 100);
        assert_eq!(c.state(), ControlState::Ramping);
    }

    #[test]
    fn over_speed_subtracts_error_with_floor() {
        let mut c = controller();
        c.tick(1000, 2000, true); // wind up: +1000
        let d = c.tick(4000, 100, true).expect("command");
        assert_eq!(d, DUTY.start_ns, "large over-speed floors at start duty");
    }

    #[test]
    fn on_target_holds_previous_command() {
        let mut c = controller();
        c.tick(1900, 2000, true);
        assert_eq!(c.tick(2000, 2000, true), None);
        assert_eq!(c.state(), ControlState::Holding);
    }

    #[test]
    fn error_percent_guards_zero_setpoint() {
        assert_eq!(rpm_error_percent(0, 100), None);
        let e = rpm_error_percent(1000, 900).expect("metric");
        assert!((e - 10.0).abs() < f64::EPSILON);
    }
}
