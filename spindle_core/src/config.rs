//! Runtime configuration types for the spin engine.
//!
//! These are the structs consumed by `SpinCore`. They are separate from the
//! TOML-deserialized schema in `spindle_config`; `conversions` bridges the
//! two.

/// Tachometer sampling configuration.
#[derive(Debug, Clone, Copy)]
pub struct SamplerCfg {
    /// Fixed sampling window in milliseconds; also the control tick period.
    pub window_ms: u32,
    /// Tachometer pulses per full rotor revolution.
    pub pulses_per_rev: u32,
    /// Plausibility ceiling: a window with more pulses than this is treated
    /// as a stuck reflective surface and discarded.
    pub max_pulses_per_window: u32,
}

impl Default for SamplerCfg {
    fn default() -> Self {
        Self {
            window_ms: 500,
            pulses_per_rev: 6,
            max_pulses_per_window: 220,
        }
    }
}

/// ESC duty-cycle endpoints in nanoseconds of pulse width.
#[derive(Debug, Clone, Copy)]
pub struct DutyCfg {
    /// Issued while stopped; the ESC treats this as "off".
    pub stop_ns: u32,
    /// Baseline just above the stall threshold; the ramp floor.
    pub start_ns: u32,
    /// Hard ceiling for any command.
    pub max_ns: u32,
}

impl Default for DutyCfg {
    fn default() -> Self {
        Self {
            stop_ns: 1_300_000,
            start_ns: 1_360_000,
            max_ns: 1_470_000,
        }
    }
}

/// One row of the kick-start multiplier table: setpoints up to `up_to_rpm`
/// use `multiplier` duty units per RPM of setpoint.
#[derive(Debug, Clone, Copy)]
pub struct KickBand {
    pub up_to_rpm: i32,
    pub multiplier: u32,
}

/// Speed-control configuration.
#[derive(Debug, Clone)]
pub struct ControlCfg {
    pub duty: DutyCfg,
    /// Kick-start bands, sorted ascending by threshold during build. The ESC
    /// torque response is non-linear across the range; these values are
    /// empirically tuned per band and must not be collapsed to one constant.
    pub kick_bands: Vec<KickBand>,
    /// Multiplier for setpoints above the last band threshold.
    pub kick_multiplier_above: u32,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            duty: DutyCfg::default(),
            kick_bands: vec![
                KickBand {
                    up_to_rpm: 1000,
                    multiplier: 12,
                },
                KickBand {
                    up_to_rpm: 2000,
                    multiplier: 10,
                },
                KickBand {
                    up_to_rpm: 3000,
                    multiplier: 12,
                },
            ],
            kick_multiplier_above: 10,
        }
    }
}

/// Inclusive range and encoder step for one setpoint domain.
#[derive(Debug, Clone, Copy)]
pub struct LimitCfg {
    pub min: i32,
    pub max: i32,
    pub step: i32,
}

impl LimitCfg {
    #[inline]
    pub fn clamp(&self, v: i32) -> i32 {
        v.clamp(self.min, self.max)
    }

    /// Floor `v` to the nearest multiple of `step`, then clamp.
    #[inline]
    pub fn quantize_floor(&self, v: i32) -> i32 {
        let step = self.step.max(1);
        self.clamp((v / step) * step)
    }
}

/// Limits for the three operator-set domains.
#[derive(Debug, Clone, Copy)]
pub struct LimitsCfg {
    pub rpm: LimitCfg,
    pub rcf: LimitCfg,
    pub time_secs: LimitCfg,
}

impl Default for LimitsCfg {
    fn default() -> Self {
        Self {
            rpm: LimitCfg {
                min: 0,
                max: 4000,
                step: 100,
            },
            rcf: LimitCfg {
                min: 0,
                max: 1960,
                step: 10,
            },
            time_secs: LimitCfg {
                min: 0,
                max: 3600,
                step: 10,
            },
        }
    }
}

/// Debounce gate intervals for the input handlers.
#[derive(Debug, Clone, Copy)]
pub struct DebounceCfg {
    pub button_ms: u64,
    pub encoder_ms: u64,
    pub retrigger: crate::debounce::Retrigger,
}

impl Default for DebounceCfg {
    fn default() -> Self {
        Self {
            button_ms: 200,
            encoder_ms: 100,
            retrigger: crate::debounce::Retrigger::Always,
        }
    }
}

/// Rotor geometry for the RPM/RCF conversion.
#[derive(Debug, Clone, Copy)]
pub struct RotorCfg {
    pub radius_cm: f64,
}

impl Default for RotorCfg {
    fn default() -> Self {
        Self { radius_cm: 11.0 }
    }
}

/// Startup/calibration sequence timing.
#[derive(Debug, Clone, Copy)]
pub struct StartupCfg {
    /// How long to hold the stop duty so the ESC arms.
    pub esc_arm_ms: u64,
}

impl Default for StartupCfg {
    fn default() -> Self {
        Self { esc_arm_ms: 5000 }
    }
}
