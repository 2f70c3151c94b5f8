//! `From` implementations bridging `spindle_config` types to
//! `spindle_core` types, so callers never map fields by hand.

use crate::config::{
    ControlCfg, DebounceCfg, DutyCfg, KickBand, LimitCfg, LimitsCfg, RotorCfg, SamplerCfg,
    StartupCfg,
};
use crate::debounce::Retrigger;

impl From<&spindle_config::SamplerCfg> for SamplerCfg {
    fn from(c: &spindle_config::SamplerCfg) -> Self {
        Self {
            window_ms: c.window_ms,
            pulses_per_rev: c.pulses_per_rev,
            max_pulses_per_window: c.max_pulses_per_window,
        }
    }
}

impl From<&spindle_config::ControlCfg> for ControlCfg {
    fn from(c: &spindle_config::ControlCfg) -> Self {
        Self {
            duty: DutyCfg {
                stop_ns: c.stop_duty_ns,
                start_ns: c.start_duty_ns,
                max_ns: c.max_duty_ns,
            },
            kick_bands: c
                .kick_bands
                .iter()
                .map(|(up_to_rpm, multiplier)| KickBand {
                    up_to_rpm: *up_to_rpm,
                    multiplier: *multiplier,
                })
                .collect(),
            kick_multiplier_above: c.kick_multiplier_above,
        }
    }
}

impl From<&spindle_config::Limit> for LimitCfg {
    fn from(c: &spindle_config::Limit) -> Self {
        Self {
            min: c.min,
            max: c.max,
            step: c.step,
        }
    }
}

impl From<&spindle_config::Limits> for LimitsCfg {
    fn from(c: &spindle_config::Limits) -> Self {
        Self {
            rpm: (&c.rpm).into(),
            rcf: (&c.rcf).into(),
            time_secs: (&c.time_secs).into(),
        }
    }
}

impl From<spindle_config::Retrigger> for Retrigger {
    fn from(r: spindle_config::Retrigger) -> Self {
        match r {
            spindle_config::Retrigger::Always => Retrigger::Always,
            spindle_config::Retrigger::OnAccept => Retrigger::OnAccept,
        }
    }
}

impl From<&spindle_config::Debounce> for DebounceCfg {
    fn from(c: &spindle_config::Debounce) -> Self {
        Self {
            button_ms: c.button_ms,
            encoder_ms: c.encoder_ms,
            retrigger: c.retrigger.into(),
        }
    }
}

impl From<&spindle_config::Rotor> for RotorCfg {
    fn from(c: &spindle_config::Rotor) -> Self {
        Self {
            radius_cm: c.radius_cm,
        }
    }
}

impl From<&spindle_config::Startup> for StartupCfg {
    fn from(c: &spindle_config::Startup) -> Self {
        Self {
            esc_arm_ms: c.esc_arm_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schema_maps_to_reference_values() {
        let cfg = spindle_config::Config::default();
        let control: ControlCfg = (&cfg.control).into();
        assert_eq!(control.duty.stop_ns, 1_300_000);
        assert_eq!(control.duty.start_ns, 1_360_000);
        assert_eq!(control.duty.max_ns, 1_470_000);
        assert_eq!(control.kick_bands.len(), 3);

        let limits: LimitsCfg = (&cfg.limits).into();
        assert_eq!(limits.rpm.max, 4000);
        assert_eq!(limits.rcf.max, 1960);
        assert_eq!(limits.time_secs.max, 3600);

        let debounce: DebounceCfg = (&cfg.debounce).into();
        assert_eq!(debounce.button_ms, 200);
        assert_eq!(debounce.retrigger, Retrigger::Always);
    }
}
