#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and rotor-preset parsing for the centrifuge controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The rotor CSV loader enforces headers and sanity-checks radii so a
//!   typo'd preset cannot silently skew every RCF conversion.

use serde::Deserialize;
use serde::de::Deserializer;

/// Rotor preset CSV schema.
///
/// Expected headers:
/// name,radius_cm
///
/// Example:
/// name,radius_cm
/// fixed-8x15,11.0
/// swing-4x50,16.5
#[derive(Debug, Deserialize, Clone)]
pub struct RotorRow {
    pub name: String,
    pub radius_cm: f64,
}

/// BCM pin assignments for the hardware build. Defaults match the
/// reference wiring.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Pins {
    pub motor_pwm: u8,
    pub tacho: u8,
    pub start_button: u8,
    pub button_led: u8,
    pub mode_switch: u8,
    pub buzzer: u8,
    pub speed_encoder_clk: u8,
    pub speed_encoder_dt: u8,
    pub speed_encoder_sw: u8,
    pub time_encoder_clk: u8,
    pub time_encoder_dt: u8,
    pub time_encoder_sw: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            motor_pwm: 15,
            tacho: 14,
            start_button: 9,
            button_led: 8,
            mode_switch: 4,
            buzzer: 6,
            speed_encoder_clk: 26,
            speed_encoder_dt: 27,
            speed_encoder_sw: 13,
            time_encoder_clk: 10,
            time_encoder_dt: 11,
            time_encoder_sw: 12,
        }
    }
}

impl Pins {
    fn all(&self) -> [u8; 12] {
        [
            self.motor_pwm,
            self.tacho,
            self.start_button,
            self.button_led,
            self.mode_switch,
            self.buzzer,
            self.speed_encoder_clk,
            self.speed_encoder_dt,
            self.speed_encoder_sw,
            self.time_encoder_clk,
            self.time_encoder_dt,
            self.time_encoder_sw,
        ]
    }
}

/// Tachometer sampling table.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SamplerCfg {
    /// Sampling window in milliseconds; also the control tick period.
    pub window_ms: u32,
    /// Tachometer pulses per rotor revolution.
    pub pulses_per_rev: u32,
    /// Counts above this per window are treated as a stuck sensor.
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

/// Speed-control table: ESC duty endpoints and the kick-start bands.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControlCfg {
    /// Duty issued while stopped (ns of pulse width).
    pub stop_duty_ns: u32,
    /// Ramp floor, just above the stall threshold.
    pub start_duty_ns: u32,
    /// Hard command ceiling.
    pub max_duty_ns: u32,
    /// Kick-start table. Accepts either:
    /// - array of tables: [{ up_to_rpm = 1000, multiplier = 12 }, ...]
    /// - array of tuples: [[1000, 12], [2000, 10], ...]
    #[serde(default, deserialize_with = "de_kick_bands")]
    pub kick_bands: Vec<(i32, u32)>,
    /// Multiplier for setpoints above the last band threshold.
    pub kick_multiplier_above: u32,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            stop_duty_ns: 1_300_000,
            start_duty_ns: 1_360_000,
            max_duty_ns: 1_470_000,
            kick_bands: vec![(1000, 12), (2000, 10), (3000, 12)],
            kick_multiplier_above: 10,
        }
    }
}

/// One setpoint domain: inclusive range and encoder step.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Limit {
    pub min: i32,
    pub max: i32,
    pub step: i32,
}

/// Ranges for the three operator-set domains.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Limits {
    pub rpm: Limit,
    pub rcf: Limit,
    pub time_secs: Limit,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            rpm: Limit {
                min: 0,
                max: 4000,
                step: 100,
            },
            rcf: Limit {
                min: 0,
                max: 1960,
                step: 10,
            },
            time_secs: Limit {
                min: 0,
                max: 3600,
                step: 10,
            },
        }
    }
}

/// Debounce gate intervals.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Debounce {
    pub button_ms: u64,
    pub encoder_ms: u64,
    /// Whether a rejected edge still refreshes the gate timestamp.
    pub retrigger: Retrigger,
}

impl Default for Debounce {
    fn default() -> Self {
        Self {
            button_ms: 200,
            encoder_ms: 100,
            retrigger: Retrigger::Always,
        }
    }
}

/// Gate timestamp policy. With `always` a rejected edge still refreshes the
/// gate; `on-accept` is the starvation-free variant.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Retrigger {
    #[default]
    Always,
    OnAccept,
}

/// Rotor geometry.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Rotor {
    pub radius_cm: f64,
}

impl Default for Rotor {
    fn default() -> Self {
        Self { radius_cm: 11.0 }
    }
}

/// Startup sequence timing.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Startup {
    /// How long the stop duty is held so the ESC arms.
    pub esc_arm_ms: u64,
}

impl Default for Startup {
    fn default() -> Self {
        Self { esc_arm_ms: 5000 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    pub sampler: SamplerCfg,
    pub control: ControlCfg,
    pub limits: Limits,
    pub debounce: Debounce,
    pub rotor: Rotor,
    pub startup: Startup,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins: one physical line per role
        let pins = self.pins.all();
        for (i, a) in pins.iter().enumerate() {
            if pins[i + 1..].contains(a) {
                eyre::bail!("pins: BCM pin {a} assigned to more than one role");
            }
        }

        // Sampler
        if self.sampler.window_ms == 0 || self.sampler.window_ms > 60_000 {
            eyre::bail!("sampler.window_ms must be in 1..=60000");
        }
        if self.sampler.pulses_per_rev == 0 {
            eyre::bail!("sampler.pulses_per_rev must be > 0");
        }
        if self.sampler.max_pulses_per_window == 0 {
            eyre::bail!("sampler.max_pulses_per_window must be > 0");
        }

        // Control
        if self.control.stop_duty_ns > self.control.start_duty_ns {
            eyre::bail!("control.stop_duty_ns must not exceed start_duty_ns");
        }
        if self.control.start_duty_ns > self.control.max_duty_ns {
            eyre::bail!("control.start_duty_ns must not exceed max_duty_ns");
        }
        for (up_to, mult) in &self.control.kick_bands {
            if *up_to <= 0 {
                eyre::bail!("kick band threshold must be > 0");
            }
            if *mult == 0 {
                eyre::bail!("kick band multiplier must be > 0");
            }
        }
        if self.control.kick_multiplier_above == 0 {
            eyre::bail!("control.kick_multiplier_above must be > 0");
        }

        // Limits
        for (name, limit) in [
            ("rpm", self.limits.rpm),
            ("rcf", self.limits.rcf),
            ("time_secs", self.limits.time_secs),
        ] {
            if limit.min < 0 {
                eyre::bail!("limits.{name}.min must be >= 0");
            }
            if limit.min > limit.max {
                eyre::bail!("limits.{name}.min must not exceed max");
            }
            if limit.step <= 0 {
                eyre::bail!("limits.{name}.step must be > 0");
            }
        }

        // Debounce
        if self.debounce.button_ms == 0 {
            eyre::bail!("debounce.button_ms must be >= 1");
        }
        if self.debounce.encoder_ms == 0 {
            eyre::bail!("debounce.encoder_ms must be >= 1");
        }
        if self.debounce.button_ms > 10_000 || self.debounce.encoder_ms > 10_000 {
            eyre::bail!("debounce gates above 10s are unreasonable");
        }

        // Rotor
        if !self.rotor.radius_cm.is_finite() || self.rotor.radius_cm <= 0.0 {
            eyre::bail!("rotor.radius_cm must be positive");
        }
        if self.rotor.radius_cm > 100.0 {
            eyre::bail!("rotor.radius_cm is unreasonably large (>1m)");
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BandToml {
    Tuple((i32, u32)),
    Table { up_to_rpm: i32, multiplier: u32 },
}

fn de_kick_bands<'de, D>(deserializer: D) -> Result<Vec<(i32, u32)>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<Vec<BandToml>> = Option::deserialize(deserializer)?;
    let mut out = Vec::new();
    if let Some(items) = opt {
        for b in items {
            match b {
                BandToml::Tuple((up_to, mult)) => out.push((up_to, mult)),
                BandToml::Table {
                    up_to_rpm,
                    multiplier,
                } => out.push((up_to_rpm, multiplier)),
            }
        }
    }
    Ok(out)
}

/// Named rotor presets loaded from CSV.
#[derive(Debug, Default)]
pub struct RotorTable {
    rows: Vec<RotorRow>,
}

impl RotorTable {
    /// Parse rotor presets from CSV text with a strict `name,radius_cm`
    /// header. Duplicate names and non-physical radii are rejected.
    pub fn from_csv_str(text: &str) -> eyre::Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = rdr.headers().map_err(|e| eyre::eyre!("rotor csv: {e}"))?;
        let expected = ["name", "radius_cm"];
        if headers.len() != expected.len()
            || headers.iter().zip(expected).any(|(h, e)| h != e)
        {
            eyre::bail!(
                "rotor csv must have exact headers 'name,radius_cm', got '{}'",
                headers.iter().collect::<Vec<_>>().join(",")
            );
        }

        let mut rows: Vec<RotorRow> = Vec::new();
        for record in rdr.deserialize::<RotorRow>() {
            let row = record.map_err(|e| eyre::eyre!("rotor csv row: {e}"))?;
            if row.name.is_empty() {
                eyre::bail!("rotor csv: empty rotor name");
            }
            if !row.radius_cm.is_finite() || row.radius_cm <= 0.0 || row.radius_cm > 100.0 {
                eyre::bail!("rotor csv: radius out of range for '{}'", row.name);
            }
            if rows.iter().any(|r| r.name == row.name) {
                eyre::bail!("rotor csv: duplicate rotor name '{}'", row.name);
            }
            rows.push(row);
        }
        if rows.is_empty() {
            eyre::bail!("rotor csv contains no presets");
        }
        Ok(Self { rows })
    }

    pub fn find(&self, name: &str) -> Option<&RotorRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn rows(&self) -> &[RotorRow] {
        &self.rows
    }
}
