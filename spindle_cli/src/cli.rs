//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "spindle", version, about = "Centrifuge controller CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/spindle.toml")]
    pub config: PathBuf,

    /// Optional rotor preset CSV (strict header)
    #[arg(long, value_name = "FILE")]
    pub rotors: Option<PathBuf>,

    /// Log (and summarize) as JSON instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one spin cycle against the simulated rotor
    Spin {
        /// RPM setpoint (selects RPM mode)
        #[arg(long, conflicts_with = "rcf")]
        rpm: Option<i32>,

        /// RCF setpoint (selects RCF mode)
        #[arg(long)]
        rcf: Option<i32>,

        /// Countdown duration in seconds
        #[arg(long, default_value_t = 30)]
        secs: i32,

        /// Rotor preset name from the rotors CSV
        #[arg(long)]
        rotor: Option<String>,

        /// Skip the ESC arming delay (simulation only)
        #[arg(long, action = ArgAction::SetTrue)]
        fast: bool,

        /// Abort if the cycle exceeds this many ticks (0 = unbounded)
        #[arg(long, default_value_t = 0)]
        max_ticks: u64,

        /// Elevate to SCHED_FIFO and lock memory (Linux, needs privileges)
        #[arg(long, action = ArgAction::SetTrue)]
        rt: bool,

        /// Real-time priority used with --rt
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
    },

    /// Convert between RPM and RCF
    Convert {
        #[arg(long, conflicts_with = "rcf")]
        rpm: Option<i32>,

        #[arg(long)]
        rcf: Option<f64>,

        /// Rotor radius in centimeters
        #[arg(long, default_value_t = 11.0)]
        radius_cm: f64,
    },

    /// Validate the config file (and the rotor CSV when given)
    Check,
}
