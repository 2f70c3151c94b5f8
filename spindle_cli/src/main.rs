mod cli;
mod logging;
mod rt;
mod spin;

use std::fs;

use clap::Parser;
use eyre::WrapErr;

use crate::cli::{Cli, Commands};

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // Load the config; a missing file falls back to the reference-hardware
    // defaults, except for `check`, whose whole point is the real file.
    let cfg = match fs::read_to_string(&cli.config) {
        Ok(text) => {
            let cfg = spindle_config::load_toml(&text)
                .wrap_err_with(|| format!("parse {}", cli.config.display()))?;
            cfg.validate()
                .wrap_err_with(|| format!("invalid config {}", cli.config.display()))?;
            cfg
        }
        Err(e) => {
            if matches!(cli.cmd, Commands::Check) {
                return Err(eyre::Report::new(e))
                    .wrap_err_with(|| format!("read {}", cli.config.display()));
            }
            spindle_config::Config::default()
        }
    };

    logging::init(&cfg.logging, cli.json, &cli.log_level)?;

    // Rotor preset table, when given.
    let rotors = match &cli.rotors {
        Some(path) => {
            let text = fs::read_to_string(path)
                .wrap_err_with(|| format!("read {}", path.display()))?;
            Some(spindle_config::RotorTable::from_csv_str(&text)?)
        }
        None => None,
    };

    match cli.cmd {
        Commands::Spin {
            rpm,
            rcf,
            secs,
            rotor,
            fast,
            max_ticks,
            rt: rt_flag,
            rt_prio,
        } => {
            rt::setup_rt_once(rt_flag, rt_prio);
            let radius_cm = match (&rotor, &rotors) {
                (Some(name), Some(table)) => table
                    .find(name)
                    .map(|r| r.radius_cm)
                    .ok_or_else(|| eyre::eyre!("unknown rotor preset '{name}'"))?,
                (Some(_), None) => eyre::bail!("--rotor requires --rotors <FILE>"),
                (None, _) => cfg.rotor.radius_cm,
            };
            spin::run_spin(
                &cfg,
                spin::SpinArgs {
                    rpm,
                    rcf,
                    secs,
                    radius_cm,
                    fast,
                    max_ticks,
                    json: cli.json,
                },
            )
        }
        Commands::Convert {
            rpm,
            rcf,
            radius_cm,
        } => convert(rpm, rcf, radius_cm, cli.json),
        Commands::Check => {
            if rotors.is_some() {
                println!("rotor presets OK");
            }
            println!("config OK: {}", cli.config.display());
            Ok(())
        }
    }
}

fn convert(rpm: Option<i32>, rcf: Option<f64>, radius_cm: f64, json: bool) -> eyre::Result<()> {
    use spindle_core::units;

    let (rpm_v, rcf_v) = match (rpm, rcf) {
        (Some(r), None) => (r, units::rpm_to_rcf(r, radius_cm)),
        (None, Some(f)) => (units::rcf_to_rpm(f, radius_cm)?, f),
        _ => eyre::bail!("provide exactly one of --rpm or --rcf"),
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "rpm": rpm_v,
                "rcf": rcf_v,
                "radius_cm": radius_cm,
            })
        );
    } else {
        println!("RPM {rpm_v} = RCF {rcf_v:.1} (radius {radius_cm} cm)");
    }
    Ok(())
}
