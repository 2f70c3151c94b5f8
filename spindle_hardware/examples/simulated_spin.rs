//! Minimal end-to-end demo: spin the simulated rotor to 1500 RPM for ten
//! seconds and print each display frame.
//!
//! Run with: cargo run -p spindle_hardware --example simulated_spin

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use spindle_core::runner::{RunParams, run_cycle};
use spindle_core::{InputEvent, Spin};
use spindle_hardware::{ConsoleBuzzer, ConsolePanel, RotorSim, RotorSimCfg, SimLed};

fn main() -> eyre::Result<()> {
    let (esc, mut rotor) = RotorSim::new(RotorSimCfg::default());

    let mut spin = Spin::builder()
        .with_motor(esc)
        .with_panel(ConsolePanel::default())
        .with_buzzer(ConsoleBuzzer)
        .with_led(SimLed::default())
        .with_startup(spindle_core::StartupCfg { esc_arm_ms: 0 })
        .with_initial_setpoints(1500, 100, 10)
        .build()?;

    spin.calibrate()?;

    // Feed tachometer edges from the rotor model, one batch per window.
    let counter = spin.pulse_counter();
    let window = spin.window();
    let done = Arc::new(AtomicBool::new(false));
    let done_pump = Arc::clone(&done);
    let pump = std::thread::spawn(move || {
        while !done_pump.load(Ordering::Relaxed) {
            std::thread::sleep(window);
            for _ in 0..rotor.advance(window.as_millis() as u32) {
                counter.on_edge();
            }
        }
    });

    spin.input_sender().send(InputEvent::StartStop)?;
    let report = run_cycle(&mut spin, RunParams { max_ticks: Some(120) }, None)?;

    done.store(true, Ordering::Relaxed);
    let _ = pump.join();

    println!(
        "finished after {} ticks at {} RPM",
        report.ticks, report.last.estimate.rounded
    );
    Ok(())
}
