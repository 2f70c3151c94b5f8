//! Spin-cycle execution: config mapping, simulated hardware assembly, and
//! run orchestration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use spindle_core::runner::{RunParams, run_cycle};
use spindle_core::{
    ButtonKind, ControlCfg, DebounceCfg, DebounceGate, InputEvent, InputHub, LimitsCfg, RotorCfg,
    SamplerCfg, Spin, SpeedMode, StartupCfg,
};
use spindle_hardware::{ConsoleBuzzer, ConsolePanel, RotorSim, RotorSimCfg, SharedLevel, SimLed};
use spindle_traits::clock::{Clock, MonotonicClock};

pub struct SpinArgs {
    pub rpm: Option<i32>,
    pub rcf: Option<i32>,
    pub secs: i32,
    /// Resolved rotor radius (preset or config).
    pub radius_cm: f64,
    pub fast: bool,
    pub max_ticks: u64,
    pub json: bool,
}

pub fn run_spin(cfg: &spindle_config::Config, args: SpinArgs) -> eyre::Result<()> {
    // Config mapping via the From impls in spindle_core::conversions.
    let sampler: SamplerCfg = (&cfg.sampler).into();
    let control: ControlCfg = (&cfg.control).into();
    let limits: LimitsCfg = (&cfg.limits).into();
    let debounce: DebounceCfg = (&cfg.debounce).into();
    let mut rotor: RotorCfg = (&cfg.rotor).into();
    rotor.radius_cm = args.radius_cm;
    let mut startup: StartupCfg = (&cfg.startup).into();
    if args.fast {
        startup.esc_arm_ms = 0;
    }

    let mode = if args.rcf.is_some() {
        SpeedMode::Rcf
    } else {
        SpeedMode::Rpm
    };
    let initial_rpm = args.rpm.unwrap_or(1000);
    let initial_rcf = args.rcf.unwrap_or(100);

    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());
    let hub = InputHub::new(&clock);

    // Ctrl-c acts as the start/stop button: same debounce, same event path,
    // so the motor always stops through the ordinary state machine.
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        let mut press = hub.button_handler(
            ButtonKind::StartStop,
            DebounceGate::new(debounce.button_ms, debounce.retrigger),
            Arc::clone(&clock),
        );
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::Relaxed);
            press();
        })?;
    }

    let (esc, mut rotor_sim) = RotorSim::new(RotorSimCfg {
        start_duty_ns: control.duty.start_ns,
        pulses_per_rev: sampler.pulses_per_rev,
        ..RotorSimCfg::default()
    });

    // Mode switch level: low reads as RPM, high as RCF.
    let mode_switch = SharedLevel::new(mode == SpeedMode::Rcf);

    let mut spin = Spin::builder()
        .with_motor(esc)
        .with_panel(ConsolePanel::default())
        .with_buzzer(ConsoleBuzzer)
        .with_led(SimLed::default())
        .with_mode_switch(mode_switch)
        .with_clock(Box::new(MonotonicClock::new()))
        .with_input_hub(hub)
        .with_sampler(sampler)
        .with_control(control)
        .with_limits(limits)
        .with_rotor(rotor)
        .with_startup(startup)
        .with_initial_mode(mode)
        .with_initial_setpoints(initial_rpm, initial_rcf, args.secs)
        .build()?;

    spin.calibrate()?;

    // Pump thread: the simulated rotor turns the commanded duty into
    // tachometer edges, one batch per sampling window.
    let counter = spin.pulse_counter();
    let window = spin.window();
    let pump_shutdown = Arc::new(AtomicBool::new(false));
    let pump_flag = Arc::clone(&pump_shutdown);
    let pump = std::thread::spawn(move || {
        while !pump_flag.load(Ordering::Relaxed) {
            std::thread::sleep(window);
            let pulses = rotor_sim.advance(window.as_millis() as u32);
            for _ in 0..pulses {
                counter.on_edge();
            }
        }
    });

    // Press start.
    spin.input_sender().send(InputEvent::StartStop)?;

    let params = RunParams {
        max_ticks: (args.max_ticks > 0).then_some(args.max_ticks),
    };
    let result = run_cycle(&mut spin, params, Some(&shutdown));

    pump_shutdown.store(true, Ordering::Relaxed);
    if pump.join().is_err() {
        tracing::warn!("sim pump thread panicked");
    }

    let report = result?;
    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "ticks": report.ticks,
                "final_rpm": report.last.estimate.rounded,
                "target_rpm": report.last.target_rpm,
                "remaining_secs": report.last.remaining_secs,
            })
        );
    } else {
        println!(
            "cycle complete: {} ticks, final {} RPM (target {})",
            report.ticks, report.last.estimate.rounded, report.last.target_rpm
        );
    }
    Ok(())
}
