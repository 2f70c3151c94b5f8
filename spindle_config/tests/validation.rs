use rstest::rstest;
use spindle_config::load_toml;

#[test]
fn empty_config_uses_reference_defaults() {
    let cfg = load_toml("").expect("parse empty");
    cfg.validate().expect("defaults must validate");
    assert_eq!(cfg.sampler.window_ms, 500);
    assert_eq!(cfg.sampler.pulses_per_rev, 6);
    assert_eq!(cfg.control.stop_duty_ns, 1_300_000);
    assert_eq!(cfg.limits.rpm.max, 4000);
    assert_eq!(cfg.rotor.radius_cm, 11.0);
}

#[test]
fn kick_bands_accept_tuples_and_tables() {
    let tuples = r#"
[control]
kick_bands = [[1000, 12], [2000, 10]]
"#;
    let cfg = load_toml(tuples).expect("tuple form");
    assert_eq!(cfg.control.kick_bands, vec![(1000, 12), (2000, 10)]);

    let tables = r#"
[[control.kick_bands]]
up_to_rpm = 1500
multiplier = 11
"#;
    let cfg = load_toml(tables).expect("table form");
    assert_eq!(cfg.control.kick_bands, vec![(1500, 11)]);
}

#[test]
fn retrigger_parses_kebab_case() {
    let cfg = load_toml("[debounce]\nretrigger = \"on-accept\"\n").expect("parse");
    assert_eq!(cfg.debounce.retrigger, spindle_config::Retrigger::OnAccept);
}

#[rstest]
#[case("[sampler]\nwindow_ms = 0\n", "window_ms")]
#[case("[sampler]\npulses_per_rev = 0\n", "pulses_per_rev")]
#[case(
    "[control]\nstop_duty_ns = 2000000\nstart_duty_ns = 1360000\n",
    "stop_duty_ns"
)]
#[case("[control]\nkick_multiplier_above = 0\n", "kick_multiplier_above")]
#[case("[limits.rpm]\nmin = 100\nmax = 0\nstep = 100\n", "limits.rpm")]
#[case("[limits.time_secs]\nmin = 0\nmax = 3600\nstep = 0\n", "limits.time_secs")]
#[case("[pins]\ntacho = 9\n", "more than one role")]
#[case("[debounce]\nbutton_ms = 0\n", "button_ms")]
#[case("[rotor]\nradius_cm = -1.0\n", "radius_cm")]
#[case("[rotor]\nradius_cm = 500.0\n", "radius_cm")]
fn invalid_configs_are_rejected(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse");
    let err = cfg.validate().expect_err("must be rejected");
    assert!(
        format!("{err}").contains(needle),
        "error for {toml:?} should mention {needle}: {err}"
    );
}

#[test]
fn unknown_band_shape_fails_to_parse() {
    let bad = "[control]\nkick_bands = [\"fast\"]\n";
    assert!(load_toml(bad).is_err());
}
