//! Property tests for the conversion and control laws.

use proptest::prelude::*;

use spindle_core::config::{ControlCfg, DutyCfg};
use spindle_core::controller::SpeedController;
use spindle_core::debounce::{DebounceGate, Retrigger};
use spindle_core::units::{rcf_to_rpm, rpm_to_rcf};

const RADIUS: f64 = 11.0;

proptest! {
    // Round-trip law: floor/sqrt truncation loses at most one RPM.
    #[test]
    fn rcf_round_trip_within_one_rpm(rpm in 0i32..=10_000) {
        let rcf = rpm_to_rcf(rpm, RADIUS);
        let back = rcf_to_rpm(rcf, RADIUS).expect("non-negative rcf");
        prop_assert!((back - rpm).abs() <= 1, "rpm {rpm} round-tripped to {back}");
    }

    // Monotone correction: under-speed never lowers the duty, over-speed
    // never raises it, and the ramp stays inside [start, max].
    #[test]
    fn corrections_are_monotonic(
        target in 1i32..=4000,
        smoothed in 1i32..=8000,
        warmup in proptest::collection::vec(1i32..=8000, 0..6),
    ) {
        let duty = DutyCfg::default();
        let mut c = SpeedController::new(ControlCfg::default());
        for w in warmup {
            c.tick(w, target, true);
        }
        let before = c.duty_ns();
        c.tick(smoothed, target, true);
        let after = c.duty_ns();

        if smoothed < target {
            prop_assert!(after >= before);
        } else if smoothed > target {
            prop_assert!(after <= before);
        } else {
            prop_assert_eq!(after, before);
        }
        prop_assert!(after >= duty.start_ns);
        prop_assert!(after <= duty.max_ns);
    }

    // Debounce law: edges separated by more than the gate always pass,
    // edges within the gate never do.
    #[test]
    fn debounce_separation_law(
        gap in 1u64..=1000,
        min_interval in 1u64..=500,
    ) {
        let mut gate = DebounceGate::new(min_interval, Retrigger::Always);
        let t0 = min_interval + 1;
        prop_assert!(gate.accept(t0));
        let accepted = gate.accept(t0 + gap);
        prop_assert_eq!(accepted, gap > min_interval);
    }
}
