use criterion::{Criterion, black_box, criterion_group, criterion_main};

use spindle_core::config::{ControlCfg, SamplerCfg};
use spindle_core::controller::SpeedController;
use spindle_core::tacho::TachoSampler;

fn bench_sampler(c: &mut Criterion) {
    c.bench_function("tacho_ingest", |b| {
        let mut sampler = TachoSampler::new(SamplerCfg::default());
        let mut pulses = 0u32;
        b.iter(|| {
            pulses = (pulses + 7) % 200;
            black_box(sampler.ingest(black_box(pulses)))
        });
    });
}

fn bench_controller(c: &mut Criterion) {
    c.bench_function("controller_tick", |b| {
        let mut ctrl = SpeedController::new(ControlCfg::default());
        let mut rpm = 0i32;
        b.iter(|| {
            rpm = (rpm + 137) % 4400;
            black_box(ctrl.tick(black_box(rpm), 2000, true))
        });
    });
}

criterion_group!(benches, bench_sampler, bench_controller);
criterion_main!(benches);
