//! Criterion benchmarks for the per-frame sampler path.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use studyhall::config::MonitorConfig;
use studyhall::host::SimulatedHost;
use studyhall::quality::{QualityBus, QualityLevel, QualityListener};
use studyhall::sampler::{FrameSampler, MonitorSession};

/// Raw `tick()` cost for one second of frames at various frame rates.
fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_second");

    for fps in [30u32, 60, 120, 240].iter() {
        group.throughput(Throughput::Elements(u64::from(*fps)));
        group.bench_with_input(BenchmarkId::from_parameter(fps), fps, |b, &fps| {
            let mut sampler = FrameSampler::new(&MonitorConfig::default());
            sampler.begin(0.0);
            let mut t = 0.0;
            let step = 1000.0 / f64::from(fps);
            b.iter(|| {
                for _ in 0..fps {
                    t += step;
                    black_box(sampler.tick(t, || None));
                }
            });
        });
    }

    group.finish();
}

/// Full session path: host callback, reschedule, flush and bus delivery.
fn bench_session(c: &mut Criterion) {
    c.bench_function("session_60fps_with_listener", |b| {
        let bus = QualityBus::new();
        let _listener = QualityListener::attach(&bus, QualityLevel::High);
        let host = Rc::new(SimulatedHost::new(0.0));
        let sampler = FrameSampler::new(&MonitorConfig::default()).with_bus(bus.clone());
        let session = MonitorSession::start(Rc::clone(&host), sampler);
        let mut t = 0.0;
        b.iter(|| {
            for _ in 0..60 {
                t += 1000.0 / 60.0;
                black_box(host.fire(t));
            }
        });
        session.stop();
    });
}

criterion_group!(benches, bench_tick, bench_session);
criterion_main!(benches);
