//! # Trajectory Sequencer Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use bot_if::tc::Action;
use bot_lib::{
    auto::Routine,
    sim::SimDrive,
    traj_seq::{self, ActionError, ActionSink, TrajSeq},
};

/// Accepts every action.
struct NullSink;

impl ActionSink for NullSink {
    fn dispatch(&mut self, _action: &Action) -> Result<(), ActionError> {
        Ok(())
    }
}

fn traj_seq_benchmark(c: &mut Criterion) {
    let routine: Routine =
        util::params::load_str(include_str!("../../params/routines/c2_d3_left.toml")).unwrap();
    let params: traj_seq::Params =
        util::params::load_str(include_str!("../../params/traj_seq.toml")).unwrap();
    let ops = routine.plan_ops(12.0).unwrap();

    // Bench plan building, dominated by the spline arc length tables
    c.bench_function("traj_seq::build", |b| {
        b.iter(|| traj_seq::build(routine.start, &ops, &params).unwrap())
    });

    let plan = traj_seq::build(routine.start, &ops, &params).unwrap();

    // Bench executing the whole plan at 50 Hz
    c.bench_function("TrajSeq::proc::full_routine", |b| {
        b.iter(|| {
            let mut seq = TrajSeq::new(params.clone());
            let mut drive = SimDrive::new(40.0);
            let mut sink = NullSink;

            seq.begin(plan.clone(), &mut drive).unwrap();
            while seq.is_active() {
                seq.proc(0.02, &mut drive, &mut sink, false).unwrap();
            }
        })
    });
}

criterion_group!(benches, traj_seq_benchmark);
criterion_main!(benches);
