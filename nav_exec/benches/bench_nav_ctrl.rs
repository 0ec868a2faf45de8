//! # Navigation Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::{
    eqpt::{
        marker::{MarkerDetection, MarkerDetections},
        odom::{Displacement, Heading},
    },
    tc::goal::GoalCmd,
};
use nav_lib::{
    nav_ctrl::{InitData, NavCtrl},
    norm,
    sensor_state::SensorState,
};
use util::module::State;

fn nav_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build the pipeline ----

    let mut nav_ctrl = NavCtrl::default();
    nav_ctrl
        .init(
            InitData {
                goal: GoalCmd::new(2.0, -1.0, 45.0),
                ..Default::default()
            },
            None,
        )
        .unwrap();

    let sensors = SensorState::new(&norm::Params::default()).unwrap();

    // ---- Dead reckoning cycle ----

    sensors
        .push_displacement(&Displacement::new([0.4, 0.1, 0.0]))
        .unwrap();
    sensors.push_heading(&Heading::from_yaw(0.2)).unwrap();
    let dr_snapshot = sensors.snapshot();
    sensors.consume(&dr_snapshot);

    c.bench_function("nav_ctrl dead reckoning cycle", |b| {
        b.iter(|| nav_ctrl.proc(black_box(&dr_snapshot)).unwrap())
    });

    // ---- Marker cycle ----

    sensors
        .push_marker(&MarkerDetections::new(vec![MarkerDetection {
            position_m_cam: [0.1, -0.05, 1.4],
            orientation_q_cam: [0.0, 0.0, 0.1, 0.995],
        }]))
        .unwrap();
    let marker_snapshot = sensors.snapshot();

    c.bench_function("nav_ctrl marker cycle", |b| {
        b.iter(|| nav_ctrl.proc(black_box(&marker_snapshot)).unwrap())
    });
}

criterion_group!(benches, nav_ctrl_benchmark);
criterion_main!(benches);
