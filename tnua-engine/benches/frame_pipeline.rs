//! Benchmarks for the per-frame analysis pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tnua_engine::services::{smooth, ExerciseClassifier};
use tnua_engine::synthetic::PoseBuilder;
use tnua_engine::{EngineConfig, Pose, Session, Skeleton};

fn workout_frames() -> Vec<Pose> {
    vec![
        PoseBuilder::standing().pose(),
        PoseBuilder::squat(130.0, 120.0).pose(),
        PoseBuilder::squat(80.0, 70.0).pose(),
        PoseBuilder::squat(130.0, 120.0).pose(),
        PoseBuilder::pushup(85.0).pose(),
        PoseBuilder::plank().pose(),
        PoseBuilder::jumping_jack(true).pose(),
        PoseBuilder::jumping_jack(false).pose(),
    ]
}

fn quiet_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.emergency.fall_threshold = 0.8;
    config.emergency.collapse_threshold = 0.7;
    config
}

fn benchmark_session(c: &mut Criterion) {
    let frames = workout_frames();

    c.bench_function("session_process_frame", |b| {
        let mut session = Session::new(quiet_config()).expect("valid config");
        let mut now = 0;
        let mut cursor = frames.iter().cycle();
        b.iter(|| {
            now += 33;
            let frame = cursor.next().expect("cycled iterator");
            session.process_frame_at(black_box(frame), now)
        })
    });

    let lying = PoseBuilder::lying().pose();
    c.bench_function("session_process_frame_emergency", |b| {
        let mut session = Session::new(quiet_config()).expect("valid config");
        let mut now = 0;
        b.iter(|| {
            now += 33;
            session.process_frame_at(black_box(&lying), now)
        })
    });
}

fn benchmark_stages(c: &mut Criterion) {
    let config = EngineConfig::default();
    let previous = PoseBuilder::standing().skeleton();
    let current = PoseBuilder::squat(80.0, 70.0).skeleton();
    let pose = PoseBuilder::squat(80.0, 70.0).pose();

    c.bench_function("skeleton_from_pose", |b| {
        b.iter(|| Skeleton::try_from(black_box(&pose)))
    });

    c.bench_function("smooth_skeleton", |b| {
        b.iter(|| smooth(Some(black_box(&previous)), black_box(&current), 0.7))
    });

    let classifier = ExerciseClassifier::new(&config.classifier, &config.form);
    c.bench_function("classify_squat", |b| {
        b.iter(|| classifier.classify(black_box(&current)))
    });
}

criterion_group!(benches, benchmark_session, benchmark_stages);
criterion_main!(benches);
