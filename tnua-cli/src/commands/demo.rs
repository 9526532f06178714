use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tnua_engine::synthetic::PoseBuilder;
use tnua_engine::{Clock, EngineConfig, ManualClock, Session};

use super::report::{render_timer_event, Reporter};
use crate::config::Config;
use crate::models::FrameRecord;

/// Fall and collapse thresholds above an upright body's hip and shoulder
/// height, so only lying on the floor raises an emergency
const DEMO_FALL_THRESHOLD: f32 = 0.8;
const DEMO_COLLAPSE_THRESHOLD: f32 = 0.7;

const WARMUP_MS: i64 = 1_000;
const HOLD_MS: i64 = 700;
const DOWN_MS: i64 = 2_000;
const RECOVERY_MS: i64 = 6_000;

#[derive(Args)]
pub struct DemoCommand {
    /// Frames per second of the synthetic camera
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(10..=120))]
    fps: u32,

    /// Squat repetitions before the fall
    #[arg(long, default_value_t = 3)]
    reps: u32,

    /// Also write the generated stream as JSON lines, replayable with `tnua replay`
    #[arg(long)]
    export: Option<PathBuf>,
}

/// Standing warm-up, `reps` squats, a fall and a recovery
pub fn script(reps: u32, fps: u32) -> Vec<FrameRecord> {
    let interval = 1_000 / i64::from(fps.max(1));
    let mut records = Vec::new();
    let mut now = 0;
    let mut hold = |builder: PoseBuilder, duration_ms: i64, records: &mut Vec<FrameRecord>| {
        let pose = builder.pose();
        let end = now + duration_ms;
        while now < end {
            records.push(FrameRecord::new(now, pose.clone()));
            now += interval;
        }
    };

    hold(PoseBuilder::standing(), WARMUP_MS, &mut records);
    for _ in 0..reps {
        hold(PoseBuilder::squat(80.0, 70.0), HOLD_MS, &mut records);
        hold(PoseBuilder::standing(), HOLD_MS, &mut records);
    }
    hold(PoseBuilder::lying(), DOWN_MS, &mut records);
    hold(PoseBuilder::standing(), RECOVERY_MS, &mut records);
    records
}

pub fn demo_engine(mut engine: EngineConfig) -> EngineConfig {
    engine.emergency.fall_threshold = DEMO_FALL_THRESHOLD;
    engine.emergency.collapse_threshold = DEMO_COLLAPSE_THRESHOLD;
    engine
}

impl DemoCommand {
    pub fn execute(self, config: &Config) -> Result<()> {
        let records = script(self.reps, self.fps);

        if let Some(path) = &self.export {
            let mut contents = String::new();
            for record in &records {
                contents.push_str(&record.to_line()?);
                contents.push('\n');
            }
            fs::write(path, contents)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), frames = records.len(), "Exported demo stream");
        }

        tracing::info!(
            fall = DEMO_FALL_THRESHOLD,
            collapse = DEMO_COLLAPSE_THRESHOLD,
            "Demo overrides emergency thresholds"
        );
        let clock = ManualClock::new(0);
        let mut session = Session::with_clock(demo_engine(config.engine.clone()), clock.clone())
            .context("Invalid engine configuration")?;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        writeln!(
            out,
            "{}",
            format!("Tnua demo: {} squats at {} fps, then a fall", self.reps, self.fps).bold()
        )?;
        writeln!(out)?;

        let mut reporter = Reporter::new(false);
        for record in &records {
            clock.set(record.timestamp_ms);
            let outcome = session.process_frame(&record.pose);
            for line in reporter.render(&outcome) {
                writeln!(out, "{line}")?;
            }
        }

        if session.emergency_state().is_active {
            clock.advance(config.engine.emergency.resolution_window_ms as i64 + 1);
            if let Some(event) = session.check_timers() {
                writeln!(out, "{}", render_timer_event(clock.now_ms(), &event))?;
            }
        }

        writeln!(out)?;
        for line in Reporter::render_summary(&session.summary()) {
            writeln!(out, "{line}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_timestamps_are_increasing() {
        let records = script(2, 30);
        assert!(records.windows(2).all(|w| w[0].timestamp_ms < w[1].timestamp_ms));
        assert_eq!(records[1].timestamp_ms, 33);
    }

    #[test]
    fn test_script_counts_every_rep_and_recovers() {
        let records = script(3, 30);
        let clock = ManualClock::new(0);
        let mut session =
            Session::with_clock(demo_engine(EngineConfig::default()), clock.clone()).unwrap();

        for record in &records {
            clock.set(record.timestamp_ms);
            session.process_frame(&record.pose);
        }

        let summary = session.summary();
        assert_eq!(summary.rep_count, 3);
        assert!(summary.emergencies_raised >= 1);
        assert!(!session.emergency_state().is_active);
    }
}
