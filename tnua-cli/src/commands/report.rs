use colored::Colorize;

use tnua_engine::services::{EmergencyEvent, RepEvent};
use tnua_engine::{ExerciseType, FormCue, FrameOutcome, SessionSummary};

/// Turns frame outcomes into terminal lines, printing only what changed
#[derive(Debug, Default)]
pub struct Reporter {
    exercise: Option<ExerciseType>,
    cue: Option<FormCue>,
    dangerous: bool,
    /// Print the exercise line for every analysed frame
    every_frame: bool,
}

fn stamp(timestamp_ms: i64) -> String {
    format!("[{:>8.3}s]", timestamp_ms as f64 / 1000.0)
}

impl Reporter {
    pub fn new(every_frame: bool) -> Self {
        Self {
            every_frame,
            ..Self::default()
        }
    }

    pub fn render(&mut self, outcome: &FrameOutcome) -> Vec<String> {
        let at = stamp(outcome.timestamp_ms);
        let mut lines = Vec::new();

        if let Some(error) = &outcome.error {
            lines.push(format!("{at} {} {error}", "frame error:".yellow()));
            return lines;
        }

        if let Some(state) = &outcome.exercise {
            if self.every_frame || self.exercise != Some(state.exercise_type) {
                lines.push(format!(
                    "{at} exercise: {} (confidence {:.2}, form {:.0})",
                    state.exercise_type.to_string().cyan(),
                    state.confidence,
                    state.form_score
                ));
                self.exercise = Some(state.exercise_type);
            }
            if state.feedback != self.cue {
                if let Some(cue) = state.feedback {
                    lines.push(format!("{at} cue: {}", cue.to_string().italic()));
                }
                self.cue = state.feedback;
            }
            if state.dangerous_posture && !self.dangerous {
                lines.push(format!("{at} {}", "head below ankle level".yellow()));
            }
            self.dangerous = state.dangerous_posture;
        }

        for event in &outcome.rep_events {
            match event {
                RepEvent::RepCounted { count, .. } => {
                    let exercise = outcome
                        .exercise
                        .as_ref()
                        .and_then(|s| s.active_exercise)
                        .unwrap_or_default();
                    lines.push(format!(
                        "{at} {} ({exercise})",
                        format!("rep {count}").green().bold()
                    ));
                }
                RepEvent::RepSuppressed { since_last_ms, .. } => {
                    lines.push(format!(
                        "{at} {}",
                        format!("rep ignored, {since_last_ms}ms after the last one").dimmed()
                    ));
                }
                RepEvent::EnteredPosition { .. } => {}
            }
        }

        for event in &outcome.emergency_events {
            lines.push(render_emergency(&at, event));
        }

        lines
    }

    pub fn render_summary(summary: &SessionSummary) -> Vec<String> {
        let mut lines = vec![
            "Session Summary".bold().to_string(),
            "────────────────────────────────".to_string(),
            format!("Session:     {}", summary.session_id),
            format!("Duration:    {:.1}s", summary.duration_ms as f64 / 1000.0),
            format!("Frames:      {}", summary.frames_processed),
            format!("Skipped:     {}", summary.frames_skipped),
            format!("Errors:      {}", summary.frames_errored),
            format!("Reps:        {}", summary.rep_count),
            format!("Emergencies: {}", summary.emergencies_raised),
        ];
        for (exercise, frames) in &summary.exercise_frames {
            lines.push(format!("  {:<13} {frames} frames", exercise.to_string()));
        }
        lines
    }
}

pub fn render_emergency(at: &str, event: &EmergencyEvent) -> String {
    match event {
        EmergencyEvent::Detected(state) => format!(
            "{at} {} {} (confidence {:.2})",
            "EMERGENCY".red().bold(),
            state.emergency_type,
            state.confidence
        ),
        EmergencyEvent::Resolved { previous } => format!(
            "{at} {} {}",
            "resolved".green(),
            previous.emergency_type
        ),
    }
}

pub fn render_timer_event(now_ms: i64, event: &EmergencyEvent) -> String {
    render_emergency(&stamp(now_ms), event)
}
