use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

use tnua_engine::{EngineConfig, Session, SessionSummary};

use super::report::Reporter;
use crate::config::Config;
use crate::models::FrameRecord;

#[derive(Args)]
pub struct ReplayCommand {
    /// JSON lines file of {"timestamp_ms", "pose"} records, or `-` for stdin
    input: String,

    /// Print the session summary when the stream ends
    #[arg(long)]
    summary: bool,

    /// Print the exercise line for every frame, not only when it changes
    #[arg(long)]
    every_frame: bool,
}

/// Result of replaying one stream
#[derive(Debug)]
pub struct ReplayReport {
    pub summary: SessionSummary,
    pub malformed_lines: usize,
    pub emergency_active: bool,
}

impl ReplayCommand {
    pub fn execute(self, config: &Config) -> Result<()> {
        let reader: Box<dyn BufRead> = if self.input == "-" {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(&self.input)
                .with_context(|| format!("Failed to open pose stream {}", self.input))?;
            Box::new(BufReader::new(file))
        };

        let stdout = io::stdout();
        let mut out = stdout.lock();
        let mut reporter = Reporter::new(self.every_frame);
        let report = replay(reader, config.engine.clone(), &mut reporter, &mut out)?;

        if report.malformed_lines > 0 {
            writeln!(
                out,
                "{}",
                format!("{} malformed line(s) skipped", report.malformed_lines).yellow()
            )?;
        }
        if report.emergency_active {
            writeln!(out, "{}", "Stream ended with an emergency still active".red())?;
        }
        if self.summary {
            writeln!(out)?;
            for line in Reporter::render_summary(&report.summary) {
                writeln!(out, "{line}")?;
            }
        }

        Ok(())
    }
}

/// Feed every record of `reader` through a fresh session
pub fn replay(
    reader: impl BufRead,
    engine: EngineConfig,
    reporter: &mut Reporter,
    out: &mut impl Write,
) -> Result<ReplayReport> {
    let mut session = Session::new(engine).context("Invalid engine configuration")?;
    tracing::debug!(session_id = %session.id(), "Replaying pose stream");

    let mut malformed_lines = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read pose stream")?;
        let record = match FrameRecord::parse_line(&line) {
            Ok(Some(record)) => record,
            Ok(None) => continue,
            Err(e) => {
                malformed_lines += 1;
                tracing::warn!(line = index + 1, "Skipping malformed record: {:#}", e);
                writeln!(out, "{} {e:#}", format!("line {}:", index + 1).yellow())?;
                continue;
            }
        };

        let outcome = session.process_frame_at(&record.pose, record.timestamp_ms);
        for rendered in reporter.render(&outcome) {
            writeln!(out, "{rendered}")?;
        }
    }

    Ok(ReplayReport {
        summary: session.summary(),
        malformed_lines,
        emergency_active: session.emergency_state().is_active,
    })
}
