//! Real-time pose stream analysis: exercise recognition, rep counting, form
//! scoring and emergency detection over per-frame body keypoints.
//!
//! ```no_run
//! use tnua_engine::{EngineConfig, Session, SessionHandlers};
//! use tnua_engine::synthetic::PoseBuilder;
//!
//! let mut session = Session::new(EngineConfig::default())?;
//! session.subscribe(
//!     SessionHandlers::new()
//!         .on_exercise_detected(|state| println!("{} reps", state.rep_count))
//!         .on_emergency_detected(|state| eprintln!("emergency: {}", state.emergency_type)),
//! );
//! session.process_frame(&PoseBuilder::squat(85.0, 80.0).pose());
//! # Ok::<(), tnua_engine::ConfigError>(())
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod synthetic;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use error::{ConfigError, FrameError};
pub use models::*;
pub use services::session::{FrameOutcome, Session, SessionHandlers, SessionSummary, SubscriptionId};
