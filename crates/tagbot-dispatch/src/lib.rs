//! Command dispatch for the tag bot
//!
//! - [`TagBot`]: the polling state machine (comments, private messages,
//!   watermark persistence, configuration refresh)
//! - [`Paced`]: fixed cooldown in front of every platform call
//! - [`Supervisor`]: restarts the bot from scratch after a failure

#![forbid(unsafe_code)]

pub mod error;
pub mod handlers;
pub mod pacing;
pub mod session;
pub mod supervisor;

pub use error::{DispatchError, Result};
pub use handlers::TagOutcome;
pub use pacing::{Paced, Pause, ThreadSleep};
pub use session::{CycleReport, SessionState, TagBot};
pub use supervisor::{Supervisor, SupervisorReport};
