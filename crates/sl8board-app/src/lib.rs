//! SL8 Board Application
//!
//! Headless shell around the core: replays recorded gesture scripts and
//! manages saved sessions.

pub mod commands;
mod error;
pub mod script;

pub use error::{AppError, AppResult};
pub use script::{GestureScript, ReplaySummary, Replayer, Step};
