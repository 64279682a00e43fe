//! Logging utilities for output and progress tracking
//!
//! This module provides standardized log lines and progress indicators.

pub mod log;
pub mod progress;

pub use log::{log_stage_complete, log_stage_start, log_warning};
pub use progress::{create_main_progress_bar, create_spinner, finish_and_clear, finish_progress_bar};
