//! Log lines for pipeline stages
//!
//! Every stage logs one line when it starts and one when it finishes, so a
//! run log reads as a sequence of `stage: ...` entries.

use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

/// Log the start of `stage` acting on `target`
pub fn log_stage_start(stage: &str, target: impl Display) {
    log::info!("{stage}: starting on {target}");
}

/// Log the end of `stage` with the number of records it handled
pub fn log_stage_complete(stage: &str, records: usize, elapsed: Option<Duration>) {
    match elapsed {
        Some(elapsed) => log::info!("{stage}: {records} records in {elapsed:.2?}"),
        None => log::info!("{stage}: {records} records"),
    }
}

/// Warn about a file, or about the run when there is no file involved
pub fn log_warning(message: &str, path: Option<&Path>) {
    match path {
        Some(path) => log::warn!("{message}: {}", path.display()),
        None => log::warn!("{message}"),
    }
}
