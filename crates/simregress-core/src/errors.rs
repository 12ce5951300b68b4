//! Suite-level error types. Failures scoped to a single case never surface
//! here; they are absorbed into that case's classification.

use std::path::PathBuf;

use thiserror::Error;

/// Errors during suite setup. These abort the run immediately.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("could not create output root {path}: {source}")]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
