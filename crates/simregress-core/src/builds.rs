//! Resolved build-tree record. Locating executables and validating the
//! installation layout is the caller's job; the engine treats this as opaque
//! input.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Filesystem layout for one build of the simulation program under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildTree {
    /// Build output directory; per-run test roots are created under it.
    pub build_dir: PathBuf,
    /// The simulation executable to invoke for each case.
    pub executable: PathBuf,
    /// Directory holding the case input files.
    pub test_files_dir: PathBuf,
    /// Source repository root; the default weather file lives under
    /// `<source_dir>/weather/`.
    pub source_dir: PathBuf,
    /// Directory holding named weather files for per-case overrides.
    pub weather_dir: PathBuf,
    /// Directory holding auxiliary datasets referenced by input files.
    pub data_sets_dir: PathBuf,
}
