//! Simulation executor seam: the engine drives any [`SimulationRunner`];
//! the default implementation spawns the build's executable per case.

use std::path::Path;

use async_trait::async_trait;

use crate::builds::BuildTree;
use crate::config::{ForceRunType, ReportingFreq};
use crate::model::CaseCompleted;

/// Runs one staged case against one build. Implementations never propagate
/// failures; every outcome is encoded in the returned [`CaseCompleted`].
#[async_trait]
pub trait SimulationRunner: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn run_case(
        &self,
        build: &BuildTree,
        case: &str,
        run_dir: &Path,
        run_type: ForceRunType,
        min_reporting_freq: ReportingFreq,
        parametric: bool,
        weather_path: &Path,
    ) -> CaseCompleted;
}

/// Default executor: spawns the build's simulation executable inside the run
/// directory and reports its exit status.
pub struct ProcessSimulator;

#[async_trait]
impl SimulationRunner for ProcessSimulator {
    async fn run_case(
        &self,
        build: &BuildTree,
        case: &str,
        run_dir: &Path,
        run_type: ForceRunType,
        min_reporting_freq: ReportingFreq,
        parametric: bool,
        weather_path: &Path,
    ) -> CaseCompleted {
        // Composite inputs win when both staged forms are present.
        let input = if run_dir.join("in.imf").exists() {
            "in.imf"
        } else {
            "in.idf"
        };

        let mut cmd = tokio::process::Command::new(&build.executable);
        cmd.current_dir(run_dir)
            .arg("--weather")
            .arg(weather_path)
            .arg("--report-freq")
            .arg(min_reporting_freq.as_str());
        match run_type {
            ForceRunType::DesignDay => {
                cmd.arg("--design-day-only");
            }
            ForceRunType::Annual => {
                cmd.arg("--annual");
            }
            ForceRunType::None => {}
        }
        if parametric {
            cmd.arg("--parametric");
        }
        cmd.arg(input);

        let success = match cmd.status().await {
            Ok(status) => status.success(),
            Err(err) => {
                tracing::warn!(case, %err, "failed to launch simulation executable");
                false
            }
        };

        CaseCompleted {
            run_directory: run_dir.to_path_buf(),
            case_name: case.to_string(),
            success,
            already_reported: false,
            worker: std::thread::current()
                .name()
                .unwrap_or("worker")
                .to_string(),
        }
    }
}
