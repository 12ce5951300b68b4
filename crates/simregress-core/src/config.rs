//! Suite run configuration.

use serde::{Deserialize, Serialize};

use crate::builds::BuildTree;

/// Which simulation periods the runs are forced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceRunType {
    /// Run each case exactly as authored.
    #[default]
    None,
    /// Design-day-only runs.
    DesignDay,
    /// Force a full annual run period.
    Annual,
}

impl ForceRunType {
    /// Prefix of the per-run output root created under each build directory.
    pub fn output_dir_prefix(self) -> &'static str {
        match self {
            ForceRunType::None => "Tests",
            ForceRunType::DesignDay => "Tests-DDOnly",
            ForceRunType::Annual => "Tests-Annual",
        }
    }
}

/// Minimum reporting frequency passed through to the simulation executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportingFreq {
    Detailed,
    Timestep,
    #[default]
    Hourly,
    Daily,
    Monthly,
    RunPeriod,
    Environment,
    Annual,
}

impl ReportingFreq {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportingFreq::Detailed => "Detailed",
            ReportingFreq::Timestep => "Timestep",
            ReportingFreq::Hourly => "Hourly",
            ReportingFreq::Daily => "Daily",
            ReportingFreq::Monthly => "Monthly",
            ReportingFreq::RunPeriod => "RunPeriod",
            ReportingFreq::Environment => "Environment",
            ReportingFreq::Annual => "Annual",
        }
    }
}

/// Everything a [`crate::engine::SuiteRunner`] needs to execute one suite.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub force_run_type: ForceRunType,
    /// Worker pool size; clamped to a minimum of 1. Pool size 1 runs strictly
    /// sequentially in-process.
    pub num_threads: usize,
    pub report_freq: ReportingFreq,
    pub build_a: BuildTree,
    /// Whether build A's cases are executed this run.
    pub run_a: bool,
    pub build_b: BuildTree,
    pub run_b: bool,
}

#[cfg(test)]
mod tests {
    use super::ForceRunType;

    #[test]
    fn output_dir_prefix_per_run_type() {
        assert_eq!(ForceRunType::None.output_dir_prefix(), "Tests");
        assert_eq!(ForceRunType::DesignDay.output_dir_prefix(), "Tests-DDOnly");
        assert_eq!(ForceRunType::Annual.output_dir_prefix(), "Tests-Annual");
    }
}
