use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde::Deserialize;

use simregress_core::builds::BuildTree;
use simregress_core::config::{ForceRunType, ReportingFreq, RunConfig};
use simregress_core::diffs::ThresholdConfig;
use simregress_core::model::TestEntry;
use simregress_core::SuiteRunner;

use crate::console::ConsoleObserver;

#[derive(Parser)]
#[command(
    name = "simregress",
    version,
    about = "Run a case list against two simulator builds and diff every output artifact pair"
)]
pub struct Cli {
    /// Build A's source repository root
    pub a_src: PathBuf,
    /// Build A's build directory
    pub a_build: PathBuf,
    /// Build B's source repository root
    pub b_src: PathBuf,
    /// Build B's build directory
    pub b_build: PathBuf,
    /// JSON file listing the cases to run
    pub case_list: PathBuf,

    /// Run build A's cases
    #[arg(short = 'a', long = "run-a")]
    pub run_a: bool,

    /// Run build B's cases
    #[arg(short = 'b', long = "run-b")]
    pub run_b: bool,

    /// Force a specific run type for every case
    #[arg(short = 'f', long = "force-type", value_enum, default_value = "none")]
    pub force_type: ForceTypeArg,

    /// Number of parallel workers (1 runs strictly sequentially)
    #[arg(short = 'j', long = "threads", default_value_t = 1)]
    pub threads: usize,

    /// Only run cases whose name matches this regular expression
    #[arg(long)]
    pub filter: Option<String>,

    /// Run only the first selected case
    #[arg(short = 't', long)]
    pub single: bool,

    /// YAML threshold configuration for the numeric/tabular diffs
    #[arg(long)]
    pub thresholds: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ForceTypeArg {
    None,
    Dd,
    Annual,
}

impl From<ForceTypeArg> for ForceRunType {
    fn from(arg: ForceTypeArg) -> Self {
        match arg {
            ForceTypeArg::None => ForceRunType::None,
            ForceTypeArg::Dd => ForceRunType::DesignDay,
            ForceTypeArg::Annual => ForceRunType::Annual,
        }
    }
}

#[derive(Deserialize)]
struct CaseList {
    files_to_run: Vec<CaseSpec>,
}

#[derive(Deserialize)]
struct CaseSpec {
    file: String,
    #[serde(default)]
    epw: Option<String>,
}

fn load_entries(path: &Path, filter: Option<&str>, single: bool) -> anyhow::Result<Vec<TestEntry>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read case list {}", path.display()))?;
    let list: CaseList = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse case list {}", path.display()))?;
    let filter = filter
        .map(regex::Regex::new)
        .transpose()
        .context("invalid --filter regex")?;

    let mut entries = Vec::new();
    for spec in list.files_to_run {
        if let Some(re) = &filter {
            if !re.is_match(&spec.file) {
                continue;
            }
        }
        entries.push(TestEntry::new(spec.file, spec.epw));
        if single {
            break;
        }
    }
    Ok(entries)
}

/// Resolve the conventional layout under a source root. Anything more exotic
/// (separated install trees, packaged builds) belongs to a dedicated build
/// abstraction, not the runner.
fn resolve_build(source_dir: &Path, build_dir: &Path) -> BuildTree {
    BuildTree {
        build_dir: build_dir.to_path_buf(),
        executable: build_dir.join("sim"),
        test_files_dir: source_dir.join("testfiles"),
        source_dir: source_dir.to_path_buf(),
        weather_dir: source_dir.join("weather"),
        data_sets_dir: source_dir.join("datasets"),
    }
}

/// Exit codes: 0 suite completed, 1 suite failed or was cancelled; usage and
/// configuration errors propagate and exit 2.
pub async fn run(args: Cli) -> anyhow::Result<i32> {
    let entries = load_entries(&args.case_list, args.filter.as_deref(), args.single)?;
    if entries.is_empty() {
        anyhow::bail!("case list {} selected no cases", args.case_list.display());
    }
    tracing::info!(
        cases = entries.len(),
        threads = args.threads,
        "suite configured"
    );

    let thresholds = match &args.thresholds {
        Some(path) => ThresholdConfig::from_yaml_file(path)?,
        None => ThresholdConfig::default(),
    };

    let config = RunConfig {
        force_run_type: args.force_type.into(),
        num_threads: args.threads,
        report_freq: ReportingFreq::Hourly,
        build_a: resolve_build(&args.a_src, &args.a_build),
        run_a: args.run_a,
        build_b: resolve_build(&args.b_src, &args.b_build),
        run_b: args.run_b,
    };

    let runner = SuiteRunner::new(config, entries)
        .with_thresholds(thresholds)
        .with_observer(Arc::new(ConsoleObserver::default()));

    // Ctrl-C flips the cooperative cancel flag; in-flight cases finish.
    let cancel = runner.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.store(true, Ordering::SeqCst);
        }
    });

    match runner.run_suite().await {
        Ok(Some(_result)) => Ok(0),
        Ok(None) => Ok(1),
        Err(err) => {
            eprintln!("suite failed: {err:#}");
            Ok(1)
        }
    }
}
