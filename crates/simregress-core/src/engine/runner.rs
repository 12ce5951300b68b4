use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::builds::BuildTree;
use crate::config::RunConfig;
use crate::diffs::{self, DiffEngines, ThresholdConfig};
use crate::errors::SetupError;
use crate::events::{NullObserver, SharedObserver};
use crate::model::{CaseCompleted, TestEntry};
use crate::report::{self, SuiteResult, RESULTS_SUMMARY_FILE, RUNTIME_SUMMARY_FILE};
use crate::sim::{ProcessSimulator, SimulationRunner};

/// Staged file names inside each run directory.
const PRIMARY_INPUT: &str = "in.idf";
const COMPOSITE_INPUT: &str = "in.imf";
const REPORT_REQUESTS: &str = "in.rvi";
const METER_REQUESTS: &str = "in.mvi";
/// Default weather file, resolved under `<source_dir>/weather/`.
const DEFAULT_WEATHER: &str = "default.epw";
/// Input-text marker for parametric cases.
const PARAMETRIC_MARKER: &str = "Parametric:";

/// One fully staged execution unit, ready for the worker pool.
struct SimJob {
    build: BuildTree,
    case: String,
    run_dir: PathBuf,
    parametric: bool,
    weather: PathBuf,
}

/// Drives one full suite run: directory preparation, per-build execution,
/// per-case diffing, aggregation, and summary persistence.
///
/// The runner owns the entry list for the duration of the run; the returned
/// [`SuiteResult`] carries the final read-only state of every entry.
pub struct SuiteRunner {
    config: RunConfig,
    entries: Vec<TestEntry>,
    simulator: Arc<dyn SimulationRunner>,
    engines: DiffEngines,
    thresholds: ThresholdConfig,
    observer: SharedObserver,
    cancel: Arc<AtomicBool>,
    output_dir_name: String,
}

impl SuiteRunner {
    /// Build a runner with default collaborators (process executor, built-in
    /// diff engines, default thresholds, silent observer). The per-run output
    /// root name is fixed at construction so successive runs never collide.
    pub fn new(config: RunConfig, entries: Vec<TestEntry>) -> Self {
        let output_dir_name = format!(
            "{}_{}",
            config.force_run_type.output_dir_prefix(),
            Local::now().format("%Y%m%d_%H%M%S")
        );
        Self {
            config,
            entries,
            simulator: Arc::new(ProcessSimulator),
            engines: DiffEngines::default(),
            thresholds: ThresholdConfig::default(),
            observer: Arc::new(NullObserver),
            cancel: Arc::new(AtomicBool::new(false)),
            output_dir_name,
        }
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_simulator(mut self, simulator: Arc<dyn SimulationRunner>) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn with_engines(mut self, engines: DiffEngines) -> Self {
        self.engines = engines;
        self
    }

    pub fn with_thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Shared cooperative cancel flag. Set it from any thread to stop the run
    /// at its next checkpoint; in-flight cases are allowed to finish.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Name of the per-run output root created under each build directory.
    pub fn output_dir_name(&self) -> &str {
        &self.output_dir_name
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn cancel_now(&self) {
        self.observer.on_print("Cancelling the test suite...");
        self.observer.on_cancelled();
    }

    /// Run the whole suite. Returns `Ok(None)` when the run was cancelled
    /// (partial results are discarded); propagates only suite-level setup
    /// failures.
    pub async fn run_suite(mut self) -> anyhow::Result<Option<SuiteResult>> {
        if self.cancelled() {
            self.cancel_now();
            return Ok(None);
        }

        self.prepare_dir_structure()?;

        self.observer
            .on_simulations_starting(2, self.entries.len());

        if self.config.run_a {
            if self.cancelled() {
                self.cancel_now();
                return Ok(None);
            }
            let build = self.config.build_a.clone();
            self.run_build(&build).await?;
        }
        if self.config.run_b {
            if self.cancelled() {
                self.cancel_now();
                return Ok(None);
            }
            let build = self.config.build_b.clone();
            self.run_build(&build).await?;
        }
        if self.cancelled() {
            self.cancel_now();
            return Ok(None);
        }
        self.observer.on_all_simulations_complete();

        self.diff_phase();

        let output_root = self.config.build_a.build_dir.join(&self.output_dir_name);
        let result = report::aggregate(
            std::mem::take(&mut self.entries),
            self.config.build_a.build_dir.clone(),
            self.config.build_b.build_dir.clone(),
            output_root.clone(),
        );

        // Summary persistence is best-effort; a write failure must not
        // invalidate the in-memory result.
        self.observer.on_print("Writing runtime summary file");
        match result.write_runtime_summary(&output_root.join(RUNTIME_SUMMARY_FILE)) {
            Ok(()) => self.observer.on_print("Runtime summary written successfully"),
            Err(err) => self
                .observer
                .on_print(&format!("Could not write runtime summary file: {err:#}")),
        }
        self.observer.on_print("Writing simulation results summary file");
        match result.write_json_summary(&output_root.join(RESULTS_SUMMARY_FILE)) {
            Ok(()) => self.observer.on_print("Results summary written successfully"),
            Err(err) => self
                .observer
                .on_print(&format!("Could not write results summary file: {err:#}")),
        }

        self.observer.on_print("Test suite complete for directories:");
        self.observer
            .on_print(&format!("\t{}", self.config.build_a.build_dir.display()));
        self.observer
            .on_print(&format!("\t{}", self.config.build_b.build_dir.display()));
        self.observer.on_print("Test suite complete");

        self.observer.on_suite_complete(&result);
        Ok(Some(result))
    }

    /// Create the per-run output root under both build directories. Failure
    /// here aborts the suite.
    fn prepare_dir_structure(&self) -> Result<(), SetupError> {
        for build in [&self.config.build_a, &self.config.build_b] {
            let root = build.build_dir.join(&self.output_dir_name);
            std::fs::create_dir_all(&root).map_err(|source| SetupError::OutputRoot {
                path: root.clone(),
                source,
            })?;
        }
        self.observer.on_print(&format!(
            "Created test directories at <build-dir>/{}",
            self.output_dir_name
        ));
        Ok(())
    }

    /// Stage and execute every entry against one build.
    async fn run_build(&self, build: &BuildTree) -> anyhow::Result<()> {
        let mut jobs = Vec::new();
        for entry in &self.entries {
            match self.stage_case(build, entry) {
                Ok(Some(job)) => jobs.push(job),
                // Missing input: already reported as a failed case.
                Ok(None) => {}
                Err(err) => {
                    self.observer.on_print(&format!(
                        "Staging failed for {}: {err:#}",
                        entry.basename
                    ));
                    self.observer.on_case_completed(&CaseCompleted::failed(
                        build.build_dir.join(&self.output_dir_name).join(&entry.basename),
                        &entry.basename,
                    ));
                }
            }
        }

        let pool = self.config.num_threads.max(1);
        if pool == 1 {
            // Strictly sequential in-process path; no pool is spawned.
            for job in jobs {
                if self.cancelled() {
                    return Ok(());
                }
                let record = self
                    .simulator
                    .run_case(
                        &job.build,
                        &job.case,
                        &job.run_dir,
                        self.config.force_run_type,
                        self.config.report_freq,
                        job.parametric,
                        &job.weather,
                    )
                    .await;
                self.observer.on_case_completed(&record);
            }
            return Ok(());
        }

        let sem = Arc::new(Semaphore::new(pool));
        let mut join_set = JoinSet::new();
        let run_type = self.config.force_run_type;
        let freq = self.config.report_freq;
        for job in jobs {
            // Waiting on a permit bounds dispatch to pool capacity, so this
            // check runs before each task actually starts.
            if self.cancelled() {
                break;
            }
            let permit = sem.clone().acquire_owned().await?;
            let simulator = self.simulator.clone();
            join_set.spawn(async move {
                let _permit = permit;
                simulator
                    .run_case(
                        &job.build,
                        &job.case,
                        &job.run_dir,
                        run_type,
                        freq,
                        job.parametric,
                        &job.weather,
                    )
                    .await
            });
        }

        // Completion order, not submission order.
        while let Some(res) = join_set.join_next().await {
            let record = match res {
                Ok(record) => record,
                Err(err) => {
                    // A crashed worker task must not take down the suite.
                    self.observer
                        .on_print(&format!("Worker task failed: {err}"));
                    CaseCompleted::failed(PathBuf::new(), "unknown")
                }
            };
            self.observer.on_case_completed(&record);
        }
        Ok(())
    }

    /// Prepare one case's isolated run directory: inputs, referenced
    /// datasets, report-request files, and the resolved weather path.
    ///
    /// Returns `Ok(None)` when neither input form exists; that case is
    /// recorded as failed and the suite continues.
    fn stage_case(&self, build: &BuildTree, entry: &TestEntry) -> anyhow::Result<Option<SimJob>> {
        let run_dir = build
            .build_dir
            .join(&self.output_dir_name)
            .join(&entry.basename);
        if run_dir.exists() {
            std::fs::remove_dir_all(&run_dir)?;
        }
        std::fs::create_dir_all(&run_dir)?;

        let input_base = build.test_files_dir.join(entry.basename.trim());
        let idf_path = input_base.with_extension("idf");
        let imf_path = input_base.with_extension("imf");

        let mut parametric = false;
        if idf_path.exists() {
            std::fs::copy(&idf_path, run_dir.join(PRIMARY_INPUT))?;
            let bytes = std::fs::read(run_dir.join(PRIMARY_INPUT))?;
            let input_text = String::from_utf8_lossy(&bytes);
            self.stage_datasets(build, &run_dir, &input_text)?;
            parametric = input_text.contains(PARAMETRIC_MARKER);
        } else if imf_path.exists() {
            std::fs::copy(&imf_path, run_dir.join(COMPOSITE_INPUT))?;
            // Composite inputs may include any sibling macro file.
            for dirent in std::fs::read_dir(&build.test_files_dir)? {
                let path = dirent?.path();
                if path.extension().is_some_and(|ext| ext == "imf") {
                    if let Some(name) = path.file_name() {
                        std::fs::copy(&path, run_dir.join(name))?;
                    }
                }
            }
        } else {
            self.observer
                .on_print("Input file doesn't exist in either primary or composite form:");
            self.observer
                .on_print(&format!("   primary: {}", idf_path.display()));
            self.observer
                .on_print(&format!("   composite: {}", imf_path.display()));
            self.observer
                .on_case_completed(&CaseCompleted::failed(run_dir, &entry.basename));
            return Ok(None);
        }

        for (ext, staged) in [("rvi", REPORT_REQUESTS), ("mvi", METER_REQUESTS)] {
            let src = input_base.with_extension(ext);
            if src.exists() {
                std::fs::copy(&src, run_dir.join(staged))?;
            }
        }

        let weather = self.resolve_weather(build, entry);
        Ok(Some(SimJob {
            build: build.clone(),
            case: entry.basename.clone(),
            run_dir,
            parametric,
            weather,
        }))
    }

    /// Copy every dataset file the input text references into
    /// `<run_dir>/datasets/`.
    fn stage_datasets(
        &self,
        build: &BuildTree,
        run_dir: &std::path::Path,
        input_text: &str,
    ) -> anyhow::Result<()> {
        if !build.data_sets_dir.is_dir() {
            return Ok(());
        }
        let target = run_dir.join("datasets");
        let mut created = false;
        for dirent in std::fs::read_dir(&build.data_sets_dir)? {
            let path = dirent?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !input_text.contains(name) {
                continue;
            }
            if !created {
                std::fs::create_dir_all(&target)?;
                created = true;
            }
            std::fs::copy(&path, target.join(name))?;
        }
        Ok(())
    }

    /// Resolve the weather file: explicit override when present on disk,
    /// otherwise the fixed default (with a warning when an override was
    /// requested but absent).
    fn resolve_weather(&self, build: &BuildTree, entry: &TestEntry) -> PathBuf {
        let default = build.source_dir.join("weather").join(DEFAULT_WEATHER);
        let Some(ref override_name) = entry.weather_override else {
            return default;
        };
        let candidate = build.weather_dir.join(format!("{override_name}.epw"));
        if candidate.exists() {
            candidate
        } else {
            self.observer.on_print(&format!(
                "For case {}, weather file did not exist at {}, using the default one!",
                entry.basename,
                candidate.display()
            ));
            default
        }
    }

    /// Per-case diffing, gated by the decision matrix inside
    /// [`diffs::process_case`]. Errors are absorbed at the case boundary.
    fn diff_phase(&mut self) {
        let root_a = self.config.build_a.build_dir.join(&self.output_dir_name);
        let root_b = self.config.build_b.build_dir.join(&self.output_dir_name);
        for entry in &mut self.entries {
            let dir_a = root_a.join(&entry.basename);
            let dir_b = root_b.join(&entry.basename);
            if let Err(err) = diffs::process_case(
                entry,
                &dir_a,
                &dir_b,
                &self.thresholds,
                &self.engines,
                self.observer.as_ref(),
            ) {
                self.observer.on_print(&format!(
                    "Unexpected error processing diffs for {}, could indicate corrupted outputs",
                    entry.basename
                ));
                self.observer.on_print(&format!("Message: {err:#}"));
            }
            self.observer.on_diff_completed(&entry.basename);
        }
    }
}
