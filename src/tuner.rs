//! The tuning loop: generate → benchmark → measure → feed back.
//!
//! ```text
//!   baseline options ──► benchmark ──► history[0]
//!                                          │
//!        ┌─────────────────────────────────┘
//!        ▼
//!   generate (initial / iterative) ──► benchmark ──► regression? ──no──► record
//!                                                        │
//!                                                       yes (side checker)
//!                                                        ▼
//!                                    generate (midway) ──► benchmark ──► record
//! ```
//!
//! Every recorded attempt is persisted to `history.json` in the output folder.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::benchmark::{BenchmarkError, BenchmarkOutcome, BenchmarkRunner};
use crate::generator::{GenerationError, OptionsGenerator};
use crate::options::write_options_file;
use crate::types::{ConfigAttempt, GeneratedOptions, ResourceUsage};

pub const HISTORY_FILE_NAME: &str = "history.json";

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("I/O error in output folder: {0}")]
    Io(#[from] std::io::Error),

    #[error("Baseline benchmark failed: {0}")]
    Baseline(#[source] BenchmarkError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Loop settings.
#[derive(Debug, Clone)]
pub struct TunerSettings {
    pub output_dir: PathBuf,
    pub iterations: usize,
    pub side_checker: bool,
    pub temperature: f64,
}

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct TuningReport {
    pub history: Vec<ConfigAttempt>,
    /// Index into `history` of the attempt with the highest ops/sec
    pub best_index: usize,
    /// Iterations that produced no recorded attempt
    pub skipped: usize,
}

impl TuningReport {
    pub fn best(&self) -> &ConfigAttempt {
        &self.history[self.best_index]
    }
}

pub struct Tuner {
    generator: OptionsGenerator,
    bench: Arc<dyn BenchmarkRunner>,
    settings: TunerSettings,
}

impl Tuner {
    pub fn new(
        generator: OptionsGenerator,
        bench: Arc<dyn BenchmarkRunner>,
        settings: TunerSettings,
    ) -> Self {
        Self {
            generator,
            bench,
            settings,
        }
    }

    /// Run the full loop starting from `initial_options`.
    pub async fn run(&self, initial_options: &str) -> Result<TuningReport, TuningError> {
        let baseline_path = self.settings.output_dir.join("options_file.ini");
        write_options_file(&baseline_path, initial_options).await?;
        let baseline = self
            .bench
            .run(&baseline_path)
            .await
            .map_err(TuningError::Baseline)?;

        let mut usage = Some(baseline.usage);
        let mut history = vec![ConfigAttempt::new(
            initial_options,
            baseline.result,
            "",
            "baseline",
        )];
        self.save_history(&history).await?;

        let mut skipped = 0;
        for iteration in 1..=self.settings.iterations {
            tracing::info!("Iteration {}/{}", iteration, self.settings.iterations);

            let Some(generated) = self.generate(&history, usage).await? else {
                tracing::warn!("Iteration {}: no options generated, skipping", iteration);
                skipped += 1;
                continue;
            };

            let path = self.options_path(&format!("options_file_{}.ini", iteration));
            let Some(outcome) = self.benchmark(&path, &generated.options).await? else {
                skipped += 1;
                continue;
            };

            let last_ops = history
                .last()
                .map(|a| a.benchmark.ops_per_sec)
                .unwrap_or_default();
            let regressed = outcome.result.ops_per_sec < last_ops;

            if self.settings.side_checker && regressed {
                tracing::info!(
                    "Iteration {}: throughput dropped from {} to {}, requesting midway options",
                    iteration,
                    last_ops,
                    outcome.result.ops_per_sec
                );
                let midway = self
                    .generator
                    .generate_midway(
                        &history,
                        &generated.options,
                        outcome.result.ops_per_sec,
                        self.settings.temperature,
                    )
                    .await?;

                let path = self.options_path(&format!("options_file_{}_midway.ini", iteration));
                let Some(outcome) = self.benchmark(&path, &midway.options).await? else {
                    skipped += 1;
                    continue;
                };
                usage = Some(outcome.usage);
                history.push(ConfigAttempt::new(
                    midway.options,
                    outcome.result,
                    midway.reasoning,
                    format!("midway {}", iteration),
                ));
            } else {
                usage = Some(outcome.usage);
                history.push(ConfigAttempt::new(
                    generated.options,
                    outcome.result,
                    generated.reasoning,
                    format!("iteration {}", iteration),
                ));
            }

            self.save_history(&history).await?;
        }

        let best_index = best_attempt(&history);
        tracing::info!(
            "Tuning finished: {} attempts recorded, {} skipped, best {} ops/sec ({})",
            history.len(),
            skipped,
            history[best_index].benchmark.ops_per_sec,
            history[best_index].metadata
        );

        Ok(TuningReport {
            history,
            best_index,
            skipped,
        })
    }

    /// Initial generation while only the baseline is recorded, iterative after.
    async fn generate(
        &self,
        history: &[ConfigAttempt],
        usage: Option<ResourceUsage>,
    ) -> Result<Option<GeneratedOptions>, GenerationError> {
        match history {
            [baseline] => Ok(self
                .generator
                .generate_initial(baseline, usage, self.settings.temperature)
                .await),
            _ => {
                self.generator
                    .generate_iterative(history, usage, self.settings.temperature)
                    .await
            }
        }
    }

    /// Write and benchmark one options file. A failing benchmark is logged
    /// and reported as `None`: generated files are allowed to be bad.
    async fn benchmark(
        &self,
        path: &Path,
        options: &str,
    ) -> Result<Option<BenchmarkOutcome>, TuningError> {
        write_options_file(path, options).await?;
        match self.bench.run(path).await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                tracing::warn!("Benchmark of {} failed: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    fn options_path(&self, file_name: &str) -> PathBuf {
        self.settings.output_dir.join(file_name)
    }

    async fn save_history(&self, history: &[ConfigAttempt]) -> Result<(), TuningError> {
        let path = self.settings.output_dir.join(HISTORY_FILE_NAME);
        let content = serde_json::to_string_pretty(history)?;
        tokio::fs::write(&path, content).await?;
        Ok(())
    }
}

/// Index of the attempt with the highest ops/sec (first one on ties).
fn best_attempt(history: &[ConfigAttempt]) -> usize {
    history
        .iter()
        .enumerate()
        .fold(0, |best, (i, attempt)| {
            if attempt.benchmark.ops_per_sec > history[best].benchmark.ops_per_sec {
                i
            } else {
                best
            }
        })
}
