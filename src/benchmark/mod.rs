//! Benchmark execution and reporting.
//!
//! - [`benchmark_sentence`] renders a result as the sentence fed to the LLM
//! - [`BenchmarkRunner`] is the seam for running a workload against an options file
//! - [`DbBench`] runs `db_bench` and samples its resource usage

mod db_bench;

pub use db_bench::{parse_db_bench_output, DbBench};

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{BenchmarkResult, ResourceUsage};

/// Errors from running a benchmark.
#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("Failed to launch benchmark: {0}")]
    Launch(#[from] std::io::Error),

    #[error("Benchmark exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("No {test_name} result found in benchmark output")]
    MissingResult { test_name: String },
}

/// A benchmark result plus the resources the benchmark consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkOutcome {
    pub result: BenchmarkResult,
    pub usage: ResourceUsage,
}

/// Runs the tuning workload against one options file.
#[async_trait]
pub trait BenchmarkRunner: Send + Sync {
    async fn run(&self, options_path: &Path) -> Result<BenchmarkOutcome, BenchmarkError>;
}

/// Describe a benchmark result in one sentence.
///
/// The resource clause only appears when `usage` is known; build it with
/// [`ResourceUsage::from_parts`] so a single missing figure drops the clause.
pub fn benchmark_sentence(
    test_name: &str,
    result: &BenchmarkResult,
    usage: Option<ResourceUsage>,
) -> String {
    let mut line = format!(
        "The use case for the database is perfectly simulated by the {test} test. \
         The db_bench benchmark results for {test} are: Write/Read speed: {speed} {unit}, \
         Operations per second: {ops}.",
        test = test_name,
        speed = result.data_speed,
        unit = result.data_speed_unit,
        ops = result.ops_per_sec,
    );

    if let Some(usage) = usage {
        line.push_str(&format!(
            " CPU used: {:.2}%, Memory used: {:.2} MB during test.",
            usage.cpu_percent, usage.memory_mb
        ));
    }

    line
}
