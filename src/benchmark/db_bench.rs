//! `db_bench` runner with resource sampling.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;

use super::{BenchmarkError, BenchmarkOutcome, BenchmarkRunner};
use crate::monitor::{ResourceSampler, SysinfoProbe};
use crate::types::{BenchmarkResult, ResourceUsage};

/// Runs one `db_bench` workload per options file.
#[derive(Debug, Clone)]
pub struct DbBench {
    pub binary: PathBuf,
    pub db_path: PathBuf,
    pub test_name: String,
    pub num_entries: u64,
}

impl DbBench {
    pub fn new(
        binary: impl Into<PathBuf>,
        db_path: impl Into<PathBuf>,
        test_name: impl Into<String>,
        num_entries: u64,
    ) -> Self {
        Self {
            binary: binary.into(),
            db_path: db_path.into(),
            test_name: test_name.into(),
            num_entries,
        }
    }

    /// Command-line arguments for one run. Direct I/O is always on and
    /// compression always off, matching what every prompt tells the model.
    pub fn args(&self, options_path: &Path) -> Vec<String> {
        vec![
            format!("--benchmarks={}", self.test_name),
            format!("--db={}", self.db_path.display()),
            format!("--options_file={}", options_path.display()),
            format!("--num={}", self.num_entries),
            "--use_direct_io_for_flush_and_compaction=true".to_string(),
            "--compression_type=none".to_string(),
        ]
    }
}

#[async_trait]
impl BenchmarkRunner for DbBench {
    async fn run(&self, options_path: &Path) -> Result<BenchmarkOutcome, BenchmarkError> {
        let args = self.args(options_path);
        tracing::info!("Running {} {}", self.binary.display(), args.join(" "));

        let child = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut sampler = child
            .id()
            .map(|pid| ResourceSampler::new(SysinfoProbe::new(pid)));
        if let Some(sampler) = sampler.as_mut() {
            sampler.start();
        }

        let output = child.wait_with_output().await;
        let usage = match sampler.as_mut() {
            Some(sampler) => sampler.stop().await,
            None => ResourceUsage::default(),
        };
        let output = output?;

        if !output.status.success() {
            return Err(BenchmarkError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let result = parse_db_bench_output(&self.test_name, &stdout).ok_or_else(|| {
            BenchmarkError::MissingResult {
                test_name: self.test_name.clone(),
            }
        })?;

        tracing::info!(
            "{}: {} ops/sec, {} {} (cpu {:.2}%, mem {:.2} MB)",
            self.test_name,
            result.ops_per_sec,
            result.data_speed,
            result.data_speed_unit,
            usage.cpu_percent,
            usage.memory_mb
        );

        Ok(BenchmarkOutcome { result, usage })
    }
}

/// Extract the result line for `test_name` from `db_bench` stdout.
///
/// Expected shape:
/// `fillrandom   :       2.371 micros/op 421773 ops/sec 23.710 seconds 10000000 operations;   46.7 MB/s`
/// Workloads without a throughput section report a speed of `0 MB/s`.
pub fn parse_db_bench_output(test_name: &str, output: &str) -> Option<BenchmarkResult> {
    let pattern = format!(
        r"(?m)^{}\s*:\s*[\d.]+\s+micros/op\s+([\d.]+)\s+ops/sec[^;\n]*(?:;\s*([\d.]+)\s+(\S+))?",
        regex::escape(test_name)
    );
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(output)?;

    let ops_per_sec = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let (data_speed, data_speed_unit) = match (caps.get(2), caps.get(3)) {
        (Some(speed), Some(unit)) => (speed.as_str().parse::<f64>().ok()?, unit.as_str()),
        _ => (0.0, "MB/s"),
    };

    Some(BenchmarkResult::new(data_speed, data_speed_unit, ops_per_sec))
}
