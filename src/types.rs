//! Core data types shared by the prompt builder, generator and tuner.

use serde::{Deserialize, Serialize};

/// Sentinel used by older callers for "resource usage not measured".
pub const UNMEASURED: f64 = -1.0;

/// Structured outcome of one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Write/read speed reported by the benchmark
    pub data_speed: f64,
    /// Unit of `data_speed` (e.g. `MB/s`)
    pub data_speed_unit: String,
    /// Operations per second
    pub ops_per_sec: f64,
}

impl BenchmarkResult {
    pub fn new(data_speed: f64, data_speed_unit: impl Into<String>, ops_per_sec: f64) -> Self {
        Self {
            data_speed,
            data_speed_unit: data_speed_unit.into(),
            ops_per_sec,
        }
    }
}

/// Average resource usage of the benchmark process over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    /// Average CPU usage in percent (may exceed 100 on multi-core hosts)
    pub cpu_percent: f64,
    /// Average resident memory in megabytes
    pub memory_mb: f64,
}

impl ResourceUsage {
    pub fn new(cpu_percent: f64, memory_mb: f64) -> Self {
        Self {
            cpu_percent,
            memory_mb,
        }
    }

    /// Build usage from two optional measurements.
    ///
    /// Usage is only reported when *both* values are known; a single missing
    /// value suppresses the whole figure.
    pub fn from_parts(cpu_percent: Option<f64>, memory_mb: Option<f64>) -> Option<Self> {
        match (cpu_percent, memory_mb) {
            (Some(cpu), Some(mem)) => Some(Self::new(cpu, mem)),
            _ => None,
        }
    }

    /// Same as [`ResourceUsage::from_parts`], treating [`UNMEASURED`] as missing.
    pub fn from_sentinel(cpu_percent: f64, memory_mb: f64) -> Option<Self> {
        let known = |v: f64| (v != UNMEASURED).then_some(v);
        Self::from_parts(known(cpu_percent), known(memory_mb))
    }
}

/// One generated configuration and its evaluation.
///
/// Records are appended by the tuning driver in generation order and never
/// mutated afterwards; the last record is the current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigAttempt {
    /// Full options file text
    pub config_text: String,
    /// Benchmark outcome for this options file
    pub benchmark: BenchmarkResult,
    /// Reasoning the LLM gave for this options file
    pub reasoning: String,
    /// Free-form tag (e.g. `baseline`, `iteration 3`, `midway`)
    pub metadata: String,
}

impl ConfigAttempt {
    pub fn new(
        config_text: impl Into<String>,
        benchmark: BenchmarkResult,
        reasoning: impl Into<String>,
        metadata: impl Into<String>,
    ) -> Self {
        Self {
            config_text: config_text.into(),
            benchmark,
            reasoning: reasoning.into(),
            metadata: metadata.into(),
        }
    }
}

/// Everything handed to the LLM boundary for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPayload {
    pub system: String,
    /// User turns, in the order the model should read them
    pub user_turns: Vec<String>,
    pub temperature: f64,
}

/// An LLM answer split around its fenced options block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    pub reasoning_before: String,
    pub options_block: String,
    pub reasoning_after: String,
}

impl LlmResponse {
    /// Reasoning text surrounding the options block, concatenated.
    pub fn reasoning(&self) -> String {
        format!("{}{}", self.reasoning_before, self.reasoning_after)
    }
}

/// A cleaned options file plus the reasoning that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOptions {
    pub options: String,
    pub reasoning: String,
}
