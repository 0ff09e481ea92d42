//! Prompt construction for options-file generation.
//!
//! Three request shapes are supported:
//! - **initial**: one user turn with the current options file and its result
//! - **iterative**: the interior history of changes, the current file, and an
//!   instruction turn
//! - **midway**: the last recorded file, the additions a new candidate made to
//!   it, the candidate's measured throughput, and an instruction turn
//!
//! Turn order matters: it is the narrative the model reads.

pub mod diff;

use thiserror::Error;

use crate::benchmark::benchmark_sentence;
use crate::types::{ConfigAttempt, PromptPayload, ResourceUsage};

/// Default sampling temperature for generation requests.
pub const DEFAULT_TEMPERATURE: f64 = 0.4;

const GENERATE_INSTRUCTION: &str = "Based on these information generate a new file in same format \
     as the options_file to improve my database performance. Enclose the new options file in ```.";

const MIDWAY_INSTRUCTION: &str = "Based on this information generate a new file. Enclose the new \
     options in ```. Feel free to use upto 100% of the CPU and Memory.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("Options history is empty; at least one recorded attempt is required")]
    EmptyHistory,
}

/// Per-run facts pinned into every prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptContext {
    /// Storage engine version the options file must target
    pub engine_version: String,
    /// Free-text description of the host and its storage
    pub device_info: String,
    /// Workload name (e.g. `fillrandom`)
    pub test_name: String,
}

impl PromptContext {
    pub fn new(
        engine_version: impl Into<String>,
        device_info: impl Into<String>,
        test_name: impl Into<String>,
    ) -> Self {
        Self {
            engine_version: engine_version.into(),
            device_info: device_info.into(),
            test_name: test_name.into(),
        }
    }
}

/// Which system prompt variant to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemVariant {
    /// Explain first, change at most 10 options
    Standard,
    /// Reasoning then file, no cap on the number of changes
    Midway,
}

/// System prompt for the given variant.
pub fn system_content(ctx: &PromptContext, variant: SystemVariant) -> String {
    let (role, policy, style) = match variant {
        SystemVariant::Standard => (
            "You are a RocksDB Expert. You are being consulted by a company to help improve \
             their RocksDB configuration by optimizing their options file based on their \
             System information and benchmark output.",
            "Also, Direct IO will always be used for both flush and compaction.",
            "First Explain the reasoning, only change 10 options, then show the option file \
             in original format.",
        ),
        SystemVariant::Midway => (
            "You are a RocksDB Expert being consulted by a company to help improve their \
             RocksDB performance by optimizing the options configured for a particular \
             scenario they face.",
            "Direct IO will always be used.",
            "Respond with the reasoning first, then show the option file in original format.",
        ),
    };

    format!(
        "{role} Only provide option files for rocksdb version {version}. {policy} \
         Additionally, compression type is set to none always. {style} \
         The Device information is: {device}",
        version = ctx.engine_version,
        device = ctx.device_info,
    )
}

/// Wrap `text` in a fenced block, making sure the closing fence sits on its own line.
fn fenced(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        format!("```\n{}```\n", text)
    } else {
        format!("```\n{}\n```\n", text)
    }
}

/// Request for the first generated file, starting from `current`.
pub fn initial_prompt(
    ctx: &PromptContext,
    current: &ConfigAttempt,
    usage: Option<ResourceUsage>,
    temperature: f64,
) -> PromptPayload {
    let line = benchmark_sentence(&ctx.test_name, &current.benchmark, usage);
    let turn = format!(
        "The current option file is:\n{}The benchmark results are: {}\n{}",
        fenced(&current.config_text),
        line,
        GENERATE_INSTRUCTION
    );

    PromptPayload {
        system: system_content(ctx, SystemVariant::Standard),
        user_turns: vec![turn],
        temperature,
    }
}

/// Request built from the full history.
///
/// The first (baseline) and last (current) attempts are left out of the
/// change log; the last attempt's result is reported next to `current_chunk`,
/// which may be only part of the current options file.
pub fn iterative_prompt(
    ctx: &PromptContext,
    history: &[ConfigAttempt],
    current_chunk: &str,
    usage: Option<ResourceUsage>,
    temperature: f64,
) -> Result<PromptPayload, PromptError> {
    let current = history.last().ok_or(PromptError::EmptyHistory)?;
    let interior = history.get(1..history.len() - 1).unwrap_or_default();

    let mut user_turns = Vec::with_capacity(interior.len() + 2);
    for attempt in interior {
        let line = benchmark_sentence(&ctx.test_name, &attempt.benchmark, usage);
        user_turns.push(format!(
            "The option file changes were:\n{}The benchmark results are: {}",
            fenced(&attempt.reasoning),
            line
        ));
    }

    let line = benchmark_sentence(&ctx.test_name, &current.benchmark, usage);
    user_turns.push(format!(
        "Part of the current option file is:\n{}The benchmark results are: {}",
        fenced(current_chunk),
        line
    ));
    user_turns.push(GENERATE_INSTRUCTION.to_string());

    Ok(PromptPayload {
        system: system_content(ctx, SystemVariant::Standard),
        user_turns,
        temperature,
    })
}

/// Request that reports only what `candidate` added to the last recorded file.
///
/// `last_throughput` is the candidate's freshly measured ops/sec; the
/// candidate is not part of `history`.
pub fn midway_prompt(
    ctx: &PromptContext,
    history: &[ConfigAttempt],
    candidate: &str,
    last_throughput: f64,
    temperature: f64,
) -> Result<PromptPayload, PromptError> {
    let previous = history.last().ok_or(PromptError::EmptyHistory)?;

    let previous_turn = format!(
        "Can you generate a new options file for RocksDB based on the following information?\n\
         The previous options file is:\n{}\
         The throughput results for the above options file are: {}. ",
        fenced(&previous.config_text),
        previous.benchmark.ops_per_sec
    );

    let changes = diff::additions(&previous.config_text, candidate);
    let changes_turn = format!(
        "We then made the following changes to the options file:\n{}\n\
         The updated file has a throughput of: {}. \n\n",
        fenced(&changes),
        last_throughput
    );

    Ok(PromptPayload {
        system: system_content(ctx, SystemVariant::Midway),
        user_turns: vec![previous_turn, changes_turn, MIDWAY_INSTRUCTION.to_string()],
        temperature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BenchmarkResult;

    fn ctx() -> PromptContext {
        PromptContext::new("8.8.1", "16 cores, NVMe SSD", "fillrandom")
    }

    fn attempt(config: &str, ops: f64, reasoning: &str) -> ConfigAttempt {
        ConfigAttempt::new(
            config,
            BenchmarkResult::new(100.0, "MB/s", ops),
            reasoning,
            "",
        )
    }

    fn history(n: usize) -> Vec<ConfigAttempt> {
        (0..n)
            .map(|i| {
                attempt(
                    &format!("write_buffer_size = {}\n", i),
                    1000.0 * (i + 1) as f64,
                    &format!("change #{}", i),
                )
            })
            .collect()
    }

    #[test]
    fn test_system_content_pins_version_policies_and_device() {
        for variant in [SystemVariant::Standard, SystemVariant::Midway] {
            let system = system_content(&ctx(), variant);
            assert!(system.contains("RocksDB Expert"));
            assert!(system.contains("rocksdb version 8.8.1"));
            assert!(system.contains("Direct IO will always be used"));
            assert!(system.contains("compression type is set to none always"));
            assert!(system.ends_with("The Device information is: 16 cores, NVMe SSD"));
        }
    }

    #[test]
    fn test_only_standard_variant_caps_changes() {
        assert!(system_content(&ctx(), SystemVariant::Standard).contains("only change 10 options"));
        assert!(!system_content(&ctx(), SystemVariant::Midway).contains("10 options"));
    }

    #[test]
    fn test_initial_prompt_is_single_turn() {
        let current = attempt("max_background_jobs = 2\n", 50000.0, "");
        let payload = initial_prompt(&ctx(), &current, None, 0.4);
        assert_eq!(payload.user_turns.len(), 1);
        assert_eq!(payload.temperature, 0.4);
        let turn = &payload.user_turns[0];
        assert!(turn.contains("```\nmax_background_jobs = 2\n```\n"));
        assert!(turn.contains("Operations per second: 50000."));
        assert!(turn.ends_with("Enclose the new options file in ```."));
    }

    #[test]
    fn test_iterative_turn_count_matches_history_length() {
        for n in 3..7 {
            let payload = iterative_prompt(&ctx(), &history(n), "chunk", None, 0.4).unwrap();
            assert_eq!(payload.user_turns.len(), n);
        }
    }

    #[test]
    fn test_iterative_skips_first_and_last_reasoning() {
        let history = history(4);
        let payload = iterative_prompt(&ctx(), &history, "write_buffer_size = 3", None, 0.4).unwrap();
        let all = payload.user_turns.join("\n");
        assert!(!all.contains("change #0"));
        assert!(all.contains("change #1"));
        assert!(all.contains("change #2"));
        assert!(!all.contains("change #3"));

        assert!(payload.user_turns[0].starts_with("The option file changes were:\n```\nchange #1\n```"));
        assert!(payload.user_turns[1].contains("Operations per second: 3000."));

        let current = &payload.user_turns[2];
        assert!(current.starts_with("Part of the current option file is:\n```\nwrite_buffer_size = 3\n```"));
        assert!(current.contains("Operations per second: 4000."));
        assert_eq!(payload.user_turns[3], GENERATE_INSTRUCTION);
    }

    #[test]
    fn test_iterative_short_history_has_no_interior() {
        for n in 1..3 {
            let payload = iterative_prompt(&ctx(), &history(n), "chunk", None, 0.4).unwrap();
            assert_eq!(payload.user_turns.len(), 2);
        }
    }

    #[test]
    fn test_iterative_reports_usage_on_every_result() {
        let usage = ResourceUsage::from_parts(Some(12.5), Some(800.0));
        let payload = iterative_prompt(&ctx(), &history(3), "chunk", usage, 0.4).unwrap();
        assert!(payload.user_turns[0].contains("CPU used: 12.50%"));
        assert!(payload.user_turns[1].contains("CPU used: 12.50%"));
    }

    #[test]
    fn test_empty_history_is_rejected() {
        assert_eq!(
            iterative_prompt(&ctx(), &[], "chunk", None, 0.4),
            Err(PromptError::EmptyHistory)
        );
        assert_eq!(
            midway_prompt(&ctx(), &[], "a = 1", 10.0, 0.4),
            Err(PromptError::EmptyHistory)
        );
    }

    #[test]
    fn test_midway_prompt_shows_previous_file_and_additions() {
        let history = vec![
            attempt("a = 0\n", 10.0, ""),
            attempt("a = 1\nb = 2\n", 42000.0, ""),
        ];
        let payload = midway_prompt(&ctx(), &history, "a = 1\nb = 3\nc = 4", 39000.0, 0.4).unwrap();
        assert_eq!(payload.user_turns.len(), 3);
        assert!(!payload.system.contains("10 options"));

        let previous = &payload.user_turns[0];
        assert!(previous.contains("```\na = 1\nb = 2\n```\n"));
        assert!(previous.contains("The throughput results for the above options file are: 42000."));

        let changes = &payload.user_turns[1];
        assert!(changes.starts_with("We then made the following changes to the options file:\n```\nb = 3\nc = 4\n```\n"));
        assert!(!changes.contains("b = 2"));
        assert!(changes.contains("The updated file has a throughput of: 39000."));

        assert!(payload.user_turns[2].contains("upto 100% of the CPU and Memory"));
    }
}
