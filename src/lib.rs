//! # dbtune
//!
//! LLM-driven tuning of RocksDB options files.
//!
//! The library runs a single linear feedback loop: an LLM proposes an
//! options file, `db_bench` measures it while its CPU and memory are
//! sampled, and the result is folded into the next prompt.
//!
//! ## Architecture
//!
//! ```text
//!   ┌────────┐  prompt   ┌───────────────────┐  options   ┌───────────┐
//!   │ Tuner  │──────────►│  OptionsGenerator │◄──────────►│ OptionsLlm│
//!   └───┬────┘           └───────────────────┘            └───────────┘
//!       │ options file
//!       ▼
//!   ┌──────────────────┐   pid   ┌──────────────────┐
//!   │ BenchmarkRunner  │────────►│ ResourceSampler  │
//!   └──────────────────┘         └──────────────────┘
//! ```
//!
//! ## Modules
//! - `prompt`: prompt construction and the additions-only options diff
//! - `generator`: prompt → LLM → cleaned options file
//! - `monitor`: background CPU/memory sampling of the benchmark process
//! - `benchmark`: `db_bench` runner and result sentences
//! - `tuner`: the generate → benchmark → feed back loop

pub mod benchmark;
pub mod config;
pub mod device;
pub mod generator;
pub mod llm;
pub mod monitor;
pub mod options;
pub mod prompt;
pub mod tuner;
pub mod types;
pub mod util;

pub use config::Config;
pub use generator::{GenerationError, OptionsGenerator};
pub use tuner::{Tuner, TunerSettings, TuningReport};
pub use types::{BenchmarkResult, ConfigAttempt, GeneratedOptions, ResourceUsage};
