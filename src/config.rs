//! Configuration for a tuning run.
//!
//! Configuration is read from environment variables (a `.env` file in the
//! working directory is loaded first, if present):
//! - `OPENROUTER_API_KEY` - Required. OpenRouter API key.
//! - `DEFAULT_MODEL` - Optional. Model used for generation. Defaults to `openai/gpt-4o`.
//! - `TEST_NAME` - Optional. db_bench workload. Defaults to `fillrandom`.
//! - `VERSION` - Optional. RocksDB version the options target. Defaults to `8.8.1`.
//! - `OUTPUT_PATH` - Optional. Run output folder. Defaults to a timestamped folder under `output/`.
//! - `NUM_ENTRIES` - Optional. Number of db_bench entries. Defaults to `30000000`.
//! - `SIDE_CHECKER` - Optional. Repair regressions with a midway generation. Defaults to `true`.
//! - `DB_BENCH_PATH` - Optional. db_bench binary. Defaults to `db_bench`.
//! - `DB_PATH` - Optional. Database directory. Defaults to `/tmp/dbtune/bench_db`.
//! - `DEFAULT_OPTIONS_FILE_DIR` - Optional. Directory holding the initial options files.
//! - `FIO_RESULT_PATH` - Optional. fio report appended to the device information.
//! - `DEVICE` - Optional. Free-text device description replacing the detected one.
//! - `ITERATIONS` - Optional. Number of generation rounds. Defaults to `10`.
//! - `TEMPERATURE` - Optional. Sampling temperature. Defaults to `0.4`.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::prompt::DEFAULT_TEMPERATURE;
use crate::util::{env_var_bool, output_folder_name};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Settings for one tuning run.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenRouter API key
    pub api_key: String,

    /// LLM model identifier (OpenRouter format)
    pub model: String,

    /// db_bench workload name
    pub test_name: String,

    /// Storage engine version the options files target
    pub engine_version: String,

    /// Folder receiving options files, history and logs
    pub output_path: PathBuf,

    /// Entries written/read per benchmark run
    pub num_entries: u64,

    /// Whether regressions trigger a midway generation
    pub side_checker: bool,

    pub db_bench_path: PathBuf,

    pub db_path: PathBuf,

    /// Directory holding `dbbench_default_options-<version>.ini`
    pub default_options_dir: PathBuf,

    pub fio_result_path: Option<PathBuf>,

    /// Device description overriding the detected one
    pub device: Option<String>,

    /// Number of generation rounds after the baseline
    pub iterations: usize,

    pub temperature: f64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENROUTER_API_KEY` is not set,
    /// and `ConfigError::InvalidValue` for unparseable numbers.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string()))?;

        let mut config = Self::new(api_key);

        if let Ok(model) = std::env::var("DEFAULT_MODEL") {
            config.model = model;
        }
        if let Ok(test_name) = std::env::var("TEST_NAME") {
            config.test_name = test_name;
        }
        if let Ok(version) = std::env::var("VERSION") {
            config.engine_version = version;
        }
        config.output_path = std::env::var("OUTPUT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                PathBuf::from("output").join(output_folder_name(&config.test_name, chrono::Local::now()))
            });
        config.num_entries = parse_env("NUM_ENTRIES", config.num_entries)?;
        config.side_checker = env_var_bool("SIDE_CHECKER", config.side_checker);
        if let Ok(path) = std::env::var("DB_BENCH_PATH") {
            config.db_bench_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("DEFAULT_OPTIONS_FILE_DIR") {
            config.default_options_dir = PathBuf::from(dir);
        }
        config.fio_result_path = std::env::var("FIO_RESULT_PATH").ok().map(PathBuf::from);
        config.device = std::env::var("DEVICE").ok().filter(|d| !d.trim().is_empty());
        config.iterations = parse_env("ITERATIONS", config.iterations)?;
        config.temperature = parse_env("TEMPERATURE", config.temperature)?;

        Ok(config)
    }

    /// Configuration with defaults for everything but the API key.
    pub fn new(api_key: String) -> Self {
        let test_name = "fillrandom".to_string();
        Self {
            api_key,
            model: "openai/gpt-4o".to_string(),
            output_path: PathBuf::from("output").join(format!("output_{}", test_name)),
            test_name,
            engine_version: "8.8.1".to_string(),
            num_entries: 30_000_000,
            side_checker: true,
            db_bench_path: PathBuf::from("db_bench"),
            db_path: PathBuf::from("/tmp/dbtune/bench_db"),
            default_options_dir: PathBuf::from("options_files/default_options_files"),
            fio_result_path: None,
            device: None,
            iterations: 10,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Initial options file for the configured engine version.
    pub fn initial_options_path(&self) -> PathBuf {
        self.default_options_dir
            .join(format!("dbbench_default_options-{}.ini", self.engine_version))
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new("key".to_string());
        assert_eq!(config.test_name, "fillrandom");
        assert_eq!(config.engine_version, "8.8.1");
        assert_eq!(config.num_entries, 30_000_000);
        assert!(config.side_checker);
        assert_eq!(config.temperature, 0.4);
        assert_eq!(
            config.initial_options_path(),
            PathBuf::from("options_files/default_options_files/dbbench_default_options-8.8.1.ini")
        );
    }

    #[test]
    fn test_parse_env_reports_invalid_values() {
        std::env::set_var("DBTUNE_TEST_BAD_NUMBER", "many");
        let err = parse_env::<u64>("DBTUNE_TEST_BAD_NUMBER", 1).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "DBTUNE_TEST_BAD_NUMBER"));

        std::env::set_var("DBTUNE_TEST_GOOD_NUMBER", " 25 ");
        assert_eq!(parse_env::<usize>("DBTUNE_TEST_GOOD_NUMBER", 1).unwrap(), 25);
        assert_eq!(parse_env::<f64>("DBTUNE_TEST_UNSET_NUMBER", 0.4).unwrap(), 0.4);
    }
}
