//! dbtune - tuning loop entry point
//!
//! Benchmarks the default options file, then lets the LLM iterate on it.

use std::sync::{Arc, Mutex};

use anyhow::Context;
use dbtune::{
    benchmark::DbBench,
    config::Config,
    device,
    llm::{ChatOptionsLlm, OpenRouterClient},
    options::{read_options_file, IniCleaner},
    prompt::PromptContext,
    OptionsGenerator, Tuner, TunerSettings,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; variables may come from the environment.
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    tokio::fs::create_dir_all(&config.output_path)
        .await
        .with_context(|| format!("creating {}", config.output_path.display()))?;

    let log_file = std::fs::File::create(config.output_path.join("log.txt"))?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbtune=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    info!(
        "Using output folder {} (model={}, workload={}, version={})",
        config.output_path.display(),
        config.model,
        config.test_name,
        config.engine_version
    );

    let device_info = device::describe(
        config.device.as_deref(),
        config.fio_result_path.as_deref(),
    )
    .await;
    info!("Device information:\n{}", device_info);

    let initial_path = config.initial_options_path();
    let initial_options = read_options_file(&initial_path)
        .await
        .with_context(|| format!("reading initial options file {}", initial_path.display()))?;

    let client = Arc::new(OpenRouterClient::new(config.api_key.clone()));
    let llm = Arc::new(ChatOptionsLlm::new(client, config.model.clone()));
    let generator = OptionsGenerator::new(
        llm,
        Arc::new(IniCleaner),
        PromptContext::new(&config.engine_version, device_info, &config.test_name),
    );
    let bench = Arc::new(DbBench::new(
        &config.db_bench_path,
        &config.db_path,
        &config.test_name,
        config.num_entries,
    ));

    let tuner = Tuner::new(
        generator,
        bench,
        TunerSettings {
            output_dir: config.output_path.clone(),
            iterations: config.iterations,
            side_checker: config.side_checker,
            temperature: config.temperature,
        },
    );

    let report = tuner.run(&initial_options).await?;
    let best = report.best();
    info!(
        "Best options file: {} with {} ops/sec ({} {})",
        best.metadata, best.benchmark.ops_per_sec, best.benchmark.data_speed, best.benchmark.data_speed_unit
    );

    Ok(())
}
