//! Background resource sampling for a running benchmark process.
//!
//! A [`ResourceSampler`] polls a [`ProcessProbe`] roughly once per second on a
//! blocking worker until it is stopped or the process goes away. Failures
//! never reach the caller: they end sampling early and the averages are
//! computed over whatever was collected.

mod probe;

pub use probe::SysinfoProbe;

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::types::ResourceUsage;

/// Default CPU sampling window (one sample per second).
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Errors raised by a process probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("No such process: {0}")]
    NoSuchProcess(u32),

    #[error("Access denied to process {0}")]
    AccessDenied(u32),

    #[error("Process probe failed: {0}")]
    Other(String),
}

/// Live statistics of one external process.
pub trait ProcessProbe: Send + 'static {
    /// Whether the process is still alive.
    fn is_running(&mut self) -> Result<bool, ProbeError>;

    /// CPU usage in percent, measured over `interval`. Blocks for `interval`.
    fn cpu_percent(&mut self, interval: Duration) -> Result<f64, ProbeError>;

    /// Resident set size in bytes.
    fn memory_rss_bytes(&mut self) -> Result<u64, ProbeError>;
}

/// CPU and memory readings in sampling order.
#[derive(Debug, Clone, Default)]
pub struct SampleLog {
    pub cpu_percent: Vec<f64>,
    pub memory_mb: Vec<f64>,
}

impl SampleLog {
    pub fn len(&self) -> usize {
        self.cpu_percent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpu_percent.is_empty()
    }

    /// Arithmetic means; an empty log averages to zero.
    pub fn averages(&self) -> ResourceUsage {
        ResourceUsage::new(mean(&self.cpu_percent), mean(&self.memory_mb))
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Samples a process on a background worker between `start` and `stop`.
pub struct ResourceSampler<P: ProcessProbe> {
    probe: Option<P>,
    interval: Duration,
    cancel: CancellationToken,
    handle: Option<JoinHandle<SampleLog>>,
}

impl<P: ProcessProbe> ResourceSampler<P> {
    pub fn new(probe: P) -> Self {
        Self::with_interval(probe, DEFAULT_SAMPLE_INTERVAL)
    }

    pub fn with_interval(probe: P, interval: Duration) -> Self {
        Self {
            probe: Some(probe),
            interval,
            cancel: CancellationToken::new(),
            handle: None,
        }
    }

    /// Begin sampling. Returns immediately; calling it twice is a no-op.
    pub fn start(&mut self) {
        let Some(probe) = self.probe.take() else {
            return;
        };
        let interval = self.interval;
        let cancel = self.cancel.clone();
        self.handle = Some(tokio::task::spawn_blocking(move || {
            run_sampling(probe, interval, cancel)
        }));
    }

    /// Stop sampling, wait for the worker to exit, and return the averages.
    ///
    /// Returns zeros if sampling never started or collected nothing.
    pub async fn stop(&mut self) -> ResourceUsage {
        self.cancel.cancel();
        let Some(handle) = self.handle.take() else {
            return ResourceUsage::default();
        };
        match handle.await {
            Ok(log) => {
                tracing::debug!("Resource sampler collected {} samples", log.len());
                log.averages()
            }
            Err(e) => {
                tracing::error!("Resource sampler worker failed: {}", e);
                ResourceUsage::default()
            }
        }
    }
}

/// Worker body: collect samples until cancelled, the process exits, or the
/// probe fails. A panicking probe keeps the samples gathered so far.
fn run_sampling<P: ProcessProbe>(
    mut probe: P,
    interval: Duration,
    cancel: CancellationToken,
) -> SampleLog {
    let mut log = SampleLog::default();
    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        sample_until_done(&mut probe, interval, &cancel, &mut log)
    }));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(ProbeError::Other(msg))) => {
            tracing::warn!("Monitoring error: {}", msg);
        }
        Ok(Err(e)) => {
            tracing::debug!("Sampling ended early: {}", e);
        }
        Err(_) => {
            tracing::error!("Monitoring error: process probe panicked");
        }
    }
    log
}

fn sample_until_done<P: ProcessProbe>(
    probe: &mut P,
    interval: Duration,
    cancel: &CancellationToken,
    log: &mut SampleLog,
) -> Result<(), ProbeError> {
    while !cancel.is_cancelled() && probe.is_running()? {
        let cpu = probe.cpu_percent(interval)?;
        let rss = probe.memory_rss_bytes()?;
        log.cpu_percent.push(cpu);
        log.memory_mb.push(rss as f64 / BYTES_PER_MB);
    }
    Ok(())
}
