//! Process statistics for a single PID, backed by `sysinfo`.

use std::time::Duration;

use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};

use super::{ProbeError, ProcessProbe};

/// Reads CPU and memory figures for one process through `sysinfo`.
pub struct SysinfoProbe {
    pid: Pid,
    sys: System,
}

impl SysinfoProbe {
    pub fn new(pid: u32) -> Self {
        Self {
            pid: Pid::from_u32(pid),
            sys: System::new(),
        }
    }

    /// Refresh only the tracked process. Returns `false` when it is gone.
    fn refresh(&mut self) -> bool {
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::new().with_cpu().with_memory(),
        );
        self.sys.process(self.pid).is_some()
    }

    fn missing(&self) -> ProbeError {
        ProbeError::NoSuchProcess(self.pid.as_u32())
    }
}

impl ProcessProbe for SysinfoProbe {
    fn is_running(&mut self) -> Result<bool, ProbeError> {
        if !self.refresh() {
            return Ok(false);
        }
        Ok(self
            .sys
            .process(self.pid)
            .map(|p| !matches!(p.status(), ProcessStatus::Zombie | ProcessStatus::Dead))
            .unwrap_or(false))
    }

    fn cpu_percent(&mut self, interval: Duration) -> Result<f64, ProbeError> {
        // CPU usage is computed between two refreshes.
        if !self.refresh() {
            return Err(self.missing());
        }
        std::thread::sleep(interval);
        if !self.refresh() {
            return Err(self.missing());
        }
        self.sys
            .process(self.pid)
            .map(|p| p.cpu_usage() as f64)
            .ok_or_else(|| self.missing())
    }

    fn memory_rss_bytes(&mut self) -> Result<u64, ProbeError> {
        if !self.refresh() {
            return Err(self.missing());
        }
        self.sys
            .process(self.pid)
            .map(|p| p.memory())
            .ok_or_else(|| self.missing())
    }
}
