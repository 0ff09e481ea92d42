//! Host description fed into the system prompt.

use std::path::Path;

use sysinfo::{Disks, System};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Describe the host: `override_text` (or detected hardware) followed by the
/// fio report at `fio_report`, when readable.
pub async fn describe(override_text: Option<&str>, fio_report: Option<&Path>) -> String {
    let mut description = match override_text {
        Some(text) => text.trim().to_string(),
        None => detect_hardware(),
    };

    if let Some(path) = fio_report {
        match tokio::fs::read_to_string(path).await {
            Ok(report) if !report.trim().is_empty() => {
                description.push_str("\nfio results for the storage device:\n");
                description.push_str(report.trim_end());
            }
            Ok(_) => tracing::warn!("fio report {} is empty", path.display()),
            Err(e) => tracing::warn!("Could not read fio report {}: {}", path.display(), e),
        }
    }

    description
}

/// Hardware summary from `sysinfo`.
pub fn detect_hardware() -> String {
    let mut sys = System::new();
    sys.refresh_cpu_all();
    sys.refresh_memory();

    let mut lines = Vec::new();
    lines.push(format!(
        "Host: {} ({})",
        System::host_name().unwrap_or_else(|| "unknown".to_string()),
        System::long_os_version().unwrap_or_else(|| "unknown OS".to_string())
    ));

    let brand = sys
        .cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| "unknown CPU".to_string());
    lines.push(format!("CPU: {} with {} logical cores", brand, sys.cpus().len()));
    lines.push(format!(
        "Memory: {:.1} GB total",
        sys.total_memory() as f64 / BYTES_PER_GB
    ));

    let disks = Disks::new_with_refreshed_list();
    for disk in disks.list() {
        lines.push(format!(
            "Disk {} mounted at {}: {:?}, {:.1} GB total, {:.1} GB available",
            disk.name().to_string_lossy(),
            disk.mount_point().display(),
            disk.kind(),
            disk.total_space() as f64 / BYTES_PER_GB,
            disk.available_space() as f64 / BYTES_PER_GB
        ));
    }

    lines.join("\n")
}
