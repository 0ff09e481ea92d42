//! Options-file cleanup and persistence.

use std::path::Path;

/// Turns an options block extracted from an LLM answer into on-disk form.
pub trait OptionsCleaner: Send + Sync {
    fn cleanup(&self, raw: &str) -> String;
}

/// Whitespace normaliser for INI-style options files.
#[derive(Debug, Clone, Copy, Default)]
pub struct IniCleaner;

impl OptionsCleaner for IniCleaner {
    fn cleanup(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut pending_blank = false;

        for line in raw.lines().map(str::trim_end) {
            if line.is_empty() {
                // Leading blanks are dropped, inner runs collapse to one.
                pending_blank = !out.is_empty();
                continue;
            }
            if pending_blank {
                out.push('\n');
                pending_blank = false;
            }
            out.push_str(line);
            out.push('\n');
        }

        out
    }
}

pub async fn read_options_file(path: &Path) -> std::io::Result<String> {
    tokio::fs::read_to_string(path).await
}

/// Write an options file, creating parent directories as needed.
pub async fn write_options_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await
}
