use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use crate::log::LogFetcher;
use crate::ui::ViewConfig;
use crate::worker::WorkerConfig;

pub const DEFAULT_CONFIG_PATH: &str = ".logscope.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub worker: WorkerSection,
    #[serde(default)]
    pub view: ViewSection,

    // Runtime only
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Direct fetcher used by `--headless`, plus the network read timeout
/// shared with the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub chunk_size: usize,
    pub batch_size: usize,
    pub read_timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let fetcher = LogFetcher::default();
        Self {
            chunk_size: fetcher.chunk_size(),
            batch_size: fetcher.batch_size(),
            read_timeout_ms: fetcher.read_timeout().as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSection {
    pub chunk_size: usize,
    pub parse_batch_size: usize,
    pub batch_size: usize,
    pub flush_interval_ms: u64,
}

impl Default for WorkerSection {
    fn default() -> Self {
        let worker = WorkerConfig::default();
        Self {
            chunk_size: worker.chunk_size,
            parse_batch_size: worker.parse_batch_size,
            batch_size: worker.batch_size,
            flush_interval_ms: worker.flush_interval.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSection {
    pub row_height: u32,
    pub overscan: usize,
    pub expanded_line_height: u32,
    pub expanded_padding: u32,
    pub histogram_height: u16,
}

impl Default for ViewSection {
    fn default() -> Self {
        let view = ViewConfig::default();
        Self {
            row_height: view.row_height,
            overscan: view.overscan,
            expanded_line_height: view.expanded_line_height,
            expanded_padding: view.expanded_padding,
            histogram_height: view.histogram_height,
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config '{}'", path.display()))?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Missing file means defaults; a file that exists must parse
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let sizes = [
            ("fetch.chunk_size", self.fetch.chunk_size),
            ("fetch.batch_size", self.fetch.batch_size),
            ("worker.chunk_size", self.worker.chunk_size),
            ("worker.parse_batch_size", self.worker.parse_batch_size),
            ("worker.batch_size", self.worker.batch_size),
        ];
        for (name, value) in sizes {
            if value == 0 {
                anyhow::bail!("{} must be greater than 0", name);
            }
        }

        if self.fetch.read_timeout_ms == 0 {
            anyhow::bail!("fetch.read_timeout_ms must be greater than 0");
        }
        if self.worker.flush_interval_ms == 0 {
            anyhow::bail!("worker.flush_interval_ms must be greater than 0");
        }
        if self.view.row_height == 0 {
            anyhow::bail!("view.row_height must be greater than 0");
        }

        if let Some(url) = &self.url {
            if url.trim().is_empty() {
                anyhow::bail!("url cannot be empty");
            }
        }

        Ok(())
    }

    pub fn fetcher(&self) -> LogFetcher {
        LogFetcher::new(self.fetch.chunk_size, self.fetch.batch_size)
            .with_read_timeout(self.read_timeout())
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            chunk_size: self.worker.chunk_size,
            parse_batch_size: self.worker.parse_batch_size,
            batch_size: self.worker.batch_size,
            flush_interval: Duration::from_millis(self.worker.flush_interval_ms),
            read_timeout: self.read_timeout(),
        }
    }

    fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch.read_timeout_ms)
    }

    pub fn view_config(&self) -> ViewConfig {
        ViewConfig {
            row_height: self.view.row_height,
            overscan: self.view.overscan,
            expanded_line_height: self.view.expanded_line_height,
            expanded_padding: self.view.expanded_padding,
            histogram_height: self.view.histogram_height,
        }
    }
}
