use anyhow::{anyhow, Context};
use clap::Parser;
use std::path::{Path, PathBuf};

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::log::LogSource;

/// Logscope - streaming NDJSON log viewer
#[derive(Parser, Debug)]
#[command(name = "logscope")]
#[command(version)]
#[command(about = "Streaming NDJSON log viewer")]
#[command(long_about = "Logscope streams newline-delimited JSON logs from a URL or a local file
and shows them in a scrollable table with a per-day histogram.

Records appear while the stream is still downloading. Each line becomes one
record; its time comes from the `_time` field, or the moment it was read when
that field is missing.

Quick start:
  1. Run 'logscope --init' to generate a config file (optional)
  2. Run 'logscope https://example.com/logs.ndjson' or 'logscope app.ndjson'
  3. Use j/k to move, Enter to expand a record, q to quit")]
pub struct Cli {
    /// URL or file path of the NDJSON stream (overrides the config file's `url`)
    pub url: Option<String>,

    /// Path to config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Initialize a new config file with default settings
    #[arg(long)]
    pub init: bool,

    /// Stream without the TUI, printing each record as a JSON line
    #[arg(long)]
    pub headless: bool,

    /// Write diagnostic logs to this file (overrides the config file's `log_file`)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// The stream to open: the positional argument wins over the config
    pub fn source(&self, config: &Config) -> anyhow::Result<LogSource> {
        self.url
            .as_deref()
            .or(config.url.as_deref())
            .map(LogSource::parse)
            .ok_or_else(|| {
                anyhow!(
                    "No log source given.\n\n\
                    Pass a URL or file path: logscope https://example.com/logs.ndjson\n\
                    Or set `url` in {}",
                    self.config
                )
            })
    }

    pub fn log_file(&self, config: &Config) -> Option<PathBuf> {
        self.log_file.clone().or_else(|| config.log_file.clone())
    }
}

/// Write a config file holding every default, leaving an existing file untouched
pub fn init_config(config_path: &str) -> anyhow::Result<()> {
    if Path::new(config_path).exists() {
        println!("Config file '{}' already exists.", config_path);
        return Ok(());
    }

    let config = Config::default();
    config
        .save(config_path)
        .with_context(|| format!("Failed to write config to '{}'", config_path))?;

    use std::fs::OpenOptions;
    use std::io::Write;
    let mut file = OpenOptions::new()
        .append(true)
        .open(config_path)
        .with_context(|| format!("Failed to append to '{}'", config_path))?;
    writeln!(file, "\n# Default log source, used when none is given on the command line")?;
    writeln!(file, "# url = \"https://example.com/logs.ndjson\"")?;

    println!("Created {}", config_path);
    println!("\nNext steps:");
    println!("  1. Set `url` in {} or pass one on the command line", config_path);
    println!("  2. Run 'logscope' to start the viewer");

    Ok(())
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
