// ABOUTME: Command implementations for the sqlite-xml CLI
// ABOUTME: Exports export, import and tables commands plus shared table selection flags

pub mod export;
pub mod import;
pub mod tables;

use anyhow::Result;
use clap::Args;
use crate::config::ConverterConfig;
use std::path::PathBuf;

/// Flags selecting which tables a command works on.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Only these tables (comma-separated); default is every table
    #[arg(long, value_delimiter = ',')]
    tables: Vec<String>,
    /// Skip these tables (comma-separated)
    #[arg(long, value_delimiter = ',')]
    exclude_tables: Vec<String>,
    /// Name of the document element
    #[arg(long)]
    root_tag: Option<String>,
    /// Path to a sqlite-xml.toml file with converter settings
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
}

impl SelectionArgs {
    /// Combine the config file (if any) with the flags; flags win.
    pub fn resolve(self, overrides: ConverterConfig) -> Result<ConverterConfig> {
        let base = match &self.config_path {
            Some(path) => ConverterConfig::load(path)?,
            None => ConverterConfig::default(),
        };

        let flags = ConverterConfig {
            root_tag: self.root_tag,
            tables: self.tables,
            exclude_tables: self.exclude_tables,
            ..Default::default()
        };

        Ok(base.merge(flags).merge(overrides))
    }
}
