// ABOUTME: Optional TOML configuration describing a converter
// ABOUTME: Selects tables, root element, replace strategy and identifier column

use crate::converter::Converter;
use crate::database::Database;
use crate::strategy::ReplaceStrategy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Converter settings read from a file such as `sqlite-xml.toml`:
///
/// ```toml
/// root_tag = "database"
/// tables = ["users", "posts"]
/// exclude_tables = ["audit_log"]
/// replace_strategy = "replace-none"
/// id_column = "_id"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    pub root_tag: Option<String>,
    pub tables: Vec<String>,
    pub exclude_tables: Vec<String>,
    pub replace_strategy: Option<ReplaceStrategy>,
    pub id_column: Option<String>,
}

impl ConverterConfig {
    /// Parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: ConverterConfig = toml::from_str(content)?;
        tracing::debug!("Loaded converter config: {:?}", config);
        Ok(config)
    }

    /// Overlay values given on the command line. Non-empty lists and `Some`
    /// values replace what the file says.
    pub fn merge(mut self, other: ConverterConfig) -> Self {
        if other.root_tag.is_some() {
            self.root_tag = other.root_tag;
        }
        if !other.tables.is_empty() {
            self.tables = other.tables;
        }
        if !other.exclude_tables.is_empty() {
            self.exclude_tables = other.exclude_tables;
        }
        if other.replace_strategy.is_some() {
            self.replace_strategy = other.replace_strategy;
        }
        if other.id_column.is_some() {
            self.id_column = other.id_column;
        }
        self
    }

    /// Build a converter for `db`.
    ///
    /// With exclusions but no explicit tables, all tables are discovered
    /// first so the exclusions have something to remove from.
    pub fn build<D: Database + ?Sized>(&self, db: &D) -> Result<Converter> {
        let mut converter = Converter::new(
            self.root_tag
                .as_deref()
                .unwrap_or(crate::format::DEFAULT_ROOT_TAG),
        )
        .with_replace_strategy(self.replace_strategy.unwrap_or_default());

        if let Some(id_column) = &self.id_column {
            converter = converter.with_id_column(id_column.as_str());
        }

        for table in &self.tables {
            converter.add_table(table.as_str());
        }

        if !self.exclude_tables.is_empty() {
            if self.tables.is_empty() {
                converter
                    .discover_tables(db)
                    .context("Failed to discover tables")?;
            }
            for table in &self.exclude_tables {
                converter.remove_table(table);
            }
        }

        Ok(converter)
    }
}
