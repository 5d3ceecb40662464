// ABOUTME: Replace strategies deciding what happens when an imported row conflicts
// ABOUTME: Shared by the importer, the TOML config and the CLI

use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;

/// Determines how existing rows are handled when inserting a row read from
/// XML violates a constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplaceStrategy {
    /// All existing rows are deleted from a table before any of its rows are added.
    ReplaceAll,
    /// On conflict, delete the existing row with the same identifier and insert again.
    #[default]
    ReplaceExisting,
    /// On conflict, keep the existing row and drop the incoming one.
    ReplaceNone,
}

impl ReplaceStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplaceStrategy::ReplaceAll => "replace-all",
            ReplaceStrategy::ReplaceExisting => "replace-existing",
            ReplaceStrategy::ReplaceNone => "replace-none",
        }
    }
}

impl fmt::Display for ReplaceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
