//! Tier file loading
//!
//! The progression table can be replaced at startup by a TOML file:
//!
//! ```toml
//! max_managed_rank = 10
//!
//! [[tiers]]
//! xp = 0
//! rank = 1
//!
//! [[tiers]]
//! xp = 3
//! rank = 2
//! ```
//!
//! A malformed file is an error; it is never silently replaced by the
//! built-in table.

use crate::tiers::{Rank, Tier, TierTable};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk tier file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TierFile {
    /// Overrides the command-line ceiling when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_managed_rank: Option<Rank>,

    #[serde(default)]
    pub tiers: Vec<Tier>,
}

impl TierFile {
    /// Convert into a validated table, falling back to `default_max_rank`
    /// when the file does not set a ceiling.
    pub fn into_table(self, default_max_rank: Rank) -> Result<TierTable> {
        let max_rank = self.max_managed_rank.unwrap_or(default_max_rank);
        TierTable::new(self.tiers, max_rank)
    }
}

/// Parse a tier table from TOML text
pub fn parse_tier_file(content: &str, default_max_rank: Rank) -> Result<TierTable> {
    let file: TierFile = toml::from_str(content)?;
    file.into_table(default_max_rank)
}

/// Load a tier table from a TOML file on disk
pub fn load_tier_file(path: &Path, default_max_rank: Rank) -> Result<TierTable> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read tier file {}: {}", path.display(), e))
    })?;

    let table = parse_tier_file(&content, default_max_rank)?;
    tracing::info!(
        path = %path.display(),
        tiers = table.tiers().len(),
        max_managed_rank = table.max_managed_rank(),
        "Loaded tier table"
    );
    Ok(table)
}

/// Resolve the tier table for startup: the file when given, otherwise the
/// built-in table with the configured ceiling.
pub fn resolve_tier_table(path: Option<&Path>, max_managed_rank: Rank) -> Result<TierTable> {
    match path {
        Some(path) => load_tier_file(path, max_managed_rank),
        None => TierTable::new(crate::tiers::DEFAULT_TIERS.to_vec(), max_managed_rank),
    }
}
