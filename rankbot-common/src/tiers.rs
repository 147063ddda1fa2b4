//! XP tier table
//!
//! Maps a progression score to a group rank number. Tiers are evaluated by
//! inclusion: the last tier whose threshold is `<= xp` wins, so an XP value
//! exactly on a threshold selects that tier.
//!
//! Rank numbers are Roblox role ranks (0-255), not role ids. They are not
//! required to be contiguous; the default table skips rank 6.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Group rank number (0-255)
pub type Rank = u8;

/// Default ceiling for automated promotions
///
/// Ranks above this are managed by hand and never assigned by the bridge.
pub const DEFAULT_MAX_MANAGED_RANK: Rank = 10;

/// A single XP threshold and the rank it grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// Minimum XP (inclusive)
    pub xp: u64,
    /// Rank granted at or above `xp`
    pub rank: Rank,
}

impl Tier {
    pub const fn new(xp: u64, rank: Rank) -> Self {
        Self { xp, rank }
    }
}

/// Built-in progression table
pub const DEFAULT_TIERS: [Tier; 9] = [
    Tier::new(0, 1),  // Cadet
    Tier::new(3, 2),  // Trooper
    Tier::new(6, 3),  // Specialist
    Tier::new(12, 4), // Corporal
    Tier::new(18, 5), // Sergeant
    Tier::new(28, 7), // Staff Sergeant
    Tier::new(35, 8), // Master Sergeant
    Tier::new(50, 9), // Sergeant Major
    Tier::new(75, 10), // Warrant Officer
];

/// Validated, ordered tier table with a managed-rank ceiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierTable {
    tiers: Vec<Tier>,
    max_managed_rank: Rank,
}

impl TierTable {
    /// Build a table, rejecting empty tables, non-increasing thresholds and
    /// duplicate ranks.
    pub fn new(tiers: Vec<Tier>, max_managed_rank: Rank) -> Result<Self> {
        if tiers.is_empty() {
            return Err(Error::InvalidTierTable("table has no tiers".to_string()));
        }

        for pair in tiers.windows(2) {
            if pair[1].xp <= pair[0].xp {
                return Err(Error::InvalidTierTable(format!(
                    "thresholds must be strictly increasing ({} followed by {})",
                    pair[0].xp, pair[1].xp
                )));
            }
        }

        let mut seen = HashSet::new();
        for tier in &tiers {
            if !seen.insert(tier.rank) {
                return Err(Error::InvalidTierTable(format!(
                    "rank {} appears in more than one tier",
                    tier.rank
                )));
            }
        }

        Ok(Self {
            tiers,
            max_managed_rank,
        })
    }

    /// Tiers in ascending threshold order
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn max_managed_rank(&self) -> Rank {
        self.max_managed_rank
    }

    /// Rank of the first (lowest) tier
    pub fn lowest_rank(&self) -> Rank {
        self.tiers[0].rank
    }

    /// Resolve an XP value to its rank, capped at the managed ceiling.
    ///
    /// Callers validate `xp` beforehand; a negative or NaN value never
    /// passes a threshold and therefore resolves to the lowest rank.
    pub fn resolve_rank(&self, xp: f64) -> Rank {
        let mut rank = self.lowest_rank();
        for tier in &self.tiers {
            if xp >= tier.xp as f64 {
                rank = tier.rank;
            }
        }
        rank.min(self.max_managed_rank)
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            tiers: DEFAULT_TIERS.to_vec(),
            max_managed_rank: DEFAULT_MAX_MANAGED_RANK,
        }
    }
}
