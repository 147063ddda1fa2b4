//! # rankbot Common Library
//!
//! Shared code for the XP rank bridge:
//! - XP tier table and rank resolution
//! - Tier file loading
//! - Promotion request/outcome types
//! - Shared-secret authentication

pub mod api;
pub mod config;
pub mod error;
pub mod tiers;

pub use error::{Error, Result};
pub use tiers::{Rank, Tier, TierTable};
