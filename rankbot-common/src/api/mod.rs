//! API module for the inbound promotion endpoint
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared request/outcome types
//!
//! The service crate wraps these with axum handlers.

pub mod auth;
pub mod types;

pub use auth::{validate_secret, ApiAuthError};
pub use types::{ErrorKind, PromotionOutcome, PromotionRequest, PromotionResponse, SkipReason};
