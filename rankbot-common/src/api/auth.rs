//! Shared-secret authentication for inbound progression updates
//!
//! Callers embed the secret in the request body. An empty configured secret
//! means the bridge was started without one; every request is rejected
//! rather than accepting an empty secret from the caller.
//!
//! # Pure Functions
//!
//! No HTTP framework dependencies here; the pipeline maps errors to outcomes.

// ========================================
// Error Types
// ========================================

/// Authentication error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiAuthError {
    /// Bridge has no shared secret configured
    SecretNotConfigured,

    /// Request carried no secret
    MissingSecret,

    /// Secret does not match
    InvalidSecret,
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::SecretNotConfigured => write!(f, "Shared secret not configured"),
            ApiAuthError::MissingSecret => write!(f, "Missing secret"),
            ApiAuthError::InvalidSecret => write!(f, "Invalid secret"),
        }
    }
}

impl std::error::Error for ApiAuthError {}

// ========================================
// Validation
// ========================================

/// Check a caller-supplied secret against the configured one
pub fn validate_secret(provided: Option<&str>, configured: &str) -> Result<(), ApiAuthError> {
    if configured.is_empty() {
        return Err(ApiAuthError::SecretNotConfigured);
    }
    let provided = provided.ok_or(ApiAuthError::MissingSecret)?;

    if constant_time_eq(provided.as_bytes(), configured.as_bytes()) {
        Ok(())
    } else {
        Err(ApiAuthError::InvalidSecret)
    }
}

/// Byte comparison whose running time does not depend on where the inputs
/// first differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ========================================
// Tests
// ========================================
