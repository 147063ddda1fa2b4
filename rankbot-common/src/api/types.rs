//! Shared request/outcome types for the promotion endpoint
//!
//! The wire request is deliberately lenient: upstream game servers send
//! `userId` and `xp` as numbers or numeric strings, and may omit fields
//! entirely. Everything is captured as raw JSON here and validated by the
//! pipeline in a fixed order (authenticate, load-gate, validate).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tiers::Rank;

/// Inbound progression update
///
/// # Examples
///
/// ```
/// use rankbot_common::api::types::PromotionRequest;
///
/// let request: PromotionRequest = serde_json::from_str(
///     r#"{"userId": 42, "xp": 20, "loaded": true, "secret": "s3cret"}"#,
/// ).unwrap();
/// assert!(request.is_loaded());
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PromotionRequest {
    #[serde(rename = "userId", default)]
    pub user_id: Value,

    #[serde(default)]
    pub xp: Value,

    /// Only the JSON boolean `true` counts as loaded
    #[serde(default)]
    pub loaded: Value,

    #[serde(default)]
    pub secret: Option<String>,
}

impl PromotionRequest {
    pub fn is_loaded(&self) -> bool {
        self.loaded == Value::Bool(true)
    }

    /// Validated user id: a positive integer
    pub fn parsed_user_id(&self) -> Option<u64> {
        let n = numeric(&self.user_id)?;
        if n.is_finite() && n > 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64 {
            Some(n as u64)
        } else {
            None
        }
    }

    /// Validated XP: a finite, non-negative number
    pub fn parsed_xp(&self) -> Option<f64> {
        let n = numeric(&self.xp)?;
        if n.is_finite() && n >= 0.0 {
            Some(n)
        } else {
            None
        }
    }
}

/// Read a JSON number or numeric string
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}

/// Why a request completed without a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Caller's XP was not authoritative yet
    NotLoaded,
    /// User owns the group and is never modified
    GroupOwner,
    /// User already holds the target role
    AlreadyCorrect,
}

/// Failure categories surfaced to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    Unauthorized,
    BadInput,
    /// Resolved rank has no role in the group
    RoleNotFound,
    /// A read from the group API failed
    UpstreamUnavailable,
    /// The membership write failed or exhausted its retries
    UpstreamError,
    InternalError,
}

impl ErrorKind {
    /// HTTP status code for this failure
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::Unauthorized => 401,
            ErrorKind::BadInput | ErrorKind::RoleNotFound => 400,
            ErrorKind::UpstreamUnavailable
            | ErrorKind::UpstreamError
            | ErrorKind::InternalError => 500,
        }
    }
}

/// Result of one pass through the promotion pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum PromotionOutcome {
    Applied {
        rank: Rank,
    },
    Skipped {
        reason: SkipReason,
        rank: Option<Rank>,
    },
    Failed {
        kind: ErrorKind,
        detail: String,
        /// Target rank when it was resolved before the failure; best-effort,
        /// always `None` for `InternalError`
        rank: Option<Rank>,
    },
}

impl PromotionOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        PromotionOutcome::Skipped { reason, rank: None }
    }

    pub fn failed(kind: ErrorKind, detail: impl Into<String>) -> Self {
        PromotionOutcome::Failed {
            kind,
            detail: detail.into(),
            rank: None,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            PromotionOutcome::Applied { .. } | PromotionOutcome::Skipped { .. } => 200,
            PromotionOutcome::Failed { kind, .. } => kind.status_code(),
        }
    }

    /// Caller-facing JSON body
    pub fn to_response(&self) -> PromotionResponse {
        match self {
            PromotionOutcome::Applied { rank } => PromotionResponse {
                success: true,
                rank: Some(*rank),
                ..Default::default()
            },
            PromotionOutcome::Skipped { reason, rank } => PromotionResponse {
                success: true,
                skipped: Some(true),
                reason: Some(*reason),
                rank: *rank,
                ..Default::default()
            },
            PromotionOutcome::Failed { kind, detail, rank } => PromotionResponse {
                success: false,
                error: Some(*kind),
                details: Some(detail.clone()),
                rank: *rank,
                ..Default::default()
            },
        }
    }
}

/// JSON body returned by the promotion endpoint
///
/// Shape is kept compatible with existing in-game callers which check
/// `success` and `skipped`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromotionResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<Rank>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
