use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Error Taxonomy
// ============================================================================
//
// Every domain error maps onto one of these kinds. The string form is part
// of the public contract: front ends branch on it, so never rename a kind.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input
    Validation,
    /// Entity absent, or outside the caller's scope
    NotFound,
    /// Wrong actor or role for the requested edge
    Unauthorized,
    /// Right actor, wrong current state
    InvalidTransition,
    /// Lost an optimistic race, or a one-shot action already happened
    Conflict,
    /// A collaborator failed transiently
    UpstreamUnavailable,
    /// Broken internal state (corrupt history); never expected in practice
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::Conflict => "conflict",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
