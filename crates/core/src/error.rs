//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Expected business-rule violations raised while editing a catalog entry.
///
/// These are advisory failures surfaced to the operator for correction;
/// none of them is fatal and none is retried automatically. Clamping or
/// silently dropping quantities would falsify inventory, so every variant
/// carries enough context to correct the input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The proposed allocation would draw more than the declared stock pool.
    #[error("allocation of {attempted} exceeds stock of {allowed} ({current} already allocated)")]
    ExceedsStock {
        /// Projected total allocation after the change.
        attempted: u64,
        /// The product's declared stock.
        allowed: u64,
        /// Allocation before the change (excluding any entry being replaced).
        current: u64,
    },

    /// A second variant would land on an occupied identity key through a
    /// path that should have merged or replaced instead. Caller bug.
    #[error("variant already exists for {0}")]
    DuplicateVariantKey(String),

    /// The request matches an existing variant exactly; nothing to change.
    #[error("variant is unchanged; nothing to do")]
    DuplicateNoOp,

    /// Size-guide row collides with an existing row (case-insensitive).
    #[error("size guide already has a row for \"{0}\"")]
    DuplicateSize(String),

    /// Measurement field already declared (case-insensitive).
    #[error("measurement field \"{0}\" already declared")]
    DuplicateField(String),

    /// A required input was missing or blank.
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),
}

/// Conflicts detected outside the local session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConflictError {
    /// Authoritative re-validation at the store rejected a commit that
    /// passed locally: another session changed the product underneath us.
    /// Carries the server's error verbatim.
    #[error("commit rejected by store: {0}")]
    StaleCommit(String),
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// conflicts). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A business rule rejected the input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A cross-session conflict surfaced by the persistence gateway.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced entity was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// The edit session already committed; start a new session to edit further.
    #[error("edit session is closed")]
    SessionClosed,
}

impl DomainError {
    pub fn empty(field: &'static str) -> Self {
        Self::Validation(ValidationError::EmptyInput(field))
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn stale_commit(msg: impl Into<String>) -> Self {
        Self::Conflict(ConflictError::StaleCommit(msg.into()))
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// True for errors the operator can fix by editing their input,
    /// as opposed to conflicts caused by concurrent modification.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exceeds_stock_reports_figures() {
        let err = ValidationError::ExceedsStock {
            attempted: 11,
            allowed: 10,
            current: 6,
        };
        assert_eq!(
            err.to_string(),
            "allocation of 11 exceeds stock of 10 (6 already allocated)"
        );
    }

    #[test]
    fn validation_errors_are_distinguishable_from_conflicts() {
        let local = DomainError::from(ValidationError::DuplicateNoOp);
        let remote = DomainError::stale_commit("stock changed");
        assert!(local.is_validation());
        assert!(!remote.is_validation());
    }
}
