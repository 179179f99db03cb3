//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic, caller-caused failures.
///
/// Missing ledger rows are *not* errors (they surface as soft no-ops), and
/// storage faults live in the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A request carried an unusable value (e.g. a non-positive quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Reject zero and negative quantities for operations that move stock in
    /// one direction only.
    pub fn ensure_positive(field: &str, qty: i64) -> DomainResult<i64> {
        if qty > 0 {
            Ok(qty)
        } else {
            Err(Self::validation(format!("{field} must be positive (got {qty})")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_positive_accepts_positive_quantities() {
        assert_eq!(DomainError::ensure_positive("base_units", 7), Ok(7));
    }

    #[test]
    fn ensure_positive_rejects_zero_and_negative() {
        for qty in [0, -3] {
            match DomainError::ensure_positive("base_units", qty) {
                Err(DomainError::Validation(msg)) => assert!(msg.contains("base_units")),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }
}
