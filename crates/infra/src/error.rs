//! Service-level error model.

use thiserror::Error;

use stockledger_core::DomainError;

use crate::store::StoreError;

/// Result type of every ledger service call.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors surfaced by [`crate::service::InventoryService`].
///
/// Missing rows, products or bins are not errors; they come back as
/// `false`, `None` or zero-quantity results. Only the two cases below
/// abort a call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Persistence failure; fatal to the surrounding workflow.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The caller passed an unusable request (e.g. a non-positive quantity).
    #[error(transparent)]
    Domain(#[from] DomainError),
}

