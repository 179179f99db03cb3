//! Inventory ledger service.
//!
//! [`InventoryService`] is the only writer of ledger rows and the log. Every
//! mutating call validates its quantity, applies additive or bounded deltas
//! through the [`InventoryStore`] port, and appends one audit entry built from
//! the before/after rows the store reports. Nothing is derived from an earlier
//! read of the row being written.
//!
//! Soft no-ops (missing row, nothing to move) come back as `false`, `None` or
//! a zero quantity and are logged at `warn`; only storage failures and
//! invalid requests surface as [`LedgerError`](crate::error::LedgerError).

mod audit;
mod availability;
mod capacity;
mod movement;
mod reservation;

pub use capacity::{OverflowRequest, ReplenishRequest, ReplenishResult, TransferRequest};
pub use movement::{AdjustRequest, PickRequest, ReceiveRequest, ShipmentRequest};
pub use reservation::{ReleaseRequest, ReserveRequest};

use serde::{Deserialize, Serialize};

use stockledger_core::UserId;

use crate::config::LedgerConfig;
use crate::store::InventoryStore;

/// Who performed a call, and which bulk operation it belongs to.
///
/// Copied verbatim onto the log entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Option<UserId>,
    pub batch_id: Option<String>,
}

impl Actor {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            batch_id: None,
        }
    }

    pub fn in_batch(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }
}

/// Stock movement and query facade over an [`InventoryStore`].
#[derive(Debug, Clone)]
pub struct InventoryService<S> {
    store: S,
    config: LedgerConfig,
}

impl<S: InventoryStore> InventoryService<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    pub fn with_config(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}
