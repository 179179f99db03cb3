use std::sync::Arc;

use thiserror::Error;

use stockledger_core::{LocationId, ProductId, VariantId};
use stockledger_inventory::{
    InventoryLevel, InventoryTransaction, LevelChange, LevelMutation, LevelTransfer,
    PendingTransaction, Product, ProductVariant, TransferOutcome, WarehouseLocation,
};

use super::query::{Pagination, TransactionFilter, TransactionPage};

/// Persistence failure.
///
/// These are the only fatal errors in the ledger: missing rows are modelled
/// as `Option`s, not errors. Nothing here is retried by the core.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// I/O, connectivity, pool exhaustion, lock poisoning.
    #[error("storage backend failure in {operation}: {message}")]
    Backend { operation: String, message: String },

    /// A stored row could not be decoded.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn backend(operation: &str, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

/// Stock ledger rows.
///
/// Implementations must evaluate every [`LevelMutation::Delta`] (bounded
/// forms included) against the row value at write time, atomically, and
/// treat [`LevelMutation::Create`] as insert-or-add. Callers never derive a
/// delta from an earlier [`LevelStore::level`] read; they read what moved off
/// the returned [`LevelChange`].
#[async_trait::async_trait]
pub trait LevelStore: Send + Sync {
    async fn level(
        &self,
        variant_id: VariantId,
        location_id: LocationId,
    ) -> Result<Option<InventoryLevel>, StoreError>;

    /// Every row holding a variant, across all locations.
    async fn levels_for_variant(
        &self,
        variant_id: VariantId,
    ) -> Result<Vec<InventoryLevel>, StoreError>;

    /// Every row stored at a location.
    async fn levels_at_location(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<InventoryLevel>, StoreError>;

    /// Apply one mutation and return the row as it stood immediately before
    /// and after the write. A freshly created row reports an all-zero
    /// `before`.
    ///
    /// Returns `Ok(None)` when a `Delta` targets a row that does not exist;
    /// nothing is written in that case.
    async fn apply(&self, mutation: LevelMutation) -> Result<Option<LevelChange>, StoreError>;

    /// Debit the source row by at most `max_units` of on-hand stock and
    /// credit the target (insert-or-add) by exactly the debited amount, all
    /// or nothing.
    ///
    /// Returns `Ok(None)`, writing nothing, when the source row is missing
    /// or holds no positive on-hand stock. A backend failure on either
    /// write leaves both rows untouched.
    async fn transfer(&self, transfer: LevelTransfer) -> Result<Option<TransferOutcome>, StoreError>;
}

/// Append-only movement log.
#[async_trait::async_trait]
pub trait TransactionLog: Send + Sync {
    /// Append an entry, assigning id, sequence number and timestamp.
    async fn append(&self, entry: PendingTransaction) -> Result<InventoryTransaction, StoreError>;

    /// Filtered, paginated read ordered by sequence number (ascending).
    async fn query(
        &self,
        filter: TransactionFilter,
        pagination: Pagination,
    ) -> Result<TransactionPage, StoreError>;
}

/// Warehouse location configuration (read-only to the ledger).
#[async_trait::async_trait]
pub trait LocationStore: Send + Sync {
    async fn location(&self, id: LocationId) -> Result<Option<WarehouseLocation>, StoreError>;

    /// All locations in a stable order (configuration order).
    async fn list_locations(&self) -> Result<Vec<WarehouseLocation>, StoreError>;
}

/// Product catalog (read-only to the ledger).
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn variant(&self, id: VariantId) -> Result<Option<ProductVariant>, StoreError>;

    /// Variants of a product, smallest pack first.
    async fn variants_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductVariant>, StoreError>;
}

/// Everything the ledger service needs from storage.
pub trait InventoryStore: LevelStore + TransactionLog + LocationStore + CatalogStore {}

impl<S> InventoryStore for S where S: LevelStore + TransactionLog + LocationStore + CatalogStore {}

#[async_trait::async_trait]
impl<S> LevelStore for Arc<S>
where
    S: LevelStore + ?Sized,
{
    async fn level(
        &self,
        variant_id: VariantId,
        location_id: LocationId,
    ) -> Result<Option<InventoryLevel>, StoreError> {
        (**self).level(variant_id, location_id).await
    }

    async fn levels_for_variant(
        &self,
        variant_id: VariantId,
    ) -> Result<Vec<InventoryLevel>, StoreError> {
        (**self).levels_for_variant(variant_id).await
    }

    async fn levels_at_location(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<InventoryLevel>, StoreError> {
        (**self).levels_at_location(location_id).await
    }

    async fn apply(&self, mutation: LevelMutation) -> Result<Option<LevelChange>, StoreError> {
        (**self).apply(mutation).await
    }

    async fn transfer(&self, transfer: LevelTransfer) -> Result<Option<TransferOutcome>, StoreError> {
        (**self).transfer(transfer).await
    }
}

#[async_trait::async_trait]
impl<S> TransactionLog for Arc<S>
where
    S: TransactionLog + ?Sized,
{
    async fn append(&self, entry: PendingTransaction) -> Result<InventoryTransaction, StoreError> {
        (**self).append(entry).await
    }

    async fn query(
        &self,
        filter: TransactionFilter,
        pagination: Pagination,
    ) -> Result<TransactionPage, StoreError> {
        (**self).query(filter, pagination).await
    }
}

#[async_trait::async_trait]
impl<S> LocationStore for Arc<S>
where
    S: LocationStore + ?Sized,
{
    async fn location(&self, id: LocationId) -> Result<Option<WarehouseLocation>, StoreError> {
        (**self).location(id).await
    }

    async fn list_locations(&self) -> Result<Vec<WarehouseLocation>, StoreError> {
        (**self).list_locations().await
    }
}

#[async_trait::async_trait]
impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).product(id).await
    }

    async fn variant(&self, id: VariantId) -> Result<Option<ProductVariant>, StoreError> {
        (**self).variant(id).await
    }

    async fn variants_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductVariant>, StoreError> {
        (**self).variants_for_product(product_id).await
    }
}
