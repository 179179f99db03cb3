use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, RwLock};

use chrono::Utc;

use stockledger_core::{LocationId, ProductId, TransactionId, VariantId};
use stockledger_inventory::{
    InventoryLevel, InventoryTransaction, LevelChange, LevelField, LevelKey, LevelMutation,
    LevelTransfer, PendingTransaction, Product, ProductVariant, TransferOutcome,
    WarehouseLocation,
};

use super::query::{Pagination, TransactionFilter, TransactionPage};
use super::r#trait::{CatalogStore, LevelStore, LocationStore, StoreError, TransactionLog};

/// In-memory implementation of every persistence port.
///
/// Intended for tests/dev. Each level mutation, bounded deltas included, is
/// evaluated under the write lock, so writes are atomic with respect to each
/// other. Transfers are staged on a copy and swapped in only when both
/// writes succeeded.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    levels: RwLock<BTreeMap<LevelKey, InventoryLevel>>,
    transactions: RwLock<Vec<InventoryTransaction>>,
    locations: RwLock<Vec<WarehouseLocation>>,
    products: RwLock<HashMap<ProductId, Product>>,
    variants: RwLock<HashMap<VariantId, ProductVariant>>,
    /// Remaining successful level writes before an injected failure.
    fail_after_writes: Mutex<Option<usize>>,
}

fn poisoned(operation: &str) -> StoreError {
    StoreError::backend(operation, "lock poisoned")
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        let mut products = self.products.write().map_err(|_| poisoned("insert_product"))?;
        products.insert(product.id, product);
        Ok(())
    }

    pub fn insert_variant(&self, variant: ProductVariant) -> Result<(), StoreError> {
        let mut variants = self.variants.write().map_err(|_| poisoned("insert_variant"))?;
        variants.insert(variant.id, variant);
        Ok(())
    }

    /// Add or replace a location, keeping configuration order for new ones.
    pub fn insert_location(&self, location: WarehouseLocation) -> Result<(), StoreError> {
        let mut locations = self.locations.write().map_err(|_| poisoned("insert_location"))?;
        match locations.iter_mut().find(|l| l.id == location.id) {
            Some(existing) => *existing = location,
            None => locations.push(location),
        }
        Ok(())
    }

    /// Put a row in place verbatim (fixture setup; bypasses the delta path).
    pub fn seed_level(&self, level: InventoryLevel) -> Result<(), StoreError> {
        let mut levels = self.levels.write().map_err(|_| poisoned("seed_level"))?;
        levels.insert(level.key(), level);
        Ok(())
    }

    /// Make the level write after the next `successful_writes` ones fail with
    /// a backend error. Used to exercise partial-failure paths.
    pub fn fail_level_write_after(&self, successful_writes: usize) {
        if let Ok(mut slot) = self.fail_after_writes.lock() {
            *slot = Some(successful_writes);
        }
    }

    /// Every log entry in append order.
    pub fn transactions(&self) -> Vec<InventoryTransaction> {
        self.transactions.read().map(|t| t.clone()).unwrap_or_default()
    }

    fn take_write_permit(&self) -> Result<(), StoreError> {
        let mut slot = self
            .fail_after_writes
            .lock()
            .map_err(|_| poisoned("level_write"))?;
        match slot.as_mut() {
            Some(0) => {
                *slot = None;
                Err(StoreError::backend("level_write", "injected failure"))
            }
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn apply_to(
        &self,
        levels: &mut BTreeMap<LevelKey, InventoryLevel>,
        mutation: LevelMutation,
    ) -> Result<Option<LevelChange>, StoreError> {
        match mutation {
            LevelMutation::Delta { key, deltas } => {
                let Some(row) = levels.get_mut(&key) else {
                    return Ok(None);
                };
                self.take_write_permit()?;
                let before = row.clone();
                for d in &deltas {
                    row.apply_delta(d);
                }
                row.updated_at = Utc::now();
                Ok(Some(LevelChange::new(before, row.clone())))
            }
            LevelMutation::Create(new_row) => {
                self.take_write_permit()?;
                let key = new_row.key();
                let before = levels
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| InventoryLevel::empty(key.variant_id, key.location_id));
                let row = levels
                    .entry(key)
                    .and_modify(|existing| existing.absorb(&new_row))
                    .or_insert_with(|| new_row.clone());
                row.updated_at = Utc::now();
                Ok(Some(LevelChange::new(before, row.clone())))
            }
        }
    }
}

#[async_trait::async_trait]
impl LevelStore for InMemoryStore {
    async fn level(
        &self,
        variant_id: VariantId,
        location_id: LocationId,
    ) -> Result<Option<InventoryLevel>, StoreError> {
        let levels = self.levels.read().map_err(|_| poisoned("level"))?;
        Ok(levels.get(&LevelKey::new(variant_id, location_id)).cloned())
    }

    async fn levels_for_variant(
        &self,
        variant_id: VariantId,
    ) -> Result<Vec<InventoryLevel>, StoreError> {
        let levels = self.levels.read().map_err(|_| poisoned("levels_for_variant"))?;
        Ok(levels
            .values()
            .filter(|l| l.variant_id == variant_id)
            .cloned()
            .collect())
    }

    async fn levels_at_location(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<InventoryLevel>, StoreError> {
        let levels = self.levels.read().map_err(|_| poisoned("levels_at_location"))?;
        Ok(levels
            .values()
            .filter(|l| l.location_id == location_id)
            .cloned()
            .collect())
    }

    async fn apply(&self, mutation: LevelMutation) -> Result<Option<LevelChange>, StoreError> {
        let mut levels = self.levels.write().map_err(|_| poisoned("apply"))?;
        self.apply_to(&mut levels, mutation)
    }

    async fn transfer(&self, transfer: LevelTransfer) -> Result<Option<TransferOutcome>, StoreError> {
        let mut levels = self.levels.write().map_err(|_| poisoned("transfer"))?;
        let source_key = transfer.source_key();
        let target_key = transfer.target_key();
        match levels.get(&source_key) {
            Some(row) if row.on_hand_base > 0 && transfer.max_units > 0 => {}
            _ => return Ok(None),
        }

        let mut staged = levels.clone();
        let debit = LevelMutation::delta(source_key, [transfer.debit()]);
        let Some(source) = self.apply_to(&mut staged, debit)? else {
            return Ok(None);
        };
        let moved = -source.moved(LevelField::OnHand);
        let credit = InventoryLevel::empty(target_key.variant_id, target_key.location_id)
            .with_on_hand(moved);
        let Some(target) = self.apply_to(&mut staged, LevelMutation::create(credit))? else {
            return Ok(None);
        };

        *levels = staged;
        Ok(Some(TransferOutcome {
            moved,
            source,
            target,
        }))
    }
}

#[async_trait::async_trait]
impl TransactionLog for InMemoryStore {
    async fn append(&self, entry: PendingTransaction) -> Result<InventoryTransaction, StoreError> {
        let mut log = self.transactions.write().map_err(|_| poisoned("append"))?;
        let next = log.last().map(|t| t.sequence_number).unwrap_or(0) + 1;
        let committed = entry.commit(TransactionId::new(), next, Utc::now());
        log.push(committed.clone());
        Ok(committed)
    }

    async fn query(
        &self,
        filter: TransactionFilter,
        pagination: Pagination,
    ) -> Result<TransactionPage, StoreError> {
        let log = self.transactions.read().map_err(|_| poisoned("query"))?;
        let matching: Vec<_> = log.iter().filter(|t| filter.matches(t)).collect();
        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .cloned()
            .collect();
        Ok(TransactionPage::new(page, total, pagination))
    }
}

#[async_trait::async_trait]
impl LocationStore for InMemoryStore {
    async fn location(&self, id: LocationId) -> Result<Option<WarehouseLocation>, StoreError> {
        let locations = self.locations.read().map_err(|_| poisoned("location"))?;
        Ok(locations.iter().find(|l| l.id == id).cloned())
    }

    async fn list_locations(&self) -> Result<Vec<WarehouseLocation>, StoreError> {
        let locations = self.locations.read().map_err(|_| poisoned("list_locations"))?;
        Ok(locations.clone())
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryStore {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().map_err(|_| poisoned("product"))?;
        Ok(products.get(&id).cloned())
    }

    async fn variant(&self, id: VariantId) -> Result<Option<ProductVariant>, StoreError> {
        let variants = self.variants.read().map_err(|_| poisoned("variant"))?;
        Ok(variants.get(&id).cloned())
    }

    async fn variants_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductVariant>, StoreError> {
        let variants = self.variants.read().map_err(|_| poisoned("variants_for_product"))?;
        let mut out: Vec<_> = variants
            .values()
            .filter(|v| v.product_id == product_id)
            .cloned()
            .collect();
        out.sort_by_key(|v| (v.hierarchy_level, v.units_per_variant));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockledger_inventory::{LevelDelta, QtySnapshot, StockState, TransactionType};

    fn key() -> LevelKey {
        LevelKey::new(VariantId::new(), LocationId::new())
    }

    fn on_hand(amount: i64) -> LevelDelta {
        LevelDelta::new(LevelField::OnHand, amount)
    }

    #[tokio::test]
    async fn delta_on_missing_row_writes_nothing() {
        let store = InMemoryStore::new();
        let k = key();
        let result = store.apply(LevelMutation::delta(k, [on_hand(5)])).await.unwrap();
        assert_eq!(result, None);
        assert_eq!(store.level(k.variant_id, k.location_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn create_adds_to_a_row_that_already_exists() {
        let store = InMemoryStore::new();
        let k = key();
        let first = InventoryLevel::empty(k.variant_id, k.location_id).with_on_hand(10);
        let second = InventoryLevel::empty(k.variant_id, k.location_id).with_on_hand(4);

        let created = store.apply(LevelMutation::create(first)).await.unwrap().unwrap();
        assert_eq!(created.before.on_hand_base, 0);

        let change = store.apply(LevelMutation::create(second)).await.unwrap().unwrap();
        assert_eq!(change.before.on_hand_base, 10);
        assert_eq!(change.after.on_hand_base, 14);
    }

    #[tokio::test]
    async fn bounded_deltas_report_what_they_actually_took() {
        let store = InMemoryStore::new();
        let k = key();
        store
            .seed_level(
                InventoryLevel::empty(k.variant_id, k.location_id)
                    .with_reserved(20)
                    .with_variant_qty(5),
            )
            .unwrap();

        let change = store
            .apply(LevelMutation::delta(
                k,
                [
                    LevelDelta::take_up_to(LevelField::Reserved, 30),
                    LevelDelta::decrement_floored(LevelField::VariantQty, 30),
                ],
            ))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(change.moved(LevelField::Reserved), -20);
        assert_eq!(change.moved(LevelField::VariantQty), -5);
        assert_eq!(change.after.reserved_base, 0);
        assert_eq!(change.after.variant_qty, 0);
    }

    #[tokio::test]
    async fn transfer_from_missing_or_empty_source_writes_nothing() {
        let store = InMemoryStore::new();
        let empty = key();
        store
            .seed_level(InventoryLevel::empty(empty.variant_id, empty.location_id))
            .unwrap();
        let target = LocationId::new();

        for from in [empty.location_id, LocationId::new()] {
            let outcome = store
                .transfer(LevelTransfer::new(empty.variant_id, from, target, 5))
                .await
                .unwrap();
            assert_eq!(outcome, None);
        }
        assert_eq!(store.level(empty.variant_id, target).await.unwrap(), None);
    }

    #[tokio::test]
    async fn transfer_credits_exactly_what_the_source_gave_up() {
        let store = InMemoryStore::new();
        let k = key();
        store
            .seed_level(InventoryLevel::empty(k.variant_id, k.location_id).with_on_hand(7))
            .unwrap();
        let target = LocationId::new();

        let outcome = store
            .transfer(LevelTransfer::new(k.variant_id, k.location_id, target, 10))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.moved, 7);
        assert_eq!(outcome.source.after.on_hand_base, 0);
        assert_eq!(outcome.target.before.on_hand_base, 0);
        assert_eq!(outcome.target.after.on_hand_base, 7);
    }

    #[tokio::test]
    async fn injected_failure_rolls_back_the_transfer() {
        let store = InMemoryStore::new();
        let k = key();
        store
            .seed_level(InventoryLevel::empty(k.variant_id, k.location_id).with_on_hand(10))
            .unwrap();
        store.fail_level_write_after(1);

        let err = store
            .transfer(LevelTransfer::new(k.variant_id, k.location_id, LocationId::new(), 5))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Backend { .. }));
        let row = store.level(k.variant_id, k.location_id).await.unwrap().unwrap();
        assert_eq!(row.on_hand_base, 10);
        assert_eq!(store.levels_for_variant(k.variant_id).await.unwrap().len(), 1);

        // The injection is one-shot.
        assert!(store.apply(LevelMutation::delta(k, [on_hand(1)])).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn log_assigns_increasing_sequence_numbers() {
        let store = InMemoryStore::new();
        let v = VariantId::new();
        for _ in 0..3 {
            store
                .append(PendingTransaction::new(
                    v,
                    TransactionType::Adjustment,
                    StockState::External,
                    StockState::OnHand,
                    QtySnapshot::new(0, 1),
                ))
                .await
                .unwrap();
        }

        let page = store
            .query(TransactionFilter::for_variant(v), Pagination::new(Some(2), Some(1)))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert!(!page.has_more);
        let seqs: Vec<_> = page.transactions.iter().map(|t| t.sequence_number).collect();
        assert_eq!(seqs, vec![2, 3]);
    }

    #[tokio::test]
    async fn variants_come_back_smallest_pack_first() {
        let store = InMemoryStore::new();
        let product = ProductId::new();
        store.insert_variant(ProductVariant::new(product, "CS24", 24, 2)).unwrap();
        store.insert_variant(ProductVariant::new(product, "EA", 1, 0)).unwrap();
        store.insert_variant(ProductVariant::new(product, "CS6", 6, 1)).unwrap();
        store.insert_variant(ProductVariant::new(ProductId::new(), "OTHER", 1, 0)).unwrap();

        let skus: Vec<_> = store
            .variants_for_product(product)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.sku)
            .collect();
        assert_eq!(skus, vec!["EA", "CS6", "CS24"]);
    }
}
