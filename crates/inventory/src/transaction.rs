//! Audit records for stock movements.
//!
//! Every state-changing ledger call produces exactly one entry. Entries go
//! through two shapes:
//!
//! 1. [`PendingTransaction`]: built by the service after the balance change,
//!    not yet assigned an id or position.
//! 2. [`InventoryTransaction`]: appended to the log, assigned an id, a
//!    monotonically increasing `sequence_number` and `created_at`. Never
//!    mutated or deleted afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{LocationId, TransactionId, UserId, VariantId};

/// Kind of movement recorded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Reserve,
    Unreserve,
    Pick,
    Ship,
    Receipt,
    Adjustment,
    Replenish,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Reserve => "reserve",
            TransactionType::Unreserve => "unreserve",
            TransactionType::Pick => "pick",
            TransactionType::Ship => "ship",
            TransactionType::Receipt => "receipt",
            TransactionType::Adjustment => "adjustment",
            TransactionType::Replenish => "replenish",
            TransactionType::Transfer => "transfer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reserve" => Some(TransactionType::Reserve),
            "unreserve" => Some(TransactionType::Unreserve),
            "pick" => Some(TransactionType::Pick),
            "ship" => Some(TransactionType::Ship),
            "receipt" => Some(TransactionType::Receipt),
            "adjustment" => Some(TransactionType::Adjustment),
            "replenish" => Some(TransactionType::Replenish),
            "transfer" => Some(TransactionType::Transfer),
            _ => None,
        }
    }
}

/// Logical state stock moves between.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockState {
    External,
    OnHand,
    Committed,
    Picked,
    Shipped,
}

impl StockState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockState::External => "external",
            StockState::OnHand => "on_hand",
            StockState::Committed => "committed",
            StockState::Picked => "picked",
            StockState::Shipped => "shipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "external" => Some(StockState::External),
            "on_hand" => Some(StockState::OnHand),
            "committed" => Some(StockState::Committed),
            "picked" => Some(StockState::Picked),
            "shipped" => Some(StockState::Shipped),
            _ => None,
        }
    }
}

/// What `reference_id` points at.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Order,
    Po,
    Adjustment,
    Replenishment,
    Transfer,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Order => "order",
            ReferenceType::Po => "po",
            ReferenceType::Adjustment => "adjustment",
            ReferenceType::Replenishment => "replenishment",
            ReferenceType::Transfer => "transfer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "order" => Some(ReferenceType::Order),
            "po" => Some(ReferenceType::Po),
            "adjustment" => Some(ReferenceType::Adjustment),
            "replenishment" => Some(ReferenceType::Replenishment),
            "transfer" => Some(ReferenceType::Transfer),
            _ => None,
        }
    }
}

/// Quantity snapshot of whatever counter the movement affected.
///
/// `after == before + delta` always holds; [`QtySnapshot::new`] derives the
/// delta so callers cannot record an inconsistent triple.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QtySnapshot {
    pub before: i64,
    pub after: i64,
    pub delta: i64,
}

impl QtySnapshot {
    pub fn new(before: i64, after: i64) -> Self {
        Self {
            before,
            after,
            delta: after - before,
        }
    }

    /// Snapshot for a movement that does not change the tracked quantity.
    pub fn unchanged(qty: i64) -> Self {
        Self::new(qty, qty)
    }
}

/// A log entry ready to be appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub variant_id: VariantId,
    pub from_location_id: Option<LocationId>,
    pub to_location_id: Option<LocationId>,
    pub transaction_type: TransactionType,
    /// Base units the movement concerned (always non-negative).
    pub base_units: i64,
    pub qty: QtySnapshot,
    pub source_state: StockState,
    pub target_state: StockState,
    pub order_id: Option<String>,
    pub order_item_id: Option<String>,
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<String>,
    pub batch_id: Option<String>,
    pub is_implicit: bool,
    pub notes: Option<String>,
    pub user_id: Option<UserId>,
}

impl PendingTransaction {
    pub fn new(
        variant_id: VariantId,
        transaction_type: TransactionType,
        source_state: StockState,
        target_state: StockState,
        qty: QtySnapshot,
    ) -> Self {
        Self {
            variant_id,
            from_location_id: None,
            to_location_id: None,
            transaction_type,
            base_units: 0,
            qty,
            source_state,
            target_state,
            order_id: None,
            order_item_id: None,
            reference_type: None,
            reference_id: None,
            batch_id: None,
            is_implicit: false,
            notes: None,
            user_id: None,
        }
    }

    pub fn from_location(mut self, location_id: LocationId) -> Self {
        self.from_location_id = Some(location_id);
        self
    }

    pub fn to_location(mut self, location_id: LocationId) -> Self {
        self.to_location_id = Some(location_id);
        self
    }

    pub fn base_units(mut self, base_units: i64) -> Self {
        self.base_units = base_units.abs();
        self
    }

    pub fn for_order(mut self, order_id: impl Into<String>, order_item_id: Option<String>) -> Self {
        let order_id = order_id.into();
        self.reference_type = Some(ReferenceType::Order);
        self.reference_id = Some(order_id.clone());
        self.order_id = Some(order_id);
        self.order_item_id = order_item_id;
        self
    }

    pub fn reference(mut self, reference_type: ReferenceType, reference_id: Option<String>) -> Self {
        self.reference_type = Some(reference_type);
        self.reference_id = reference_id;
        self
    }

    pub fn implicit(mut self, is_implicit: bool) -> Self {
        self.is_implicit = is_implicit;
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn actor(mut self, user_id: Option<UserId>, batch_id: Option<String>) -> Self {
        self.user_id = user_id;
        self.batch_id = batch_id;
        self
    }

    /// Seal the entry. Called by log implementations during append.
    pub fn commit(
        self,
        id: TransactionId,
        sequence_number: u64,
        created_at: DateTime<Utc>,
    ) -> InventoryTransaction {
        InventoryTransaction {
            id,
            sequence_number,
            variant_id: self.variant_id,
            from_location_id: self.from_location_id,
            to_location_id: self.to_location_id,
            transaction_type: self.transaction_type,
            base_units: self.base_units,
            variant_qty_delta: self.qty.delta,
            variant_qty_before: self.qty.before,
            variant_qty_after: self.qty.after,
            source_state: self.source_state,
            target_state: self.target_state,
            order_id: self.order_id,
            order_item_id: self.order_item_id,
            reference_type: self.reference_type,
            reference_id: self.reference_id,
            batch_id: self.batch_id,
            is_implicit: self.is_implicit,
            notes: self.notes,
            user_id: self.user_id,
            created_at,
        }
    }
}

/// An appended, immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: TransactionId,
    /// Position in the log; strictly increasing in append order.
    pub sequence_number: u64,
    pub variant_id: VariantId,
    pub from_location_id: Option<LocationId>,
    pub to_location_id: Option<LocationId>,
    pub transaction_type: TransactionType,
    pub base_units: i64,
    pub variant_qty_delta: i64,
    pub variant_qty_before: i64,
    pub variant_qty_after: i64,
    pub source_state: StockState,
    pub target_state: StockState,
    pub order_id: Option<String>,
    pub order_item_id: Option<String>,
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<String>,
    pub batch_id: Option<String>,
    pub is_implicit: bool,
    pub notes: Option<String>,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl InventoryTransaction {
    /// Whether the entry involves a location on either side.
    pub fn touches(&self, location_id: LocationId) -> bool {
        self.from_location_id == Some(location_id) || self.to_location_id == Some(location_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_derives_delta() {
        let snap = QtySnapshot::new(10, 4);
        assert_eq!(snap.delta, -6);
        assert_eq!(snap.before + snap.delta, snap.after);
        assert_eq!(QtySnapshot::unchanged(9).delta, 0);
    }

    #[test]
    fn commit_copies_snapshot_and_linkage() {
        let variant_id = VariantId::new();
        let loc = LocationId::new();
        let pending = PendingTransaction::new(
            variant_id,
            TransactionType::Reserve,
            StockState::OnHand,
            StockState::Committed,
            QtySnapshot::unchanged(3),
        )
        .from_location(loc)
        .base_units(-30)
        .for_order("SO-1", Some("SO-1-1".to_string()));

        let tx = pending.commit(TransactionId::new(), 1, Utc::now());
        assert_eq!(tx.base_units, 30);
        assert_eq!(tx.variant_qty_delta, 0);
        assert_eq!(tx.order_id.as_deref(), Some("SO-1"));
        assert_eq!(tx.reference_type, Some(ReferenceType::Order));
        assert!(tx.touches(loc));
        assert!(!tx.touches(LocationId::new()));
    }

    #[test]
    fn enum_string_forms_round_trip() {
        for t in [
            TransactionType::Reserve,
            TransactionType::Unreserve,
            TransactionType::Pick,
            TransactionType::Ship,
            TransactionType::Receipt,
            TransactionType::Adjustment,
            TransactionType::Replenish,
            TransactionType::Transfer,
        ] {
            assert_eq!(TransactionType::parse(t.as_str()), Some(t));
        }
        for s in [
            StockState::External,
            StockState::OnHand,
            StockState::Committed,
            StockState::Picked,
            StockState::Shipped,
        ] {
            assert_eq!(StockState::parse(s.as_str()), Some(s));
        }
        assert_eq!(ReferenceType::parse("po"), Some(ReferenceType::Po));
    }
}
