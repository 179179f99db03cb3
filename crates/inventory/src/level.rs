//! Stock ledger row and the mutation vocabulary used to change it.
//!
//! Balances are only ever changed through [`LevelMutation`]s, which storage
//! backends must apply atomically against the current row value
//! (`column = column + delta`, or one of the bounded forms in [`DeltaBound`]).
//! Reading a row, editing it in memory and writing it back would lose updates
//! under concurrent writers. Callers learn what actually moved from the
//! [`LevelChange`] the backend returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{LocationId, VariantId};

/// Primary key of a ledger row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelKey {
    pub variant_id: VariantId,
    pub location_id: LocationId,
}

impl LevelKey {
    pub fn new(variant_id: VariantId, location_id: LocationId) -> Self {
        Self {
            variant_id,
            location_id,
        }
    }
}

/// Per-(variant, location) balances. Quantities are base units except
/// `variant_qty`, which is the physical pack count at the location.
///
/// Rows are created lazily and never deleted; an all-zero row is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub variant_id: VariantId,
    pub location_id: LocationId,
    pub on_hand_base: i64,
    pub reserved_base: i64,
    pub picked_base: i64,
    pub packed_base: i64,
    pub backorder_base: i64,
    pub variant_qty: i64,
    pub updated_at: DateTime<Utc>,
}

impl InventoryLevel {
    /// A fresh row with every counter at zero.
    pub fn empty(variant_id: VariantId, location_id: LocationId) -> Self {
        Self {
            variant_id,
            location_id,
            on_hand_base: 0,
            reserved_base: 0,
            picked_base: 0,
            packed_base: 0,
            backorder_base: 0,
            variant_qty: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn with_on_hand(mut self, on_hand_base: i64) -> Self {
        self.on_hand_base = on_hand_base;
        self
    }

    pub fn with_reserved(mut self, reserved_base: i64) -> Self {
        self.reserved_base = reserved_base;
        self
    }

    pub fn with_variant_qty(mut self, variant_qty: i64) -> Self {
        self.variant_qty = variant_qty;
        self
    }

    pub fn key(&self) -> LevelKey {
        LevelKey::new(self.variant_id, self.location_id)
    }

    /// Available-to-promise: on hand minus reserved. Negative means backorder.
    pub fn atp(&self) -> i64 {
        self.on_hand_base - self.reserved_base
    }

    pub fn get(&self, field: LevelField) -> i64 {
        match field {
            LevelField::OnHand => self.on_hand_base,
            LevelField::Reserved => self.reserved_base,
            LevelField::Picked => self.picked_base,
            LevelField::Packed => self.packed_base,
            LevelField::Backorder => self.backorder_base,
            LevelField::VariantQty => self.variant_qty,
        }
    }

    /// Apply one delta and return the signed change it made. Storage
    /// backends call this while holding whatever guarantees atomicity for them.
    pub fn apply_delta(&mut self, delta: &LevelDelta) -> i64 {
        let slot = match delta.field {
            LevelField::OnHand => &mut self.on_hand_base,
            LevelField::Reserved => &mut self.reserved_base,
            LevelField::Picked => &mut self.picked_base,
            LevelField::Packed => &mut self.packed_base,
            LevelField::Backorder => &mut self.backorder_base,
            LevelField::VariantQty => &mut self.variant_qty,
        };
        let before = *slot;
        *slot = delta.bound.evaluate(before, delta.amount);
        *slot - before
    }

    /// Fold another row's counters into this one (insert-or-add semantics).
    pub fn absorb(&mut self, other: &InventoryLevel) {
        self.on_hand_base += other.on_hand_base;
        self.reserved_base += other.reserved_base;
        self.picked_base += other.picked_base;
        self.packed_base += other.packed_base;
        self.backorder_base += other.backorder_base;
        self.variant_qty += other.variant_qty;
    }
}

/// A mutable counter on [`InventoryLevel`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelField {
    OnHand,
    Reserved,
    Picked,
    Packed,
    Backorder,
    VariantQty,
}

impl LevelField {
    /// Column name in persistent storage.
    pub fn column(&self) -> &'static str {
        match self {
            LevelField::OnHand => "on_hand_base",
            LevelField::Reserved => "reserved_base",
            LevelField::Picked => "picked_base",
            LevelField::Packed => "packed_base",
            LevelField::Backorder => "backorder_base",
            LevelField::VariantQty => "variant_qty",
        }
    }
}

/// How a delta's amount combines with the current column value.
///
/// Bounded forms take a positive amount and never remove more than the
/// column holds, so the result depends on the value at write time rather
/// than on anything the caller read earlier.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaBound {
    /// `column + amount`
    #[default]
    Unbounded,
    /// `column - LEAST(GREATEST(column, 0), amount)`
    UpTo,
    /// `GREATEST(column - amount, 0)`
    FloorAtZero,
}

impl DeltaBound {
    pub fn evaluate(self, current: i64, amount: i64) -> i64 {
        match self {
            DeltaBound::Unbounded => current + amount,
            DeltaBound::UpTo => current - current.max(0).min(amount),
            DeltaBound::FloorAtZero => (current - amount).max(0),
        }
    }

    /// SQL right-hand side for `column`, with the amount bound at `param`.
    pub fn sql(self, column: &str, param: usize) -> String {
        match self {
            DeltaBound::Unbounded => format!("{column} + ${param}"),
            DeltaBound::UpTo => format!("{column} - LEAST(GREATEST({column}, 0), ${param})"),
            DeltaBound::FloorAtZero => format!("GREATEST({column} - ${param}, 0)"),
        }
    }
}

/// Change to one counter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDelta {
    pub field: LevelField,
    pub amount: i64,
    #[serde(default)]
    pub bound: DeltaBound,
}

impl LevelDelta {
    /// Plain signed addition.
    pub fn new(field: LevelField, amount: i64) -> Self {
        Self {
            field,
            amount,
            bound: DeltaBound::Unbounded,
        }
    }

    /// Take out at most `amount`, never more than the column currently holds.
    pub fn take_up_to(field: LevelField, amount: i64) -> Self {
        Self {
            field,
            amount,
            bound: DeltaBound::UpTo,
        }
    }

    /// Subtract `amount`, clamping the result at zero.
    pub fn decrement_floored(field: LevelField, amount: i64) -> Self {
        Self {
            field,
            amount,
            bound: DeltaBound::FloorAtZero,
        }
    }
}

/// A row as it was immediately before and after one atomic write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
    pub before: InventoryLevel,
    pub after: InventoryLevel,
}

impl LevelChange {
    pub fn new(before: InventoryLevel, after: InventoryLevel) -> Self {
        Self { before, after }
    }

    /// Signed change the write made to `field`.
    pub fn moved(&self, field: LevelField) -> i64 {
        self.after.get(field) - self.before.get(field)
    }
}

/// Move on-hand stock between two locations of one variant: the source gives
/// up at most `max_units` (never more than it holds) and the target receives
/// exactly what the source gave up, in one atomic step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTransfer {
    pub variant_id: VariantId,
    pub from_location_id: LocationId,
    pub to_location_id: LocationId,
    pub max_units: i64,
}

impl LevelTransfer {
    pub fn new(variant_id: VariantId, from_location_id: LocationId, to_location_id: LocationId, max_units: i64) -> Self {
        Self {
            variant_id,
            from_location_id,
            to_location_id,
            max_units,
        }
    }

    pub fn source_key(&self) -> LevelKey {
        LevelKey::new(self.variant_id, self.from_location_id)
    }

    pub fn target_key(&self) -> LevelKey {
        LevelKey::new(self.variant_id, self.to_location_id)
    }

    /// The bounded debit applied to the source row.
    pub fn debit(&self) -> LevelDelta {
        LevelDelta::take_up_to(LevelField::OnHand, self.max_units)
    }
}

/// What a completed [`LevelTransfer`] did to both rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub moved: i64,
    pub source: LevelChange,
    pub target: LevelChange,
}

/// The only way balances change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelMutation {
    /// Atomic update of an existing row. Zero-amount deltas are dropped by
    /// [`LevelMutation::delta`]; each field may appear at most once.
    Delta {
        key: LevelKey,
        deltas: Vec<LevelDelta>,
    },
    /// Insert a row; if one appeared concurrently, add these counters to it.
    Create(InventoryLevel),
}

impl LevelMutation {
    pub fn delta(key: LevelKey, deltas: impl IntoIterator<Item = LevelDelta>) -> Self {
        LevelMutation::Delta {
            key,
            deltas: deltas.into_iter().filter(|d| d.amount != 0).collect(),
        }
    }

    pub fn create(level: InventoryLevel) -> Self {
        LevelMutation::Create(level)
    }

    pub fn key(&self) -> LevelKey {
        match self {
            LevelMutation::Delta { key, .. } => *key,
            LevelMutation::Create(level) => level.key(),
        }
    }
}
