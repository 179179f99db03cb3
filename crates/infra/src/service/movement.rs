//! Physical stock movements: pick, ship, receive, adjust.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use stockledger_core::{DomainError, LocationId, VariantId};
use stockledger_inventory::{
    InventoryLevel, InventoryTransaction, LevelDelta, LevelField, LevelKey, LevelMutation,
    PendingTransaction, QtySnapshot, ReferenceType, StockState, TransactionType,
};

use super::{Actor, InventoryService};
use crate::error::LedgerResult;
use crate::store::InventoryStore;

/// Take stock off a shelf for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickRequest {
    pub variant_id: VariantId,
    pub location_id: LocationId,
    pub base_units: i64,
    pub order_id: String,
    pub order_item_id: Option<String>,
    #[serde(default)]
    pub actor: Actor,
}

impl PickRequest {
    pub fn new(
        variant_id: VariantId,
        location_id: LocationId,
        base_units: i64,
        order_id: impl Into<String>,
    ) -> Self {
        Self {
            variant_id,
            location_id,
            base_units,
            order_id: order_id.into(),
            order_item_id: None,
            actor: Actor::default(),
        }
    }

    pub fn item(mut self, order_item_id: impl Into<String>) -> Self {
        self.order_item_id = Some(order_item_id.into());
        self
    }

    pub fn by(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }
}

/// Picked stock leaving the building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentRequest {
    pub variant_id: VariantId,
    pub location_id: LocationId,
    pub base_units: i64,
    pub order_id: String,
    pub order_item_id: Option<String>,
    #[serde(default)]
    pub actor: Actor,
}

impl ShipmentRequest {
    pub fn new(
        variant_id: VariantId,
        location_id: LocationId,
        base_units: i64,
        order_id: impl Into<String>,
    ) -> Self {
        Self {
            variant_id,
            location_id,
            base_units,
            order_id: order_id.into(),
            order_item_id: None,
            actor: Actor::default(),
        }
    }

    pub fn item(mut self, order_item_id: impl Into<String>) -> Self {
        self.order_item_id = Some(order_item_id.into());
        self
    }

    pub fn by(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }
}

/// Goods arriving against a purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveRequest {
    pub variant_id: VariantId,
    pub location_id: LocationId,
    pub base_units: i64,
    /// Purchase order id.
    pub reference_id: String,
    /// Physical pack count, when the receiver counted packs.
    pub variant_qty: Option<i64>,
    #[serde(default)]
    pub actor: Actor,
}

impl ReceiveRequest {
    pub fn new(
        variant_id: VariantId,
        location_id: LocationId,
        base_units: i64,
        reference_id: impl Into<String>,
    ) -> Self {
        Self {
            variant_id,
            location_id,
            base_units,
            reference_id: reference_id.into(),
            variant_qty: None,
            actor: Actor::default(),
        }
    }

    pub fn packs(mut self, variant_qty: i64) -> Self {
        self.variant_qty = Some(variant_qty);
        self
    }

    pub fn by(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }
}

/// Signed on-hand correction (cycle count, damage, write-off).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustRequest {
    pub variant_id: VariantId,
    pub location_id: LocationId,
    pub delta: i64,
    pub reason: Option<String>,
    #[serde(default)]
    pub actor: Actor,
}

impl AdjustRequest {
    pub fn new(variant_id: VariantId, location_id: LocationId, delta: i64) -> Self {
        Self {
            variant_id,
            location_id,
            delta,
            reason: None,
            actor: Actor::default(),
        }
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn by(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }
}

impl<S: InventoryStore> InventoryService<S> {
    /// Move stock from on-hand to picked, consuming any reservation first.
    ///
    /// Pick never checks on-hand: picking more than is on the shelf drives
    /// `on_hand_base` negative. The reserved balance drops by at most what
    /// was reserved. The pack count on the row and in the log entry is
    /// floored at zero independently of the base-unit math.
    ///
    /// Returns `false` when there is no row at the location.
    #[instrument(
        skip(self, req),
        fields(
            variant_id = %req.variant_id,
            location_id = %req.location_id,
            base_units = req.base_units,
            order_id = %req.order_id
        ),
        err
    )]
    pub async fn pick(&self, req: PickRequest) -> LedgerResult<bool> {
        let units = DomainError::ensure_positive("base_units", req.base_units)?;
        let key = LevelKey::new(req.variant_id, req.location_id);

        // Release and pack-count bounds are evaluated by the store against the
        // row as it is at write time; what moved is read back off the change.
        let mutation = LevelMutation::delta(
            key,
            [
                LevelDelta::new(LevelField::OnHand, -units),
                LevelDelta::new(LevelField::Picked, units),
                LevelDelta::take_up_to(LevelField::Reserved, units),
                LevelDelta::decrement_floored(LevelField::VariantQty, units),
            ],
        );
        let Some(change) = self.store.apply(mutation).await? else {
            warn!("pick skipped: no inventory row at location");
            return Ok(false);
        };

        let released = -change.moved(LevelField::Reserved);
        let packs = QtySnapshot::new(change.before.variant_qty, change.after.variant_qty);
        let row = change.after;

        let source = if released > 0 {
            StockState::Committed
        } else {
            StockState::OnHand
        };
        let entry = PendingTransaction::new(
            req.variant_id,
            TransactionType::Pick,
            source,
            StockState::Picked,
            packs,
        )
        .from_location(req.location_id)
        .base_units(units)
        .for_order(req.order_id, req.order_item_id)
        .implicit(true)
        .actor(req.actor.user_id, req.actor.batch_id);
        self.store.append(entry).await?;

        if row.on_hand_base < 0 {
            warn!(on_hand_base = row.on_hand_base, "pick drove on-hand negative");
        }
        debug!(released, picked_base = row.picked_base, "stock picked");
        Ok(true)
    }

    /// Drain picked stock at ship time.
    ///
    /// Always logs. When the row is missing the decrement is skipped and the
    /// entry records a zero-to-zero snapshot; otherwise the snapshot tracks
    /// `picked_base`.
    #[instrument(
        skip(self, req),
        fields(
            variant_id = %req.variant_id,
            location_id = %req.location_id,
            base_units = req.base_units,
            order_id = %req.order_id
        ),
        err
    )]
    pub async fn record_shipment(&self, req: ShipmentRequest) -> LedgerResult<InventoryTransaction> {
        let units = DomainError::ensure_positive("base_units", req.base_units)?;
        let key = LevelKey::new(req.variant_id, req.location_id);

        let mutation = LevelMutation::delta(key, [LevelDelta::new(LevelField::Picked, -units)]);
        let snapshot = match self.store.apply(mutation).await? {
            Some(change) => QtySnapshot::new(change.before.picked_base, change.after.picked_base),
            None => {
                warn!("shipment recorded without an inventory row; picked balance untouched");
                QtySnapshot::unchanged(0)
            }
        };

        let entry = PendingTransaction::new(
            req.variant_id,
            TransactionType::Ship,
            StockState::Picked,
            StockState::Shipped,
            snapshot,
        )
        .from_location(req.location_id)
        .base_units(units)
        .for_order(req.order_id, req.order_item_id)
        .actor(req.actor.user_id, req.actor.batch_id);
        let committed = self.store.append(entry).await?;

        debug!(sequence_number = committed.sequence_number, "shipment recorded");
        Ok(committed)
    }

    /// Book received goods onto a location, creating the row if needed.
    ///
    /// The row's pack count only moves by an explicitly supplied
    /// `variant_qty`; the log snapshot falls back to `base_units` when no
    /// pack count was given. In that case the entry's `variant_qty_after`
    /// is not written back to the row, so the next entry's
    /// `variant_qty_before` restarts from the row and the pack-count chain
    /// cannot be replayed across such a receipt. Base units (`base_units`,
    /// `on_hand_base`) stay consistent either way.
    #[instrument(
        skip(self, req),
        fields(
            variant_id = %req.variant_id,
            location_id = %req.location_id,
            base_units = req.base_units,
            reference_id = %req.reference_id
        ),
        err
    )]
    pub async fn receive(&self, req: ReceiveRequest) -> LedgerResult<InventoryTransaction> {
        let units = DomainError::ensure_positive("base_units", req.base_units)?;
        let packs = req.variant_qty.unwrap_or(0);

        // Insert-or-add: adds to an existing row, creates the first one.
        let receipt = InventoryLevel::empty(req.variant_id, req.location_id)
            .with_on_hand(units)
            .with_variant_qty(packs);
        let (before, on_hand_base) = match self.store.apply(LevelMutation::create(receipt)).await? {
            Some(change) => (change.before.variant_qty, change.after.on_hand_base),
            None => (0, units),
        };

        let counted = req.variant_qty.unwrap_or(units);
        let entry = PendingTransaction::new(
            req.variant_id,
            TransactionType::Receipt,
            StockState::External,
            StockState::OnHand,
            QtySnapshot::new(before, before + counted),
        )
        .to_location(req.location_id)
        .base_units(units)
        .reference(ReferenceType::Po, Some(req.reference_id))
        .actor(req.actor.user_id, req.actor.batch_id);
        let committed = self.store.append(entry).await?;

        debug!(on_hand_base, "stock received");
        Ok(committed)
    }

    /// Apply a signed on-hand correction.
    ///
    /// Returns `None` for a zero delta, and for a negative delta against a
    /// location that holds no row.
    #[instrument(
        skip(self, req),
        fields(
            variant_id = %req.variant_id,
            location_id = %req.location_id,
            delta = req.delta
        ),
        err
    )]
    pub async fn adjust(&self, req: AdjustRequest) -> LedgerResult<Option<InventoryTransaction>> {
        if req.delta == 0 {
            warn!("adjust skipped: zero delta");
            return Ok(None);
        }
        let key = LevelKey::new(req.variant_id, req.location_id);

        let mutation = LevelMutation::delta(key, [LevelDelta::new(LevelField::OnHand, req.delta)]);
        let change = match self.store.apply(mutation).await? {
            Some(change) => change,
            None if req.delta > 0 => {
                let created = LevelMutation::create(
                    InventoryLevel::empty(req.variant_id, req.location_id).with_on_hand(req.delta),
                );
                match self.store.apply(created).await? {
                    Some(change) => change,
                    None => return Ok(None),
                }
            }
            None => {
                debug!("negative adjustment against missing row ignored");
                return Ok(None);
            }
        };

        let snapshot = QtySnapshot::new(change.before.on_hand_base, change.after.on_hand_base);
        let entry = if req.delta < 0 {
            PendingTransaction::new(
                req.variant_id,
                TransactionType::Adjustment,
                StockState::OnHand,
                StockState::External,
                snapshot,
            )
            .from_location(req.location_id)
        } else {
            PendingTransaction::new(
                req.variant_id,
                TransactionType::Adjustment,
                StockState::External,
                StockState::OnHand,
                snapshot,
            )
            .to_location(req.location_id)
        };
        let entry = entry
            .base_units(req.delta)
            .reference(ReferenceType::Adjustment, None)
            .notes(req.reason)
            .actor(req.actor.user_id, req.actor.batch_id);
        let committed = self.store.append(entry).await?;

        debug!(on_hand_base = change.after.on_hand_base, "stock adjusted");
        Ok(Some(committed))
    }
}
