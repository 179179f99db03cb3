//! Reserve and release: move ATP between on-hand and committed without
//! touching physical stock.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use stockledger_core::{DomainError, LocationId, VariantId};
use stockledger_inventory::{
    LevelChange, LevelDelta, LevelField, LevelKey, LevelMutation, PendingTransaction, QtySnapshot,
    StockState, TransactionType,
};

use super::{Actor, InventoryService};
use crate::error::LedgerResult;
use crate::store::InventoryStore;

/// Commit stock at one location to an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveRequest {
    pub variant_id: VariantId,
    pub location_id: LocationId,
    pub base_units: i64,
    pub order_id: String,
    pub order_item_id: Option<String>,
    #[serde(default)]
    pub actor: Actor,
}

impl ReserveRequest {
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

/// Undo (part of) a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRequest {
    pub variant_id: VariantId,
    pub location_id: LocationId,
    pub base_units: i64,
    pub order_id: String,
    pub order_item_id: Option<String>,
    /// Stored as the log entry's notes.
    pub reason: Option<String>,
    #[serde(default)]
    pub actor: Actor,
}

impl ReleaseRequest {
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
            reason: None,
            actor: Actor::default(),
        }
    }

    pub fn item(mut self, order_item_id: impl Into<String>) -> Self {
        self.order_item_id = Some(order_item_id.into());
        self
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
    /// Add `base_units` to the row's reserved balance.
    ///
    /// Returns `false` (and writes nothing) when the variant has no row at the
    /// location. Reservations are not capped by on-hand: reserving more than
    /// is available drives ATP negative, which is how backorders show up.
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
    pub async fn reserve(&self, req: ReserveRequest) -> LedgerResult<bool> {
        let units = DomainError::ensure_positive("base_units", req.base_units)?;
        let key = LevelKey::new(req.variant_id, req.location_id);

        let mutation = LevelMutation::delta(key, [LevelDelta::new(LevelField::Reserved, units)]);
        let Some(LevelChange { after: row, .. }) = self.store.apply(mutation).await? else {
            warn!("reserve skipped: no inventory row at location");
            return Ok(false);
        };

        let entry = PendingTransaction::new(
            req.variant_id,
            TransactionType::Reserve,
            StockState::OnHand,
            StockState::Committed,
            QtySnapshot::unchanged(row.variant_qty),
        )
        .from_location(req.location_id)
        .base_units(units)
        .for_order(req.order_id, req.order_item_id)
        .actor(req.actor.user_id, req.actor.batch_id);
        self.store.append(entry).await?;

        debug!(reserved_base = row.reserved_base, "stock reserved");
        Ok(true)
    }

    /// Subtract `base_units` from the row's reserved balance.
    ///
    /// A missing row is a no-op returning `false`, so releasing twice or
    /// releasing against a cleaned-up location is harmless.
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
    pub async fn release(&self, req: ReleaseRequest) -> LedgerResult<bool> {
        let units = DomainError::ensure_positive("base_units", req.base_units)?;
        let key = LevelKey::new(req.variant_id, req.location_id);

        let mutation = LevelMutation::delta(key, [LevelDelta::new(LevelField::Reserved, -units)]);
        let Some(LevelChange { after: row, .. }) = self.store.apply(mutation).await? else {
            debug!("release skipped: no inventory row at location");
            return Ok(false);
        };

        let entry = PendingTransaction::new(
            req.variant_id,
            TransactionType::Unreserve,
            StockState::Committed,
            StockState::OnHand,
            QtySnapshot::unchanged(row.variant_qty),
        )
        .from_location(req.location_id)
        .base_units(units)
        .for_order(req.order_id, req.order_item_id)
        .notes(req.reason)
        .actor(req.actor.user_id, req.actor.batch_id);
        self.store.append(entry).await?;

        debug!(reserved_base = row.reserved_base, "reservation released");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::error::LedgerError;
    use crate::service::fixtures::Fixture;

    #[tokio::test]
    async fn reserve_moves_atp_without_touching_on_hand() {
        let fx = Fixture::new();
        fx.seed(fx.each.id, fx.pick.id, 100, 0);

        let ok = fx
            .service
            .reserve(ReserveRequest::new(fx.each.id, fx.pick.id, 30, "SO-1").item("L1"))
            .await
            .unwrap();
        assert!(ok);

        let row = fx.row(fx.each.id, fx.pick.id).await.unwrap();
        assert_eq!(row.on_hand_base, 100);
        assert_eq!(row.reserved_base, 30);
        assert_eq!(fx.service.calculate_atp(fx.each.id).await.unwrap(), 70);

        let log = fx.store.transactions();
        assert_eq!(log.len(), 1);
        let entry = &log[0];
        assert_eq!(entry.transaction_type, TransactionType::Reserve);
        assert_eq!(entry.source_state, StockState::OnHand);
        assert_eq!(entry.target_state, StockState::Committed);
        assert_eq!(entry.base_units, 30);
        assert_eq!(entry.variant_qty_delta, 0);
        assert_eq!(entry.order_id.as_deref(), Some("SO-1"));
        assert_eq!(entry.order_item_id.as_deref(), Some("L1"));
        assert!(!entry.is_implicit);
    }

    #[tokio::test]
    async fn reserve_without_row_is_a_soft_no_op() {
        let fx = Fixture::new();
        let ok = fx
            .service
            .reserve(ReserveRequest::new(fx.each.id, fx.pick.id, 5, "SO-1"))
            .await
            .unwrap();
        assert!(!ok);
        assert!(fx.row(fx.each.id, fx.pick.id).await.is_none());
        assert!(fx.store.transactions().is_empty());
    }

    #[tokio::test]
    async fn over_reservation_drives_atp_negative() {
        let fx = Fixture::new();
        fx.seed(fx.each.id, fx.pick.id, 10, 0);
        fx.service
            .reserve(ReserveRequest::new(fx.each.id, fx.pick.id, 15, "SO-2"))
            .await
            .unwrap();
        assert_eq!(fx.service.calculate_atp(fx.each.id).await.unwrap(), -5);
    }

    #[tokio::test]
    async fn non_positive_quantities_are_rejected() {
        let fx = Fixture::new();
        fx.seed(fx.each.id, fx.pick.id, 10, 0);
        for units in [0, -4] {
            let err = fx
                .service
                .reserve(ReserveRequest::new(fx.each.id, fx.pick.id, units, "SO-3"))
                .await
                .unwrap_err();
            assert!(matches!(err, LedgerError::Domain(_)));
        }
        let row = fx.row(fx.each.id, fx.pick.id).await.unwrap();
        assert_eq!(row.reserved_base, 0);
        assert!(fx.store.transactions().is_empty());
    }

    #[tokio::test]
    async fn release_records_reason_and_restores_atp() {
        let fx = Fixture::new();
        fx.seed(fx.each.id, fx.pick.id, 50, 20);

        let ok = fx
            .service
            .release(ReleaseRequest::new(fx.each.id, fx.pick.id, 20, "SO-4").reason("order cancelled"))
            .await
            .unwrap();
        assert!(ok);
        assert_eq!(fx.row(fx.each.id, fx.pick.id).await.unwrap().reserved_base, 0);

        let entry = &fx.store.transactions()[0];
        assert_eq!(entry.transaction_type, TransactionType::Unreserve);
        assert_eq!(entry.source_state, StockState::Committed);
        assert_eq!(entry.target_state, StockState::OnHand);
        assert_eq!(entry.notes.as_deref(), Some("order cancelled"));
    }

    #[tokio::test]
    async fn release_without_row_is_idempotent() {
        let fx = Fixture::new();
        let req = ReleaseRequest::new(fx.each.id, LocationId::new(), 3, "SO-5");
        assert!(!fx.service.release(req.clone()).await.unwrap());
        assert!(!fx.service.release(req).await.unwrap());
        assert!(fx.store.transactions().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: reserve(n) followed by release(n) leaves the row as it was.
        #[test]
        fn reserve_then_release_round_trips(
            on_hand in 0i64..10_000,
            reserved in 0i64..10_000,
            units in 1i64..5_000,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let fx = Fixture::new();
                fx.seed(fx.each.id, fx.pick.id, on_hand, reserved);
                let before = fx.row(fx.each.id, fx.pick.id).await.unwrap();

                fx.service
                    .reserve(ReserveRequest::new(fx.each.id, fx.pick.id, units, "SO-P"))
                    .await
                    .unwrap();
                fx.service
                    .release(ReleaseRequest::new(fx.each.id, fx.pick.id, units, "SO-P"))
                    .await
                    .unwrap();

                let after = fx.row(fx.each.id, fx.pick.id).await.unwrap();
                assert_eq!(after.on_hand_base, before.on_hand_base);
                assert_eq!(after.reserved_base, before.reserved_base);
                assert_eq!(after.variant_qty, before.variant_qty);
                assert_eq!(fx.store.transactions().len(), 2);
            });
        }
    }
}
