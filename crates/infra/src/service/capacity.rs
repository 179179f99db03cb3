//! Capacity planner orchestration: replenishment, transfers, threshold scans
//! and overflow put-away.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use stockledger_core::{DomainError, LocationId, VariantId, WarehouseId};
use stockledger_inventory::{
    InventoryTransaction, LevelTransfer, LocationType, OverflowBin, OverflowQuery,
    PendingTransaction, ProductVariant, QtySnapshot, ReferenceType, ReplenishmentNeed, StockState,
    TransactionType, find_overflow_bin, occupied_cube, replenishment_needs,
};

use super::{Actor, InventoryService};
use crate::error::LedgerResult;
use crate::store::InventoryStore;

/// Top up a location from its configured parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplenishRequest {
    pub variant_id: VariantId,
    pub target_location_id: LocationId,
    pub requested_units: i64,
    #[serde(default)]
    pub actor: Actor,
}

impl ReplenishRequest {
    pub fn new(variant_id: VariantId, target_location_id: LocationId, requested_units: i64) -> Self {
        Self {
            variant_id,
            target_location_id,
            requested_units,
            actor: Actor::default(),
        }
    }

    pub fn by(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }
}

/// Outcome of a replenishment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplenishResult {
    /// Base units actually moved; zero for every no-op.
    pub replenished: i64,
    /// The parent location, when one is configured.
    pub source_location_id: Option<LocationId>,
    pub transaction: Option<InventoryTransaction>,
}

impl ReplenishResult {
    fn nothing(source_location_id: Option<LocationId>) -> Self {
        Self {
            replenished: 0,
            source_location_id,
            transaction: None,
        }
    }
}

/// Operator-initiated move between two arbitrary locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub variant_id: VariantId,
    pub from_location_id: LocationId,
    pub to_location_id: LocationId,
    pub base_units: i64,
    pub notes: Option<String>,
    #[serde(default)]
    pub actor: Actor,
}

impl TransferRequest {
    pub fn new(
        variant_id: VariantId,
        from_location_id: LocationId,
        to_location_id: LocationId,
        base_units: i64,
    ) -> Self {
        Self {
            variant_id,
            from_location_id,
            to_location_id,
            base_units,
            notes: None,
            actor: Actor::default(),
        }
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn by(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }
}

/// Where can `required_units` packs of a variant go?
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverflowRequest {
    pub warehouse_id: Option<WarehouseId>,
    pub variant_id: VariantId,
    pub required_units: i64,
    pub min_units_required: Option<i64>,
}

impl OverflowRequest {
    pub fn new(variant_id: VariantId, required_units: i64) -> Self {
        Self {
            warehouse_id: None,
            variant_id,
            required_units,
            min_units_required: None,
        }
    }

    pub fn in_warehouse(mut self, warehouse_id: WarehouseId) -> Self {
        self.warehouse_id = Some(warehouse_id);
        self
    }

    pub fn at_least(mut self, min_units: i64) -> Self {
        self.min_units_required = Some(min_units);
        self
    }
}

struct OnHandMove {
    variant_id: VariantId,
    from: LocationId,
    to: LocationId,
    units: i64,
    kind: TransactionType,
    reference: ReferenceType,
    notes: Option<String>,
    actor: Actor,
}

impl<S: InventoryStore> InventoryService<S> {
    /// Pull up to `requested_units` from the target's parent location.
    ///
    /// Moves `min(requested, parent on-hand)`, with the parent balance taken
    /// at write time. The parent decrement and the target increment are one
    /// atomic store transfer; if it fails neither row changes and nothing is
    /// logged.
    #[instrument(
        skip(self, req),
        fields(
            variant_id = %req.variant_id,
            target_location_id = %req.target_location_id,
            requested_units = req.requested_units
        ),
        err
    )]
    pub async fn replenish(&self, req: ReplenishRequest) -> LedgerResult<ReplenishResult> {
        let units = DomainError::ensure_positive("requested_units", req.requested_units)?;

        let Some(target) = self.store.location(req.target_location_id).await? else {
            warn!("replenish skipped: unknown target location");
            return Ok(ReplenishResult::nothing(None));
        };
        let Some(parent) = target.parent_location_id else {
            warn!(location_code = %target.code, "replenish skipped: no parent location configured");
            return Ok(ReplenishResult::nothing(None));
        };

        let moved = self
            .move_on_hand(OnHandMove {
                variant_id: req.variant_id,
                from: parent,
                to: target.id,
                units,
                kind: TransactionType::Replenish,
                reference: ReferenceType::Replenishment,
                notes: None,
                actor: req.actor,
            })
            .await?;

        match moved {
            Some((replenished, transaction)) => {
                debug!(replenished, source_location_id = %parent, "location replenished");
                Ok(ReplenishResult {
                    replenished,
                    source_location_id: Some(parent),
                    transaction: Some(transaction),
                })
            }
            None => {
                warn!(source_location_id = %parent, "replenish skipped: parent has no stock");
                Ok(ReplenishResult::nothing(Some(parent)))
            }
        }
    }

    /// Move up to `base_units` of on-hand stock between two locations.
    ///
    /// Returns `None` when the source holds no positive on-hand stock.
    #[instrument(
        skip(self, req),
        fields(
            variant_id = %req.variant_id,
            from_location_id = %req.from_location_id,
            to_location_id = %req.to_location_id,
            base_units = req.base_units
        ),
        err
    )]
    pub async fn transfer(&self, req: TransferRequest) -> LedgerResult<Option<InventoryTransaction>> {
        let units = DomainError::ensure_positive("base_units", req.base_units)?;
        if req.from_location_id == req.to_location_id {
            return Err(DomainError::validation("transfer source and destination are the same location").into());
        }

        let moved = self
            .move_on_hand(OnHandMove {
                variant_id: req.variant_id,
                from: req.from_location_id,
                to: req.to_location_id,
                units,
                kind: TransactionType::Transfer,
                reference: ReferenceType::Transfer,
                notes: req.notes,
                actor: req.actor,
            })
            .await?;

        match moved {
            Some((units_moved, transaction)) => {
                debug!(units_moved, "stock transferred");
                Ok(Some(transaction))
            }
            None => {
                warn!("transfer skipped: source has no stock");
                Ok(None)
            }
        }
    }

    /// Every (location, variant) row sitting below its location's `min_qty`.
    #[instrument(skip(self), err)]
    pub async fn locations_needing_replenishment(
        &self,
        variant_id: Option<VariantId>,
    ) -> LedgerResult<Vec<ReplenishmentNeed>> {
        let locations: Vec<_> = self
            .store
            .list_locations()
            .await?
            .into_iter()
            .filter(|l| l.min_qty.is_some())
            .collect();

        let mut levels = Vec::new();
        for loc in &locations {
            match variant_id {
                Some(v) => levels.extend(self.store.level(v, loc.id).await?),
                None => levels.extend(self.store.levels_at_location(loc.id).await?),
            }
        }

        let needs = replenishment_needs(&locations, &levels, variant_id);
        debug!(count = needs.len(), "replenishment scan complete");
        Ok(needs)
    }

    /// The overflow bin with the most free volume that can take the variant.
    ///
    /// `None` when the variant is unknown, has no measurable cube, or no bin
    /// qualifies.
    #[instrument(
        skip(self, req),
        fields(variant_id = %req.variant_id, required_units = req.required_units),
        err
    )]
    pub async fn find_overflow_bin(&self, req: OverflowRequest) -> LedgerResult<Option<OverflowBin>> {
        let Some(variant) = self.store.variant(req.variant_id).await? else {
            debug!("overflow lookup for unknown variant");
            return Ok(None);
        };

        let locations = self.store.list_locations().await?;
        let mut catalog: HashMap<VariantId, Option<ProductVariant>> = HashMap::new();
        let mut occupied: HashMap<LocationId, u64> = HashMap::new();

        for loc in locations.iter().filter(|l| {
            l.location_type == LocationType::Overflow
                && (req.warehouse_id.is_none() || l.warehouse_id == req.warehouse_id)
        }) {
            let contents = self.store.levels_at_location(loc.id).await?;
            for level in &contents {
                if !catalog.contains_key(&level.variant_id) {
                    let found = self.store.variant(level.variant_id).await?;
                    catalog.insert(level.variant_id, found);
                }
            }
            let cube = occupied_cube(contents.iter().filter_map(|level| {
                catalog
                    .get(&level.variant_id)
                    .and_then(Option::as_ref)
                    .map(|v| (v, level))
            }));
            occupied.insert(loc.id, cube);
        }

        let query = OverflowQuery {
            warehouse_id: req.warehouse_id,
            variant: &variant,
            required_units: req.required_units,
            min_units_required: req.min_units_required,
        };
        let bin = find_overflow_bin(&locations, query, |id| occupied.get(&id).copied().unwrap_or(0));

        match &bin {
            Some(b) => debug!(location_code = %b.code, max_units = b.max_units, "overflow bin selected"),
            None => warn!("no overflow bin can take the variant"),
        }
        Ok(bin)
    }

    async fn move_on_hand(&self, mv: OnHandMove) -> LedgerResult<Option<(i64, InventoryTransaction)>> {
        let transfer = LevelTransfer::new(mv.variant_id, mv.from, mv.to, mv.units);
        let outcome = match self.store.transfer(transfer).await {
            Ok(Some(outcome)) => outcome,
            Ok(None) => return Ok(None),
            Err(e) => {
                error!(error = %e, "stock move failed; both rows rolled back");
                return Err(e.into());
            }
        };

        let entry = PendingTransaction::new(
            mv.variant_id,
            mv.kind,
            StockState::OnHand,
            StockState::OnHand,
            QtySnapshot::new(outcome.target.before.on_hand_base, outcome.target.after.on_hand_base),
        )
        .from_location(mv.from)
        .to_location(mv.to)
        .base_units(outcome.moved)
        .reference(mv.reference, None)
        .implicit(mv.kind == TransactionType::Replenish)
        .notes(mv.notes)
        .actor(mv.actor.user_id, mv.actor.batch_id);
        let committed = self.store.append(entry).await?;

        Ok(Some((outcome.moved, committed)))
    }
}
