//! Postgres-backed persistence ports.
//!
//! Balance changes are issued as `column = column + $n` updates (or the
//! `LEAST`/`GREATEST` forms of bounded deltas) so concurrent writers never
//! lose each other's changes and bounds hold against the value at write time.
//! Every level write locks its row with `SELECT ... FOR UPDATE` inside a SQL
//! transaction to report the before image. Transfers debit and credit in the
//! same transaction. Schema: `migrations/0001_inventory_ledger.sql`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database / Io / Tls / PoolTimedOut / PoolClosed / other | `Backend` |
//! | ColumnDecode / Decode / unknown enum string | `Corrupt` |

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use stockledger_core::{LocationId, ProductId, TransactionId, UserId, VariantId, WarehouseId};
use stockledger_inventory::{
    Dimensions, InventoryLevel, InventoryTransaction, LevelChange, LevelField, LevelMutation,
    LevelTransfer, LocationType, PendingTransaction, Product, ProductVariant, ReferenceType,
    StockState, TransactionType, TransferOutcome, WarehouseLocation,
};

use super::query::{Pagination, TransactionFilter, TransactionPage};
use super::r#trait::{CatalogStore, LevelStore, LocationStore, StoreError, TransactionLog};

const LEVEL_COLUMNS: &str = "variant_id, location_id, on_hand_base, reserved_base, picked_base, \
     packed_base, backorder_base, variant_qty, updated_at";

const TRANSACTION_COLUMNS: &str = "id, sequence_number, variant_id, from_location_id, \
     to_location_id, transaction_type, base_units, variant_qty_delta, variant_qty_before, \
     variant_qty_after, source_state, target_state, order_id, order_item_id, reference_type, \
     reference_id, batch_id, is_implicit, notes, user_id, created_at";

const LOCATION_COLUMNS: &str = "id, code, location_type, warehouse_id, parent_location_id, \
     capacity_cubic_mm, width_mm, height_mm, depth_mm, min_qty, max_qty";

const VARIANT_COLUMNS: &str = "id, product_id, sku, units_per_variant, hierarchy_level, \
     width_mm, height_mm, length_mm, barcode";

/// Postgres implementation of every persistence port.
///
/// `Send + Sync`; clone freely (`PgPool` is reference-counted).
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), StoreError> {
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit_transaction", e))
}

async fn rollback(tx: Transaction<'static, Postgres>) -> Result<(), StoreError> {
    tx.rollback()
        .await
        .map_err(|e| map_sqlx_error("rollback", e))
}

/// Undo an insert-or-add: the row before the write is the row after it minus
/// the counters that were added.
fn before_create(after: &InventoryLevel, added: &InventoryLevel) -> InventoryLevel {
    let mut before = after.clone();
    before.on_hand_base -= added.on_hand_base;
    before.reserved_base -= added.reserved_base;
    before.picked_base -= added.picked_base;
    before.packed_base -= added.packed_base;
    before.backorder_base -= added.backorder_base;
    before.variant_qty -= added.variant_qty;
    before
}

/// Apply one mutation on a connection that is inside a SQL transaction; the
/// row lock taken here is held until that transaction ends.
async fn apply_on(
    conn: &mut PgConnection,
    mutation: LevelMutation,
) -> Result<Option<LevelChange>, StoreError> {
    match mutation {
        LevelMutation::Delta { key, deltas } => {
            let locked = sqlx::query(&format!(
                "SELECT {LEVEL_COLUMNS} FROM inventory_levels \
                 WHERE variant_id = $1 AND location_id = $2 FOR UPDATE"
            ))
            .bind(key.variant_id.as_uuid())
            .bind(key.location_id.as_uuid())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("lock_level", e))?;
            let Some(before) = locked.as_ref().map(level_from_row).transpose()? else {
                return Ok(None);
            };
            if deltas.is_empty() {
                return Ok(Some(LevelChange::new(before.clone(), before)));
            }

            let assignments = deltas
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    let col = d.field.column();
                    format!("{col} = {}", d.bound.sql(col, i + 3))
                })
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE inventory_levels SET {assignments}, updated_at = NOW() \
                 WHERE variant_id = $1 AND location_id = $2 RETURNING {LEVEL_COLUMNS}"
            );

            let mut query = sqlx::query(&sql)
                .bind(key.variant_id.as_uuid())
                .bind(key.location_id.as_uuid());
            for d in &deltas {
                query = query.bind(d.amount);
            }

            let row = query
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| map_sqlx_error("apply_delta", e))?;
            Ok(Some(LevelChange::new(before, level_from_row(&row)?)))
        }
        LevelMutation::Create(level) => {
            let row = sqlx::query(&format!(
                r#"
                INSERT INTO inventory_levels (
                    variant_id, location_id, on_hand_base, reserved_base, picked_base,
                    packed_base, backorder_base, variant_qty
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (variant_id, location_id)
                DO UPDATE SET
                    on_hand_base = inventory_levels.on_hand_base + EXCLUDED.on_hand_base,
                    reserved_base = inventory_levels.reserved_base + EXCLUDED.reserved_base,
                    picked_base = inventory_levels.picked_base + EXCLUDED.picked_base,
                    packed_base = inventory_levels.packed_base + EXCLUDED.packed_base,
                    backorder_base = inventory_levels.backorder_base + EXCLUDED.backorder_base,
                    variant_qty = inventory_levels.variant_qty + EXCLUDED.variant_qty,
                    updated_at = NOW()
                RETURNING {LEVEL_COLUMNS}
                "#
            ))
            .bind(level.variant_id.as_uuid())
            .bind(level.location_id.as_uuid())
            .bind(level.on_hand_base)
            .bind(level.reserved_base)
            .bind(level.picked_base)
            .bind(level.packed_base)
            .bind(level.backorder_base)
            .bind(level.variant_qty)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("create_level", e))?;
            let after = level_from_row(&row)?;
            Ok(Some(LevelChange::new(before_create(&after, &level), after)))
        }
    }
}

#[async_trait::async_trait]
impl LevelStore for PostgresStore {
    #[instrument(skip(self), fields(variant_id = %variant_id, location_id = %location_id), err)]
    async fn level(
        &self,
        variant_id: VariantId,
        location_id: LocationId,
    ) -> Result<Option<InventoryLevel>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {LEVEL_COLUMNS} FROM inventory_levels WHERE variant_id = $1 AND location_id = $2"
        ))
        .bind(variant_id.as_uuid())
        .bind(location_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("level", e))?;
        row.as_ref().map(level_from_row).transpose()
    }

    #[instrument(skip(self), fields(variant_id = %variant_id), err)]
    async fn levels_for_variant(
        &self,
        variant_id: VariantId,
    ) -> Result<Vec<InventoryLevel>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {LEVEL_COLUMNS} FROM inventory_levels WHERE variant_id = $1 ORDER BY location_id"
        ))
        .bind(variant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("levels_for_variant", e))?;
        rows.iter().map(level_from_row).collect()
    }

    #[instrument(skip(self), fields(location_id = %location_id), err)]
    async fn levels_at_location(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<InventoryLevel>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {LEVEL_COLUMNS} FROM inventory_levels WHERE location_id = $1 ORDER BY variant_id"
        ))
        .bind(location_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("levels_at_location", e))?;
        rows.iter().map(level_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn apply(&self, mutation: LevelMutation) -> Result<Option<LevelChange>, StoreError> {
        let mut tx = self.begin().await?;
        match apply_on(&mut *tx, mutation).await? {
            Some(change) => {
                commit(tx).await?;
                Ok(Some(change))
            }
            None => {
                rollback(tx).await?;
                Ok(None)
            }
        }
    }

    #[instrument(
        skip(self, transfer),
        fields(
            variant_id = %transfer.variant_id,
            from = %transfer.from_location_id,
            to = %transfer.to_location_id,
            max_units = transfer.max_units,
        ),
        err
    )]
    async fn transfer(&self, transfer: LevelTransfer) -> Result<Option<TransferOutcome>, StoreError> {
        if transfer.max_units <= 0 {
            return Ok(None);
        }
        let mut tx = self.begin().await?;

        let debit = LevelMutation::delta(transfer.source_key(), [transfer.debit()]);
        let source = match apply_on(&mut *tx, debit).await? {
            Some(change) if change.moved(LevelField::OnHand) < 0 => change,
            _ => {
                rollback(tx).await?;
                return Ok(None);
            }
        };
        let moved = -source.moved(LevelField::OnHand);

        let target_key = transfer.target_key();
        let credit = InventoryLevel::empty(target_key.variant_id, target_key.location_id)
            .with_on_hand(moved);
        let Some(target) = apply_on(&mut *tx, LevelMutation::create(credit)).await? else {
            rollback(tx).await?;
            return Ok(None);
        };

        commit(tx).await?;
        Ok(Some(TransferOutcome {
            moved,
            source,
            target,
        }))
    }
}

#[async_trait::async_trait]
impl TransactionLog for PostgresStore {
    #[instrument(skip(self, entry), fields(variant_id = %entry.variant_id, transaction_type = entry.transaction_type.as_str()), err)]
    async fn append(&self, entry: PendingTransaction) -> Result<InventoryTransaction, StoreError> {
        let id = TransactionId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO inventory_transactions (
                id, variant_id, from_location_id, to_location_id, transaction_type,
                base_units, variant_qty_delta, variant_qty_before, variant_qty_after,
                source_state, target_state, order_id, order_item_id, reference_type,
                reference_id, batch_id, is_implicit, notes, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING sequence_number, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(entry.variant_id.as_uuid())
        .bind(entry.from_location_id.map(Uuid::from))
        .bind(entry.to_location_id.map(Uuid::from))
        .bind(entry.transaction_type.as_str())
        .bind(entry.base_units)
        .bind(entry.qty.delta)
        .bind(entry.qty.before)
        .bind(entry.qty.after)
        .bind(entry.source_state.as_str())
        .bind(entry.target_state.as_str())
        .bind(entry.order_id.as_deref())
        .bind(entry.order_item_id.as_deref())
        .bind(entry.reference_type.map(|r| r.as_str()))
        .bind(entry.reference_id.as_deref())
        .bind(entry.batch_id.as_deref())
        .bind(entry.is_implicit)
        .bind(entry.notes.as_deref())
        .bind(entry.user_id.map(Uuid::from))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_transaction", e))?;

        let sequence_number: i64 = row.try_get("sequence_number").map_err(decode_error)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode_error)?;
        Ok(entry.commit(id, sequence_number as u64, created_at))
    }

    #[instrument(skip(self), err)]
    async fn query(
        &self,
        filter: TransactionFilter,
        pagination: Pagination,
    ) -> Result<TransactionPage, StoreError> {
        const WHERE: &str = r#"
            WHERE ($1::uuid IS NULL OR variant_id = $1)
                AND ($2::uuid IS NULL OR from_location_id = $2 OR to_location_id = $2)
                AND ($3::text IS NULL OR transaction_type = $3)
                AND ($4::text IS NULL OR order_id = $4)
                AND ($5::text IS NULL OR reference_id = $5)
                AND ($6::text IS NULL OR batch_id = $6)
                AND ($7::timestamptz IS NULL OR created_at >= $7)
                AND ($8::timestamptz IS NULL OR created_at <= $8)
        "#;

        let variant = filter.variant_id.map(Uuid::from);
        let location = filter.location_id.map(Uuid::from);
        let tx_type = filter.transaction_type.map(|t| t.as_str());

        let count_row = sqlx::query(&format!(
            "SELECT COUNT(*) AS total FROM inventory_transactions {WHERE}"
        ))
        .bind(variant)
        .bind(location)
        .bind(tx_type)
        .bind(filter.order_id.as_deref())
        .bind(filter.reference_id.as_deref())
        .bind(filter.batch_id.as_deref())
        .bind(filter.created_after)
        .bind(filter.created_before)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_transactions", e))?;
        let total: i64 = count_row.try_get("total").map_err(decode_error)?;

        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM inventory_transactions {WHERE} \
             ORDER BY sequence_number ASC LIMIT $9 OFFSET $10"
        ))
        .bind(variant)
        .bind(location)
        .bind(tx_type)
        .bind(filter.order_id.as_deref())
        .bind(filter.reference_id.as_deref())
        .bind(filter.batch_id.as_deref())
        .bind(filter.created_after)
        .bind(filter.created_before)
        .bind(i64::from(pagination.limit))
        .bind(i64::from(pagination.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("query_transactions", e))?;

        let transactions = rows
            .iter()
            .map(transaction_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TransactionPage::new(transactions, total as u64, pagination))
    }
}

#[async_trait::async_trait]
impl LocationStore for PostgresStore {
    #[instrument(skip(self), fields(location_id = %id), err)]
    async fn location(&self, id: LocationId) -> Result<Option<WarehouseLocation>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {LOCATION_COLUMNS} FROM warehouse_locations WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("location", e))?;
        row.as_ref().map(location_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_locations(&self) -> Result<Vec<WarehouseLocation>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {LOCATION_COLUMNS} FROM warehouse_locations ORDER BY sort_order, created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_locations", e))?;
        rows.iter().map(location_from_row).collect()
    }
}

#[async_trait::async_trait]
impl CatalogStore for PostgresStore {
    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query("SELECT id, base_sku, name FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("product", e))?;
        row.map(|r| {
            Ok(Product {
                id: ProductId::from_uuid(r.try_get("id").map_err(decode_error)?),
                base_sku: r.try_get("base_sku").map_err(decode_error)?,
                name: r.try_get("name").map_err(decode_error)?,
            })
        })
        .transpose()
    }

    #[instrument(skip(self), fields(variant_id = %id), err)]
    async fn variant(&self, id: VariantId) -> Result<Option<ProductVariant>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("variant", e))?;
        row.as_ref().map(variant_from_row).transpose()
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn variants_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductVariant>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE product_id = $1 \
             ORDER BY hierarchy_level, units_per_variant"
        ))
        .bind(product_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("variants_for_product", e))?;
        rows.iter().map(variant_from_row).collect()
    }
}

// Row decoding

fn decode_error(err: sqlx::Error) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

fn opt_u64(row: &PgRow, column: &str) -> Result<Option<u64>, StoreError> {
    let v: Option<i64> = row.try_get(column).map_err(decode_error)?;
    Ok(v.map(|v| v.max(0) as u64))
}

fn level_from_row(row: &PgRow) -> Result<InventoryLevel, StoreError> {
    Ok(InventoryLevel {
        variant_id: VariantId::from_uuid(row.try_get("variant_id").map_err(decode_error)?),
        location_id: LocationId::from_uuid(row.try_get("location_id").map_err(decode_error)?),
        on_hand_base: row.try_get("on_hand_base").map_err(decode_error)?,
        reserved_base: row.try_get("reserved_base").map_err(decode_error)?,
        picked_base: row.try_get("picked_base").map_err(decode_error)?,
        packed_base: row.try_get("packed_base").map_err(decode_error)?,
        backorder_base: row.try_get("backorder_base").map_err(decode_error)?,
        variant_qty: row.try_get("variant_qty").map_err(decode_error)?,
        updated_at: row.try_get("updated_at").map_err(decode_error)?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<InventoryTransaction, StoreError> {
    let tx_type: String = row.try_get("transaction_type").map_err(decode_error)?;
    let source: String = row.try_get("source_state").map_err(decode_error)?;
    let target: String = row.try_get("target_state").map_err(decode_error)?;
    let reference: Option<String> = row.try_get("reference_type").map_err(decode_error)?;
    let sequence_number: i64 = row.try_get("sequence_number").map_err(decode_error)?;
    let from: Option<Uuid> = row.try_get("from_location_id").map_err(decode_error)?;
    let to: Option<Uuid> = row.try_get("to_location_id").map_err(decode_error)?;
    let user: Option<Uuid> = row.try_get("user_id").map_err(decode_error)?;

    Ok(InventoryTransaction {
        id: TransactionId::from_uuid(row.try_get("id").map_err(decode_error)?),
        sequence_number: sequence_number as u64,
        variant_id: VariantId::from_uuid(row.try_get("variant_id").map_err(decode_error)?),
        from_location_id: from.map(LocationId::from_uuid),
        to_location_id: to.map(LocationId::from_uuid),
        transaction_type: TransactionType::parse(&tx_type)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown transaction_type '{tx_type}'")))?,
        base_units: row.try_get("base_units").map_err(decode_error)?,
        variant_qty_delta: row.try_get("variant_qty_delta").map_err(decode_error)?,
        variant_qty_before: row.try_get("variant_qty_before").map_err(decode_error)?,
        variant_qty_after: row.try_get("variant_qty_after").map_err(decode_error)?,
        source_state: StockState::parse(&source)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown source_state '{source}'")))?,
        target_state: StockState::parse(&target)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown target_state '{target}'")))?,
        order_id: row.try_get("order_id").map_err(decode_error)?,
        order_item_id: row.try_get("order_item_id").map_err(decode_error)?,
        reference_type: reference
            .map(|r| {
                ReferenceType::parse(&r)
                    .ok_or_else(|| StoreError::Corrupt(format!("unknown reference_type '{r}'")))
            })
            .transpose()?,
        reference_id: row.try_get("reference_id").map_err(decode_error)?,
        batch_id: row.try_get("batch_id").map_err(decode_error)?,
        is_implicit: row.try_get("is_implicit").map_err(decode_error)?,
        notes: row.try_get("notes").map_err(decode_error)?,
        user_id: user.map(UserId::from_uuid),
        created_at: row.try_get("created_at").map_err(decode_error)?,
    })
}

fn location_from_row(row: &PgRow) -> Result<WarehouseLocation, StoreError> {
    let kind: String = row.try_get("location_type").map_err(decode_error)?;
    let warehouse: Option<Uuid> = row.try_get("warehouse_id").map_err(decode_error)?;
    let parent: Option<Uuid> = row.try_get("parent_location_id").map_err(decode_error)?;

    Ok(WarehouseLocation {
        id: LocationId::from_uuid(row.try_get("id").map_err(decode_error)?),
        code: row.try_get("code").map_err(decode_error)?,
        location_type: LocationType::parse(&kind)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown location_type '{kind}'")))?,
        warehouse_id: warehouse.map(WarehouseId::from_uuid),
        parent_location_id: parent.map(LocationId::from_uuid),
        capacity_cubic_mm: opt_u64(row, "capacity_cubic_mm")?,
        width_mm: opt_u64(row, "width_mm")?,
        height_mm: opt_u64(row, "height_mm")?,
        depth_mm: opt_u64(row, "depth_mm")?,
        min_qty: row.try_get("min_qty").map_err(decode_error)?,
        max_qty: row.try_get("max_qty").map_err(decode_error)?,
    })
}

fn variant_from_row(row: &PgRow) -> Result<ProductVariant, StoreError> {
    let units: i32 = row.try_get("units_per_variant").map_err(decode_error)?;
    let level: i32 = row.try_get("hierarchy_level").map_err(decode_error)?;

    Ok(ProductVariant {
        id: VariantId::from_uuid(row.try_get("id").map_err(decode_error)?),
        product_id: ProductId::from_uuid(row.try_get("product_id").map_err(decode_error)?),
        sku: row.try_get("sku").map_err(decode_error)?,
        units_per_variant: units.max(1) as u32,
        hierarchy_level: level.max(0) as u32,
        dimensions: Dimensions {
            width_mm: opt_u64(row, "width_mm")?,
            height_mm: opt_u64(row, "height_mm")?,
            length_mm: opt_u64(row, "length_mm")?,
        },
        barcode: row.try_get("barcode").map_err(decode_error)?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
            StoreError::backend(operation, format!("database error [{code}]: {}", db_err.message()))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Corrupt(format!("{operation}: {err}"))
        }
        sqlx::Error::PoolClosed => StoreError::backend(operation, "connection pool closed"),
        sqlx::Error::PoolTimedOut => StoreError::backend(operation, "connection pool timed out"),
        _ => StoreError::backend(operation, err.to_string()),
    }
}
