//! Inventory ledger domain: catalog records, stock ledger rows, movement
//! audit records, and the availability and capacity math built on them.
//!
//! Pure, deterministic logic only (no IO, no storage).

pub mod availability;
pub mod capacity;
pub mod catalog;
pub mod level;
pub mod transaction;
pub mod uom;

pub use availability::{
    LevelTotals, ProductSummary, VariantAvailability, calculate_atp, summarize_product,
    variant_availability,
};
pub use capacity::{
    OverflowBin, OverflowQuery, ReplenishmentNeed, find_overflow_bin, occupied_cube,
    replenishment_needs,
};
pub use catalog::{Dimensions, LocationType, Product, ProductVariant, WarehouseLocation};
pub use level::{
    DeltaBound, InventoryLevel, LevelChange, LevelDelta, LevelField, LevelKey, LevelMutation,
    LevelTransfer, TransferOutcome,
};
pub use transaction::{
    InventoryTransaction, PendingTransaction, QtySnapshot, ReferenceType, StockState,
    TransactionType,
};
