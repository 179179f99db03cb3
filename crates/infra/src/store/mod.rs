//! Persistence port for the inventory ledger.
//!
//! One narrow async trait per entity (levels, transaction log, locations,
//! catalog) so the service never issues storage queries itself and tests can
//! run against [`InMemoryStore`].

pub mod in_memory;
pub mod postgres;
pub mod query;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{MAX_PAGE_SIZE, Pagination, TransactionFilter, TransactionPage};
pub use r#trait::{
    CatalogStore, InventoryStore, LevelStore, LocationStore, StoreError, TransactionLog,
};
