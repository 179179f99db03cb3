//! Infrastructure layer: persistence port and backends, configuration, and
//! the inventory ledger service.

pub mod config;
pub mod error;
pub mod service;
pub mod store;


pub use config::{LedgerConfig, StoreBackend, connect_postgres};
pub use error::{LedgerError, LedgerResult};
pub use service::{Actor, InventoryService};
