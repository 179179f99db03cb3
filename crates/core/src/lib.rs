//! `stockledger-core`: identifiers and error taxonomy shared by the ledger crates.
//!
//! Nothing in here touches storage or the network.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{LocationId, ProductId, TransactionId, UserId, VariantId, WarehouseId};
