//! Ledger configuration.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::store::{MAX_PAGE_SIZE, StoreError};

/// Which persistence backend to run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Postgres { database_url: String },
}

/// Runtime configuration for the ledger service and its store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub backend: StoreBackend,
    /// Postgres pool size.
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Page size used when callers do not ask for one.
    pub default_page_size: u32,
    /// Upper bound on any audit page (never above the store's hard cap).
    pub max_page_size: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::InMemory,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
            default_page_size: 50,
            max_page_size: 500,
        }
    }
}

impl LedgerConfig {
    /// Read configuration from the environment, falling back to defaults.
    ///
    /// - `STOCKLEDGER_BACKEND`: `memory` (default) or `postgres`
    /// - `DATABASE_URL`: required for `postgres`
    /// - `STOCKLEDGER_DB_MAX_CONNECTIONS`
    /// - `STOCKLEDGER_PAGE_SIZE`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let wants_postgres = lookup("STOCKLEDGER_BACKEND")
            .map(|b| b.eq_ignore_ascii_case("postgres"))
            .unwrap_or(false);
        if wants_postgres {
            match lookup("DATABASE_URL") {
                Some(database_url) => config.backend = StoreBackend::Postgres { database_url },
                None => tracing::warn!(
                    "STOCKLEDGER_BACKEND=postgres but DATABASE_URL is not set; using in-memory store"
                ),
            }
        }

        if let Some(n) = lookup("STOCKLEDGER_DB_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
            config.max_connections = n;
        }
        if let Some(n) = lookup("STOCKLEDGER_PAGE_SIZE").and_then(|v| v.parse().ok()) {
            config = config.with_default_page_size(n);
        }
        config
    }

    pub fn with_postgres(mut self, database_url: impl Into<String>) -> Self {
        self.backend = StoreBackend::Postgres {
            database_url: database_url.into(),
        };
        self
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn with_default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = size.clamp(1, self.max_page_size);
        self
    }

    pub fn with_max_page_size(mut self, size: u32) -> Self {
        self.max_page_size = size.clamp(1, MAX_PAGE_SIZE);
        self.default_page_size = self.default_page_size.min(self.max_page_size);
        self
    }
}

/// Open a Postgres pool for a `Postgres` backend configuration.
pub async fn connect_postgres(config: &LedgerConfig) -> Result<PgPool, StoreError> {
    let StoreBackend::Postgres { database_url } = &config.backend else {
        return Err(StoreError::backend(
            "connect_postgres",
            "configuration does not select the postgres backend",
        ));
    };

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(database_url)
        .await
        .map_err(|e| StoreError::backend("connect_postgres", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_in_memory() {
        let config = LedgerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn selects_postgres_when_url_present() {
        let config = LedgerConfig::from_lookup(lookup(&[
            ("STOCKLEDGER_BACKEND", "Postgres"),
            ("DATABASE_URL", "postgres://localhost/ledger"),
            ("STOCKLEDGER_DB_MAX_CONNECTIONS", "25"),
        ]));
        assert_eq!(
            config.backend,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/ledger".to_string()
            }
        );
        assert_eq!(config.max_connections, 25);
    }

    #[test]
    fn postgres_without_url_falls_back_to_memory() {
        let config = LedgerConfig::from_lookup(lookup(&[("STOCKLEDGER_BACKEND", "postgres")]));
        assert_eq!(config.backend, StoreBackend::InMemory);
    }

    #[test]
    fn page_sizes_are_clamped() {
        let config = LedgerConfig::default()
            .with_max_page_size(5_000)
            .with_default_page_size(2_000);
        assert_eq!(config.max_page_size, MAX_PAGE_SIZE);
        assert_eq!(config.default_page_size, MAX_PAGE_SIZE);

        let config = LedgerConfig::default().with_max_page_size(20);
        assert_eq!(config.default_page_size, 20);
    }

    #[tokio::test]
    async fn connect_refuses_in_memory_config() {
        let err = connect_postgres(&LedgerConfig::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend { .. }));
    }
}
