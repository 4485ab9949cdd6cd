//! Benchmark run configuration.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Default number of identifiers sampled per entity type.
pub const DEFAULT_NUMBER_OF_IDS: usize = 250;

/// Default worker count assumed by the external driver.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Backend an adapter should be created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process SQLite (always available).
    Sqlite,
    /// PostgreSQL over sqlx (requires the `postgres` cargo feature).
    Postgres,
    /// EdgeDB over its EdgeQL client (requires the `edgedb` cargo feature).
    EdgeDb,
}

impl BackendKind {
    /// Canonical lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Postgres => "postgres",
            BackendKind::EdgeDb => "edgedb",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlite" => Ok(BackendKind::Sqlite),
            "postgres" | "postgresql" => Ok(BackendKind::Postgres),
            "edgedb" => Ok(BackendKind::EdgeDb),
            other => Err(Error::Connection(format!("unknown backend '{}'", other))),
        }
    }
}

/// Everything an adapter needs for one benchmark run.
///
/// Connection targets travel here explicitly; there is no process-global
/// connection state to initialize.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Backend to benchmark.
    pub backend: BackendKind,

    /// Connection target: SQLite path (or ":memory:") or a PostgreSQL URL.
    /// The EdgeDB client resolves its target through its own project/env
    /// discovery and ignores this field.
    pub dsn: String,

    /// Identifiers sampled per entity type by `load_ids`.
    pub number_of_ids: usize,

    /// Worker count the driver will run with; sizes the insert seed list.
    pub concurrency: usize,
}

impl BenchConfig {
    /// Create a configuration for the given backend and connection target.
    pub fn new(backend: BackendKind, dsn: impl Into<String>) -> Self {
        Self {
            backend,
            dsn: dsn.into(),
            number_of_ids: DEFAULT_NUMBER_OF_IDS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Configuration for an in-memory SQLite database.
    pub fn sqlite_in_memory() -> Self {
        Self::new(BackendKind::Sqlite, ":memory:")
    }

    /// Set the per-entity sample size.
    pub fn with_number_of_ids(mut self, number_of_ids: usize) -> Self {
        self.number_of_ids = number_of_ids;
        self
    }

    /// Set the assumed driver concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::sqlite_in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BenchConfig::default();
        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(config.dsn, ":memory:");
        assert_eq!(config.number_of_ids, DEFAULT_NUMBER_OF_IDS);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_config_builder() {
        let config = BenchConfig::new(BackendKind::Postgres, "postgres://localhost/moviebench")
            .with_number_of_ids(50)
            .with_concurrency(4);

        assert_eq!(config.backend, BackendKind::Postgres);
        assert_eq!(config.dsn, "postgres://localhost/moviebench");
        assert_eq!(config.number_of_ids, 50);
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("sqlite".parse::<BackendKind>().unwrap(), BackendKind::Sqlite);
        assert_eq!(
            "postgresql".parse::<BackendKind>().unwrap(),
            BackendKind::Postgres
        );
        assert_eq!("edgedb".parse::<BackendKind>().unwrap(), BackendKind::EdgeDb);
        assert!("oracle".parse::<BackendKind>().is_err());
    }
}
