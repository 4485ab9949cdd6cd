//! Backend adapters for the movie-review benchmark workload.
//!
//! Every backend implements the same [`QueryAdapter`] contract from
//! `moviebench-core`, so the external driver measures identical work:
//!
//! - **sqlite**: in-process, always available, backs the hermetic tests
//! - **postgres**: relational server via sqlx (`--features postgres`)
//! - **edgedb**: object database speaking EdgeQL (`--features edgedb`)
//!
//! [`connect`] picks the adapter from a [`BenchConfig`], replacing any
//! per-backend wiring in the caller.

pub mod fixtures;
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "edgedb")]
pub mod edgedb;

pub use fixtures::{Dataset, Scale};
pub use sqlite::SqliteAdapter;

#[cfg(feature = "postgres")]
pub use postgres::PostgresAdapter;

#[cfg(feature = "edgedb")]
pub use edgedb::EdgeDbAdapter;

use moviebench_core::{BackendKind, BenchConfig, Error, QueryAdapter};

/// Create the adapter selected by the configuration.
///
/// Backends compiled out of this build report a connection error naming the
/// missing cargo feature.
pub fn connect(cfg: &BenchConfig) -> Result<Box<dyn QueryAdapter>, Error> {
    match cfg.backend {
        BackendKind::Sqlite => Ok(Box::new(SqliteAdapter::connect(cfg)?)),
        #[cfg(feature = "postgres")]
        BackendKind::Postgres => Ok(Box::new(PostgresAdapter::connect(cfg)?)),
        #[cfg(not(feature = "postgres"))]
        BackendKind::Postgres => Err(Error::Connection(
            "postgres backend not compiled in; rebuild with --features postgres".to_string(),
        )),
        #[cfg(feature = "edgedb")]
        BackendKind::EdgeDb => Ok(Box::new(EdgeDbAdapter::connect(cfg)?)),
        #[cfg(not(feature = "edgedb"))]
        BackendKind::EdgeDb => Err(Error::Connection(
            "edgedb backend not compiled in; rebuild with --features edgedb".to_string(),
        )),
    }
}

/// Like [`connect`], but also loads generated fixtures at `scale` before
/// handing the adapter back.
///
/// Server backends keep the data after the adapter closes. An in-memory
/// SQLite DSN does not, which makes this the way to run a full cycle with
/// no external state. The EdgeDB arm assumes the schema migrations from
/// `dbschema/` have already been applied.
pub fn connect_populated(cfg: &BenchConfig, scale: Scale) -> Result<Box<dyn QueryAdapter>, Error> {
    let dataset = Dataset::generate(scale);
    match cfg.backend {
        BackendKind::Sqlite => {
            let mut adapter = SqliteAdapter::connect(cfg)?;
            adapter.populate(&dataset)?;
            Ok(Box::new(adapter))
        }
        #[cfg(feature = "postgres")]
        BackendKind::Postgres => {
            let adapter = PostgresAdapter::connect(cfg)?;
            adapter.setup_schema()?;
            adapter.populate(&dataset)?;
            Ok(Box::new(adapter))
        }
        #[cfg(not(feature = "postgres"))]
        BackendKind::Postgres => Err(Error::Connection(
            "postgres backend not compiled in; rebuild with --features postgres".to_string(),
        )),
        #[cfg(feature = "edgedb")]
        BackendKind::EdgeDb => {
            let adapter = EdgeDbAdapter::connect(cfg)?;
            adapter.populate(&dataset)?;
            Ok(Box::new(adapter))
        }
        #[cfg(not(feature = "edgedb"))]
        BackendKind::EdgeDb => Err(Error::Connection(
            "edgedb backend not compiled in; rebuild with --features edgedb".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_dispatches_sqlite() {
        let cfg = BenchConfig::sqlite_in_memory();
        let adapter = connect(&cfg).unwrap();
        assert_eq!(adapter.name(), "sqlite");
    }

    #[test]
    fn test_connect_populated_yields_usable_pool() {
        let cfg = BenchConfig::sqlite_in_memory().with_number_of_ids(4);
        let adapter = connect_populated(&cfg, Scale::Tiny).unwrap();
        let pool = adapter.load_ids(&cfg).unwrap();
        assert_eq!(pool.get(moviebench_core::QueryName::GetMovie).len(), 4);
    }

    #[cfg(not(feature = "postgres"))]
    #[test]
    fn test_missing_backend_reports_connection_error() {
        let cfg = BenchConfig::new(BackendKind::Postgres, "postgres://localhost/x");
        let err = connect(&cfg).err().unwrap();
        assert!(matches!(err, Error::Connection(_)));
    }
}
