//! Moviebench Core - Query adapter contract for cross-database benchmarks.
//!
//! This crate defines the uniform surface every backend implements: connect,
//! sample identifiers once, run point queries/mutations by id, and reset
//! mutated rows between batches. The backends themselves live in
//! `moviebench-backends`; the timing driver is external and out of scope.
//!
//! # Quick Start
//!
//! ```ignore
//! use moviebench_core::{BenchConfig, QueryName};
//! use moviebench_backends::connect;
//!
//! fn main() -> Result<(), moviebench_core::Error> {
//!     let cfg = BenchConfig::default().with_number_of_ids(50);
//!     let adapter = connect(&cfg)?;
//!
//!     let pool = adapter.load_ids(&cfg)?;
//!     adapter.setup(&cfg, QueryName::UpdateMovie)?;
//!     for id in pool.get(QueryName::UpdateMovie) {
//!         let json = adapter.update_movie(id)?;
//!         println!("{}", json);
//!     }
//!     adapter.cleanup(&cfg, QueryName::UpdateMovie)?;
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod ids;
pub mod records;

pub use adapter::{
    synthesize_user, title_suffix, QueryAdapter, QueryName, INSERT_PREFIX, TITLE_SEPARATOR,
};
pub use config::{BackendKind, BenchConfig, DEFAULT_CONCURRENCY, DEFAULT_NUMBER_OF_IDS};
pub use error::Error;
pub use ids::IdPool;
