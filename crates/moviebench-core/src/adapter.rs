//! The query adapter contract.
//!
//! One trait, implemented once per backend. The external driver connects,
//! samples identifiers once, then runs repeated `{setup?, operation(id),
//! cleanup?}` cycles before closing the adapter.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::BenchConfig;
use crate::error::Error;
use crate::ids::IdPool;

/// Name prefix reserved for users created by `insert_user`.
///
/// Reset hooks delete by this pattern, so it must never appear in
/// pre-existing data.
pub const INSERT_PREFIX: &str = "insert_test__";

/// Separator appended to movie titles by `update_movie` and stripped by the
/// reset hooks. Pristine titles never contain it.
pub const TITLE_SEPARATOR: &str = "---";

/// Upper bound (exclusive) for the random suffix of inserted user names.
const INSERT_SUFFIX_BOUND: u32 = 1_000_000;

/// Operations the external driver can run against an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QueryName {
    GetUser,
    GetMovie,
    GetPerson,
    UpdateMovie,
    InsertUser,
}

impl QueryName {
    /// All operations, in driver order.
    pub const ALL: [QueryName; 5] = [
        QueryName::GetUser,
        QueryName::GetMovie,
        QueryName::GetPerson,
        QueryName::UpdateMovie,
        QueryName::InsertUser,
    ];

    /// Wire name used in id pools and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryName::GetUser => "get_user",
            QueryName::GetMovie => "get_movie",
            QueryName::GetPerson => "get_person",
            QueryName::UpdateMovie => "update_movie",
            QueryName::InsertUser => "insert_user",
        }
    }

    /// Whether the operation mutates backend state (and therefore has
    /// non-trivial reset hooks).
    pub fn is_mutation(&self) -> bool {
        matches!(self, QueryName::UpdateMovie | QueryName::InsertUser)
    }
}

impl fmt::Display for QueryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get_user" => Ok(QueryName::GetUser),
            "get_movie" => Ok(QueryName::GetMovie),
            "get_person" => Ok(QueryName::GetPerson),
            "update_movie" => Ok(QueryName::UpdateMovie),
            "insert_user" => Ok(QueryName::InsertUser),
            other => Err(Error::Query(format!("unknown query name '{}'", other))),
        }
    }
}

/// Deterministic title suffix for `update_movie`: the id's leading eight
/// characters (the whole id when shorter).
pub fn title_suffix(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Name and image for a user created by `insert_user`.
///
/// The random suffix keeps concurrent inserts from colliding with high
/// probability; collisions are accepted, not eliminated.
pub fn synthesize_user(seed: &str) -> (String, String) {
    let num = rand::thread_rng().gen_range(0..INSERT_SUFFIX_BOUND);
    let name = format!("{}{}", seed, num);
    let image = format!("image_{}{}", seed, num);
    (name, image)
}

/// Uniform operation surface implemented by every backend.
///
/// Calls are synchronous and blocking. A driver runs one adapter (one
/// backend connection) per worker; workers share nothing but the read-only
/// id pool. Errors always propagate; retries, if any, belong to the driver.
pub trait QueryAdapter {
    /// Short backend label, e.g. "sqlite".
    fn name(&self) -> &'static str;

    /// Sample identifiers for a benchmark run.
    ///
    /// Candidate rows are ordered by a random key and the first
    /// `cfg.number_of_ids` taken, so repeated runs exercise different
    /// records. The movie sample is shared between `get_movie` and
    /// `update_movie`; `insert_user` receives `cfg.concurrency` seed values
    /// instead of identifiers.
    fn load_ids(&self, cfg: &BenchConfig) -> Result<IdPool, Error>;

    /// Fetch a user with their ten most recent reviews, serialized as JSON.
    fn get_user(&self, id: &str) -> Result<String, Error>;

    /// Fetch a movie with ordered credits and newest-first reviews.
    fn get_movie(&self, id: &str) -> Result<String, Error>;

    /// Fetch a person with the movies they acted in or directed, ordered by
    /// year then title.
    fn get_person(&self, id: &str) -> Result<String, Error>;

    /// Append the reserved separator plus a suffix derived from the id to
    /// the movie's title; returns `{id, title}` JSON.
    fn update_movie(&self, id: &str) -> Result<String, Error>;

    /// Insert a user named from the seed plus a random numeric suffix;
    /// returns `{id, name, image}` JSON.
    fn insert_user(&self, seed: &str) -> Result<String, Error>;

    /// Reset hook run before a batch of `query`: strips mutated titles for
    /// `update_movie`, deletes prefix-named users for `insert_user`, no-op
    /// for reads. Idempotent; matches by pattern, not by tracked rows.
    fn setup(&self, cfg: &BenchConfig, query: QueryName) -> Result<(), Error>;

    /// Reset hook run after a batch; identical semantics to `setup`.
    fn cleanup(&self, cfg: &BenchConfig, query: QueryName) -> Result<(), Error>;

    /// Release the backend connection. Permitted no-op where the underlying
    /// client owns connection management.
    fn close(&mut self) -> Result<(), Error>;
}
