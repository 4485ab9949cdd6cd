#![cfg(feature = "postgres")]

//! Integration tests for the PostgreSQL adapter.
//!
//! These need a reachable server and are skipped unless DATABASE_URL is set:
//!
//!     DATABASE_URL=postgres://localhost/moviebench cargo test --features postgres
//!
//! The test rewrites the contents of every workload table in the target
//! database, so point it at a scratch database. Everything runs in one test
//! function because the tables are shared state.

use moviebench_backends::{Dataset, PostgresAdapter};
use moviebench_core::records::{MovieDetail, UpdatedMovie, UserDetail};
use moviebench_core::{
    BackendKind, BenchConfig, Error, QueryAdapter, QueryName, INSERT_PREFIX, TITLE_SEPARATOR,
};

fn test_config() -> Option<BenchConfig> {
    let url = std::env::var("DATABASE_URL").ok()?;
    Some(
        BenchConfig::new(BackendKind::Postgres, url)
            .with_number_of_ids(3)
            .with_concurrency(2),
    )
}

#[test]
fn test_postgres_adapter_contract() {
    let Some(cfg) = test_config() else {
        eprintln!("skipping postgres integration test; DATABASE_URL not set");
        return;
    };

    let mut adapter = PostgresAdapter::connect(&cfg).unwrap();
    adapter.setup_schema().unwrap();
    adapter.populate(&Dataset::demo()).unwrap();

    // Sampling respects the configured size and reuses movie ids for updates.
    let pool = adapter.load_ids(&cfg).unwrap();
    assert_eq!(pool.get(QueryName::GetUser).len(), 2);
    assert_eq!(pool.get(QueryName::GetMovie).len(), 3);
    assert_eq!(
        pool.get(QueryName::UpdateMovie),
        pool.get(QueryName::GetMovie)
    );
    assert_eq!(pool.get(QueryName::InsertUser), &[INSERT_PREFIX; 2]);

    // Derived documents match the handcrafted dataset.
    let movie: MovieDetail = serde_json::from_str(&adapter.get_movie("m1").unwrap()).unwrap();
    assert_eq!(movie.title, "First Light");
    assert!((movie.avg_rating.unwrap() - 11.0 / 3.0).abs() < 1e-9);
    let cast: Vec<&str> = movie.cast.iter().map(|c| c.full_name.as_str()).collect();
    assert_eq!(cast, vec!["Zoe Park", "Nora Quinn"]);
    let review_ids: Vec<&str> = movie.reviews.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(review_ids, vec!["r3", "r2", "r1"]);

    let reviewless: MovieDetail =
        serde_json::from_str(&adapter.get_movie("m2").unwrap()).unwrap();
    assert_eq!(reviewless.avg_rating, None);

    let bob: UserDetail = serde_json::from_str(&adapter.get_user("u2").unwrap()).unwrap();
    assert_eq!(bob.latest_reviews.len(), 10);
    assert_eq!(bob.latest_reviews[0].id, "rb11");

    // Update appends the suffix; the reset strips it back off.
    let updated: UpdatedMovie =
        serde_json::from_str(&adapter.update_movie("m1").unwrap()).unwrap();
    assert_eq!(updated.title, format!("First Light{}m1", TITLE_SEPARATOR));
    adapter.setup(&cfg, QueryName::UpdateMovie).unwrap();
    let restored: MovieDetail =
        serde_json::from_str(&adapter.get_movie("m1").unwrap()).unwrap();
    assert_eq!(restored.title, "First Light");

    // Insert, read back, clean up.
    adapter.setup(&cfg, QueryName::InsertUser).unwrap();
    let inserted: serde_json::Value =
        serde_json::from_str(&adapter.insert_user(INSERT_PREFIX).unwrap()).unwrap();
    let id = inserted["id"].as_str().unwrap().to_string();
    assert!(inserted["name"].as_str().unwrap().starts_with(INSERT_PREFIX));
    adapter.get_user(&id).unwrap();
    adapter.cleanup(&cfg, QueryName::InsertUser).unwrap();
    assert!(matches!(
        adapter.get_user(&id).unwrap_err(),
        Error::NotFound { .. }
    ));

    // Unknown ids map to the not-found error.
    assert!(matches!(
        adapter.get_person("missing").unwrap_err(),
        Error::NotFound { .. }
    ));

    adapter.close().unwrap();
}
