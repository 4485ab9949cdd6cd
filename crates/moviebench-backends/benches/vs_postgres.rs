//! PostgreSQL comparison benchmarks.
//!
//! Requires:
//! - `--features postgres` flag
//! - `DATABASE_URL` environment variable
//!
//! Example: DATABASE_URL=postgres://localhost/moviebench cargo bench --bench vs_postgres --features postgres
//!
//! Both backends serve the same generated dataset, so the measured work is
//! the identical document per operation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use moviebench_backends::{Dataset, PostgresAdapter, Scale, SqliteAdapter};
use moviebench_core::{BackendKind, BenchConfig, IdPool, QueryAdapter, QueryName};

fn postgres_config() -> BenchConfig {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL environment variable not set");
    BenchConfig::new(BackendKind::Postgres, url).with_number_of_ids(25)
}

fn setup_backends() -> (SqliteAdapter, PostgresAdapter, IdPool, IdPool, BenchConfig) {
    let data = Dataset::generate(Scale::Small);

    let sqlite_cfg = BenchConfig::sqlite_in_memory().with_number_of_ids(25);
    let mut sqlite = SqliteAdapter::connect(&sqlite_cfg).unwrap();
    sqlite.populate(&data).unwrap();
    let sqlite_pool = sqlite.load_ids(&sqlite_cfg).unwrap();

    let pg_cfg = postgres_config();
    let postgres = PostgresAdapter::connect(&pg_cfg).unwrap();
    postgres.setup_schema().unwrap();
    postgres.populate(&data).unwrap();
    let pg_pool = postgres.load_ids(&pg_cfg).unwrap();

    (sqlite, postgres, sqlite_pool, pg_pool, pg_cfg)
}

fn bench_get_movie(c: &mut Criterion) {
    let mut group = c.benchmark_group("vs_postgres/get_movie");
    let (sqlite, postgres, sqlite_pool, pg_pool, _) = setup_backends();

    group.bench_function("sqlite", |b| {
        let mut ids = sqlite_pool.get(QueryName::GetMovie).iter().cycle();
        b.iter(|| {
            let json = sqlite.get_movie(ids.next().unwrap()).unwrap();
            black_box(json.len());
        });
    });

    group.bench_function("postgres", |b| {
        let mut ids = pg_pool.get(QueryName::GetMovie).iter().cycle();
        b.iter(|| {
            let json = postgres.get_movie(ids.next().unwrap()).unwrap();
            black_box(json.len());
        });
    });

    group.finish();
}

fn bench_get_user(c: &mut Criterion) {
    let mut group = c.benchmark_group("vs_postgres/get_user");
    let (sqlite, postgres, sqlite_pool, pg_pool, _) = setup_backends();

    group.bench_function("sqlite", |b| {
        let mut ids = sqlite_pool.get(QueryName::GetUser).iter().cycle();
        b.iter(|| {
            let json = sqlite.get_user(ids.next().unwrap()).unwrap();
            black_box(json.len());
        });
    });

    group.bench_function("postgres", |b| {
        let mut ids = pg_pool.get(QueryName::GetUser).iter().cycle();
        b.iter(|| {
            let json = postgres.get_user(ids.next().unwrap()).unwrap();
            black_box(json.len());
        });
    });

    group.finish();
}

fn bench_update_movie(c: &mut Criterion) {
    let mut group = c.benchmark_group("vs_postgres/update_movie");
    let (sqlite, postgres, sqlite_pool, pg_pool, pg_cfg) = setup_backends();
    let sqlite_cfg = BenchConfig::sqlite_in_memory().with_number_of_ids(25);

    group.bench_function("sqlite", |b| {
        sqlite.setup(&sqlite_cfg, QueryName::UpdateMovie).unwrap();
        let mut ids = sqlite_pool.get(QueryName::UpdateMovie).iter().cycle();
        b.iter(|| {
            let json = sqlite.update_movie(ids.next().unwrap()).unwrap();
            black_box(json.len());
        });
        sqlite.cleanup(&sqlite_cfg, QueryName::UpdateMovie).unwrap();
    });

    group.bench_function("postgres", |b| {
        postgres.setup(&pg_cfg, QueryName::UpdateMovie).unwrap();
        let mut ids = pg_pool.get(QueryName::UpdateMovie).iter().cycle();
        b.iter(|| {
            let json = postgres.update_movie(ids.next().unwrap()).unwrap();
            black_box(json.len());
        });
        postgres.cleanup(&pg_cfg, QueryName::UpdateMovie).unwrap();
    });

    group.finish();
}

criterion_group!(benches, bench_get_movie, bench_get_user, bench_update_movie);
criterion_main!(benches);
