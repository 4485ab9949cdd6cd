//! Query benchmarks for the SQLite adapter.
//!
//! Exercises each workload operation against an in-memory database, cycling
//! through a sampled id pool the way the external driver does.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use moviebench_backends::{Scale, SqliteAdapter};
use moviebench_core::{BenchConfig, IdPool, QueryAdapter, QueryName};

fn sample_pool(adapter: &SqliteAdapter, number_of_ids: usize) -> IdPool {
    let cfg = BenchConfig::sqlite_in_memory().with_number_of_ids(number_of_ids);
    adapter.load_ids(&cfg).unwrap()
}

fn bench_point_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("sqlite/point_reads");

    for &scale in &[Scale::Tiny, Scale::Small] {
        let name = format!("{:?}", scale);
        let adapter = SqliteAdapter::with_scale(scale).unwrap();
        let pool = sample_pool(&adapter, 25);

        group.bench_with_input(BenchmarkId::new("get_user", &name), &(), |b, _| {
            let mut ids = pool.get(QueryName::GetUser).iter().cycle();
            b.iter(|| {
                let json = adapter.get_user(ids.next().unwrap()).unwrap();
                black_box(json.len());
            });
        });

        group.bench_with_input(BenchmarkId::new("get_movie", &name), &(), |b, _| {
            let mut ids = pool.get(QueryName::GetMovie).iter().cycle();
            b.iter(|| {
                let json = adapter.get_movie(ids.next().unwrap()).unwrap();
                black_box(json.len());
            });
        });

        group.bench_with_input(BenchmarkId::new("get_person", &name), &(), |b, _| {
            let mut ids = pool.get(QueryName::GetPerson).iter().cycle();
            b.iter(|| {
                let json = adapter.get_person(ids.next().unwrap()).unwrap();
                black_box(json.len());
            });
        });
    }

    group.finish();
}

fn bench_mutations(c: &mut Criterion) {
    let mut group = c.benchmark_group("sqlite/mutations");

    let cfg = BenchConfig::sqlite_in_memory().with_number_of_ids(25);
    let adapter = SqliteAdapter::with_scale(Scale::Small).unwrap();
    let pool = adapter.load_ids(&cfg).unwrap();

    group.bench_function("update_movie", |b| {
        adapter.setup(&cfg, QueryName::UpdateMovie).unwrap();
        let mut ids = pool.get(QueryName::UpdateMovie).iter().cycle();
        b.iter(|| {
            let json = adapter.update_movie(ids.next().unwrap()).unwrap();
            black_box(json.len());
        });
        adapter.cleanup(&cfg, QueryName::UpdateMovie).unwrap();
    });

    group.bench_function("insert_user", |b| {
        adapter.setup(&cfg, QueryName::InsertUser).unwrap();
        let seeds = pool.get(QueryName::InsertUser);
        b.iter(|| {
            let json = adapter.insert_user(&seeds[0]).unwrap();
            black_box(json.len());
        });
        adapter.cleanup(&cfg, QueryName::InsertUser).unwrap();
    });

    group.finish();
}

fn bench_load_ids(c: &mut Criterion) {
    let mut group = c.benchmark_group("sqlite/load_ids");

    let adapter = SqliteAdapter::with_scale(Scale::Small).unwrap();

    for number_of_ids in [10, 50] {
        let cfg = BenchConfig::sqlite_in_memory().with_number_of_ids(number_of_ids);
        group.bench_with_input(
            BenchmarkId::from_parameter(number_of_ids),
            &cfg,
            |b, cfg| {
                b.iter(|| {
                    let pool = adapter.load_ids(cfg).unwrap();
                    black_box(pool.len());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_point_reads, bench_mutations, bench_load_ids);
criterion_main!(benches);
