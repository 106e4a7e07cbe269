//! Benchmarks for the plane cache.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use plane_cache::cache::Cache;
use plane_cache::raster;
use plane_cache::source::FnSource;
use plane_cache::strategy::{CacheStrategy, Neighborhood};

fn strategy(neighborhood: Neighborhood) -> CacheStrategy {
    // z, c, t stack with a wide z window.
    let mut strategy = CacheStrategy::new(neighborhood, vec![64, 4, 100]).unwrap();
    strategy.set_range(0, 8).unwrap();
    strategy.set_range(1, 3).unwrap();
    strategy.set_range(2, 2).unwrap();
    strategy
}

fn bench_strategy_rebuild(c: &mut Criterion) {
    let mut rectangle = strategy(Neighborhood::Rectangle);

    c.bench_function("rectangle_rank_rebuild_3d", |b| {
        b.iter(|| {
            rectangle.set_range(0, black_box(8)).unwrap();
            black_box(rectangle.candidate_offsets().len());
        })
    });
}

fn bench_load_list(c: &mut Criterion) {
    let crosshair = strategy(Neighborhood::Crosshair);
    let rectangle = strategy(Neighborhood::Rectangle);
    let pos = [32, 2, 50];

    c.bench_function("crosshair_load_list_3d", |b| {
        b.iter(|| black_box(crosshair.load_list(black_box(&pos)).unwrap()))
    });

    c.bench_function("rectangle_load_list_3d", |b| {
        b.iter(|| black_box(rectangle.load_list(black_box(&pos)).unwrap()))
    });
}

fn bench_raster(c: &mut Criterion) {
    let lengths = [64, 4, 100];

    c.bench_function("raster_encode_decode_25k", |b| {
        b.iter(|| {
            for index in 0..25_600 {
                let pos = raster::raster_to_position(&lengths, index).unwrap();
                black_box(raster::position_to_raster(&lengths, &pos).unwrap());
            }
        })
    });
}

fn bench_recache_walk(c: &mut Criterion) {
    let count = 64 * 4 * 100;
    let mut cache = Cache::new(
        strategy(Neighborhood::Rectangle),
        FnSource::new(count, |i| Ok(i)),
        false,
    )
    .unwrap();

    // Step along t so each sweep drops one slab and loads one.
    c.bench_function("rectangle_recache_walk_t", |b| {
        let mut t = 0;
        b.iter(|| {
            t = (t + 1) % 100;
            cache.set_position(&[32, 2, t]).unwrap();
            cache.recache_all().unwrap();
            black_box(cache.resident_count());
        })
    });
}

criterion_group!(
    benches,
    bench_strategy_rebuild,
    bench_load_list,
    bench_raster,
    bench_recache_walk,
);
criterion_main!(benches);
