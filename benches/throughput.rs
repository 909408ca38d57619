use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use cinelog::{
    core::store::CatalogStore,
    movie::MovieDraft,
    performer::PerformerDraft,
};

fn movie(i: u64) -> MovieDraft {
    MovieDraft {
        title: format!("Movie {i}"),
        rating: (i % 101) as u32,
        country: "USA".to_string(),
        ..MovieDraft::default()
    }
}

fn performer(i: u64) -> PerformerDraft {
    PerformerDraft {
        first_name: format!("First{i}"),
        last_name: format!("Last{i}"),
        rating: (i % 101) as u32,
        ..PerformerDraft::default()
    }
}

fn bench_inserts(c: &mut Criterion) {
    c.bench_function("store_add_movie_50k", |b| {
        b.iter(|| {
            let mut store = CatalogStore::new();
            for i in 0..50_000u64 {
                let _ = store.add_movie(movie(i));
            }
        });
    });
}

fn bench_links(c: &mut Criterion) {
    c.bench_function("store_link_10k", |b| {
        b.iter(|| {
            let mut store = CatalogStore::new();
            let movies: Vec<_> = (0..1_000u64).map(|i| store.add_movie(movie(i))).collect();
            let performers: Vec<_> = (0..1_000u64)
                .map(|i| store.add_performer(performer(i)))
                .collect();
            for i in 0..10_000usize {
                let m = movies[i % movies.len()];
                let p = performers[(i * 7) % performers.len()];
                store.link(m, p).expect("link");
            }
        });
    });
}

fn bench_name_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_performer_by_name");
    let mut store = CatalogStore::new();
    for i in 0..50_000u64 {
        let _ = store.add_performer(performer(i));
    }

    for n in [10usize, 100usize, 1000usize] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                for i in 0..n {
                    let _ = store.find_performer_by_name(&format!("First{i} Last{i}"));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_inserts, bench_links, bench_name_lookup);
criterion_main!(benches);
