use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use costume_rental_client::booking::DateRange;
use costume_rental_client::catalog::{CatalogItem, CatalogSnapshot};

// These run on every date-input keystroke and dialog open, so they should
// stay well under a millisecond even for a large catalog.
fn snapshot_lookup_benchmark(c: &mut Criterion) {
    let items = (0..1000)
        .map(|i| CatalogItem {
            id: i,
            title: format!("Costume {i}"),
            description: None,
            price: 1500.0,
            available: true,
            image_url: None,
        })
        .collect();
    let snapshot = CatalogSnapshot::new(items);

    c.bench_function("snapshot_title_lookup", |b| {
        b.iter(|| {
            for id in [0u32, 499, 999, 5000] {
                black_box(snapshot.title_for(black_box(id)));
            }
        })
    });
}

fn date_range_benchmark(c: &mut Criterion) {
    let from = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

    c.bench_function("date_range_validation", |b| {
        b.iter(|| {
            black_box(DateRange::new(black_box(from), black_box(to)).is_ok());
            black_box(DateRange::new(black_box(to), black_box(from)).is_err());
        })
    });
}

criterion_group!(benches, snapshot_lookup_benchmark, date_range_benchmark);
criterion_main!(benches);
