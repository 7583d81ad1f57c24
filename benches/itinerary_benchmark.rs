use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use travel_portal_core::{
    itinerary::{
        ItineraryAction, ItineraryData, ItineraryItem, ItineraryKind, ItineraryStore,
        LayoutMetrics,
    },
    pricing::{from_price, resolve_price, PriceFields},
};

fn itinerary_with(stops: usize) -> ItineraryData {
    let mut data = ItineraryData::new("Bench trip", "Hotel", "Airport");
    for i in 0..stops {
        let kind = if i % 3 == 2 {
            ItineraryKind::Route
        } else {
            ItineraryKind::Activity
        };
        let mut item = ItineraryItem::new(format!("stop-{i}"), kind, format!("Stop {i}"))
            .with_description("First line\nSecond line");
        if kind == ItineraryKind::Activity && i % 2 == 0 {
            item = item.with_sub_items(vec![
                ItineraryItem::new(format!("stop-{i}-a"), ItineraryKind::SubActivity, "Photo stop"),
                ItineraryItem::new(format!("stop-{i}-b"), ItineraryKind::SubActivity, "Snack"),
            ]);
        }
        data.items.push(item);
    }
    data
}

// Timeline layout for increasingly long itineraries
pub fn layout_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("itinerary_layout");
    let metrics = LayoutMetrics::default();

    for stops in [5, 50, 500].iter() {
        let data = itinerary_with(*stops);
        group.bench_with_input(BenchmarkId::from_parameter(stops), &data, |b, data| {
            b.iter(|| metrics.layout(black_box(data)))
        });
    }
    group.finish();
}

// Reordering through the store clones the itinerary for every action
pub fn dispatch_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("itinerary_dispatch");

    for stops in [5, 50, 500].iter() {
        let store = ItineraryStore::new(itinerary_with(*stops));
        let id = format!("stop-{}", stops / 2);
        group.bench_with_input(BenchmarkId::from_parameter(stops), &id, |b, id| {
            b.iter(|| {
                let _ = store.dispatch(ItineraryAction::MoveUp(id.clone()));
                let _ = store.dispatch(ItineraryAction::MoveDown(id.clone()));
            })
        });
    }
    group.finish();
}

// Price fallback over a page of listing cards
pub fn pricing_benchmark(c: &mut Criterion) {
    let prices: Vec<PriceFields> = (0..100)
        .map(|i| PriceFields {
            price_after_discount: (i % 4 == 0).then_some(80.0 + i as f64),
            normal_price: (i % 2 == 0).then_some(100.0 + i as f64),
            price_per_person: Some(90.0 + i as f64),
            currency: Some("EUR".to_string()),
            ..Default::default()
        })
        .collect();

    c.bench_function("resolve_price_page", |b| {
        b.iter(|| {
            for fields in &prices {
                black_box(resolve_price(black_box(fields)));
            }
        })
    });
    c.bench_function("from_price_page", |b| {
        b.iter(|| from_price(black_box(&prices)))
    });
}

criterion_group!(benches, layout_benchmark, dispatch_benchmark, pricing_benchmark);
criterion_main!(benches);
