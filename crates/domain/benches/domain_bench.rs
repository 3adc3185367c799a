use criterion::{Criterion, criterion_group, criterion_main};
use document_store::{Document, InMemoryDocumentStore, DocumentStoreExt};
use domain::{
    CustomerId, LineItem, Money, OrderAggregator, RawOrder, flatten_items, paths,
    placed_totals_of, stage_total,
};
use serde_json::json;

fn make_orders(count: usize, items_each: usize) -> Vec<RawOrder> {
    (0..count)
        .map(|o| {
            RawOrder::new(
                (0..items_each)
                    .map(|i| LineItem::new(format!("Item {o}-{i}"), Money::from_cents(8950), 3))
                    .collect(),
            )
        })
        .collect()
}

fn bench_placed_totals(c: &mut Criterion) {
    let orders = make_orders(100, 10);

    c.bench_function("domain/placed_totals_1000_items", |b| {
        b.iter(|| placed_totals_of(&orders));
    });
}

fn bench_stage_total(c: &mut Criterion) {
    let orders = make_orders(100, 10);

    c.bench_function("domain/flatten_and_stage_total_1000_items", |b| {
        b.iter(|| stage_total(&flatten_items(&orders)));
    });
}

fn bench_decode_raw_order(c: &mut Criterion) {
    let doc = Document::new(
        paths::orders(&CustomerId::new("C1")).doc("o1"),
        json!({
            "items": (0..20)
                .map(|i| json!({"name": format!("Item {i}"), "price": 89.5, "qty": 2, "barcode": format!("bc{i}")}))
                .collect::<Vec<_>>()
        }),
    );

    c.bench_function("domain/decode_raw_order_20_items", |b| {
        b.iter(|| RawOrder::from_document(&doc));
    });
}

fn bench_aggregate_from_store(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryDocumentStore::new();
    let customer = CustomerId::new("C1");
    rt.block_on(async {
        for o in 0..50 {
            store
                .set(
                    paths::orders(&customer).doc(format!("o{o}")),
                    json!({"items": [{"name": "Kibble", "price": 100, "qty": 3}]}),
                )
                .await
                .unwrap();
        }
    });
    let aggregator = OrderAggregator::new(store);

    c.bench_function("domain/placed_totals_from_store_50_orders", |b| {
        b.iter(|| {
            rt.block_on(async {
                aggregator.placed_totals(&customer).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_placed_totals,
    bench_stage_total,
    bench_decode_raw_order,
    bench_aggregate_from_store
);
criterion_main!(benches);
