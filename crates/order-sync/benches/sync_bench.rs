use std::hint::black_box;

use common::OrderId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{IncomingOrderEvent, OrderEventName};
use event_store::InMemoryEventStore;
use order_store::InMemoryOrderStore;
use order_sync::{BatchConfig, BatchProcessor, Message, SyncEngine};

fn body(order_id: &str, event_name: OrderEventName) -> String {
    serde_json::json!({
        "eventName": event_name.as_str(),
        "eventData": {
            "orderId": order_id,
            "sku": "SKU-BENCH",
            "units": 1,
            "price": 1000,
            "userId": "user-bench"
        },
        "createdAt": "2024-06-01T08:00:00Z",
        "updatedAt": "2024-06-01T08:00:00Z"
    })
    .to_string()
}

fn new_processor() -> BatchProcessor<InMemoryOrderStore, InMemoryEventStore> {
    BatchProcessor::new(
        SyncEngine::new(InMemoryOrderStore::new(), InMemoryEventStore::new()),
        BatchConfig::default(),
    )
}

fn bench_sync_placed(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let engine = SyncEngine::new(InMemoryOrderStore::new(), InMemoryEventStore::new());

    c.bench_function("sync/placed_new_order", |b| {
        b.iter(|| {
            let order_id = OrderId::generate();
            let event: IncomingOrderEvent =
                serde_json::from_str(&body(order_id.as_str(), OrderEventName::Placed)).unwrap();
            rt.block_on(async { black_box(engine.sync_order(&event).await.unwrap()) });
        });
    });
}

fn bench_redelivered_placed(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let engine = SyncEngine::new(InMemoryOrderStore::new(), InMemoryEventStore::new());
    let event: IncomingOrderEvent =
        serde_json::from_str(&body("order-bench", OrderEventName::Placed)).unwrap();
    rt.block_on(async { engine.sync_order(&event).await.unwrap() });

    c.bench_function("sync/redelivered_placed", |b| {
        b.iter(|| {
            rt.block_on(async { black_box(engine.sync_order(&event).await.unwrap()) });
        });
    });
}

fn bench_batch_lifecycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let lifecycle = [
        OrderEventName::Placed,
        OrderEventName::StockAllocated,
        OrderEventName::PaymentAccepted,
        OrderEventName::Shipped,
        OrderEventName::Delivered,
    ];

    c.bench_function("sync/batch_of_50_orders", |b| {
        b.iter(|| {
            let processor = new_processor();
            rt.block_on(async {
                for event_name in lifecycle {
                    let batch = (0..50)
                        .map(|i| {
                            let order_id = format!("order-{i}");
                            Message::new(format!("{order_id}-{event_name}"), body(&order_id, event_name))
                        })
                        .collect();
                    black_box(processor.process_batch(batch).await);
                }
            });
        });
    });
}

criterion_group!(
    benches,
    bench_sync_placed,
    bench_redelivered_placed,
    bench_batch_lifecycle
);
criterion_main!(benches);
