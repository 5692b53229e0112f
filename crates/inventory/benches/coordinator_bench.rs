use std::sync::Arc;

use chrono::NaiveDate;
use common::{DateRange, HotelId, RequestId, RoomType};
use criterion::{Criterion, criterion_group, criterion_main};
use inventory::{AvailabilityCoordinator, InMemoryRoomStore, NewRoom, RoomSelector};

fn stay() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 9, 2).unwrap(),
    )
}

async fn populated(rooms: usize) -> Arc<AvailabilityCoordinator<InMemoryRoomStore>> {
    let store = InMemoryRoomStore::new();
    for i in 0..rooms {
        store
            .seed(
                NewRoom::new(HotelId::new(1), format!("{i}"), RoomType::Double, 10_000),
                (i % 17) as u32,
            )
            .await
            .unwrap();
    }
    Arc::new(AvailabilityCoordinator::new(store))
}

fn bench_confirm_fresh_request(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let coordinator = rt.block_on(populated(1));
    let room_id = rt.block_on(coordinator.available_rooms()).unwrap()[0].id();

    c.bench_function("coordinator/confirm_fresh_request", |b| {
        b.iter(|| {
            rt.block_on(async {
                coordinator
                    .confirm(room_id, RequestId::generate(), stay())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_confirm_replayed_request(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let coordinator = rt.block_on(populated(1));
    let room_id = rt.block_on(coordinator.available_rooms()).unwrap()[0].id();
    let request_id = RequestId::new("bench-replay");
    rt.block_on(coordinator.confirm(room_id, request_id.clone(), stay()))
        .unwrap();

    c.bench_function("coordinator/confirm_replayed_request", |b| {
        b.iter(|| {
            rt.block_on(async {
                coordinator
                    .confirm(room_id, request_id.clone(), stay())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_select_optimal_500_rooms(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let selector = RoomSelector::new(rt.block_on(populated(500)));

    c.bench_function("selector/select_optimal_500_rooms", |b| {
        b.iter(|| {
            rt.block_on(async {
                selector
                    .select_optimal(HotelId::new(1), RoomType::Double)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_recommend_500_rooms(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let selector = RoomSelector::new(rt.block_on(populated(500)));

    c.bench_function("selector/recommend_500_rooms", |b| {
        b.iter(|| {
            rt.block_on(async {
                selector.recommend().await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_confirm_fresh_request,
    bench_confirm_replayed_request,
    bench_select_optimal_500_rooms,
    bench_recommend_500_rooms
);
criterion_main!(benches);
