//! End-to-end offline flow against a sled-backed store

use outbox_core::{MemoryGateway, ProgressSnapshot, RemoteGateway, StorageBackend, Target, Verb};
use outbox_store::{PersistentQueue, SledStorage, SnapshotCache};
use outbox_sync::{ConnectivityMonitor, Dispatcher, Reconciler, RetryPolicy};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

fn open_storage(temp_dir: &TempDir) -> Arc<dyn StorageBackend> {
    Arc::new(SledStorage::open(&temp_dir.path().join("outbox.db")).unwrap())
}

#[tokio::test]
async fn test_offline_enqueues_survive_restart_and_drain_in_order() {
    let temp_dir = TempDir::new().unwrap();

    // Session one: offline, user keeps working
    {
        let queue = PersistentQueue::open(open_storage(&temp_dir));
        queue.enqueue(
            Target::new("/api/v1/packages/1/status", Verb::Put),
            json!({"status": "delivered"}),
        );
        queue.enqueue(
            Target::new("/api/v1/packages/2/status", Verb::Put),
            json!({"status": "attempted"}),
        );
        queue.enqueue(
            Target::new("/api/v1/notes", Verb::Post),
            json!({"text": "gate code 4411"}),
        );
    }

    // Session two: process restarted, connectivity comes back
    let queue = Arc::new(PersistentQueue::open(open_storage(&temp_dir)));
    assert_eq!(queue.len(), 3);

    let gateway = Arc::new(MemoryGateway::new());
    let dispatcher = Arc::new(Dispatcher::new(
        queue.clone(),
        gateway.clone(),
        RetryPolicy::default(),
    ));

    let (tx, rx) = watch::channel(false);
    let handle = ConnectivityMonitor::new(dispatcher, rx).spawn();

    tx.send(true).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let resources: Vec<_> = gateway
        .delivered()
        .into_iter()
        .map(|(t, _)| t.resource)
        .collect();
    assert_eq!(
        resources,
        vec![
            "/api/v1/packages/1/status",
            "/api/v1/packages/2/status",
            "/api/v1/notes",
        ]
    );
    assert!(queue.is_empty());

    drop(tx);
    handle.await.unwrap();
}

#[tokio::test]
async fn test_resume_then_advance_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let storage = open_storage(&temp_dir);

    let cache = Arc::new(SnapshotCache::new(storage.clone()));
    let gateway = Arc::new(MemoryGateway::new());
    gateway.seed_snapshot(ProgressSnapshot::new("driver-7", 12, json!({"route": "B"})));

    let reconciler = Reconciler::new(cache.clone(), gateway.clone());

    // Resume adopts the remote snapshot
    let winner = reconciler.resume("driver-7").await.unwrap().unwrap();
    assert_eq!(winner.step, 12);

    // Advance is confirmed remotely before it lands in the cache
    reconciler
        .advance("driver-7", 13, json!({"route": "B", "stop": 4}))
        .await
        .unwrap();
    assert_eq!(gateway.read("driver-7").await.unwrap().unwrap().step, 13);

    // The cached copy survives a restart of the local store
    drop(reconciler);
    drop(cache);
    drop(storage);
    let cache = SnapshotCache::new(open_storage(&temp_dir));
    assert_eq!(cache.load("driver-7").unwrap().unwrap().step, 13);
}

#[tokio::test]
async fn test_poison_item_drops_while_rest_deliver() {
    let temp_dir = TempDir::new().unwrap();
    let queue = Arc::new(PersistentQueue::open(open_storage(&temp_dir)));
    let gateway = Arc::new(MemoryGateway::new());
    let dispatcher = Dispatcher::new(queue.clone(), gateway.clone(), RetryPolicy::default());

    // First item is rejected outright, the rest go through
    queue.enqueue(Target::new("/api/v1/bad", Verb::Post), json!({"broken": true}));
    queue.enqueue(Target::new("/api/v1/good", Verb::Post), json!({}));
    gateway.fail_deliveries(1, outbox_core::GatewayError::Rejected(422));

    dispatcher.flush().await;

    let resources: Vec<_> = gateway
        .delivered()
        .into_iter()
        .map(|(t, _)| t.resource)
        .collect();
    assert_eq!(resources, vec!["/api/v1/good"]);
    assert!(queue.is_empty());
}
