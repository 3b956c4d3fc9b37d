//! Queue drain loop with bounded retries
//!
//! At most one drain is in flight at any time. A flush arriving while a drain
//! is active is coalesced into a no-op; the in-flight drain re-examines the
//! queue on completion, so items enqueued mid-drain are still picked up.

use outbox_core::{QueueItem, RemoteGateway};
use outbox_store::PersistentQueue;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use ulid::Ulid;

/// Retry policy for failed deliveries
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total failed attempts before an item is dropped permanently
    pub max_attempts: u32,
    /// Drop permanently-rejected items (4xx class) on first failure rather
    /// than retrying them; false restores retry-then-drop parity with
    /// transient failures
    pub drop_rejected: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            drop_rejected: true,
        }
    }
}

/// Counts from one completed drain pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    pub retained: usize,
    pub dropped: usize,
}

/// Result of a flush call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The drain ran to completion
    Completed(DrainReport),
    /// Another drain was already in flight; this trigger coalesced to a no-op
    Skipped,
}

/// Drains the persistent queue through the remote gateway
pub struct Dispatcher {
    queue: Arc<PersistentQueue>,
    gateway: Arc<dyn RemoteGateway>,
    policy: RetryPolicy,
    /// Exclusive in-flight marker: held for the duration of one drain pass,
    /// released on every exit path by guard scoping
    in_flight: Mutex<()>,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<PersistentQueue>,
        gateway: Arc<dyn RemoteGateway>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            queue,
            gateway,
            policy,
            in_flight: Mutex::new(()),
        }
    }

    /// Attempt delivery of every queued item, in enqueue order
    ///
    /// Successful items are removed; failed items are retained until their
    /// attempt count reaches the bound, then dropped — an accepted data-loss
    /// boundary. Returns `Skipped` if a drain is already in flight.
    pub async fn flush(&self) -> DrainOutcome {
        let _guard = match self.in_flight.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Drain already in flight, coalescing trigger");
                return DrainOutcome::Skipped;
            }
        };

        let mut report = DrainReport::default();
        let mut seen: HashSet<Ulid> = HashSet::new();

        // Completion of a pass is the trigger for evaluating whether another
        // pass is needed: items that arrived mid-pass get one too. Items we
        // already attempted this flush wait for a later trigger.
        loop {
            let pass: Vec<QueueItem> = self
                .queue
                .drain()
                .into_iter()
                .filter(|item| !seen.contains(&item.id))
                .collect();

            if pass.is_empty() {
                break;
            }

            for item in pass {
                seen.insert(item.id);
                self.attempt(item, &mut report).await;

                // Yield between attempts so other work can interleave
                tokio::task::yield_now().await;
            }
        }

        debug!(
            "Drain complete: {} delivered, {} retained, {} dropped",
            report.delivered, report.retained, report.dropped
        );
        DrainOutcome::Completed(report)
    }

    async fn attempt(&self, item: QueueItem, report: &mut DrainReport) {
        match self.gateway.deliver(&item.target, &item.payload).await {
            Ok(()) => {
                self.queue.remove(&item.id);
                report.delivered += 1;
                debug!("Delivered {} {} ({})", item.target.verb, item.target.resource, item.id);
            }
            Err(e) if e.is_permanent() && self.policy.drop_rejected => {
                self.queue.remove(&item.id);
                report.dropped += 1;
                warn!("Dropping rejected item {}: {}", item.id, e);
            }
            Err(e) => match self.queue.bump_attempts(&item.id) {
                Some(attempts) if attempts >= self.policy.max_attempts => {
                    self.queue.remove(&item.id);
                    report.dropped += 1;
                    warn!(
                        "Dropping item {} after {} failed attempts: {}",
                        item.id, attempts, e
                    );
                }
                Some(attempts) => {
                    report.retained += 1;
                    debug!(
                        "Delivery of {} failed (attempt {}/{}), retaining: {}",
                        item.id, attempts, self.policy.max_attempts, e
                    );
                }
                // Item vanished from the queue between drain and failure
                None => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use outbox_core::{GatewayError, MemoryGateway, MemoryStorage, ProgressSnapshot, Target, Verb};
    use serde_json::{json, Value};
    use tokio::sync::Semaphore;

    fn make_queue() -> Arc<PersistentQueue> {
        Arc::new(PersistentQueue::open(Arc::new(MemoryStorage::new())))
    }

    fn target(resource: &str) -> Target {
        Target::new(resource, Verb::Post)
    }

    #[tokio::test]
    async fn test_drain_delivers_in_order_exactly_once() {
        let queue = make_queue();
        let gateway = Arc::new(MemoryGateway::new());
        let dispatcher = Dispatcher::new(queue.clone(), gateway.clone(), RetryPolicy::default());

        queue.enqueue(target("/a"), json!({"n": 1}));
        queue.enqueue(target("/b"), json!({"n": 2}));
        queue.enqueue(target("/c"), json!({"n": 3}));

        let outcome = dispatcher.flush().await;
        assert_eq!(
            outcome,
            DrainOutcome::Completed(DrainReport {
                delivered: 3,
                retained: 0,
                dropped: 0,
            })
        );

        let resources: Vec<_> = gateway
            .delivered()
            .into_iter()
            .map(|(t, _)| t.resource)
            .collect();
        assert_eq!(resources, vec!["/a", "/b", "/c"]);
        assert!(queue.is_empty());

        // Nothing left for a second drain
        let outcome = dispatcher.flush().await;
        assert_eq!(outcome, DrainOutcome::Completed(DrainReport::default()));
        assert_eq!(gateway.delivered().len(), 3);
    }

    #[tokio::test]
    async fn test_transient_failure_retains_item() {
        let queue = make_queue();
        let gateway = Arc::new(MemoryGateway::new());
        let dispatcher = Dispatcher::new(queue.clone(), gateway.clone(), RetryPolicy::default());

        queue.enqueue(target("/a"), json!({}));
        gateway.fail_deliveries(1, GatewayError::Server(503));

        let outcome = dispatcher.flush().await;
        assert_eq!(
            outcome,
            DrainOutcome::Completed(DrainReport {
                delivered: 0,
                retained: 1,
                dropped: 0,
            })
        );
        assert_eq!(queue.drain()[0].attempts, 1);

        // Next drain succeeds
        let outcome = dispatcher.flush().await;
        assert_eq!(
            outcome,
            DrainOutcome::Completed(DrainReport {
                delivered: 1,
                retained: 0,
                dropped: 0,
            })
        );
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_item_dropped_after_five_failures() {
        let queue = make_queue();
        let gateway = Arc::new(MemoryGateway::new());
        let dispatcher = Dispatcher::new(queue.clone(), gateway.clone(), RetryPolicy::default());

        queue.enqueue(target("/a"), json!({}));
        gateway.fail_deliveries(5, GatewayError::Transport("unreachable".into()));

        for _ in 0..4 {
            dispatcher.flush().await;
            assert_eq!(queue.len(), 1, "item should be retained before the bound");
        }

        // Fifth failure crosses the bound: gone from every later drain
        dispatcher.flush().await;
        assert!(queue.is_empty());
        assert!(gateway.delivered().is_empty());

        let outcome = dispatcher.flush().await;
        assert_eq!(outcome, DrainOutcome::Completed(DrainReport::default()));
    }

    #[tokio::test]
    async fn test_rejected_item_drops_without_retries() {
        let queue = make_queue();
        let gateway = Arc::new(MemoryGateway::new());
        let dispatcher = Dispatcher::new(queue.clone(), gateway.clone(), RetryPolicy::default());

        queue.enqueue(target("/a"), json!({}));
        gateway.fail_deliveries(1, GatewayError::Rejected(422));

        let outcome = dispatcher.flush().await;
        assert_eq!(
            outcome,
            DrainOutcome::Completed(DrainReport {
                delivered: 0,
                retained: 0,
                dropped: 1,
            })
        );
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_item_retries_under_compat_policy() {
        let queue = make_queue();
        let gateway = Arc::new(MemoryGateway::new());
        let policy = RetryPolicy {
            drop_rejected: false,
            ..RetryPolicy::default()
        };
        let dispatcher = Dispatcher::new(queue.clone(), gateway.clone(), policy);

        queue.enqueue(target("/a"), json!({}));
        gateway.fail_deliveries(1, GatewayError::Rejected(422));

        let outcome = dispatcher.flush().await;
        assert_eq!(
            outcome,
            DrainOutcome::Completed(DrainReport {
                delivered: 0,
                retained: 1,
                dropped: 0,
            })
        );
        assert_eq!(queue.drain()[0].attempts, 1);
    }

    /// Gateway whose deliveries block until the test hands out permits
    struct GatedGateway {
        inner: MemoryGateway,
        gate: Semaphore,
    }

    impl GatedGateway {
        fn new() -> Self {
            Self {
                inner: MemoryGateway::new(),
                gate: Semaphore::new(0),
            }
        }
    }

    #[async_trait]
    impl RemoteGateway for GatedGateway {
        async fn read(&self, owner_id: &str) -> Result<Option<ProgressSnapshot>, GatewayError> {
            self.inner.read(owner_id).await
        }

        async fn upsert(
            &self,
            owner_id: &str,
            step: u64,
            data: &Value,
        ) -> Result<(), GatewayError> {
            self.inner.upsert(owner_id, step, data).await
        }

        async fn deliver(&self, target: &Target, payload: &Value) -> Result<(), GatewayError> {
            self.gate.acquire().await.unwrap().forget();
            self.inner.deliver(target, payload).await
        }
    }

    #[tokio::test]
    async fn test_flush_during_active_drain_is_skipped() {
        let queue = make_queue();
        let gateway = Arc::new(GatedGateway::new());
        let dispatcher = Arc::new(Dispatcher::new(
            queue.clone(),
            gateway.clone(),
            RetryPolicy::default(),
        ));

        queue.enqueue(target("/a"), json!({}));

        // First drain blocks inside its delivery attempt
        let first = tokio::spawn({
            let dispatcher = dispatcher.clone();
            async move { dispatcher.flush().await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        // Triggers during the active drain coalesce to no-ops
        assert_eq!(dispatcher.flush().await, DrainOutcome::Skipped);
        assert_eq!(dispatcher.flush().await, DrainOutcome::Skipped);

        gateway.gate.add_permits(1);
        let outcome = first.await.unwrap();
        assert_eq!(
            outcome,
            DrainOutcome::Completed(DrainReport {
                delivered: 1,
                retained: 0,
                dropped: 0,
            })
        );

        // No item delivered more than once
        assert_eq!(gateway.inner.delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_items_enqueued_mid_drain_get_a_follow_up_pass() {
        let queue = make_queue();
        let gateway = Arc::new(GatedGateway::new());
        let dispatcher = Arc::new(Dispatcher::new(
            queue.clone(),
            gateway.clone(),
            RetryPolicy::default(),
        ));

        queue.enqueue(target("/a"), json!({}));

        let flush = tokio::spawn({
            let dispatcher = dispatcher.clone();
            async move { dispatcher.flush().await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        // Arrives while the drain is blocked on /a
        queue.enqueue(target("/b"), json!({}));
        gateway.gate.add_permits(2);

        let outcome = flush.await.unwrap();
        assert_eq!(
            outcome,
            DrainOutcome::Completed(DrainReport {
                delivered: 2,
                retained: 0,
                dropped: 0,
            })
        );

        let resources: Vec<_> = gateway
            .inner
            .delivered()
            .into_iter()
            .map(|(t, _)| t.resource)
            .collect();
        assert_eq!(resources, vec!["/a", "/b"]);
    }
}
