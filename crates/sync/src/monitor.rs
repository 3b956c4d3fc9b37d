//! Connectivity-edge triggered flushing
//!
//! The monitor consumes a reachability watch channel supplied by the host
//! (platform signal, periodic probe, test harness) and flushes the dispatcher
//! once per offline→online transition. It is an explicitly owned task: the
//! host keeps the `JoinHandle`, and the task ends when every sender of the
//! watch channel is dropped.

use crate::Dispatcher;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Flushes the dispatcher on offline→online reachability edges
pub struct ConnectivityMonitor {
    dispatcher: Arc<Dispatcher>,
    reachability: watch::Receiver<bool>,
}

impl ConnectivityMonitor {
    pub fn new(dispatcher: Arc<Dispatcher>, reachability: watch::Receiver<bool>) -> Self {
        Self {
            dispatcher,
            reachability,
        }
    }

    /// Spawn the monitor as an owned background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Watch reachability edges until the sender side is dropped
    ///
    /// Only the offline→online edge triggers a flush; going offline performs
    /// no delivery action and enqueues keep being accepted regardless.
    pub async fn run(mut self) {
        let mut online = *self.reachability.borrow();

        // A drain may already be warranted at startup
        if online {
            self.flush_once().await;
        }

        while self.reachability.changed().await.is_ok() {
            let now_online = *self.reachability.borrow_and_update();
            if now_online == online {
                continue;
            }
            online = now_online;

            if online {
                info!("Connectivity regained, draining pending queue");
                self.flush_once().await;
            } else {
                debug!("Connectivity lost, queue keeps accepting enqueues");
            }
        }

        debug!("Reachability channel closed, monitor stopping");
    }

    async fn flush_once(&self) {
        // Rapid flapping coalesces inside the dispatcher: a drain already in
        // flight turns this trigger into a no-op.
        let outcome = self.dispatcher.flush().await;
        debug!("Reconnect drain outcome: {:?}", outcome);
    }
}
