//! Process-wide "projects changed" notification.
//!
//! Publishers call [`RefreshBridge::publish`] after a successful sync; every
//! subscribed view reloads its project list. Delivery is synchronous, in
//! subscription order, with no payload and no replay for late subscribers.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;

/// What changed; currently a single topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshEvent {
    ProjectsUpdated,
}

type Handler = Arc<dyn Fn(&RefreshEvent) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

/// Broadcasts refresh events to subscribed handlers
#[derive(Clone, Default)]
pub struct RefreshBridge {
    registry: Arc<Mutex<Registry>>,
}

static GLOBAL: OnceLock<RefreshBridge> = OnceLock::new();

impl RefreshBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bridge shared by the whole process
    pub fn global() -> &'static RefreshBridge {
        GLOBAL.get_or_init(RefreshBridge::new)
    }

    /// Register a handler; it stays registered while the returned
    /// [`Subscription`] is alive.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&RefreshEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.handlers.push((id, Arc::new(handler)));
        tracing::debug!("Refresh subscriber {} added", id);

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Announce that the project list changed.
    ///
    /// Handlers registered at the time of the call are invoked in
    /// subscription order. A failing or panicking handler is logged and the
    /// remaining handlers still run.
    pub fn publish(&self) {
        self.publish_event(RefreshEvent::ProjectsUpdated);
    }

    fn publish_event(&self, event: RefreshEvent) {
        let handlers: Vec<(u64, Handler)> = self.registry.lock().handlers.clone();
        tracing::debug!("Publishing {:?} to {} subscribers", event, handlers.len());

        for (id, handler) in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!("Refresh subscriber {} failed: {:#}", id, e);
                }
                Err(_) => {
                    tracing::error!("Refresh subscriber {} panicked", id);
                }
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().handlers.len()
    }
}

/// Handle for a registered refresh handler
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().handlers.retain(|(id, _)| *id != self.id);
            tracing::debug!("Refresh subscriber {} removed", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_publish_in_subscription_order() {
        let bridge = RefreshBridge::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let calls = Arc::clone(&calls);
            bridge.subscribe(move |_| {
                calls.lock().push("first");
                Ok(())
            })
        };
        let second = {
            let calls = Arc::clone(&calls);
            bridge.subscribe(move |_| {
                calls.lock().push("second");
                Ok(())
            })
        };

        bridge.publish();
        assert_eq!(*calls.lock(), vec!["first", "second"]);
        drop((first, second));
    }

    #[test]
    fn test_failing_handlers_do_not_stop_delivery() {
        let bridge = RefreshBridge::new();
        let delivered = Arc::new(AtomicUsize::new(0));

        let _err = bridge.subscribe(|_| anyhow::bail!("view gone"));
        let _panics = bridge.subscribe(|_| panic!("boom"));
        let counter = Arc::clone(&delivered);
        let _ok = bridge.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bridge.publish();
        bridge.publish();
        assert_eq!(delivered.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_drop_and_unsubscribe_remove_handlers() {
        let bridge = RefreshBridge::new();
        let delivered = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&delivered);
        let sub = bridge.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let other = bridge.subscribe(|_| Ok(()));
        assert_eq!(bridge.subscriber_count(), 2);

        sub.unsubscribe();
        drop(other);
        assert_eq!(bridge.subscriber_count(), 0);

        bridge.publish();
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let bridge = RefreshBridge::new();
        bridge.publish();

        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&delivered);
        let _sub = bridge.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handler_may_subscribe_during_publish() {
        let bridge = RefreshBridge::new();
        let inner = bridge.clone();
        let nested = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&nested);
        let _sub = bridge.subscribe(move |_| {
            sink.lock().push(inner.subscribe(|_| Ok(())));
            Ok(())
        });

        bridge.publish();
        assert_eq!(bridge.subscriber_count(), 2);
    }

    #[test]
    fn test_global_is_shared() {
        let a = RefreshBridge::global();
        let b = RefreshBridge::global();
        assert!(Arc::ptr_eq(&a.registry, &b.registry));
    }
}
