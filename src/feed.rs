// 📡 Change Feed - Live collection subscriptions
//
// Keeps view caches consistent with the gateway without polling. A view
// subscribes to a collection with a refetch callback; every committed
// insert/update/delete on that collection (including the caller's own
// writes) invokes the callback at least once. The callback refetches the
// whole collection rather than applying a delta, so there is nothing to
// merge.
//
// One transport channel is opened per collection and shared by every
// subscriber to it, reference-counted by live Subscription guards. When a
// channel cannot be (re)established the failure is recoverable: it is
// logged and retried on the next subscribe or dispatch, and consumers keep
// their last fetched snapshot in the meantime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

// ============================================================================
// ERRORS
// ============================================================================

/// Recoverable change-feed failure. Never fatal: at worst a view shows
/// stale data until the next successful reconnect or manual refresh.
#[derive(Debug, Clone)]
pub struct SubscriptionError {
    pub collection: String,
    pub message: String,
}

impl SubscriptionError {
    pub fn new(collection: &str, message: &str) -> Self {
        SubscriptionError {
            collection: collection.to_string(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "change feed '{}': {}", self.collection, self.message)
    }
}

impl std::error::Error for SubscriptionError {}

// ============================================================================
// TRANSPORT
// ============================================================================

/// Seam to the remote feed channel. The gateway's in-process feed uses
/// LocalTransport; tests exercise reconnect handling with flaky
/// implementations.
pub trait FeedTransport: Send {
    fn connect(&mut self, collection: &str) -> Result<(), SubscriptionError>;
    fn disconnect(&mut self, collection: &str);
}

/// In-process transport: events are dispatched directly by the gateway,
/// so there is no channel to fail.
pub struct LocalTransport;

impl FeedTransport for LocalTransport {
    fn connect(&mut self, _collection: &str) -> Result<(), SubscriptionError> {
        Ok(())
    }

    fn disconnect(&mut self, _collection: &str) {}
}

// ============================================================================
// FEED HUB
// ============================================================================

type Callback = Arc<dyn Fn() + Send + Sync>;

struct Channel {
    subscribers: Vec<(u64, Callback)>,
    connected: bool,
}

struct FeedInner {
    transport: Box<dyn FeedTransport>,
    channels: HashMap<String, Channel>,
    next_id: u64,
}

impl FeedInner {
    /// Try to (re)establish the transport channel. Failure is logged and
    /// left for the next attempt.
    fn ensure_connected(&mut self, collection: &str) {
        let channel = match self.channels.get_mut(collection) {
            Some(c) => c,
            None => return,
        };
        if channel.connected {
            return;
        }
        match self.transport.connect(collection) {
            Ok(()) => channel.connected = true,
            Err(e) => eprintln!("⚠️  {} (will retry)", e),
        }
    }
}

/// Change-feed hub. Cloning yields another handle to the same hub, so the
/// gateway and any number of views can share it.
#[derive(Clone)]
pub struct ChangeFeed {
    inner: Arc<Mutex<FeedInner>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::with_transport(Box::new(LocalTransport))
    }

    pub fn with_transport(transport: Box<dyn FeedTransport>) -> Self {
        ChangeFeed {
            inner: Arc::new(Mutex::new(FeedInner {
                transport,
                channels: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Subscribe to every change committed to `collection`. The returned
    /// guard is the only way to hold the subscription: dropping it
    /// unsubscribes, so a subscription cannot leak past its view.
    pub fn subscribe(
        &self,
        collection: &str,
        on_change: impl Fn() + Send + Sync + 'static,
    ) -> Subscription {
        let mut inner = self.inner.lock().unwrap();

        let id = inner.next_id;
        inner.next_id += 1;

        inner
            .channels
            .entry(collection.to_string())
            .or_insert_with(|| Channel {
                subscribers: Vec::new(),
                connected: false,
            })
            .subscribers
            .push((id, Arc::new(on_change)));

        inner.ensure_connected(collection);

        Subscription {
            feed: Arc::downgrade(&self.inner),
            collection: collection.to_string(),
            id,
        }
    }

    /// Deliver a change event for `collection` to every live subscriber.
    /// Called by the gateway after each committed mutation. Callbacks run
    /// outside the hub lock, so an on_change may itself subscribe or drop
    /// subscriptions.
    pub fn dispatch(&self, collection: &str) {
        let callbacks: Vec<Callback> = {
            let mut inner = self.inner.lock().unwrap();
            inner.ensure_connected(collection);
            match inner.channels.get(collection) {
                Some(channel) => channel.subscribers.iter().map(|(_, cb)| cb.clone()).collect(),
                None => return,
            }
        };

        for callback in callbacks {
            callback();
        }
    }

    /// Number of live subscribers for a collection
    pub fn subscriber_count(&self, collection: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .channels
            .get(collection)
            .map(|c| c.subscribers.len())
            .unwrap_or(0)
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SUBSCRIPTION HANDLE
// ============================================================================

/// RAII subscription guard. Dropping it removes the callback; the last
/// guard for a collection closes the shared transport channel.
pub struct Subscription {
    feed: Weak<Mutex<FeedInner>>,
    collection: String,
    id: u64,
}

impl Subscription {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Explicit unsubscribe; equivalent to dropping the guard
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let inner = match self.feed.upgrade() {
            Some(inner) => inner,
            None => return, // hub already gone
        };
        let mut inner = inner.lock().unwrap();

        // None = other subscribers remain; Some(flag) = channel is done,
        // flag says whether the transport was ever actually connected
        let was_connected = match inner.channels.get_mut(&self.collection) {
            Some(channel) => {
                channel.subscribers.retain(|(id, _)| *id != self.id);
                if channel.subscribers.is_empty() {
                    Some(channel.connected)
                } else {
                    None
                }
            }
            None => None,
        };

        if let Some(was_connected) = was_connected {
            inner.channels.remove(&self.collection);
            // Never hand the transport an unbalanced disconnect
            if was_connected {
                inner.transport.disconnect(&self.collection);
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport that records connect/disconnect calls and can be told to
    /// fail the next N connect attempts
    struct RecordingTransport {
        log: Arc<Mutex<Vec<String>>>,
        failures_left: Arc<AtomicUsize>,
    }

    impl FeedTransport for RecordingTransport {
        fn connect(&mut self, collection: &str) -> Result<(), SubscriptionError> {
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(SubscriptionError::new(collection, "connection refused"));
            }
            self.log.lock().unwrap().push(format!("connect:{}", collection));
            Ok(())
        }

        fn disconnect(&mut self, collection: &str) {
            self.log
                .lock()
                .unwrap()
                .push(format!("disconnect:{}", collection));
        }
    }

    fn counting_feed() -> (ChangeFeed, Arc<AtomicUsize>) {
        (ChangeFeed::new(), Arc::new(AtomicUsize::new(0)))
    }

    #[test]
    fn test_mutation_fires_on_change() {
        let (feed, count) = counting_feed();
        let c = count.clone();
        let _sub = feed.subscribe("vehicles", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        feed.dispatch("vehicles");
        assert_eq!(count.load(Ordering::SeqCst), 1);

        feed.dispatch("vehicles");
        feed.dispatch("vehicles");
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_events_route_by_collection() {
        let (feed, count) = counting_feed();
        let c = count.clone();
        let _sub = feed.subscribe("vehicles", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        feed.dispatch("provider_links");
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let (feed, count) = counting_feed();
        let c = count.clone();
        let sub = feed.subscribe("vehicles", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        feed.dispatch("vehicles");
        sub.cancel();
        feed.dispatch("vehicles");
        feed.dispatch("vehicles");

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(feed.subscriber_count("vehicles"), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let (feed, count) = counting_feed();
        {
            let c = count.clone();
            let _sub = feed.subscribe("vehicles", move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
            feed.dispatch("vehicles");
        } // view torn down here

        feed.dispatch("vehicles");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transport_shared_per_collection() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let feed = ChangeFeed::with_transport(Box::new(RecordingTransport {
            log: log.clone(),
            failures_left: Arc::new(AtomicUsize::new(0)),
        }));

        let a = feed.subscribe("vehicles", || {});
        let b = feed.subscribe("vehicles", || {});
        let c = feed.subscribe("membership_records", || {});

        // One connect per collection, not per subscriber
        assert_eq!(
            *log.lock().unwrap(),
            vec!["connect:vehicles", "connect:membership_records"]
        );

        drop(a);
        assert!(log.lock().unwrap().len() == 2); // still one holder left

        drop(b);
        drop(c);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "connect:vehicles",
                "connect:membership_records",
                "disconnect:vehicles",
                "disconnect:membership_records"
            ]
        );
    }

    #[test]
    fn test_failed_connect_recovers_on_next_dispatch() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let feed = ChangeFeed::with_transport(Box::new(RecordingTransport {
            log: log.clone(),
            failures_left: Arc::new(AtomicUsize::new(1)),
        }));

        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let _sub = feed.subscribe("vehicles", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        // First connect failed; nothing recorded yet
        assert!(log.lock().unwrap().is_empty());

        // Reconnect happens transparently on the next dispatch, and the
        // event still reaches the subscriber
        feed.dispatch("vehicles");
        assert_eq!(*log.lock().unwrap(), vec!["connect:vehicles"]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unconnected_channel_skips_disconnect() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let feed = ChangeFeed::with_transport(Box::new(RecordingTransport {
            log: log.clone(),
            failures_left: Arc::new(AtomicUsize::new(usize::MAX)),
        }));

        // The channel never manages to connect...
        let sub = feed.subscribe("vehicles", || {});
        drop(sub);

        // ...so the transport must not see a disconnect either
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_on_change_may_drop_other_subscriptions() {
        let feed = ChangeFeed::new();
        let victim = Arc::new(Mutex::new(None::<Subscription>));

        let inner = feed.subscribe("vehicles", || {});
        *victim.lock().unwrap() = Some(inner);

        let v = victim.clone();
        let _killer = feed.subscribe("vehicles", move || {
            v.lock().unwrap().take();
        });

        // Must not deadlock
        feed.dispatch("vehicles");
        assert_eq!(feed.subscriber_count("vehicles"), 1);
    }
}
