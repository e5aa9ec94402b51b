// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Change feed and live query subscriptions.
//!
//! Stores publish a [`ChangeEvent`] after every committed write. A live query
//! listens to the feed, re-runs its query when a relevant event arrives and
//! publishes the result through a `watch` channel.
//!
//! # Lifetimes
//!
//! - A [`Subscription`] keeps its live query alive
//! - Dropping the last handle to a query aborts its task
//! - Handles obtained from a [`LiveQueryRegistry`] with the same key share one task

use hemolink_domain::{DonationId, RequestId, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::debug;

/// Maximum number of change events buffered per subscriber.
/// Subscribers that fall further behind re-query on the next event.
const CHANGE_BUFFER_SIZE: usize = 100;

/// A committed change in the store.
///
/// Events identify what changed, never the new values. Subscribers re-read
/// the store to obtain authoritative data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A profile was created or modified.
    ProfileChanged {
        /// The affected user.
        user_id: UserId,
    },
    /// A request was created or modified.
    RequestChanged {
        /// The affected request.
        request_id: RequestId,
    },
    /// A donation record was appended.
    DonationRecorded {
        /// The new record.
        donation_id: DonationId,
        /// The donor who offered.
        donor_id: UserId,
        /// The request offered against.
        request_id: RequestId,
    },
    /// A donation record changed status.
    DonationUpdated {
        /// The affected record.
        donation_id: DonationId,
        /// The donor who offered.
        donor_id: UserId,
    },
}

/// Fan-out of committed changes to any number of subscribers.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    /// Creates a feed with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANGE_BUFFER_SIZE);
        Self { tx }
    }

    /// Publishes an event. Dropped silently when nobody listens.
    pub fn publish(&self, event: ChangeEvent) {
        match self.tx.send(event) {
            Ok(receivers) => debug!(receivers, "Published change event"),
            Err(_) => debug!("No receivers for change event"),
        }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the task driving a live query. Aborts it on drop.
#[derive(Debug)]
struct LiveQueryGuard {
    handle: JoinHandle<()>,
}

impl Drop for LiveQueryGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A cancellable handle on a live query result.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: watch::Receiver<T>,
    guard: Arc<LiveQueryGuard>,
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
            guard: Arc::clone(&self.guard),
        }
    }
}

impl<T: Clone> Subscription<T> {
    /// Returns the latest result.
    #[must_use]
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Waits for the next result.
    ///
    /// Returns false once the live query has stopped.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Stops receiving results. The query stops when no handle remains.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Returns true if both handles are driven by the same live query.
    #[must_use]
    pub fn shares_query_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.guard, &other.guard)
    }
}

/// Starts a live query.
///
/// Runs `query` once before returning, then again after every event for
/// which `relevant` returns true. A lagging feed forces a re-query. The
/// query stops when the feed closes or the last handle is dropped.
///
/// # Arguments
///
/// * `changes` - A feed receiver, subscribed before the initial query runs
/// * `relevant` - Selects the events that invalidate the result
/// * `query` - Produces a fresh result
pub async fn spawn_live_query<T, P, Q, Fut>(
    mut changes: broadcast::Receiver<ChangeEvent>,
    relevant: P,
    query: Q,
) -> Subscription<T>
where
    T: Send + Sync + 'static,
    P: Fn(&ChangeEvent) -> bool + Send + 'static,
    Q: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let initial: T = query().await;
    let (tx, rx) = watch::channel(initial);

    let handle: JoinHandle<()> = tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(event) => {
                    if !relevant(&event) {
                        continue;
                    }
                    debug!(?event, "Live query invalidated");
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Live query lagged; refreshing");
                }
                Err(RecvError::Closed) => break,
            }
            if tx.send(query().await).is_err() {
                break;
            }
        }
    });

    Subscription {
        rx,
        guard: Arc::new(LiveQueryGuard { handle }),
    }
}

/// Deduplicates live queries by filter key.
///
/// The registry holds weak references only. A key whose handles were all
/// dropped is treated as absent. Lookup and start are serialized so
/// concurrent subscribers to one key always share a single query.
#[derive(Debug)]
pub struct LiveQueryRegistry<K, T> {
    entries: Mutex<HashMap<K, (watch::Receiver<T>, Weak<LiveQueryGuard>)>>,
    starting: AsyncMutex<()>,
}

impl<K, T> LiveQueryRegistry<K, T>
where
    K: Eq + Hash,
{
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            starting: AsyncMutex::new(()),
        }
    }

    /// Returns the live query registered under `key`, starting it with
    /// `start` if none is running.
    ///
    /// Callers racing on the same key wait for the first start and receive
    /// a handle on the same query.
    pub async fn get_or_start<F, Fut>(&self, key: K, start: F) -> Subscription<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Subscription<T>>,
    {
        let _starting: AsyncMutexGuard<'_, ()> = self.starting.lock().await;
        if let Some(existing) = self.get(&key) {
            return existing;
        }
        let subscription: Subscription<T> = start().await;
        self.insert(key, &subscription);
        subscription
    }

    fn get(&self, key: &K) -> Option<Subscription<T>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let found: Option<Subscription<T>> = entries.get(key).and_then(|(rx, weak)| {
            weak.upgrade().map(|guard| Subscription {
                rx: rx.clone(),
                guard,
            })
        });
        if found.is_none() {
            entries.remove(key);
        }
        found
    }

    fn insert(&self, key: K, subscription: &Subscription<T>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, (_, weak)| weak.strong_count() > 0);
        entries.insert(
            key,
            (subscription.rx.clone(), Arc::downgrade(&subscription.guard)),
        );
    }

    /// Returns the number of live queries still running.
    #[must_use]
    pub fn active_count(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .values()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }
}

impl<K: Eq + Hash, T> Default for LiveQueryRegistry<K, T> {
    fn default() -> Self {
        Self::new()
    }
}
