//! Listener registry and cancellation handle for snapshot delivery.
//!
//! # Responsibility
//! - Provide the publish/subscribe primitive the local backend needs and
//!   the cancellation handle both backends return.
//!
//! # Invariants
//! - Listeners fire synchronously in registration order.
//! - Cancellation is idempotent and never fails; dropping a
//!   [`Subscription`] cancels it.
//! - The registry is an explicit instance owned by its store, never
//!   process-wide state.

use std::sync::{Arc, Mutex, PoisonError, Weak};

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Slots {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Ordered set of zero-argument change listeners.
#[derive(Default)]
pub struct ListenerSet {
    slots: Arc<Mutex<Slots>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and returns the handle that removes it.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut slots = lock(&self.slots);
            let id = slots.next_id;
            slots.next_id += 1;
            slots.entries.push((id, Arc::new(listener)));
            id
        };

        let weak: Weak<Mutex<Slots>> = Arc::downgrade(&self.slots);
        Subscription::new(move || {
            if let Some(slots) = weak.upgrade() {
                lock(&slots).entries.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Invokes every registered listener, in registration order.
    ///
    /// Listeners are cloned out before the calls so a listener may
    /// subscribe or cancel without deadlocking the registry.
    pub fn notify(&self) {
        let listeners: Vec<Listener> = lock(&self.slots)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }

    /// Number of currently registered listeners.
    pub fn len(&self) -> usize {
        lock(&self.slots).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock(slots: &Mutex<Slots>) -> std::sync::MutexGuard<'_, Slots> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle that stops snapshot delivery for one subscriber.
///
/// Cancellation runs at most once, either through [`Subscription::cancel`]
/// or on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wraps the backend-specific cancellation action.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancels delivery now instead of waiting for drop.
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::ListenerSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn notify_fires_listeners_in_registration_order() {
        let set = ListenerSet::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = seen.clone();
        let _a = set.subscribe(move || first.lock().expect("lock").push("first"));
        let second = seen.clone();
        let _b = set.subscribe(move || second.lock().expect("lock").push("second"));

        set.notify();
        assert_eq!(*seen.lock().expect("lock"), ["first", "second"]);
    }

    #[test]
    fn cancelled_listener_is_removed() {
        let set = ListenerSet::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let sub = set.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        set.notify();
        sub.cancel();
        set.notify();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn dropping_the_subscription_unregisters() {
        let set = ListenerSet::new();
        {
            let _sub = set.subscribe(|| {});
            assert_eq!(set.len(), 1);
        }
        assert!(set.is_empty());
    }

    #[test]
    fn listener_may_cancel_another_during_notify() {
        let set = ListenerSet::new();
        let parked = Arc::new(Mutex::new(None));

        let slot = parked.clone();
        let _canceller = set.subscribe(move || {
            // Dropping the parked subscription re-enters the registry.
            slot.lock().expect("lock").take();
        });
        let victim = set.subscribe(|| {});
        *parked.lock().expect("lock") = Some(victim);

        set.notify();
        assert_eq!(set.len(), 1);
    }
}
