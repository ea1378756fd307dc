// ============================================================================
// spark-pubsub - PubSub
// Subscriber registry with synchronous fan-out of changed field names
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::types::{FieldName, Subscriber, SubscriberId, subscriber_addr};

// =============================================================================
// PUBSUB INNER
// =============================================================================

struct Registration {
    id: SubscriberId,
    callback: Subscriber,
}

/// Shared state behind a `PubSub` handle.
pub struct PubSubInner {
    /// Registrations in subscription order
    subscribers: RefCell<Vec<Registration>>,

    /// Next registration id
    next_id: Cell<u64>,
}

impl PubSubInner {
    fn new() -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    fn register(&self, callback: Subscriber) -> SubscriberId {
        let mut subscribers = self.subscribers.borrow_mut();

        // Set semantics: the same allocation is only registered once
        let addr = subscriber_addr(&callback);
        if let Some(existing) = subscribers
            .iter()
            .find(|reg| subscriber_addr(&reg.callback) == addr)
        {
            return existing.id;
        }

        let id = SubscriberId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        subscribers.push(Registration { id, callback });
        tracing::debug!(subscriber = id.0, total = subscribers.len(), "subscribed");
        id
    }

    fn unregister(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|reg| reg.id != id);
        let removed = subscribers.len() != before;
        if removed {
            tracing::debug!(subscriber = id.0, total = subscribers.len(), "unsubscribed");
        }
        removed
    }

    fn is_registered(&self, id: SubscriberId) -> bool {
        self.subscribers.borrow().iter().any(|reg| reg.id == id)
    }

    fn notify(&self, fields: &[FieldName]) {
        if fields.is_empty() {
            return;
        }

        // Collect first, then call: callbacks may subscribe or unsubscribe
        // while we are iterating.
        let snapshot: Vec<(SubscriberId, Subscriber)> = self
            .subscribers
            .borrow()
            .iter()
            .map(|reg| (reg.id, reg.callback.clone()))
            .collect();

        tracing::trace!(?fields, subscribers = snapshot.len(), "notify");

        for (id, callback) in snapshot {
            // Removed by an earlier callback in this same fan-out
            if !self.is_registered(id) {
                continue;
            }
            callback(fields);
        }
    }
}

// =============================================================================
// PUBSUB - The public hub handle
// =============================================================================

/// Publish/subscribe hub for field-change events.
///
/// A `PubSub` is embedded in a type to make it `Notifiable`. Cloning the
/// handle shares the same subscriber set.
///
/// # Example
///
/// ```
/// use spark_pubsub::PubSub;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let hub = PubSub::new();
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let sub = hub.subscribe({
///     let seen = seen.clone();
///     move |fields| seen.borrow_mut().push(fields.to_vec())
/// });
///
/// hub.notify(&["x", "y"]);
/// sub.unsubscribe();
/// hub.notify(&["x"]);
///
/// assert_eq!(*seen.borrow(), vec![vec!["x", "y"]]);
/// ```
#[derive(Clone)]
pub struct PubSub {
    inner: Rc<PubSubInner>,
}

impl PubSub {
    /// Create a hub with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(PubSubInner::new()),
        }
    }

    /// Register a callback for every future non-empty `notify`.
    ///
    /// Each call wraps `callback` in a fresh allocation, so it always adds a
    /// new registration. Use [`PubSub::subscribe_rc`] to share one callback
    /// across several subscribe calls with set semantics.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[FieldName]) + 'static,
    {
        self.subscribe_rc(Rc::new(callback))
    }

    /// Register a shared callback.
    ///
    /// Subscribing the identical `Rc` again has no additional effect: the
    /// returned handle refers to the existing registration.
    pub fn subscribe_rc(&self, callback: Subscriber) -> Subscription {
        let id = self.inner.register(callback);
        Subscription {
            hub: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Invoke every subscriber once, in subscription order, with `fields`.
    ///
    /// An empty list is a no-op.
    pub fn notify(&self, fields: &[FieldName]) {
        self.inner.notify(fields);
    }

    /// Number of live registrations
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// Check if two handles share the same hub
    pub fn ptr_eq(&self, other: &PubSub) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for PubSub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PubSub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubSub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Handle to one registration, returned by `subscribe`.
///
/// Dropping the handle does NOT unsubscribe; call [`Subscription::unsubscribe`].
/// The handle only holds a weak reference, so it never keeps the hub alive.
#[derive(Clone)]
pub struct Subscription {
    hub: Weak<PubSubInner>,
    id: SubscriberId,
}

impl Subscription {
    /// Remove exactly this registration.
    ///
    /// Returns false if it was already removed or the hub is gone.
    pub fn unsubscribe(&self) -> bool {
        match self.hub.upgrade() {
            Some(hub) => hub.unregister(self.id),
            None => false,
        }
    }

    /// Whether the registration is still in place
    pub fn is_active(&self) -> bool {
        self.hub
            .upgrade()
            .is_some_and(|hub| hub.is_registered(self.id))
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// =============================================================================
// NOTIFIABLE
// =============================================================================

/// Capability of reporting field changes to subscribers.
///
/// Implementors only need to expose their embedded [`PubSub`]; `notify` and
/// `subscribe` come for free.
///
/// # Example
///
/// ```
/// use spark_pubsub::{Notifiable, PubSub};
/// use std::cell::Cell;
///
/// #[derive(Default)]
/// struct Sprite {
///     pubsub: PubSub,
///     x: Cell<i32>,
/// }
///
/// impl Notifiable for Sprite {
///     fn pubsub(&self) -> &PubSub {
///         &self.pubsub
///     }
/// }
///
/// impl Sprite {
///     fn set_x(&self, value: i32) {
///         self.x.set(value);
///         self.notify(&["x"]);
///     }
/// }
///
/// let sprite = Sprite::default();
/// sprite.set_x(1);
/// assert_eq!(sprite.x.get(), 1);
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` must be Notifiable to report field changes",
    label = "this type has no `PubSub`",
    note = "embed a `PubSub` and implement `Notifiable`, or wrap the type with `Mixin`"
)]
pub trait Notifiable {
    /// The hub that fans out this instance's change events
    fn pubsub(&self) -> &PubSub;

    /// Report that `fields` changed.
    fn notify(&self, fields: &[FieldName]) {
        self.pubsub().notify(fields);
    }

    /// Register a callback for this instance's change events.
    fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[FieldName]) + 'static,
        Self: Sized,
    {
        self.pubsub().subscribe(callback)
    }
}

impl Notifiable for PubSub {
    fn pubsub(&self) -> &PubSub {
        self
    }
}

impl<T: Notifiable + ?Sized> Notifiable for Rc<T> {
    fn pubsub(&self) -> &PubSub {
        (**self).pubsub()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Rc<RefCell<Vec<Vec<FieldName>>>>;

    fn recorder(log: &Log) -> impl Fn(&[FieldName]) + 'static {
        let log = log.clone();
        move |fields| log.borrow_mut().push(fields.to_vec())
    }

    #[test]
    fn notify_reaches_every_subscriber_once() {
        let hub = PubSub::new();
        let a: Log = Default::default();
        let b: Log = Default::default();

        let _sa = hub.subscribe(recorder(&a));
        let _sb = hub.subscribe(recorder(&b));

        hub.notify(&["x"]);
        assert_eq!(*a.borrow(), vec![vec!["x"]]);
        assert_eq!(*b.borrow(), vec![vec!["x"]]);
    }

    #[test]
    fn empty_notify_is_noop() {
        let hub = PubSub::new();
        let log: Log = Default::default();
        let _sub = hub.subscribe(recorder(&log));

        hub.notify(&[]);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn notify_without_subscribers_is_fine() {
        let hub = PubSub::new();
        hub.notify(&["x"]);
        assert!(!hub.has_subscribers());
    }

    #[test]
    fn fan_out_follows_subscription_order() {
        let hub = PubSub::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let subs: Vec<_> = (0..4)
            .map(|i| {
                let order = order.clone();
                hub.subscribe(move |_| order.borrow_mut().push(i))
            })
            .collect();

        hub.notify(&["x"]);
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
        assert_eq!(subs.len(), 4);
    }

    #[test]
    fn unsubscribe_removes_only_that_callback() {
        let hub = PubSub::new();
        let a: Log = Default::default();
        let b: Log = Default::default();

        let sa = hub.subscribe(recorder(&a));
        let _sb = hub.subscribe(recorder(&b));

        assert!(sa.unsubscribe());
        assert!(!sa.is_active());
        assert!(!sa.unsubscribe());

        hub.notify(&["y"]);
        assert!(a.borrow().is_empty());
        assert_eq!(b.borrow().len(), 1);
    }

    #[test]
    fn same_rc_subscribes_once() {
        let hub = PubSub::new();
        let log: Log = Default::default();
        let callback: Subscriber = Rc::new(recorder(&log));

        let first = hub.subscribe_rc(callback.clone());
        let second = hub.subscribe_rc(callback.clone());
        assert_eq!(first.id(), second.id());
        assert_eq!(hub.subscriber_count(), 1);

        hub.notify(&["x"]);
        assert_eq!(log.borrow().len(), 1);

        second.unsubscribe();
        assert!(!first.is_active());
    }

    #[test]
    fn subscriber_removed_mid_fan_out_is_skipped() {
        let hub = PubSub::new();
        let log: Log = Default::default();
        let victim: Rc<RefCell<Option<Subscription>>> = Default::default();

        let _killer = hub.subscribe({
            let victim = victim.clone();
            move |_| {
                if let Some(sub) = victim.borrow_mut().take() {
                    sub.unsubscribe();
                }
            }
        });
        *victim.borrow_mut() = Some(hub.subscribe(recorder(&log)));

        hub.notify(&["x"]);
        assert!(log.borrow().is_empty());
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn subscriber_added_mid_fan_out_waits_for_next_event() {
        let hub = PubSub::new();
        let log: Log = Default::default();
        let added = Rc::new(Cell::new(false));

        let _adder = hub.subscribe({
            let hub = hub.clone();
            let log = log.clone();
            let added = added.clone();
            move |_| {
                if !added.replace(true) {
                    // Handle intentionally leaked: stays subscribed
                    let _ = hub.subscribe(recorder(&log));
                }
            }
        });

        hub.notify(&["x"]);
        assert!(log.borrow().is_empty());

        hub.notify(&["y"]);
        assert_eq!(*log.borrow(), vec![vec!["y"]]);
    }

    #[test]
    fn self_unsubscribe_during_callback() {
        let hub = PubSub::new();
        let calls = Rc::new(Cell::new(0));
        let me: Rc<RefCell<Option<Subscription>>> = Default::default();

        let sub = hub.subscribe({
            let calls = calls.clone();
            let me = me.clone();
            move |_| {
                calls.set(calls.get() + 1);
                if let Some(sub) = me.borrow().as_ref() {
                    sub.unsubscribe();
                }
            }
        });
        *me.borrow_mut() = Some(sub);

        hub.notify(&["x"]);
        hub.notify(&["x"]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn subscription_does_not_keep_hub_alive() {
        let hub = PubSub::new();
        let sub = hub.subscribe(|_| {});
        drop(hub);

        assert!(!sub.is_active());
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn clones_share_subscribers() {
        let hub = PubSub::new();
        let other = hub.clone();
        let log: Log = Default::default();
        let _sub = other.subscribe(recorder(&log));

        hub.notify(&["x"]);
        assert!(hub.ptr_eq(&other));
        assert_eq!(log.borrow().len(), 1);
    }
}
