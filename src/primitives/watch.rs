// ============================================================================
// spark-pubsub - Watch
// Live projections of a Notifiable instance, refreshed on relevant events
// ============================================================================
//
// A watch keeps a projection of selected fields and recomputes it whenever a
// change event names one of them. Events about other fields are ignored.
// Subscriber callbacks only hold a weak reference to the instance, so a
// watch never keeps its instance alive through the instance's own hub.
// ============================================================================

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use crate::core::types::{FieldName, is_relevant};
use crate::primitives::pubsub::{Notifiable, Subscription};

// =============================================================================
// WATCH
// =============================================================================

/// A live view of some fields of a shared instance.
///
/// Dropping the watch unsubscribes it.
///
/// # Example
///
/// ```
/// use spark_pubsub::{watch, Notifiable, Notifies, PubSub};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// #[derive(Default)]
/// struct Sprite {
///     pubsub: PubSub,
///     x: Cell<i32>,
///     y: Cell<i32>,
/// }
///
/// impl Notifiable for Sprite {
///     fn pubsub(&self) -> &PubSub {
///         &self.pubsub
///     }
/// }
///
/// let sprite = Rc::new(Sprite::default());
/// let view = watch(sprite.clone(), &["x", "y"], |s| (s.x.get(), s.y.get()));
/// assert_eq!(view.get(), (0, 0));
///
/// Notifies::new(&["x", "y"]).call(&*sprite, |s| {
///     s.x.set(5);
///     s.y.set(5);
/// });
/// assert_eq!(view.get(), (5, 5));
/// ```
pub struct Watch<T: Notifiable + 'static, S: 'static> {
    instance: Rc<T>,
    select: Rc<dyn Fn(&T) -> S>,
    state: Rc<RefCell<S>>,
    /// Set when an event arrived while the projection was borrowed
    stale: Rc<Cell<bool>>,
    refreshes: Rc<Cell<u64>>,
    fields: &'static [FieldName],
    subscription: Subscription,
}

/// Install a fresh projection, or mark it stale if a reader still holds it.
fn refresh<S>(state: &RefCell<S>, stale: &Cell<bool>, refreshes: &Cell<u64>, next: S) {
    match state.try_borrow_mut() {
        Ok(mut current) => {
            *current = next;
            stale.set(false);
            refreshes.set(refreshes.get() + 1);
        }
        Err(_) => {
            stale.set(true);
            tracing::trace!("watch refresh deferred, projection is borrowed");
        }
    }
}

impl<T: Notifiable + 'static, S: 'static> Watch<T, S> {
    /// The watched instance
    pub fn instance(&self) -> &Rc<T> {
        &self.instance
    }

    /// Current projection (cloning).
    pub fn get(&self) -> S
    where
        S: Clone,
    {
        self.state().clone()
    }

    /// Borrow the current projection.
    ///
    /// Events that arrive while the borrow is held are not lost: the
    /// projection is recomputed on the next read.
    pub fn state(&self) -> Ref<'_, S> {
        self.catch_up();
        self.state.borrow()
    }

    /// Access the current projection with a closure (avoids cloning).
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state())
    }

    pub fn fields(&self) -> &'static [FieldName] {
        self.fields
    }

    /// How many times the projection was recomputed after creation
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.get()
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Recompute a projection whose refresh was deferred
    fn catch_up(&self) {
        if self.stale.get() {
            let next = (self.select)(&self.instance);
            refresh(&self.state, &self.stale, &self.refreshes, next);
        }
    }
}

impl<T: Notifiable + 'static, S: 'static> Drop for Watch<T, S> {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

/// Watch `fields` of a shared instance through the projection `select`.
///
/// The projection is computed once immediately and again after every event
/// that names at least one of `fields`.
pub fn watch<T, S, F>(instance: Rc<T>, fields: &'static [FieldName], select: F) -> Watch<T, S>
where
    T: Notifiable + 'static,
    S: 'static,
    F: Fn(&T) -> S + 'static,
{
    let select: Rc<dyn Fn(&T) -> S> = Rc::new(select);
    let state = Rc::new(RefCell::new(select(&instance)));
    let stale = Rc::new(Cell::new(false));
    let refreshes = Rc::new(Cell::new(0));

    let subscription = instance.pubsub().subscribe({
        let instance = Rc::downgrade(&instance);
        let select = select.clone();
        let state = state.clone();
        let stale = stale.clone();
        let refreshes = refreshes.clone();
        move |event: &[FieldName]| {
            if !is_relevant(event, fields) {
                return;
            }
            if let Some(instance) = instance.upgrade() {
                let next = select(&instance);
                refresh(&state, &stale, &refreshes, next);
                tracing::trace!(?event, "watch refreshed");
            }
        }
    });

    Watch {
        instance,
        select,
        state,
        stale,
        refreshes,
        fields,
        subscription,
    }
}

/// Like [`watch`], building the instance with `init` first.
pub fn watch_with<T, S, F>(
    init: impl FnOnce() -> T,
    fields: &'static [FieldName],
    select: F,
) -> Watch<T, S>
where
    T: Notifiable + 'static,
    S: 'static,
    F: Fn(&T) -> S + 'static,
{
    watch(Rc::new(init()), fields, select)
}

// =============================================================================
// ON NOTIFY
// =============================================================================

/// Call `callback` with a fresh projection whenever one of `fields` changes.
///
/// Unlike [`watch`], nothing is stored; the returned subscription must be
/// unsubscribed explicitly.
pub fn on_notify<T, S, F, C>(
    instance: &Rc<T>,
    fields: &'static [FieldName],
    select: F,
    callback: C,
) -> Subscription
where
    T: Notifiable + 'static,
    F: Fn(&T) -> S + 'static,
    C: Fn(S) + 'static,
{
    let weak = Rc::downgrade(instance);
    instance.pubsub().subscribe(move |event| {
        if !is_relevant(event, fields) {
            return;
        }
        if let Some(instance) = weak.upgrade() {
            callback(select(&instance));
        }
    })
}

// =============================================================================
// TESTS
// =============================================================================
