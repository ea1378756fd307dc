// ============================================================================
// spark-pubsub - Notifies
// Run a mutating method, then report a fixed set of fields as changed
// ============================================================================
//
// The field list is declared next to the method, not derived from a diff:
// a call always reports every declared field, whether or not it changed.
// Each call produces exactly one event carrying the whole list.
// ============================================================================

use std::future::Future;

use crate::core::types::FieldName;
use crate::primitives::pubsub::Notifiable;

/// Declared change set of one mutating method.
///
/// # Example
///
/// ```
/// use spark_pubsub::{Notifiable, Notifies, PubSub};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// #[derive(Default)]
/// struct Sprite {
///     pubsub: PubSub,
///     y: Cell<i32>,
/// }
///
/// impl Notifiable for Sprite {
///     fn pubsub(&self) -> &PubSub {
///         &self.pubsub
///     }
/// }
///
/// impl Sprite {
///     const SET_Y: Notifies = Notifies::new(&["y"]);
///
///     fn set_y(&self, value: i32) {
///         Self::SET_Y.call(self, |s| s.y.set(value))
///     }
/// }
///
/// let sprite = Sprite::default();
/// let hits = Rc::new(Cell::new(0));
/// let _sub = sprite.subscribe({
///     let hits = hits.clone();
///     move |fields| {
///         assert_eq!(fields, ["y"]);
///         hits.set(hits.get() + 1);
///     }
/// });
///
/// sprite.set_y(11);
/// assert_eq!(hits.get(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notifies {
    fields: &'static [FieldName],
}

impl Notifies {
    pub const fn new(fields: &'static [FieldName]) -> Self {
        Self { fields }
    }

    /// Fields reported after each call
    pub fn fields(&self) -> &'static [FieldName] {
        self.fields
    }

    fn fire<S: Notifiable + ?Sized>(&self, this: &S) {
        tracing::trace!(fields = ?self.fields, "mutation complete");
        this.notify(self.fields);
    }

    // =========================================================================
    // SYNCHRONOUS
    // =========================================================================

    /// Run `f` on `this`, then notify. The result of `f` is passed through.
    pub fn call<S, R>(&self, this: &S, f: impl FnOnce(&S) -> R) -> R
    where
        S: Notifiable + ?Sized,
    {
        let result = f(this);
        self.fire(this);
        result
    }

    /// Like [`Notifies::call`] for methods that need `&mut self`.
    pub fn call_mut<S, R>(&self, this: &mut S, f: impl FnOnce(&mut S) -> R) -> R
    where
        S: Notifiable + ?Sized,
    {
        let result = f(this);
        self.fire(this);
        result
    }

    /// Run a fallible method; notify only if it returned `Ok`.
    ///
    /// An `Err` means the mutation did not complete, so nothing is reported.
    pub fn try_call<S, T, E>(&self, this: &S, f: impl FnOnce(&S) -> Result<T, E>) -> Result<T, E>
    where
        S: Notifiable + ?Sized,
    {
        let value = f(this)?;
        self.fire(this);
        Ok(value)
    }

    // =========================================================================
    // DEFERRED
    // =========================================================================

    /// Await `work`, then notify and forward its output.
    pub async fn call_async<S, Fut>(&self, this: &S, work: Fut) -> Fut::Output
    where
        S: Notifiable + ?Sized,
        Fut: Future,
    {
        let output = work.await;
        self.fire(this);
        output
    }

    /// Await fallible `work`; notify only when it settles with `Ok`.
    ///
    /// An `Err` propagates to the caller untouched.
    pub async fn try_call_async<S, Fut, T, E>(&self, this: &S, work: Fut) -> Result<T, E>
    where
        S: Notifiable + ?Sized,
        Fut: Future<Output = Result<T, E>>,
    {
        let value = work.await?;
        self.fire(this);
        Ok(value)
    }

    // =========================================================================
    // COMPOSITION
    // =========================================================================

    /// Turn a method into one that notifies after every call.
    ///
    /// Arguments are passed as a single value (use a tuple for several).
    ///
    /// ```
    /// use spark_pubsub::{Notifiable, Notifies, PubSub};
    /// use std::cell::Cell;
    ///
    /// #[derive(Default)]
    /// struct Counter {
    ///     pubsub: PubSub,
    ///     count: Cell<u32>,
    /// }
    ///
    /// impl Notifiable for Counter {
    ///     fn pubsub(&self) -> &PubSub {
    ///         &self.pubsub
    ///     }
    /// }
    ///
    /// let add = Notifies::new(&["count"]).wrap(|c: &Counter, n: u32| {
    ///     c.count.set(c.count.get() + n);
    ///     c.count.get()
    /// });
    ///
    /// let counter = Counter::default();
    /// assert_eq!(add(&counter, 2), 2);
    /// ```
    pub fn wrap<S, A, R, F>(self, method: F) -> impl Fn(&S, A) -> R
    where
        S: Notifiable + ?Sized,
        F: Fn(&S, A) -> R,
    {
        move |this: &S, args: A| self.call(this, |s| method(s, args))
    }
}

// =============================================================================
// TESTS
// =============================================================================
