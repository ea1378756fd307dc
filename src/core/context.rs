// ============================================================================
// spark-pubsub - Scoped Context
// Thread-local provider stack for sharing instances through a UI tree
// ============================================================================
//
// A provider pushes a value for the duration of a closure. Anything running
// inside the closure can look the value up by its context id; the innermost
// provider wins. Outside every provider the lookup fails fast.
// ============================================================================

use std::any::{Any, type_name};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::error::ContextError;

// =============================================================================
// PROVIDER STACK
// =============================================================================

/// Identifier of one `Context<T>`. Two contexts over the same `T` are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

/// Thread-local state holding every active provider.
pub struct ProviderStack {
    /// Active providers, outermost first
    frames: RefCell<Vec<(ContextId, Rc<dyn Any>)>>,
}

impl ProviderStack {
    fn new() -> Self {
        Self {
            frames: RefCell::new(Vec::new()),
        }
    }

    fn push(&self, id: ContextId, value: Rc<dyn Any>) {
        self.frames.borrow_mut().push((id, value));
    }

    fn pop(&self) {
        self.frames.borrow_mut().pop();
    }

    /// Innermost value provided for `id`, if any
    fn lookup(&self, id: ContextId) -> Option<Rc<dyn Any>> {
        self.frames
            .borrow()
            .iter()
            .rev()
            .find(|(frame_id, _)| *frame_id == id)
            .map(|(_, value)| value.clone())
    }

    /// Number of active providers
    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }
}

thread_local! {
    /// The thread-local provider stack
    static PROVIDERS: ProviderStack = ProviderStack::new();
}

/// Context ids are process-wide so a context moved across threads never
/// aliases another one.
static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Access the thread-local provider stack.
pub fn with_providers<R>(f: impl FnOnce(&ProviderStack) -> R) -> R {
    PROVIDERS.with(f)
}

/// Number of providers currently active on this thread.
pub fn provider_depth() -> usize {
    with_providers(|stack| stack.depth())
}

// =============================================================================
// CONTEXT<T>
// =============================================================================

/// A typed, scoped slot for sharing one value with everything run inside
/// its provider.
///
/// # Example
///
/// ```
/// use spark_pubsub::create_context;
///
/// let theme = create_context::<String>();
///
/// theme.provide("dark".to_string(), || {
///     assert_eq!(theme.use_context().unwrap().as_str(), "dark");
/// });
///
/// assert!(theme.use_context().is_err());
/// ```
pub struct Context<T: 'static> {
    id: ContextId,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Context<T> {
    /// Create a new context with its own identity.
    pub fn new() -> Self {
        Self {
            id: ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed)),
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Run `f` with `value` provided to this context.
    pub fn provide<R>(&self, value: T, f: impl FnOnce() -> R) -> R {
        self.provide_rc(Rc::new(value), f)
    }

    /// Run `f` with an already shared value provided to this context.
    ///
    /// The provider is removed when `f` returns or unwinds.
    pub fn provide_rc<R>(&self, value: Rc<T>, f: impl FnOnce() -> R) -> R {
        with_providers(|stack| stack.push(self.id, value as Rc<dyn Any>));
        tracing::debug!(context = type_name::<T>(), "context provided");

        struct ProvideGuard;

        impl Drop for ProvideGuard {
            fn drop(&mut self) {
                with_providers(|stack| stack.pop());
                tracing::debug!(depth = provider_depth(), "context exited");
            }
        }

        let _guard = ProvideGuard;
        f()
    }

    /// Value from the innermost enclosing provider.
    ///
    /// Fails with `ContextError::Missing` when called outside every provider
    /// of this context.
    pub fn use_context(&self) -> Result<Rc<T>, ContextError> {
        with_providers(|stack| stack.lookup(self.id))
            .and_then(|value| value.downcast::<T>().ok())
            .ok_or(ContextError::Missing {
                context: type_name::<T>(),
            })
    }

    /// Whether a provider for this context is currently active
    pub fn is_provided(&self) -> bool {
        with_providers(|stack| stack.lookup(self.id)).is_some()
    }
}

impl<T: 'static> Default for Context<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a new context for values of type `T`.
pub fn create_context<T: 'static>() -> Context<T> {
    Context::new()
}

// =============================================================================
// TESTS
// =============================================================================
