// ============================================================================
// spark-pubsub - Hydration Context
// Provide a dehydrated state to a scope and hydrate it once, on first use
// ============================================================================

use std::cell::OnceCell;
use std::rc::Rc;

use super::registry::{ClassRegistry, HydratedInstances, hydrate};
use super::state::DehydratedState;
use crate::core::context::Context;
use crate::core::error::{ContextError, HydrationError};

/// Per-provider state: the payloads and, once requested, their instances
struct HydrationScope {
    state: DehydratedState,
    hydrated: OnceCell<Rc<HydratedInstances>>,
}

/// Shares hydrated instances with everything run inside its provider.
///
/// Each [`HydrationContext::provide`] call is its own scope: instances are
/// rebuilt at most once per scope and every consumer in it sees the same
/// ones.
///
/// # Example
///
/// ```
/// use serde_json::{json, Value};
/// use spark_pubsub::{create_hydration_context, ClassRegistry, DehydratedState, HydrationError, Serializable};
///
/// struct Counter(i64);
///
/// impl Serializable for Counter {
///     const TYPE_TAG: &'static str = "Counter";
///
///     fn dehydrate(&self) -> Value {
///         json!(self.0)
///     }
///
///     fn hydrate(data: &Value) -> Result<Self, HydrationError> {
///         data.as_i64()
///             .map(Counter)
///             .ok_or_else(|| HydrationError::invalid(Self::TYPE_TAG, "expected a number"))
///     }
/// }
///
/// let hydration = create_hydration_context(ClassRegistry::new().with::<Counter>());
/// let state = DehydratedState::new().with("clicks", &Counter(3));
///
/// hydration.provide(state, || {
///     let instances = hydration.use_hydrated_instances().unwrap();
///     assert_eq!(instances.require::<Counter>("clicks").unwrap().0, 3);
/// });
///
/// assert!(hydration.use_hydrated_instances().is_err());
/// ```
pub struct HydrationContext {
    registry: Rc<ClassRegistry>,
    scope: Context<HydrationScope>,
}

impl HydrationContext {
    pub fn new(registry: ClassRegistry) -> Self {
        Self {
            registry: Rc::new(registry),
            scope: Context::new(),
        }
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Run `f` with `dehydrated` provided to this context.
    pub fn provide<R>(&self, dehydrated: DehydratedState, f: impl FnOnce() -> R) -> R {
        self.scope.provide(
            HydrationScope {
                state: dehydrated,
                hydrated: OnceCell::new(),
            },
            f,
        )
    }

    /// The raw payloads of the innermost provider.
    pub fn use_dehydrated_state(&self) -> Result<DehydratedState, ContextError> {
        Ok(self.current_scope()?.state.clone())
    }

    /// Instances of the innermost provider, hydrated on first call.
    ///
    /// Fails with [`HydrationError::Context`] outside every provider, and with
    /// the reconstructor's error if hydration fails. A failed hydration is
    /// retried on the next call.
    pub fn use_hydrated_instances(&self) -> Result<Rc<HydratedInstances>, HydrationError> {
        let scope = self.current_scope()?;
        if let Some(hydrated) = scope.hydrated.get() {
            return Ok(hydrated.clone());
        }

        let hydrated = Rc::new(hydrate(&scope.state, &self.registry)?);
        tracing::debug!(instances = hydrated.len(), "hydrated provider state");
        Ok(scope.hydrated.get_or_init(|| hydrated).clone())
    }

    fn current_scope(&self) -> Result<Rc<HydrationScope>, ContextError> {
        self.scope
            .use_context()
            .map_err(|_| ContextError::Missing {
                context: "HydrationContext",
            })
    }
}

impl std::fmt::Debug for HydrationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HydrationContext")
            .field("registry", &self.registry)
            .field("provided", &self.scope.is_provided())
            .finish()
    }
}

/// Create a hydration context that rebuilds instances with `registry`.
pub fn create_hydration_context(registry: ClassRegistry) -> HydrationContext {
    HydrationContext::new(registry)
}

// =============================================================================
// TESTS
// =============================================================================
