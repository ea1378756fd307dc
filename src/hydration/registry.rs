// ============================================================================
// spark-pubsub - Class Registry
// Type tag to reconstructor table, and the hydration loop built on it
// ============================================================================
//
// The registry is always filled in by the caller. An entry whose tag is not
// registered is left out of the result; a reconstructor that rejects its
// data aborts the whole hydration.
// ============================================================================

use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::state::{DehydratedState, Serializable};
use crate::core::error::HydrationError;

/// Builds a live instance from a payload's `data`
type Reconstructor = Box<dyn Fn(&Value) -> Result<Rc<dyn Any>, HydrationError>>;

// =============================================================================
// CLASS REGISTRY
// =============================================================================

/// Caller-supplied mapping from type tag to reconstructor.
#[derive(Default)]
pub struct ClassRegistry {
    reconstructors: BTreeMap<String, Reconstructor>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under its own `TYPE_TAG`.
    pub fn register<T: Serializable>(&mut self) -> &mut Self {
        self.register_with(T::TYPE_TAG, T::hydrate)
    }

    /// Register an arbitrary reconstructor under `tag`.
    ///
    /// A later registration for the same tag replaces the earlier one.
    pub fn register_with<T, F>(&mut self, tag: impl Into<String>, reconstruct: F) -> &mut Self
    where
        T: 'static,
        F: Fn(&Value) -> Result<T, HydrationError> + 'static,
    {
        let tag = tag.into();
        tracing::debug!(%tag, ty = type_name::<T>(), "registered reconstructor");
        let reconstructor: Reconstructor = Box::new(move |data: &Value| {
            reconstruct(data).map(|instance| Rc::new(instance) as Rc<dyn Any>)
        });
        self.reconstructors.insert(tag, reconstructor);
        self
    }

    /// Builder form of [`ClassRegistry::register`].
    pub fn with<T: Serializable>(mut self) -> Self {
        self.register::<T>();
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.reconstructors.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.reconstructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reconstructors.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.reconstructors.keys().map(String::as_str)
    }

    fn reconstruct(&self, tag: &str, data: &Value) -> Option<Result<Rc<dyn Any>, HydrationError>> {
        self.reconstructors.get(tag).map(|f| f(data))
    }
}

impl std::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("tags", &self.tags().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// HYDRATED INSTANCES
// =============================================================================

/// Live instances rebuilt from a [`DehydratedState`], looked up by name.
#[derive(Default)]
pub struct HydratedInstances {
    instances: BTreeMap<String, Rc<dyn Any>>,
}

impl HydratedInstances {
    /// Instance stored under `name`, if it exists and is a `T`.
    pub fn get<T: 'static>(&self, name: &str) -> Option<Rc<T>> {
        let instance = self.instances.get(name)?.clone();
        instance.downcast::<T>().ok()
    }

    /// Like [`HydratedInstances::get`], but says why the lookup failed.
    pub fn require<T: 'static>(&self, name: &str) -> Result<Rc<T>, HydrationError> {
        let instance = self
            .instances
            .get(name)
            .ok_or_else(|| HydrationError::Missing { name: name.into() })?;

        instance
            .clone()
            .downcast::<T>()
            .map_err(|_| HydrationError::TypeMismatch {
                name: name.into(),
                expected: type_name::<T>(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.instances.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for HydratedInstances {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HydratedInstances")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// HYDRATE
// =============================================================================

/// Rebuild every entry of `state` whose type tag is registered.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use serde_json::Value;
/// use spark_pubsub::{from_data, hydrate, ClassRegistry, DehydratedState, HydrationError, Serializable};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Sprite {
///     x: i32,
///     y: i32,
/// }
///
/// impl Serializable for Sprite {
///     const TYPE_TAG: &'static str = "Sprite";
///
///     fn dehydrate(&self) -> Value {
///         serde_json::to_value(self).unwrap_or_default()
///     }
///
///     fn hydrate(data: &Value) -> Result<Self, HydrationError> {
///         from_data(Self::TYPE_TAG, data)
///     }
/// }
///
/// let state = DehydratedState::new().with("sprite1", &Sprite { x: 1, y: 2 });
/// let registry = ClassRegistry::new().with::<Sprite>();
///
/// let hydrated = hydrate(&state, &registry).unwrap();
/// assert_eq!(*hydrated.require::<Sprite>("sprite1").unwrap(), Sprite { x: 1, y: 2 });
/// ```
pub fn hydrate(
    state: &DehydratedState,
    registry: &ClassRegistry,
) -> Result<HydratedInstances, HydrationError> {
    let mut instances = BTreeMap::new();

    for (name, payload) in state.iter() {
        match registry.reconstruct(&payload.type_tag, &payload.data) {
            Some(instance) => {
                instances.insert(name.to_string(), instance?);
            }
            None => {
                tracing::debug!(
                    %name,
                    tag = %payload.type_tag,
                    "no reconstructor registered, entry skipped"
                );
            }
        }
    }

    Ok(HydratedInstances { instances })
}

/// Deserialize `data` with serde, reporting failures as
/// [`HydrationError::Invalid`] for `type_tag`.
pub fn from_data<D: DeserializeOwned>(
    type_tag: &'static str,
    data: &Value,
) -> Result<D, HydrationError> {
    D::deserialize(data).map_err(|err| HydrationError::invalid(type_tag, err.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
