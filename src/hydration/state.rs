// ============================================================================
// spark-pubsub - Dehydrated State
// Named instances turned into plain `{ data, typeTag }` payloads
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::HydrationError;

// =============================================================================
// SERIALIZABLE
// =============================================================================

/// A type that can cross a serialization gap.
///
/// `TYPE_TAG` names the type in dehydrated payloads and selects the
/// reconstructor in a [`ClassRegistry`](super::ClassRegistry).
pub trait Serializable: Sized + 'static {
    const TYPE_TAG: &'static str;

    /// Plain data snapshot of this instance.
    fn dehydrate(&self) -> Value;

    /// Rebuild a live instance from a snapshot.
    ///
    /// Must fail with [`HydrationError::Invalid`] rather than return a
    /// partially initialized instance when `data` has the wrong shape.
    fn hydrate(data: &Value) -> Result<Self, HydrationError>;
}

/// Object-safe view of [`Serializable`], so instances of different types can
/// be dehydrated together.
pub trait AnySerializable {
    fn type_tag(&self) -> &'static str;
    fn dehydrate_value(&self) -> Value;
}

impl<T: Serializable> AnySerializable for T {
    fn type_tag(&self) -> &'static str {
        T::TYPE_TAG
    }

    fn dehydrate_value(&self) -> Value {
        self.dehydrate()
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// One dehydrated instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedInstance {
    pub data: Value,
    pub type_tag: String,
}

impl SerializedInstance {
    pub fn of(instance: &(impl AnySerializable + ?Sized)) -> Self {
        Self {
            data: instance.dehydrate_value(),
            type_tag: instance.type_tag().to_string(),
        }
    }
}

/// Name to payload mapping. Serializes as a plain JSON object.
///
/// # Example
///
/// ```
/// use serde_json::{json, Value};
/// use spark_pubsub::{DehydratedState, HydrationError, Serializable};
///
/// struct Sprite {
///     x: i64,
/// }
///
/// impl Serializable for Sprite {
///     const TYPE_TAG: &'static str = "Sprite";
///
///     fn dehydrate(&self) -> Value {
///         json!({ "x": self.x })
///     }
///
///     fn hydrate(data: &Value) -> Result<Self, HydrationError> {
///         let x = data["x"]
///             .as_i64()
///             .ok_or_else(|| HydrationError::invalid(Self::TYPE_TAG, "x must be a number"))?;
///         Ok(Sprite { x })
///     }
/// }
///
/// let state = DehydratedState::new().with("sprite1", &Sprite { x: 3 });
/// assert_eq!(
///     state.to_json().unwrap(),
///     r#"{"sprite1":{"data":{"x":3},"typeTag":"Sprite"}}"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DehydratedState {
    entries: BTreeMap<String, SerializedInstance>,
}

impl DehydratedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`DehydratedState::insert`].
    pub fn with(
        mut self,
        name: impl Into<String>,
        instance: &(impl AnySerializable + ?Sized),
    ) -> Self {
        self.insert(name, instance);
        self
    }

    /// Dehydrate `instance` under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, instance: &(impl AnySerializable + ?Sized)) {
        self.entries
            .insert(name.into(), SerializedInstance::of(instance));
    }

    /// Insert an already dehydrated payload.
    pub fn insert_raw(&mut self, name: impl Into<String>, payload: SerializedInstance) {
        self.entries.insert(name.into(), payload);
    }

    pub fn get(&self, name: &str) -> Option<&SerializedInstance> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SerializedInstance)> {
        self.entries.iter().map(|(name, payload)| (name.as_str(), payload))
    }

    pub fn to_json(&self) -> Result<String, HydrationError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, HydrationError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Dehydrate a set of named instances.
///
/// Pure: the instances are only read.
pub fn dehydrate<'a, I, N>(instances: I) -> DehydratedState
where
    I: IntoIterator<Item = (N, &'a dyn AnySerializable)>,
    N: Into<String>,
{
    let mut state = DehydratedState::new();
    for (name, instance) in instances {
        state.insert(name, instance);
    }
    state
}

// =============================================================================
// TESTS
// =============================================================================
