// ============================================================================
// spark-pubsub - Freeze
// Recursive read-only marking of owned value graphs
// ============================================================================
//
// Plain Rust data behind a shared reference is already read-only. The only
// things that can change behind `&T` in this crate are `Field`s, so freezing
// a graph means finding every reachable `Field` and locking it. Values with
// no `Field` inside freeze trivially.
// ============================================================================

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::ops::Deref;
use std::rc::Rc;

use crate::primitives::pubsub::{Notifiable, PubSub};

// =============================================================================
// FREEZE TRAIT
// =============================================================================

/// A value whose reachable `Field`s can be locked.
pub trait Freeze {
    /// Seal this value and everything reachable from it.
    ///
    /// Sealed fields reject every write, including replacement.
    fn deep_freeze(&self);

    /// Freeze this value as the root of an immutable instance.
    ///
    /// Own fields become read-only but stay replaceable through `set` and
    /// `update`; their contents are sealed. Defaults to `deep_freeze`.
    fn freeze_fields(&self) {
        self.deep_freeze();
    }
}

/// Implement `Freeze` as a no-op for types that hold no `Field`.
macro_rules! impl_inert_freeze {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Freeze for $ty {
                fn deep_freeze(&self) {}
            }
        )*
    };
}

impl_inert_freeze!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    str,
    String,
    serde_json::Value,
);

impl<T: Freeze + ?Sized> Freeze for &T {
    fn deep_freeze(&self) {
        (**self).deep_freeze();
    }
}

impl<T: Freeze + ?Sized> Freeze for Box<T> {
    fn deep_freeze(&self) {
        (**self).deep_freeze();
    }
}

impl<T: Freeze + ?Sized> Freeze for Rc<T> {
    fn deep_freeze(&self) {
        (**self).deep_freeze();
    }

    fn freeze_fields(&self) {
        (**self).freeze_fields();
    }
}

impl<T: Freeze> Freeze for Option<T> {
    fn deep_freeze(&self) {
        if let Some(value) = self {
            value.deep_freeze();
        }
    }
}

impl<T: Freeze> Freeze for [T] {
    fn deep_freeze(&self) {
        self.iter().for_each(Freeze::deep_freeze);
    }
}

impl<T: Freeze, const N: usize> Freeze for [T; N] {
    fn deep_freeze(&self) {
        self.iter().for_each(Freeze::deep_freeze);
    }
}

impl<T: Freeze> Freeze for Vec<T> {
    fn deep_freeze(&self) {
        self.iter().for_each(Freeze::deep_freeze);
    }
}

impl<T: Freeze> Freeze for VecDeque<T> {
    fn deep_freeze(&self) {
        self.iter().for_each(Freeze::deep_freeze);
    }
}

// Keys are immutable while inside a map, only values can hold fields
impl<K, V: Freeze, S> Freeze for HashMap<K, V, S> {
    fn deep_freeze(&self) {
        self.values().for_each(Freeze::deep_freeze);
    }
}

impl<K, V: Freeze> Freeze for BTreeMap<K, V> {
    fn deep_freeze(&self) {
        self.values().for_each(Freeze::deep_freeze);
    }
}

impl<T, S> Freeze for HashSet<T, S> {
    fn deep_freeze(&self) {}
}

impl<T> Freeze for BTreeSet<T> {
    fn deep_freeze(&self) {}
}

impl<A: Freeze, B: Freeze> Freeze for (A, B) {
    fn deep_freeze(&self) {
        self.0.deep_freeze();
        self.1.deep_freeze();
    }
}

impl<A: Freeze, B: Freeze, C: Freeze> Freeze for (A, B, C) {
    fn deep_freeze(&self) {
        self.0.deep_freeze();
        self.1.deep_freeze();
        self.2.deep_freeze();
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Configuration of [`immutable`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImmutableOptions {
    /// Skip freezing entirely (tests, hot paths)
    pub disabled: bool,
}

impl ImmutableOptions {
    pub const fn enabled() -> Self {
        Self { disabled: false }
    }

    pub const fn disabled() -> Self {
        Self { disabled: true }
    }
}

// =============================================================================
// IMMUTABLE
// =============================================================================

/// Read-only handle to an instance built by [`immutable`].
///
/// Derefs to the instance but never hands out `&mut`, so a field can only be
/// replaced through [`Field::set`](crate::Field::set) or
/// [`Field::update`](crate::Field::update), which refreeze the new value.
///
/// ```compile_fail
/// use spark_pubsub::{Field, ImmutableOptions, freezable, immutable};
///
/// struct Store {
///     items: Field<Vec<i32>>,
/// }
///
/// freezable!(Store { items });
///
/// let mut store = immutable(Store { items: Field::new(vec![1]) }, ImmutableOptions::default());
/// // Plain assignment would install an unfrozen field
/// store.items = Field::new(vec![1]);
/// ```
pub struct Immutable<T> {
    instance: T,
}

impl<T> Immutable<T> {
    /// Name of the wrapped instance's type.
    pub fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl<T> Deref for Immutable<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.instance
    }
}

impl<T> AsRef<T> for Immutable<T> {
    fn as_ref(&self) -> &T {
        &self.instance
    }
}

impl<T: Freeze> Freeze for Immutable<T> {
    fn deep_freeze(&self) {
        self.instance.deep_freeze();
    }

    fn freeze_fields(&self) {
        self.instance.freeze_fields();
    }
}

impl<T: Notifiable> Notifiable for Immutable<T> {
    fn pubsub(&self) -> &PubSub {
        self.instance.pubsub()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Immutable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Immutable").field(&self.instance).finish()
    }
}

/// Freeze a freshly constructed instance and hand back a read-only handle.
///
/// Every own field of `instance` becomes read-only and everything reachable
/// from those fields is sealed. Fields stay replaceable, so copy-on-write
/// updates keep working while in-place edits fail. The instance keeps its
/// type behind the handle. With `disabled` set, nothing is frozen.
///
/// # Example
///
/// ```
/// use spark_pubsub::{Field, ImmutableOptions, freezable, immutable};
///
/// struct Store {
///     items: Field<Vec<i32>>,
/// }
///
/// freezable!(Store { items });
///
/// let store = immutable(
///     Store { items: Field::new(vec![1]) },
///     ImmutableOptions::default(),
/// );
///
/// assert!(store.items.mutate(|items| items.push(2)).is_err());
/// store
///     .items
///     .update(|items| items.iter().copied().chain([2]).collect())
///     .unwrap();
/// assert_eq!(store.items.get(), vec![1, 2]);
/// ```
pub fn immutable<T: Freeze>(instance: T, options: ImmutableOptions) -> Immutable<T> {
    if !options.disabled {
        tracing::debug!(
            instance = std::any::type_name::<T>(),
            "freezing instance"
        );
        instance.freeze_fields();
    }
    Immutable { instance }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inert_values_freeze_without_effect() {
        42i32.deep_freeze();
        "text".deep_freeze();
        vec![1u32, 2, 3].deep_freeze();
        Some(String::from("a")).deep_freeze();
        (1u8, 2.0f64).deep_freeze();
        serde_json::json!({ "a": [1, 2] }).deep_freeze();
    }

    #[test]
    fn immutable_handle_only_allows_refreezing_setters() {
        use crate::immutability::field::{Field, FreezeState};

        struct Store {
            items: Field<Vec<u32>>,
        }

        crate::freezable!(Store { items });

        let store = immutable(
            Store {
                items: Field::new(vec![1]),
            },
            ImmutableOptions::default(),
        );
        assert!(store.type_name().ends_with("Store"));
        assert_eq!(store.items.state(), FreezeState::Frozen);

        // Replacement goes through `set`, so the field stays frozen
        store.items.set(vec![1]).unwrap();
        assert_eq!(store.items.state(), FreezeState::Frozen);
        assert!(store.items.mutate(|items| items.push(2)).is_err());
        assert_eq!(store.as_ref().items.get(), vec![1]);
    }

    #[test]
    fn options_default_to_enabled() {
        assert!(!ImmutableOptions::default().disabled);
        assert_eq!(ImmutableOptions::default(), ImmutableOptions::enabled());
        assert!(ImmutableOptions::disabled().disabled);
    }
}
