// ============================================================================
// spark-pubsub - Field
// A tracked field cell with a one-way freeze state machine
// ============================================================================
//
//   Mutable ──freeze──▶ Frozen ──deep_freeze──▶ Sealed
//      └───────────deep_freeze──────────────────▲
//
// Mutable: every write is allowed.
// Frozen:  contents are read-only; replacing the whole value is allowed and
//          the new value is deep-frozen before it is installed.
// Sealed:  reached from some other frozen value; no write at all. This also
//          covers a Frozen field whose instance is later sealed into another
//          frozen graph.
// ============================================================================

use std::any::type_name;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::freeze::Freeze;
use crate::core::error::ImmutabilityError;

/// Freeze state of a [`Field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeState {
    Mutable,
    Frozen,
    Sealed,
}

/// A field whose value can be frozen in place.
///
/// Reads hand out cheap `Rc` snapshots, so a reader never blocks a later
/// replacement.
///
/// # Example
///
/// ```
/// use spark_pubsub::Field;
///
/// let todos = Field::new(vec!["write docs"]);
/// todos.mutate(|t| t.push("ship")).unwrap();
///
/// todos.freeze();
/// assert!(todos.mutate(|t| t.push("again")).is_err());
///
/// // Copy-on-write still works
/// todos.update(|t| t.iter().copied().chain(["again"]).collect()).unwrap();
/// assert_eq!(todos.get().len(), 3);
/// ```
pub struct Field<T> {
    value: RefCell<Rc<T>>,
    state: Cell<FreezeState>,
}

impl<T> Field<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(Rc::new(value)),
            state: Cell::new(FreezeState::Mutable),
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Current value (cloning).
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        (*self.snapshot()).clone()
    }

    /// Shared handle to the current value.
    ///
    /// The snapshot stays valid after the field is replaced.
    pub fn snapshot(&self) -> Rc<T> {
        self.value.borrow().clone()
    }

    /// Access the current value with a closure (avoids cloning).
    ///
    /// `f` reads a snapshot, so it may replace the field without panicking.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let current = self.snapshot();
        f(&current)
    }

    pub fn state(&self) -> FreezeState {
        self.state.get()
    }

    /// Whether in-place mutation is rejected
    pub fn is_frozen(&self) -> bool {
        self.state.get() != FreezeState::Mutable
    }

    pub fn is_sealed(&self) -> bool {
        self.state.get() == FreezeState::Sealed
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Replace the value.
    ///
    /// On a frozen field the new value is deep-frozen before it is installed,
    /// so it can never be edited in place either. Fails on a sealed field.
    pub fn set(&self, value: T) -> Result<(), ImmutabilityError>
    where
        T: Freeze,
    {
        match self.state.get() {
            FreezeState::Sealed => Err(ImmutabilityError::Sealed {
                type_name: type_name::<T>(),
            }),
            FreezeState::Frozen => {
                value.deep_freeze();
                *self.value.borrow_mut() = Rc::new(value);
                Ok(())
            }
            FreezeState::Mutable => {
                *self.value.borrow_mut() = Rc::new(value);
                Ok(())
            }
        }
    }

    /// Copy-on-write update: build the next value from the current one and
    /// install it with [`Field::set`].
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<(), ImmutabilityError>
    where
        T: Freeze,
    {
        if self.is_sealed() {
            return Err(ImmutabilityError::Sealed {
                type_name: type_name::<T>(),
            });
        }
        let next = self.with(f);
        self.set(next)
    }

    /// Edit the value in place.
    ///
    /// Only allowed while the field is mutable. If a snapshot is still held
    /// elsewhere, the value is cloned first so the snapshot is unaffected.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, ImmutabilityError>
    where
        T: Clone,
    {
        match self.state.get() {
            FreezeState::Frozen => Err(ImmutabilityError::Frozen {
                type_name: type_name::<T>(),
            }),
            FreezeState::Sealed => Err(ImmutabilityError::Sealed {
                type_name: type_name::<T>(),
            }),
            FreezeState::Mutable => {
                let mut value = self.value.borrow_mut();
                Ok(f(Rc::make_mut(&mut *value)))
            }
        }
    }

    // =========================================================================
    // FREEZING
    // =========================================================================

    /// Freeze as a top-level field: contents are sealed, replacement stays
    /// allowed. No effect on a field that is already frozen.
    pub fn freeze(&self)
    where
        T: Freeze,
    {
        if self.state.get() != FreezeState::Mutable {
            return;
        }
        self.state.set(FreezeState::Frozen);
        self.snapshot().deep_freeze();
    }
}

impl<T: Freeze> Freeze for Field<T> {
    fn deep_freeze(&self) {
        // Sealed fields were walked before; this also stops cycles
        if self.state.get() == FreezeState::Sealed {
            return;
        }
        self.state.set(FreezeState::Sealed);
        self.snapshot().deep_freeze();
    }

    fn freeze_fields(&self) {
        self.freeze();
    }
}

impl<T: Default> Default for Field<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("value", &self.snapshot())
            .field("state", &self.state.get())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
