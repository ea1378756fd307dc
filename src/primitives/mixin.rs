// ============================================================================
// spark-pubsub - Mixin
// Add pub/sub behavior to an arbitrary base type without touching it
// ============================================================================
//
// Mixin<B> owns the base value and a PubSub. The base keeps its own methods;
// they are reached through borrow()/borrow_mut(), the equivalent of a super
// call. Methods defined on a type built with `pubsub_mixin!` shadow the base
// ones and can be annotated with `Notifies`.
// ============================================================================

use std::cell::{Ref, RefCell, RefMut};

use crate::immutability::freeze::Freeze;
use crate::primitives::pubsub::{Notifiable, PubSub};

/// A base type composed with the Notification Core.
///
/// # Example
///
/// ```
/// use spark_pubsub::{Mixin, Notifiable};
///
/// #[derive(Default)]
/// struct ThirdPartySprite {
///     x: i32,
/// }
///
/// let sprite = Mixin::new(ThirdPartySprite::default());
/// let _sub = sprite.subscribe(|fields| assert_eq!(fields, ["x"]));
///
/// sprite.borrow_mut().x = 3;
/// sprite.notify(&["x"]);
/// assert_eq!(sprite.borrow().x, 3);
/// ```
pub struct Mixin<B> {
    base: RefCell<B>,
    pubsub: PubSub,
}

impl<B> Mixin<B> {
    pub fn new(base: B) -> Self {
        Self {
            base: RefCell::new(base),
            pubsub: PubSub::new(),
        }
    }

    /// Shared access to the base value.
    ///
    /// # Panics
    ///
    /// Panics if the base is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, B> {
        self.base.borrow()
    }

    /// Exclusive access to the base value, for calling its `&mut self`
    /// methods.
    ///
    /// # Panics
    ///
    /// Panics if the base is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, B> {
        self.base.borrow_mut()
    }

    /// Read the base with a closure.
    pub fn with<R>(&self, f: impl FnOnce(&B) -> R) -> R {
        f(&self.base.borrow())
    }

    /// Mutate the base with a closure.
    ///
    /// The borrow ends before this returns, so a notification sent after it
    /// can read the base again.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(&mut self.base.borrow_mut())
    }

    /// Unwrap the base value. Subscribers are dropped.
    pub fn into_inner(self) -> B {
        self.base.into_inner()
    }
}

impl<B> Notifiable for Mixin<B> {
    fn pubsub(&self) -> &PubSub {
        &self.pubsub
    }
}

// Freezing reaches through to the base; the hub itself is never frozen
impl<B: Freeze> Freeze for Mixin<B> {
    fn deep_freeze(&self) {
        self.base.borrow().deep_freeze();
    }

    fn freeze_fields(&self) {
        self.base.borrow().freeze_fields();
    }
}

impl<B: Default> Default for Mixin<B> {
    fn default() -> Self {
        Self::new(B::default())
    }
}

impl<B> From<B> for Mixin<B> {
    fn from(base: B) -> Self {
        Self::new(base)
    }
}

impl<B: std::fmt::Debug> std::fmt::Debug for Mixin<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mixin")
            .field("base", &self.base)
            .field("pubsub", &self.pubsub)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FieldName;
    use crate::primitives::notifies::Notifies;
    use std::rc::Rc;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct ThirdPartySprite {
        x: i32,
        y: i32,
    }

    impl ThirdPartySprite {
        fn set_position(&mut self, x: i32, y: i32) {
            self.x = x;
            self.y = y;
        }
    }

    crate::pubsub_mixin! {
        /// Sprite that reports its position changes.
        #[derive(Default)]
        struct ReactiveSprite(ThirdPartySprite);
    }

    impl ReactiveSprite {
        const SET_POSITION: Notifies = Notifies::new(&["x", "y"]);

        fn set_position(&self, x: i32, y: i32) {
            Self::SET_POSITION.call(self, |s| s.borrow_mut().set_position(x, y))
        }
    }

    fn record<N: Notifiable>(target: &N) -> Rc<RefCell<Vec<Vec<FieldName>>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let _ = target.subscribe({
            let log = log.clone();
            move |fields| log.borrow_mut().push(fields.to_vec())
        });
        log
    }

    #[test]
    fn base_behaves_as_before() {
        let mixed = Mixin::new(ThirdPartySprite::default());
        mixed.borrow_mut().set_position(2, 3);
        assert_eq!(*mixed.borrow(), ThirdPartySprite { x: 2, y: 3 });
        assert_eq!(mixed.into_inner(), ThirdPartySprite { x: 2, y: 3 });
    }

    #[test]
    fn base_methods_do_not_notify_on_their_own() {
        let mixed = Mixin::<ThirdPartySprite>::default();
        let log = record(&mixed);

        mixed.with_mut(|s| s.set_position(1, 1));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn override_notifies_exactly_once() {
        let sprite = ReactiveSprite::default();
        assert_eq!(sprite.with(|s| (s.x, s.y)), (0, 0));

        let log = record(&sprite);
        assert!(log.borrow().is_empty());

        sprite.set_position(1, 1);
        assert_eq!(*log.borrow(), vec![vec!["x", "y"]]);
        assert_eq!(sprite.with(|s| (s.x, s.y)), (1, 1));
    }

    #[test]
    fn declared_type_keeps_its_name() {
        let sprite = ReactiveSprite::from(ThirdPartySprite::default());
        assert!(std::any::type_name_of_val(&sprite).ends_with("ReactiveSprite"));
    }

    #[test]
    fn base_can_be_handed_in_preinitialized() {
        let sprite = ReactiveSprite::new(ThirdPartySprite { x: 5, y: 6 });
        assert_eq!(sprite.borrow().x, 5);
        assert_eq!(sprite.into_inner().y, 6);
    }
}
