// ============================================================================
// spark-pubsub - Ergonomic Macros
// ============================================================================

/// Helper macro to clone variables into a move closure.
///
/// This reduces the boilerplate of manually cloning `Rc` handles before
/// moving them into a subscriber.
///
/// # Usage
///
/// ```rust
/// use spark_pubsub::{cloned, PubSub};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let hub = PubSub::new();
/// let hits = Rc::new(Cell::new(0));
///
/// let _sub = hub.subscribe(cloned!(hits => move |_| hits.set(hits.get() + 1)));
/// hub.notify(&["x"]);
/// assert_eq!(hits.get(), 1);
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}

/// Run a method body, then report the listed fields as changed.
///
/// Wraps `Notifies::new(&[...]).call(self, |this| body)`. Inside the body the
/// receiver is available under the name given before the arrow.
///
/// # Usage
///
/// ```rust
/// use spark_pubsub::{notifies, Notifiable, PubSub};
/// use std::cell::Cell;
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
/// impl Sprite {
///     fn set_position(&self, x: i32, y: i32) {
///         notifies!(self, ["x", "y"] => |this| {
///             this.x.set(x);
///             this.y.set(y);
///         })
///     }
/// }
///
/// Sprite::default().set_position(1, 1);
/// ```
#[macro_export]
macro_rules! notifies {
    ($this:expr, [$($field:expr),* $(,)?] => |$recv:ident| $body:expr) => {
        $crate::Notifies::new(&[$($field),*]).call($this, |$recv| $body)
    };
}

/// Declare a named type that composes a base type with pub/sub behavior.
///
/// The generated struct derefs to [`Mixin`](crate::Mixin) over the base,
/// implements `Notifiable` and `From<Base>`, and gets `new(base)` and
/// `into_inner()`. Attributes (including derives such as `Default`) are
/// forwarded to the struct. The wrapped mixin is stored in a field named
/// `mixin`, so `freezable!(Name { mixin })` makes the type freezable when the
/// base is.
///
/// # Usage
///
/// ```rust
/// use spark_pubsub::{pubsub_mixin, Notifiable, Notifies};
///
/// #[derive(Default)]
/// pub struct ThirdPartySprite {
///     x: i32,
///     y: i32,
/// }
///
/// impl ThirdPartySprite {
///     fn set_position(&mut self, x: i32, y: i32) {
///         self.x = x;
///         self.y = y;
///     }
/// }
///
/// pubsub_mixin! {
///     #[derive(Default)]
///     pub struct ReactiveSprite(ThirdPartySprite);
/// }
///
/// impl ReactiveSprite {
///     pub fn set_position(&self, x: i32, y: i32) {
///         Notifies::new(&["x", "y"]).call(self, |s| s.borrow_mut().set_position(x, y))
///     }
/// }
///
/// let sprite = ReactiveSprite::default();
/// sprite.set_position(1, 1);
/// assert_eq!(sprite.borrow().x, 1);
/// ```
#[macro_export]
macro_rules! pubsub_mixin {
    ($(#[$meta:meta])* $vis:vis struct $name:ident($base:ty);) => {
        $(#[$meta])*
        $vis struct $name {
            mixin: $crate::Mixin<$base>,
        }

        #[allow(dead_code)]
        impl $name {
            /// Compose `base` with a fresh, subscriber-less hub.
            $vis fn new(base: $base) -> Self {
                Self {
                    mixin: $crate::Mixin::new(base),
                }
            }

            /// Unwrap the base value. Subscribers are dropped.
            $vis fn into_inner(self) -> $base {
                self.mixin.into_inner()
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::Mixin<$base>;

            fn deref(&self) -> &Self::Target {
                &self.mixin
            }
        }

        impl ::std::convert::From<$base> for $name {
            fn from(base: $base) -> Self {
                Self::new(base)
            }
        }

        impl $crate::Notifiable for $name {
            fn pubsub(&self) -> &$crate::PubSub {
                $crate::Notifiable::pubsub(&self.mixin)
            }
        }
    };
}

/// Implement [`Freeze`](crate::Freeze) for user types.
///
/// - `freezable!(Type { a, b })` freezes the listed members. Fields not
///   listed (such as an embedded `PubSub`) are left alone.
/// - `freezable!(TypeA, TypeB)` marks plain data types that hold no `Field`.
///
/// # Usage
///
/// ```rust
/// use spark_pubsub::{freezable, Field, Freeze};
///
/// #[derive(Clone)]
/// struct Todo {
///     label: String,
/// }
///
/// struct Store {
///     todos: Field<Vec<Todo>>,
/// }
///
/// freezable!(Todo);
/// freezable!(Store { todos });
///
/// let store = Store { todos: Field::new(vec![]) };
/// store.freeze_fields();
/// assert!(store.todos.is_frozen());
/// ```
#[macro_export]
macro_rules! freezable {
    ($name:ident { $($field:ident),* $(,)? }) => {
        impl $crate::Freeze for $name {
            fn deep_freeze(&self) {
                $( $crate::Freeze::deep_freeze(&self.$field); )*
            }

            fn freeze_fields(&self) {
                $( $crate::Freeze::freeze_fields(&self.$field); )*
            }
        }
    };
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Freeze for $ty {
                fn deep_freeze(&self) {}
            }
        )+
    };
}
