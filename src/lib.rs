// ============================================================================
// spark-pubsub - Reactive State Utilities for Rust
// ============================================================================
//
// Field-change notification for plain structs: a pub/sub core, a wrapper
// that notifies after mutating methods, composition over third-party types,
// freezable fields for copy-on-write state, and hydration of named instances
// across a serialization gap.
// ============================================================================

#[macro_use]
mod macros;

pub mod core;
pub mod hydration;
pub mod immutability;
pub mod primitives;

// Re-export core items at crate root for ergonomic access
pub use crate::core::context::{Context, ContextId, create_context, provider_depth};
pub use crate::core::error::{ContextError, HydrationError, ImmutabilityError};
pub use crate::core::types::{FieldName, Subscriber, SubscriberId, is_relevant};

// Re-export primitives at crate root
pub use primitives::mixin::Mixin;
pub use primitives::notifies::Notifies;
pub use primitives::pubsub::{Notifiable, PubSub, Subscription};
pub use primitives::watch::{Watch, on_notify, watch, watch_with};

// Re-export immutability
pub use immutability::field::{Field, FreezeState};
pub use immutability::freeze::{Freeze, Immutable, ImmutableOptions, immutable};

// Re-export hydration
pub use hydration::{
    AnySerializable, ClassRegistry, DehydratedState, HydratedInstances, HydrationContext,
    Serializable, SerializedInstance, create_hydration_context, dehydrate, from_data, hydrate,
};

// =============================================================================
// TESTS
// =============================================================================
