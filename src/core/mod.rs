// ============================================================================
// spark-pubsub - Core Module
// Fundamental types, errors, and scoped context
// ============================================================================

pub mod context;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use context::{Context, ContextId, ProviderStack, create_context, provider_depth, with_providers};
pub use error::{ContextError, HydrationError, ImmutabilityError};
pub use types::{FieldName, Subscriber, SubscriberId, is_relevant};
