// ============================================================================
// spark-pubsub - Primitives Module
// Notification core and its consumers: pubsub, notifies, mixin, watch
// ============================================================================

pub mod mixin;
pub mod notifies;
pub mod pubsub;
pub mod watch;

// Re-export for convenience
pub use mixin::Mixin;
pub use notifies::Notifies;
pub use pubsub::{Notifiable, PubSub, PubSubInner, Subscription};
pub use watch::{Watch, on_notify, watch, watch_with};
