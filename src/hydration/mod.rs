// ============================================================================
// spark-pubsub - Hydration Module
// Moving instances across a serialization gap and back
// ============================================================================

pub mod provider;
pub mod registry;
pub mod state;

pub use provider::{HydrationContext, create_hydration_context};
pub use registry::{ClassRegistry, HydratedInstances, from_data, hydrate};
pub use state::{AnySerializable, DehydratedState, Serializable, SerializedInstance, dehydrate};
