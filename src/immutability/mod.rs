// ============================================================================
// spark-pubsub - Immutability Module
// Freezable fields and the `immutable` construction step
// ============================================================================

pub mod field;
pub mod freeze;

pub use field::{Field, FreezeState};
pub use freeze::{Freeze, Immutable, ImmutableOptions, immutable};
