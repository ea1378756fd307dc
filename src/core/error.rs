// ============================================================================
// spark-pubsub - Errors
// Failure types for immutable fields, hydration, and scoped contexts
// ============================================================================

use thiserror::Error;

// =============================================================================
// IMMUTABILITY
// =============================================================================

/// Raised at the point where a frozen value is mutated in place.
///
/// This is the enforcement signal for the copy-on-write contract: the caller
/// should replace the field with `set`/`update` instead of editing it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImmutabilityError {
    /// Direct mutation of a frozen top-level field.
    #[error("cannot mutate frozen value of type `{type_name}`; replace it instead")]
    Frozen { type_name: &'static str },

    /// Any write to a field reachable from a frozen value.
    #[error("cannot assign to sealed value of type `{type_name}`; it is owned by a frozen value")]
    Sealed { type_name: &'static str },
}

// =============================================================================
// CONTEXT
// =============================================================================

/// A scoped value was requested outside of its provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("context `{context}` must be used inside its own provider")]
    Missing { context: &'static str },
}

// =============================================================================
// HYDRATION
// =============================================================================

/// Errors produced while turning dehydrated payloads back into instances.
#[derive(Debug, Error)]
pub enum HydrationError {
    /// A reconstructor rejected the shape of its data.
    #[error("invalid data for `{type_tag}`: {reason}")]
    Invalid {
        type_tag: &'static str,
        reason: String,
    },

    #[error("malformed dehydrated state: {0}")]
    Json(#[from] serde_json::Error),

    /// The hydrated map has no entry under this name.
    #[error("no hydrated instance named `{name}`")]
    Missing { name: String },

    /// The entry exists but was reconstructed as a different type.
    #[error("hydrated instance `{name}` is not a `{expected}`")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Context(#[from] ContextError),
}

impl HydrationError {
    /// Shorthand for reconstructors reporting a validation failure.
    pub fn invalid(type_tag: &'static str, reason: impl Into<String>) -> Self {
        HydrationError::Invalid {
            type_tag,
            reason: reason.into(),
        }
    }
}
