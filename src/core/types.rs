// ============================================================================
// spark-pubsub - Type Definitions
// Shared aliases for change events and their subscribers
// ============================================================================

use std::rc::Rc;

// =============================================================================
// CHANGE EVENTS
// =============================================================================

/// Name of a tracked field, as reported in a change event.
///
/// Field names are declared next to the code that mutates them, so they are
/// always static strings.
pub type FieldName = &'static str;

/// A subscriber callback.
///
/// Receives every field name reported by one `notify` call. Identity is the
/// `Rc` allocation: registering the same `Rc` twice is a single subscription.
pub type Subscriber = Rc<dyn Fn(&[FieldName])>;

/// Identifier of one registration inside a `PubSub`.
///
/// Monotonic per hub, never reused, so a stale handle can never remove a
/// newer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub(crate) u64);

/// Address of a subscriber allocation, used for set semantics.
///
/// Compares the data pointer only; vtable pointers of the same closure may
/// differ between codegen units.
pub(crate) fn subscriber_addr(subscriber: &Subscriber) -> *const () {
    Rc::as_ptr(subscriber) as *const ()
}

/// True if any name in `event` is one of `watched`.
pub fn is_relevant(event: &[FieldName], watched: &[FieldName]) -> bool {
    event.iter().any(|field| watched.contains(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relevance_is_any_overlap() {
        assert!(is_relevant(&["x", "y"], &["y"]));
        assert!(!is_relevant(&["x"], &["y", "z"]));
        assert!(!is_relevant(&[], &["x"]));
    }

    #[test]
    fn same_rc_has_same_address() {
        let a: Subscriber = Rc::new(|_: &[FieldName]| {});
        let b = a.clone();
        let c: Subscriber = Rc::new(|_: &[FieldName]| {});
        assert_eq!(subscriber_addr(&a), subscriber_addr(&b));
        assert_ne!(subscriber_addr(&a), subscriber_addr(&c));
    }
}
