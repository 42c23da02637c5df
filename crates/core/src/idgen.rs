//! Injected id generation for synthesized codes and element ids.
//!
//! The normalizer and builder must sometimes invent a `code` or `elementId`
//! (a group with no code, a spacer with no id). Generation goes through a
//! trait so production gets collision-free uuids while tests get a
//! deterministic counter.

/// Source of fresh identifiers for synthesized codes and element ids.
pub trait IdProvider {
    /// Return a fresh identifier starting with `prefix` followed by `_`.
    fn next_id(&mut self, prefix: &str) -> String;
}

/// Production provider: uuid v4 suffixes, collision-free across calls.
#[derive(Debug, Default)]
pub struct UuidIds;

impl IdProvider for UuidIds {
    fn next_id(&mut self, prefix: &str) -> String {
        format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
    }
}

/// Deterministic provider for tests: `prefix_1`, `prefix_2`, ...
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdProvider for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}_{}", self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_count_up_per_provider() {
        let mut ids = SequentialIds::new();
        assert_eq!(ids.next_id("group"), "group_1");
        assert_eq!(ids.next_id("field"), "field_2");
        assert_eq!(ids.next_id("group"), "group_3");
    }

    #[test]
    fn uuid_ids_embed_the_prefix_and_never_repeat() {
        let mut ids = UuidIds;
        let a = ids.next_id("spacer");
        let b = ids.next_id("spacer");
        assert!(a.starts_with("spacer_"));
        assert!(b.starts_with("spacer_"));
        assert_ne!(a, b);
    }
}
