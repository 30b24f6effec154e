//! Test assertions over the pending view.

use crate::cache::PendingCaches;
use crate::context::StoryContext;

fn pending_ids(caches: &PendingCaches) -> Vec<String> {
    caches
        .aggregated_pending()
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Asserts that the aggregated pending view shows exactly `expected`, in order.
///
/// Unresolved handles show as `<pending>`, failed ones as `<failed>`.
pub fn assert_pending_ids(caches: &PendingCaches, expected: &[&str]) {
    let actual = pending_ids(caches);
    assert_eq!(
        actual, expected,
        "Expected pending view {:?}, got {:?}",
        expected, actual
    );
}

/// Asserts the size of the aggregated pending view.
pub fn assert_pending_len(caches: &PendingCaches, expected: usize) {
    assert_eq!(
        caches.pending_len(),
        expected,
        "Expected {} pending items, got {:?}",
        expected,
        pending_ids(caches)
    );
}

/// Asserts that nothing is pending.
pub fn assert_no_pending(caches: &PendingCaches) {
    assert!(
        caches.is_empty(),
        "Expected no pending items, got {:?}",
        pending_ids(caches)
    );
}

/// Asserts the resolved identifier of the context's current step.
pub fn assert_current_step(context: &StoryContext, expected: Option<&str>) {
    let actual = context.current_step().map(|step| step.to_string());
    assert_eq!(
        actual.as_deref(),
        expected,
        "Expected current step {:?}, got {:?}",
        expected,
        actual
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestRun;

    #[test]
    fn test_pending_assertions_pass() {
        let run = TestRun::new().story("s").step("st");
        assert_pending_ids(run.context().caches(), &["st", "s"]);
        assert_pending_len(run.context().caches(), 2);
        assert_current_step(run.context(), Some("st"));
    }

    #[test]
    #[should_panic(expected = "Expected no pending items")]
    fn test_no_pending_fails_with_open_items() {
        let run = TestRun::new().story("s");
        assert_no_pending(run.context().caches());
    }
}
