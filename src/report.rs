//! Warn-once reporting of prop failures.
//!
//! Host frameworks print a given failure message only the first time it is
//! seen for the lifetime of the page. [`PropTypeReporter`] keeps the same
//! memory and emits each new message as a `tracing` warning.
use std::collections::HashSet;

use tracing::warn;

use crate::error::PropValidationFailure;

#[derive(Debug, Default)]
pub struct PropTypeReporter {
    seen: HashSet<String>,
}

impl PropTypeReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a batch of failures, returning only the ones not reported before.
    pub fn report<I>(&mut self, failures: I) -> Vec<PropValidationFailure>
    where
        I: IntoIterator<Item = PropValidationFailure>,
    {
        let mut fresh = Vec::new();
        for failure in failures {
            if self.seen.insert(failure.to_string()) {
                warn!(prop = failure.prop(), "{}", failure.warning());
                fresh.push(failure);
            }
        }
        fresh
    }

    pub fn reported(&self) -> usize {
        self.seen.len()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::falcor_shapes_prop_types;
    use crate::error::Location;
    use serde_json::json;

    #[test]
    fn repeated_messages_are_reported_once() {
        let types = falcor_shapes_prop_types(&json!({"people": true}), false).unwrap();
        let mut reporter = PropTypeReporter::new();

        let first = reporter.report(types.check_value(&json!({}), "Component", Location::Prop));
        assert_eq!(first.len(), 1);

        let again = reporter.report(types.check_value(&json!({}), "Component", Location::Prop));
        assert!(again.is_empty());

        // a different component produces a different message
        let other = reporter.report(types.check_value(&json!({}), "Other", Location::Prop));
        assert_eq!(other.len(), 1);
        assert_eq!(reporter.reported(), 2);

        reporter.clear();
        let after_clear = reporter.report(types.check_value(&json!({}), "Component", Location::Prop));
        assert_eq!(after_clear.len(), 1);
    }
}
