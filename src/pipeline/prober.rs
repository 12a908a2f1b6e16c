//! Dry-run validation against the store.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::pipeline::ValidationOutcome;
use crate::store::{ResultSet, SparqlExecutor};

/// Probes a query by running it once and checking the response shape.
///
/// Anything the store or its client throws becomes an
/// [`ValidationOutcome::Invalid`]; probing never fails.
pub struct ExecutionProber<'a> {
    executor: &'a dyn SparqlExecutor,
}

impl<'a> ExecutionProber<'a> {
    pub fn new(executor: &'a dyn SparqlExecutor) -> Self {
        Self { executor }
    }

    /// Returns `Valid` iff the store answered with a boolean or a bindings envelope.
    pub async fn probe(&self, query: &str) -> ValidationOutcome {
        let response = AssertUnwindSafe(self.executor.execute(query))
            .catch_unwind()
            .await;

        let outcome = match response {
            Ok(Ok(envelope)) => match ResultSet::from_envelope(&envelope) {
                Ok(_) => ValidationOutcome::Valid,
                Err(e) => ValidationOutcome::invalid(e.to_string()),
            },
            Ok(Err(e)) => ValidationOutcome::invalid(e.to_string()),
            Err(_) => ValidationOutcome::invalid("store client panicked while probing"),
        };

        if let ValidationOutcome::Invalid(ref reason) = outcome {
            tracing::debug!(reason = %reason, "Probe rejected query");
        }

        outcome
    }
}
