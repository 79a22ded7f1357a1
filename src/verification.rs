use crate::{Call, Times};

/// A report detailing what the user expectations were and how many calls were actually
/// received since the expectation was registered.
#[derive(Clone, Debug)]
pub(crate) struct VerificationReport {
    /// The expectation name specified by the user.
    pub(crate) name: Option<String>,
    /// One-line rendering of the argument matchers.
    pub(crate) signature: String,
    /// What users specified
    pub(crate) expected_calls: Times,
    /// Actual number of received calls that matched the expectation
    pub(crate) n_matched_calls: u64,
    /// Position of the expectation in registration order.
    pub(crate) position: usize,
}

impl VerificationReport {
    pub(crate) fn error_message(&self) -> String {
        let title = match &self.name {
            Some(name) => format!("Expectation #{} ({}).", self.position, name),
            None => format!("Expectation #{}.", self.position),
        };
        format!(
            "{}\n\tArguments: {}\n\tExpected range of matching calls: {}\n\tNumber of matched calls: {}",
            title, self.signature, self.expected_calls, self.n_matched_calls
        )
    }

    pub(crate) fn is_satisfied(&self) -> bool {
        self.expected_calls.contains(self.n_matched_calls)
    }
}

pub(crate) enum VerificationOutcome {
    /// The expectations were satisfied and no unexpected call was received.
    Success,
    /// Something went wrong: unsatisfied expectations and unexpected calls are returned.
    Failure {
        failed_expectations: Vec<VerificationReport>,
        unexpected_calls: Vec<Call>,
    },
}
