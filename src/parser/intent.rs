//! Lexical message classification

use regex::Regex;
use std::sync::LazyLock;

/// Prefix the request form uses for initial plan requests
pub const PLAN_REQUEST_PREFIX: &str = "create a study plan for a";

static REVISION_INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(improv|fix|updat|chang|revis)\w*").expect("valid intent regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Fresh structured-plan request
    PlanRequest,
    /// Conversational follow-up on an existing session
    Continuation,
}

pub fn classify_message(message: &str) -> MessageKind {
    if message
        .trim_start()
        .to_lowercase()
        .starts_with(PLAN_REQUEST_PREFIX)
    {
        MessageKind::PlanRequest
    } else {
        MessageKind::Continuation
    }
}

/// True when the user asks to improve, fix, update, change or revise the plan
pub fn expresses_revision_intent(message: &str) -> bool {
    REVISION_INTENT.is_match(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            classify_message("Create a study plan for a Novice on Python"),
            MessageKind::PlanRequest
        );
        assert_eq!(
            classify_message("  create A STUDY plan for a Mastery on Go"),
            MessageKind::PlanRequest
        );
        assert_eq!(
            classify_message("What is a closure?"),
            MessageKind::Continuation
        );
    }

    #[test]
    fn test_revision_intent() {
        assert!(expresses_revision_intent("Please fix week 2"));
        assert!(expresses_revision_intent("Can you UPDATE the plan?"));
        assert!(expresses_revision_intent("I'd like some changes"));
        assert!(expresses_revision_intent("revise day 3"));
        assert!(expresses_revision_intent("improvements to the schedule"));
        assert!(!expresses_revision_intent("What does recursion mean?"));
        assert!(!expresses_revision_intent("what prefix notation is"));
    }
}
