//! Request parameter extraction
//!
//! Pulls proficiency, subject, duration and hours-per-day out of a free-text
//! plan request such as "Create a study plan for a Novice on Python over
//! 1 months, 2 weeks, and 0 days with 2 hours available per day". Every field
//! falls back to its default when the pattern is absent.

use crate::models::{Proficiency, RequestParameters, StudyDuration};
use regex::Regex;
use std::sync::LazyLock;

static PROFICIENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(novice|advanced beginner|competence|proficiency|expertise|mastery)\b")
        .expect("valid proficiency regex")
});

static SUBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bon (\w+)").expect("valid subject regex"));

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)over (\d+) months?, (\d+) weeks?, and (\d+) days?")
        .expect("valid duration regex")
});

static HOURS_PER_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+) hours? available per day").expect("valid hours regex")
});

pub fn extract_request_parameters(request: &str) -> RequestParameters {
    let proficiency = PROFICIENCY
        .captures(request)
        .and_then(|c| c.get(1))
        .map(|m| Proficiency::from_label(m.as_str()))
        .unwrap_or_default();

    let subject = SUBJECT
        .captures(request)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let duration = DURATION
        .captures(request)
        .map(|c| StudyDuration {
            months: capture_number(&c, 1),
            weeks: capture_number(&c, 2),
            days: capture_number(&c, 3),
        })
        .unwrap_or_default();

    let hours_per_day = HOURS_PER_DAY
        .captures(request)
        .map(|c| capture_number(&c, 1))
        .unwrap_or(0);

    RequestParameters {
        proficiency,
        subject,
        duration,
        hours_per_day,
    }
}

fn capture_number(captures: &regex::Captures<'_>, group: usize) -> u32 {
    captures
        .get(group)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_request() {
        let params = extract_request_parameters(
            "Create a study plan for a Advanced Beginner on Python over 1 months, 2 weeks, and 3 days with 4 hours available per day.",
        );
        assert_eq!(params.proficiency, Proficiency::AdvancedBeginner);
        assert_eq!(params.subject.as_deref(), Some("Python"));
        assert_eq!(
            params.duration,
            StudyDuration {
                months: 1,
                weeks: 2,
                days: 3
            }
        );
        assert_eq!(params.hours_per_day, 4);
    }

    #[test]
    fn test_singular_units_and_case() {
        let params = extract_request_parameters(
            "create a study plan for a NOVICE on rust OVER 1 month, 1 week, and 1 day, 1 hour available per day",
        );
        assert_eq!(params.proficiency, Proficiency::Novice);
        assert_eq!(params.subject.as_deref(), Some("rust"));
        assert_eq!(params.duration.months, 1);
        assert_eq!(params.duration.days, 1);
        assert_eq!(params.hours_per_day, 1);
    }

    #[test]
    fn test_missing_fields_default() {
        let params = extract_request_parameters("make the second week lighter");
        assert_eq!(params, RequestParameters::default());
    }

    #[test]
    fn test_partial_duration_does_not_match() {
        let params = extract_request_parameters("Plan on Go over 2 months with 3 hours available per day");
        assert!(params.duration.is_zero());
        assert_eq!(params.hours_per_day, 3);
        assert_eq!(params.subject.as_deref(), Some("Go"));
    }
}
