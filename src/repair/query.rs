//! Replacement search phrases

use super::probe::VideoDuration;
use crate::models::RequestParameters;
use regex::Regex;
use std::sync::LazyLock;

static AVAILABLE_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*hours").expect("valid available hours regex"));

/// Appended to the base phrase on successive attempts when variation is on
pub const ATTEMPT_SUFFIXES: [&str; 5] = ["", " tutorial", " explained", " lecture", " course"];

/// Combine a day's topic with the parameters of the original request
///
/// e.g. "Loops in Python for a Novice in 2 hours over 1 months, 0 weeks, and 0 days"
///
/// Duration fields missing from the request default to zero. A duration that
/// is zero in all three fields is left out of the phrase rather than rendered
/// as "over 0 months, 0 weeks, and 0 days"; any nonzero field brings all three
/// back in.
pub fn base_search_phrase(topic: &str, params: &RequestParameters) -> String {
    let topic = topic.trim();
    let subject = params.subject_label();
    let mut phrase = if topic.is_empty() {
        subject.to_string()
    } else {
        format!("{} in {}", topic, subject)
    };

    phrase.push_str(&format!(
        " for a {} in {} hours",
        params.proficiency, params.hours_per_day
    ));

    let duration = params.duration;
    if !duration.is_zero() {
        phrase.push_str(&format!(
            " over {} months, {} weeks, and {} days",
            duration.months, duration.weeks, duration.days
        ));
    }

    phrase
}

/// Phrase for a zero-based attempt index
pub fn search_phrase_for_attempt(base: &str, attempt: usize, vary: bool) -> String {
    if !vary {
        return base.to_string();
    }
    let suffix = ATTEMPT_SUFFIXES[attempt % ATTEMPT_SUFFIXES.len()];
    format!("{}{}", base, suffix)
}

/// Duration filter for a multi-result search, from the hours named in the query
///
/// The hours bound the video length: up to 4 minutes is short, up to 20
/// minutes medium, anything longer long. `None` when the query names no hours.
pub fn duration_for_query(query: &str) -> Option<VideoDuration> {
    let hours: u64 = AVAILABLE_HOURS
        .captures(query)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())?;
    let seconds = hours.saturating_mul(3600);
    Some(match seconds {
        0..=240 => VideoDuration::Short,
        241..=1200 => VideoDuration::Medium,
        _ => VideoDuration::Long,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Proficiency, StudyDuration};

    #[test]
    fn test_base_phrase_with_all_parameters() {
        let params = RequestParameters {
            proficiency: Proficiency::Novice,
            subject: Some("Python".to_string()),
            duration: StudyDuration {
                months: 1,
                weeks: 2,
                days: 0,
            },
            hours_per_day: 2,
        };
        assert_eq!(
            base_search_phrase("Loops", &params),
            "Loops in Python for a Novice in 2 hours over 1 months, 2 weeks, and 0 days"
        );
    }

    #[test]
    fn test_base_phrase_defaults() {
        let params = RequestParameters::default();
        assert_eq!(
            base_search_phrase("Recursion", &params),
            "Recursion in unknown topic for a unknown level in 0 hours"
        );
        assert_eq!(
            base_search_phrase("  ", &params),
            "unknown topic for a unknown level in 0 hours"
        );
    }

    #[test]
    fn test_partial_duration_keeps_zero_fields() {
        let params = RequestParameters {
            subject: Some("Go".to_string()),
            duration: StudyDuration {
                months: 0,
                weeks: 0,
                days: 5,
            },
            ..RequestParameters::default()
        };
        assert!(base_search_phrase("Channels", &params)
            .ends_with("over 0 months, 0 weeks, and 5 days"));
    }

    #[test]
    fn test_duration_for_query() {
        assert_eq!(
            duration_for_query("Loops in Python with 2 hours available per day"),
            Some(VideoDuration::Long)
        );
        assert_eq!(duration_for_query("warmup in 0 hours"), Some(VideoDuration::Short));
        assert_eq!(duration_for_query("Loops in Python"), None);
    }

    #[test]
    fn test_attempt_variation() {
        assert_eq!(search_phrase_for_attempt("rust", 0, true), "rust");
        assert_eq!(search_phrase_for_attempt("rust", 1, true), "rust tutorial");
        assert_eq!(search_phrase_for_attempt("rust", 4, true), "rust course");
        assert_eq!(search_phrase_for_attempt("rust", 3, false), "rust");
    }
}
