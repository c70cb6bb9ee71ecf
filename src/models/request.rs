//! Parameters recovered from a free-text plan request
//!
//! Produced by `parser::request_params::extract_request_parameters` and consumed
//! by the repair engine when it builds replacement search phrases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Self-reported background level (Dreyfus scale)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Proficiency {
    Novice,
    AdvancedBeginner,
    Competence,
    Proficiency,
    Expertise,
    Mastery,
    #[default]
    Unknown,
}

impl Proficiency {
    pub fn label(&self) -> &'static str {
        match self {
            Proficiency::Novice => "Novice",
            Proficiency::AdvancedBeginner => "Advanced Beginner",
            Proficiency::Competence => "Competence",
            Proficiency::Proficiency => "Proficiency",
            Proficiency::Expertise => "Expertise",
            Proficiency::Mastery => "Mastery",
            Proficiency::Unknown => "unknown level",
        }
    }

    /// Case-insensitive match on the level name
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "novice" => Proficiency::Novice,
            "advanced beginner" => Proficiency::AdvancedBeginner,
            "competence" => Proficiency::Competence,
            "proficiency" => Proficiency::Proficiency,
            "expertise" => Proficiency::Expertise,
            "mastery" => Proficiency::Mastery,
            _ => Proficiency::Unknown,
        }
    }
}

impl fmt::Display for Proficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudyDuration {
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
}

impl StudyDuration {
    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.weeks == 0 && self.days == 0
    }
}

/// Structured view of a plan request; absent fields keep their defaults
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestParameters {
    pub proficiency: Proficiency,
    pub subject: Option<String>,
    pub duration: StudyDuration,
    pub hours_per_day: u32,
}

impl RequestParameters {
    pub fn subject_label(&self) -> &str {
        self.subject.as_deref().unwrap_or("unknown topic")
    }
}
