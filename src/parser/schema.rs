//! JSON Schema audit for decoded plans
//!
//! Reports which expected fields are absent or ill-typed instead of failing on
//! access. Decoding itself stays lenient; this is diagnostics only.

use jsonschema::Validator;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::LazyLock;

static PLAN_VALIDATOR: LazyLock<Option<Validator>> = LazyLock::new(|| {
    match Validator::new(&plan_schema()) {
        Ok(validator) => Some(validator),
        Err(e) => {
            tracing::error!("Failed to compile plan schema: {}", e);
            None
        }
    }
});

/// A single schema deviation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    /// JSON pointer into the payload ("" for the root)
    pub path: String,
    pub message: String,
}

/// Schema for the plan document as the model is instructed to emit it
pub fn plan_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["studyPlan_Overview", "studyPlan"],
        "properties": {
            "studyPlan_Overview": {
                "type": "object",
                "additionalProperties": { "type": "string" }
            },
            "studyPlan": {
                "type": "object",
                "additionalProperties": {
                    "type": "array",
                    "items": { "$ref": "#/$defs/day" }
                }
            }
        },
        "$defs": {
            "day": {
                "type": "object",
                "required": ["day", "topic", "Time", "resources"],
                "properties": {
                    "day": { "type": "string" },
                    "topic": { "type": "string" },
                    "Time": { "type": "string" },
                    "resources": {
                        "type": "object",
                        "properties": {
                            "YouTube": {
                                "type": "array",
                                "items": { "$ref": "#/$defs/video" }
                            }
                        }
                    }
                }
            },
            "video": {
                "type": ["object", "null"],
                "required": ["title", "link"],
                "properties": {
                    "title": { "type": "string" },
                    "link": { "type": "string" }
                }
            }
        }
    })
}

/// Validate a raw payload against the plan schema, collecting every deviation
pub fn audit_plan(value: &Value) -> Vec<SchemaIssue> {
    let Some(validator) = PLAN_VALIDATOR.as_ref() else {
        return Vec::new();
    };

    validator
        .iter_errors(value)
        .map(|error| SchemaIssue {
            path: error.instance_path.to_string(),
            message: error.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_plan_has_no_issues() {
        let value = json!({
            "studyPlan_Overview": {"Week1": "Basics"},
            "studyPlan": {
                "Week 1": [{
                    "day": "Day 1",
                    "topic": "Intro",
                    "Time": "1 hour",
                    "resources": {"YouTube": [{"title": "t", "link": "https://youtu.be/aaaaaaaaaaa"}]}
                }]
            }
        });
        assert!(audit_plan(&value).is_empty());
    }

    #[test]
    fn test_missing_fields_are_reported_with_paths() {
        let value = json!({
            "studyPlan": {
                "Week 1": [{"day": "Day 1", "Time": "1 hour"}]
            }
        });
        let issues = audit_plan(&value);
        assert!(issues.iter().any(|i| i.message.contains("studyPlan_Overview")));
        assert!(issues
            .iter()
            .any(|i| i.path == "/studyPlan/Week 1/0" && i.message.contains("topic")));
        assert!(issues.iter().any(|i| i.message.contains("resources")));
    }

    #[test]
    fn test_null_video_entry_is_allowed() {
        let value = json!({
            "studyPlan_Overview": {},
            "studyPlan": {
                "Week 1": [{
                    "day": "Day 1", "topic": "x", "Time": "1 hour",
                    "resources": {"YouTube": [null]}
                }]
            }
        });
        assert!(audit_plan(&value).is_empty());
    }
}
