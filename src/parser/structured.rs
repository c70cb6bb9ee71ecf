//! Structured response parser
//!
//! Model output is free-form text that may wrap the plan JSON in a fenced code
//! block surrounded by prose. Decoding failure is an expected outcome and is
//! reported as `NotStructured` carrying the raw text unchanged.

use super::schema::{audit_plan, SchemaIssue};
use crate::models::StudyPlanDocument;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static INLINE_JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```json([\s\S]*?)```").expect("valid fence regex"));

/// A successfully decoded plan plus any schema deviations found in the raw payload
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredPlan {
    pub plan: StudyPlanDocument,
    pub issues: Vec<SchemaIssue>,
}

/// Outcome of parsing model output
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    Structured(StructuredPlan),
    /// Original raw text, untouched
    NotStructured(String),
}

impl ParsedResponse {
    pub fn is_structured(&self) -> bool {
        matches!(self, ParsedResponse::Structured(_))
    }

    pub fn plan(&self) -> Option<&StudyPlanDocument> {
        match self {
            ParsedResponse::Structured(structured) => Some(&structured.plan),
            ParsedResponse::NotStructured(_) => None,
        }
    }

    pub fn into_plan(self) -> Option<StudyPlanDocument> {
        match self {
            ParsedResponse::Structured(structured) => Some(structured.plan),
            ParsedResponse::NotStructured(_) => None,
        }
    }
}

/// Parse model output into a plan document
///
/// The first ```json fenced block is the candidate payload when present
/// (an unlabeled fence is accepted as a fallback); otherwise the whole trimmed
/// text is. Only decoding is enforced here. Shape deviations are collected as
/// `issues` and never reject the document.
pub fn parse_structured_response(raw: &str) -> ParsedResponse {
    let candidate = extract_json_block(raw).unwrap_or_else(|| raw.trim().to_string());

    let value: Value = match serde_json::from_str(&candidate) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "model output is not structured data");
            return ParsedResponse::NotStructured(raw.to_string());
        }
    };

    let issues = audit_plan(&value);

    match serde_json::from_value::<StudyPlanDocument>(value) {
        Ok(plan) => {
            for issue in &issues {
                tracing::warn!(path = %issue.path, "plan schema deviation: {}", issue.message);
            }
            ParsedResponse::Structured(StructuredPlan { plan, issues })
        }
        Err(e) => {
            tracing::debug!(error = %e, "payload decoded but is not a study plan");
            ParsedResponse::NotStructured(raw.to_string())
        }
    }
}

/// Extract the interior of the first JSON code block
///
/// Uses the markdown AST so fences nested in lists or quoted prose are found;
/// falls back to a regex for fences that open and close on a single line.
pub fn extract_json_block(text: &str) -> Option<String> {
    let parser = Parser::new_ext(text, Options::empty());
    let mut current: Option<(bool, String)> = None; // (labelled json, content)
    let mut unlabeled: Option<String> = None;

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                let info = info.trim().to_lowercase();
                if info.starts_with("json") {
                    current = Some((true, String::new()));
                } else if info.is_empty() {
                    current = Some((false, String::new()));
                }
            }
            Event::Text(body) => {
                if let Some((_, ref mut content)) = current {
                    content.push_str(&body);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((labelled, content)) = current.take() {
                    if labelled {
                        return Some(content.trim().to_string());
                    }
                    if unlabeled.is_none() {
                        unlabeled = Some(content.trim().to_string());
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(captures) = INLINE_JSON_FENCE.captures(text) {
        if let Some(body) = captures.get(1) {
            return Some(body.as_str().trim().to_string());
        }
    }

    unlabeled.filter(|content| content.starts_with('{'))
}
