//! Study plan document model
//!
//! The canonical plan representation exchanged between the refinement pipeline
//! and the resource repair engine. On the wire a plan has two known top-level
//! fields, `studyPlan_Overview` and `studyPlan`. Week order follows generation
//! order, so both mappings are insertion-ordered.
//!
//! Decoding is lenient below the top level: text fields that arrive as `null`
//! or as numbers fall back to text, and keys the model adds beyond the known
//! ones are kept in `extra` so a decoded plan renders back without loss.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Resource category inspected by the repair engine
pub const VIDEO_CATEGORY: &str = "YouTube";

/// A complete study plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPlanDocument {
    /// Week label -> summary text
    #[serde(
        rename = "studyPlan_Overview",
        default,
        deserialize_with = "deserialize_overview"
    )]
    pub overview: IndexMap<String, String>,

    /// Week label -> ordered day entries
    #[serde(rename = "studyPlan")]
    pub weeks: IndexMap<String, Vec<DayEntry>>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl StudyPlanDocument {
    pub fn new() -> Self {
        Self {
            overview: IndexMap::new(),
            weeks: IndexMap::new(),
            extra: IndexMap::new(),
        }
    }

    /// Week labels paired with their day counts, in document order
    pub fn shape(&self) -> Vec<(String, usize)> {
        self.weeks
            .iter()
            .map(|(label, days)| (label.clone(), days.len()))
            .collect()
    }

    /// All video links in document order (weeks, then days, then list order)
    pub fn video_links(&self, category: &str) -> Vec<&str> {
        self.weeks
            .values()
            .flatten()
            .filter_map(|day| day.resources.get(category))
            .flatten()
            .filter_map(|slot| slot.as_video())
            .map(|video| video.link.as_str())
            .collect()
    }

    pub fn to_json_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Pretty JSON, the form persisted and returned to callers
    pub fn render_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// JSON wrapped in a ```json fence, the form models are asked to emit
    pub fn render_fenced(&self) -> String {
        format!("```json\n{}\n```", self.render_json())
    }
}

impl Default for StudyPlanDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// One study day within a week
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DayEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub day: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub topic: String,

    /// Allotted time, free text (e.g. "2 hours")
    #[serde(rename = "Time", default, deserialize_with = "lenient_text")]
    pub time: String,

    /// Resource category -> ordered resource slots
    #[serde(default, deserialize_with = "deserialize_resources")]
    pub resources: IndexMap<String, Vec<ResourceSlot>>,

    /// Fields outside the known set, e.g. per-day objectives
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl DayEntry {
    pub fn new(day: impl Into<String>, topic: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            topic: topic.into(),
            time: time.into(),
            resources: IndexMap::new(),
            extra: IndexMap::new(),
        }
    }

    /// Builder helper used by tests and fixtures
    pub fn with_videos(mut self, category: &str, videos: Vec<VideoResource>) -> Self {
        self.resources.insert(
            category.to_string(),
            videos.into_iter().map(ResourceSlot::Video).collect(),
        );
        self
    }
}

/// A single video resource
///
/// `link` must be present for an entry to decode as a video; objects without
/// it are kept as `ResourceSlot::Other`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoResource {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,

    #[serde(deserialize_with = "lenient_text")]
    pub link: String,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl VideoResource {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            extra: IndexMap::new(),
        }
    }

    /// Both title and link are blank
    pub fn is_placeholder(&self) -> bool {
        self.title.trim().is_empty() && self.link.trim().is_empty()
    }
}

/// An entry inside a resource list
///
/// Anything that does not decode as a video resource (`null`, bare strings,
/// objects without a `link`) is carried through untouched as `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceSlot {
    Video(VideoResource),
    Other(Value),
}

impl ResourceSlot {
    pub fn as_video(&self) -> Option<&VideoResource> {
        match self {
            ResourceSlot::Video(video) => Some(video),
            ResourceSlot::Other(_) => None,
        }
    }

    /// Explicitly empty entry: `null`, `""`, `{}` or a video with no title and no link
    ///
    /// Objects that carry anything at all are not placeholders, even when they
    /// have no usable link.
    pub fn is_placeholder(&self) -> bool {
        match self {
            ResourceSlot::Video(video) => video.is_placeholder(),
            ResourceSlot::Other(Value::Null) => true,
            ResourceSlot::Other(Value::String(s)) => s.trim().is_empty(),
            ResourceSlot::Other(Value::Object(map)) => map.is_empty(),
            ResourceSlot::Other(_) => false,
        }
    }
}

/// Text from any scalar; `null` and containers become empty text
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(deserializer)?))
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

fn deserialize_overview<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<IndexMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(week, summary)| (week, value_text(summary)))
        .collect())
}

/// Accept a single resource object where a list is expected
fn deserialize_resources<'de, D>(
    deserializer: D,
) -> Result<IndexMap<String, Vec<ResourceSlot>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<ResourceSlot>),
        One(ResourceSlot),
    }

    let raw: Option<IndexMap<String, OneOrMany>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(category, entries)| {
            let list = match entries {
                OneOrMany::Many(list) => list,
                OneOrMany::One(slot) => vec![slot],
            };
            (category, list)
        })
        .collect())
}
