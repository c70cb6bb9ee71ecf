//! Video link parsing
//!
//! A link is usable only if it resolves to exactly one 11-character platform
//! video identifier via a watch, short, embed or shorts URL.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static VIDEO_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.|m\.)?(?:youtu\.be/|youtube\.com/(?:watch\?(?:[^#\s]*&)?v=|embed/|v/|shorts/))([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
    )
    .expect("valid video link regex")
});

/// Platform video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this identifier
    pub fn watch_url(&self) -> String {
        watch_url(&self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the video identifier from a link; `None` if the link is malformed
pub fn extract_video_id(link: &str) -> Option<VideoId> {
    VIDEO_LINK
        .captures(link.trim())
        .and_then(|captures| captures.get(1))
        .map(|id| VideoId(id.as_str().to_string()))
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
