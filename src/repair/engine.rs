//! Resource repair engine
//!
//! Walks a plan in document order (weeks, then days, then entries in the
//! video list), validates each link against the platform and replaces the
//! ones that fail with a fresh search result. Weeks and days are never added,
//! removed or reordered; only the video list of a day is rewritten.
//!
//! Every uncertain outcome is treated as invalid: malformed links, duplicate
//! links, dead or ambiguous liveness verdicts and probe errors. An entry that
//! is present but has no link at all is invalid too. A probe error during
//! search ends the search for that slot and leaves the slot as it was.

use super::dedup::DedupCache;
use super::probe::{Liveness, ResourceProbe};
use super::query::{base_search_phrase, search_phrase_for_attempt};
use crate::models::{RepairSettings, RequestParameters, ResourceSlot, StudyPlanDocument, VideoResource};
use crate::parser::{extract_request_parameters, extract_video_id};
use serde::Serialize;
use serde_json::Value;

/// Outcome of validating one link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkVerdict {
    Valid,
    Malformed,
    KnownInvalid,
    Duplicate,
    Dead(Liveness),
    ProbeFailed,
}

impl LinkVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, LinkVerdict::Valid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub week: String,
    pub day: String,
    pub original: String,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedLink {
    pub week: String,
    pub day: String,
    pub link: String,
}

/// Summary of one repair run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub kept: usize,
    pub replaced: Vec<Replacement>,
    pub unresolved: Vec<UnresolvedLink>,
    pub search_attempts: usize,
    pub placeholders_removed: usize,
    pub days_without_category: usize,
}

impl RepairReport {
    pub fn changed(&self) -> bool {
        !self.replaced.is_empty() || self.placeholders_removed > 0
    }
}

pub struct ResourceRepairEngine<'a> {
    probe: &'a dyn ResourceProbe,
    settings: &'a RepairSettings,
}

impl<'a> ResourceRepairEngine<'a> {
    pub fn new(probe: &'a dyn ResourceProbe, settings: &'a RepairSettings) -> Self {
        Self { probe, settings }
    }

    /// Repair `plan` using the parameters found in `request_text`
    pub async fn repair(&self, request_text: &str, plan: StudyPlanDocument) -> StudyPlanDocument {
        self.repair_with_report(request_text, plan).await.0
    }

    pub async fn repair_with_report(
        &self,
        request_text: &str,
        mut plan: StudyPlanDocument,
    ) -> (StudyPlanDocument, RepairReport) {
        let params = extract_request_parameters(request_text);
        let category = self.settings.resource_category.as_str();
        let mut cache = DedupCache::new();
        let mut report = RepairReport::default();

        for (week_label, days) in plan.weeks.iter_mut() {
            for day in days.iter_mut() {
                let topic = day.topic.clone();
                let day_label = day.day.clone();

                let Some(slots) = day.resources.get_mut(category) else {
                    tracing::debug!(week = %week_label, day = %day_label, category, "day has no resource list, skipping");
                    report.days_without_category += 1;
                    continue;
                };

                for slot in slots.iter_mut() {
                    let original = match slot {
                        ResourceSlot::Video(video) => {
                            if video.is_placeholder() {
                                continue;
                            }

                            let verdict = self.validate(&video.link, &mut cache).await;
                            if verdict.is_valid() {
                                report.kept += 1;
                                continue;
                            }

                            tracing::info!(
                                week = %week_label,
                                day = %day_label,
                                link = %video.link,
                                ?verdict,
                                "invalid resource link"
                            );
                            cache.mark_invalid(&video.link);
                            video.link.clone()
                        }
                        // Present but without a link: invalid, replaced in place
                        ResourceSlot::Other(Value::Object(entry)) if !entry.is_empty() => {
                            tracing::info!(
                                week = %week_label,
                                day = %day_label,
                                "resource entry has no link"
                            );
                            Value::Object(entry.clone()).to_string()
                        }
                        ResourceSlot::Other(_) => continue,
                    };

                    match self
                        .find_replacement(&topic, &params, &cache, &mut report)
                        .await
                    {
                        Some(candidate) => {
                            cache.accept(&candidate.link);
                            report.replaced.push(Replacement {
                                week: week_label.clone(),
                                day: day_label.clone(),
                                original,
                                replacement: candidate.link.clone(),
                            });
                            *slot = ResourceSlot::Video(candidate);
                        }
                        None => {
                            report.unresolved.push(UnresolvedLink {
                                week: week_label.clone(),
                                day: day_label.clone(),
                                link: original,
                            });
                        }
                    }
                }

                let before = slots.len();
                slots.retain(|slot| !slot.is_placeholder());
                report.placeholders_removed += before - slots.len();
            }
        }

        tracing::info!(
            kept = report.kept,
            replaced = report.replaced.len(),
            unresolved = report.unresolved.len(),
            search_attempts = report.search_attempts,
            "resource repair finished"
        );

        (plan, report)
    }

    /// Validate a single link, recording it as accepted when it passes
    pub async fn validate(&self, link: &str, cache: &mut DedupCache) -> LinkVerdict {
        let link = link.trim();
        if link.is_empty() {
            return LinkVerdict::Malformed;
        }
        if cache.is_known_invalid(link) {
            return LinkVerdict::KnownInvalid;
        }
        let Some(video_id) = extract_video_id(link) else {
            return LinkVerdict::Malformed;
        };
        if cache.is_accepted(link) {
            return LinkVerdict::Duplicate;
        }

        match self.probe.check_liveness(video_id.as_str()).await {
            Ok(Liveness::Live) => {
                cache.accept(link);
                LinkVerdict::Valid
            }
            Ok(other) => LinkVerdict::Dead(other),
            Err(e) => {
                tracing::warn!(link, error = %e, "liveness check failed");
                LinkVerdict::ProbeFailed
            }
        }
    }

    async fn find_replacement(
        &self,
        topic: &str,
        params: &RequestParameters,
        cache: &DedupCache,
        report: &mut RepairReport,
    ) -> Option<VideoResource> {
        // An all-zero duration is omitted from the phrase
        let base = base_search_phrase(topic, params);

        for attempt in 0..self.settings.max_search_attempts {
            let phrase =
                search_phrase_for_attempt(&base, attempt, self.settings.vary_query_per_attempt);
            report.search_attempts += 1;

            match self.probe.search(&phrase).await {
                Ok(Some(candidate)) if cache.is_usable_candidate(&candidate.link) => {
                    return Some(candidate);
                }
                Ok(Some(candidate)) => {
                    tracing::debug!(attempt, link = %candidate.link, "candidate already used or rejected");
                }
                Ok(None) => {
                    tracing::debug!(attempt, phrase = %phrase, "search returned no candidate");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "replacement search failed");
                    return None;
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayEntry;
    use crate::repair::probe::ProbeError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct AllLive;

    #[async_trait]
    impl ResourceProbe for AllLive {
        async fn check_liveness(&self, _video_id: &str) -> Result<Liveness, ProbeError> {
            Ok(Liveness::Live)
        }

        async fn search(&self, _phrase: &str) -> Result<Option<VideoResource>, ProbeError> {
            Ok(None)
        }
    }

    struct DeadSet {
        dead: HashSet<&'static str>,
        searches: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ResourceProbe for DeadSet {
        async fn check_liveness(&self, video_id: &str) -> Result<Liveness, ProbeError> {
            Ok(if self.dead.contains(video_id) {
                Liveness::Dead
            } else {
                Liveness::Live
            })
        }

        async fn search(&self, phrase: &str) -> Result<Option<VideoResource>, ProbeError> {
            self.searches.lock().unwrap().push(phrase.to_string());
            Ok(Some(VideoResource::new(
                "Fresh",
                "https://www.youtube.com/watch?v=zzzzzzzzzzz",
            )))
        }
    }

    fn link(id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", id)
    }

    #[tokio::test]
    async fn test_validate_rejects_malformed_and_duplicates() {
        let settings = RepairSettings::default();
        let engine = ResourceRepairEngine::new(&AllLive, &settings);
        let mut cache = DedupCache::new();

        assert_eq!(engine.validate("", &mut cache).await, LinkVerdict::Malformed);
        assert_eq!(
            engine.validate("https://vimeo.com/123", &mut cache).await,
            LinkVerdict::Malformed
        );
        assert_eq!(engine.validate(&link("aaaaaaaaaaa"), &mut cache).await, LinkVerdict::Valid);
        assert_eq!(
            engine.validate(&link("aaaaaaaaaaa"), &mut cache).await,
            LinkVerdict::Duplicate
        );
    }

    #[tokio::test]
    async fn test_dead_link_replaced_with_phrase_from_request() {
        let probe = DeadSet {
            dead: HashSet::from(["bbbbbbbbbbb"]),
            searches: Mutex::new(Vec::new()),
        };
        let settings = RepairSettings::default();
        let engine = ResourceRepairEngine::new(&probe, &settings);

        let mut plan = StudyPlanDocument::new();
        plan.weeks.insert(
            "Week 1".to_string(),
            vec![DayEntry::new("Day 1", "Loops", "2 hours").with_videos(
                "YouTube",
                vec![VideoResource::new("Old", link("bbbbbbbbbbb"))],
            )],
        );

        let (repaired, report) = engine
            .repair_with_report("Create a study plan for a Novice on Python", plan)
            .await;

        assert_eq!(
            repaired.video_links("YouTube"),
            vec!["https://www.youtube.com/watch?v=zzzzzzzzzzz"]
        );
        assert_eq!(report.replaced.len(), 1);
        assert_eq!(report.search_attempts, 1);
        let searches = probe.searches.lock().unwrap();
        assert!(searches[0].starts_with("Loops in Python for a Novice"));
    }
}
