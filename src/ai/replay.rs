//! Reviewer that serves recorded replies
//!
//! Reads a JSON object keyed by qualified function name:
//!
//! ```json
//! {
//!   "billing.Invoice.total": {
//!     "tokens_used": 812,
//!     "findings": [
//!       { "severity": "warning", "category": "bug", "title": "Rounding drift",
//!         "description": "...", "line_start": 4, "confidence": 0.8 }
//!     ]
//!   },
//!   "billing.Invoice.refund": { "error": "rate limited" }
//! }
//! ```
//!
//! Entries are decoded when requested, so a bad entry fails only its own
//! function. An `error` entry replays a reviewer failure.

use super::review::{ReviewReply, ReviewRequest, Reviewer};
use super::{ReviewError, ReviewResult};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize)]
struct RecordedFailure {
    error: String,
}

#[derive(Debug, Default)]
pub struct ReplayReviewer {
    replies: HashMap<String, Value>,
}

impl ReplayReviewer {
    pub fn new(replies: HashMap<String, Value>) -> Self {
        Self { replies }
    }

    pub fn from_json(json: &str) -> ReviewResult<Self> {
        let replies: HashMap<String, Value> = serde_json::from_str(json)?;
        Ok(Self::new(replies))
    }

    pub fn from_file(path: &Path) -> ReviewResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let reviewer = Self::from_json(&content)?;
        debug!(
            "Loaded {} recorded replies from {}",
            reviewer.replies.len(),
            path.display()
        );
        Ok(reviewer)
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }
}

impl Reviewer for ReplayReviewer {
    fn review(&self, request: &ReviewRequest) -> ReviewResult<ReviewReply> {
        let name = &request.qualified_name;
        let entry = self
            .replies
            .get(name)
            .ok_or_else(|| ReviewError::NoReply(name.clone()))?;

        if let Ok(failure) = RecordedFailure::deserialize(entry) {
            return Err(ReviewError::Failed(failure.error));
        }
        ReviewReply::deserialize(entry).map_err(|e| ReviewError::Malformed(format!("{name}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ReviewContext;
    use crate::models::Language;

    fn request(name: &str) -> ReviewRequest {
        ReviewRequest {
            model: "test".into(),
            qualified_name: name.into(),
            language: Language::Go,
            source: "func F() {}".into(),
            context: ReviewContext::default(),
        }
    }

    #[test]
    fn test_replays_recorded_reply() {
        let reviewer = ReplayReviewer::from_json(
            r#"{"pkg.F": {"tokens_used": 42, "findings": [{"severity": "critical", "title": "Nil deref"}]}}"#,
        )
        .unwrap();
        assert_eq!(reviewer.len(), 1);
        let reply = reviewer.review(&request("pkg.F")).unwrap();
        assert_eq!(reply.tokens_used, 42);
        assert_eq!(reply.findings[0].title.as_deref(), Some("Nil deref"));
    }

    #[test]
    fn test_missing_reply_is_an_error() {
        let reviewer = ReplayReviewer::default();
        assert!(matches!(
            reviewer.review(&request("pkg.G")),
            Err(ReviewError::NoReply(name)) if name == "pkg.G"
        ));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(matches!(
            ReplayReviewer::from_json("[1, 2"),
            Err(ReviewError::Parse(_))
        ));
    }

    #[test]
    fn test_bad_entry_fails_only_that_function() {
        let reviewer = ReplayReviewer::from_json(
            r#"{"a.ok": {"findings": []}, "a.bad": {"findings": "nope"}, "a.down": {"error": "rate limited"}}"#,
        )
        .unwrap();
        assert!(reviewer.review(&request("a.ok")).is_ok());
        assert!(matches!(
            reviewer.review(&request("a.bad")),
            Err(ReviewError::Malformed(msg)) if msg.starts_with("a.bad:")
        ));
        assert!(matches!(
            reviewer.review(&request("a.down")),
            Err(ReviewError::Failed(msg)) if msg == "rate limited"
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replies.json");
        std::fs::write(&path, r#"{"a.b": {"findings": []}}"#).unwrap();
        let reviewer = ReplayReviewer::from_file(&path).unwrap();
        assert!(reviewer.review(&request("a.b")).unwrap().findings.is_empty());
        assert!(ReplayReviewer::from_file(&dir.path().join("missing.json")).is_err());
    }
}
