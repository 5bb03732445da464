//! Task submissions and their review lifecycle.
//!
//! A submission snapshots the member and task fields it was created from, so
//! the review screen and history stay meaningful after the task (or even the
//! member record) is gone. Review is one-shot: `pending` moves to exactly one
//! of `approved` or `rejected` and never changes again.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::task::TaskKind;
use crate::types::{PlatformId, SeqKey, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Review status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    /// Parse a status string from a stored document.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(CoreError::Validation(format!(
                "Invalid submission status '{s}'. Must be one of: pending, approved, rejected"
            ))),
        }
    }

    /// Convert to the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// Media kind of one attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Photo,
    Document,
    Video,
}

impl AttachmentKind {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "photo" => Ok(Self::Photo),
            "document" => Ok(Self::Document),
            "video" => Ok(Self::Video),
            _ => Err(CoreError::Validation(format!(
                "Invalid attachment kind '{s}'. Must be one of: photo, document, video"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Document => "document",
            Self::Video => "video",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Photo => "Photo",
            Self::Document => "Document",
            Self::Video => "Video",
        }
    }
}

/// One attached file, referenced by the transport's opaque file handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    /// Opaque transport file reference, resendable as-is.
    pub file_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Overall payload kind of a submission, derived from its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    Photo,
    Document,
    Video,
    Multiple,
}

impl ContentKind {
    /// Derive the kind from the attachment list.
    ///
    /// One attachment keeps its own kind; two or more are `Multiple`; none
    /// means a text-only submission.
    pub fn derive(attachments: &[Attachment]) -> Self {
        match attachments {
            [] => Self::Text,
            [single] => match single.kind {
                AttachmentKind::Photo => Self::Photo,
                AttachmentKind::Document => Self::Document,
                AttachmentKind::Video => Self::Video,
            },
            _ => Self::Multiple,
        }
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub user_id: PlatformId,
    /// Full name at submission time.
    pub user_name: String,
    pub user_display_id: u32,
    pub task_id: SeqKey,
    pub task_title: String,
    pub task_description: String,
    pub task_points: i64,
    pub task_kind: TaskKind,
    pub content_kind: ContentKind,
    /// Free-text answer segments joined with a blank line. May be empty when
    /// the submission is attachments-only.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub submitted_at: Timestamp,
    pub status: SubmissionStatus,
}

impl Submission {
    /// Apply a one-shot review decision.
    ///
    /// `decision` must be `Approved` or `Rejected`; a submission that has
    /// already been decided is a conflict.
    pub fn decide(&mut self, decision: SubmissionStatus) -> Result<(), CoreError> {
        if decision == SubmissionStatus::Pending {
            return Err(CoreError::Validation(
                "A review decision must be approved or rejected".to_string(),
            ));
        }
        if self.status != SubmissionStatus::Pending {
            return Err(CoreError::Conflict(format!(
                "Submission was already {}",
                self.status.as_str()
            )));
        }
        self.status = decision;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// Content accumulated across turns before the member finishes a submission.
///
/// Lives in per-conversation session scratch, never in the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionDraft {
    text_segments: Vec<String>,
    attachments: Vec<Attachment>,
}

impl SubmissionDraft {
    pub fn push_text(&mut self, segment: &str) {
        let trimmed = segment.trim();
        if !trimmed.is_empty() {
            self.text_segments.push(trimmed.to_string());
        }
    }

    pub fn push_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    /// A draft with neither text nor attachments cannot be finished.
    pub fn is_empty(&self) -> bool {
        self.text_segments.is_empty() && self.attachments.is_empty()
    }

    /// Consume the draft into the joined text block and the attachment list.
    pub fn into_parts(self) -> (String, Vec<Attachment>) {
        (self.text_segments.join("\n\n"), self.attachments)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn pending_submission() -> Submission {
        Submission {
            user_id: 100,
            user_name: "Ada Lovelace".to_string(),
            user_display_id: 1,
            task_id: "3".to_string(),
            task_title: "Share the post".to_string(),
            task_description: "Repost and send a screenshot".to_string(),
            task_points: 10,
            task_kind: TaskKind::Daily,
            content_kind: ContentKind::Text,
            text: "done".to_string(),
            attachments: Vec::new(),
            submitted_at: Utc::now(),
            status: SubmissionStatus::Pending,
        }
    }

    fn photo(file_ref: &str) -> Attachment {
        Attachment {
            kind: AttachmentKind::Photo,
            file_ref: file_ref.to_string(),
            file_name: None,
            caption: None,
        }
    }

    // -- status --

    #[test]
    fn status_roundtrip() {
        for status in [
            SubmissionStatus::Pending,
            SubmissionStatus::Approved,
            SubmissionStatus::Rejected,
        ] {
            assert_eq!(SubmissionStatus::from_str_db(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn status_from_str_invalid() {
        assert!(SubmissionStatus::from_str_db("reviewed").is_err());
    }

    // -- decide --

    #[test]
    fn decide_approves_once() {
        let mut s = pending_submission();
        s.decide(SubmissionStatus::Approved).unwrap();
        assert_eq!(s.status, SubmissionStatus::Approved);
    }

    #[test]
    fn decide_twice_is_conflict() {
        let mut s = pending_submission();
        s.decide(SubmissionStatus::Rejected).unwrap();
        let err = s.decide(SubmissionStatus::Approved).unwrap_err();
        assert_matches!(err, CoreError::Conflict(_));
        assert_eq!(s.status, SubmissionStatus::Rejected);
    }

    #[test]
    fn decide_rejects_pending_as_decision() {
        let mut s = pending_submission();
        assert!(s.decide(SubmissionStatus::Pending).is_err());
        assert_eq!(s.status, SubmissionStatus::Pending);
    }

    // -- content kind --

    #[test]
    fn content_kind_no_attachments_is_text() {
        assert_eq!(ContentKind::derive(&[]), ContentKind::Text);
    }

    #[test]
    fn content_kind_single_keeps_media_kind() {
        assert_eq!(ContentKind::derive(&[photo("f1")]), ContentKind::Photo);
        let doc = Attachment {
            kind: AttachmentKind::Document,
            file_ref: "f2".to_string(),
            file_name: Some("report.pdf".to_string()),
            caption: None,
        };
        assert_eq!(ContentKind::derive(&[doc]), ContentKind::Document);
    }

    #[test]
    fn content_kind_two_or_more_is_multiple() {
        assert_eq!(
            ContentKind::derive(&[photo("f1"), photo("f2")]),
            ContentKind::Multiple
        );
    }

    // -- draft --

    #[test]
    fn draft_joins_text_segments_with_blank_line() {
        let mut draft = SubmissionDraft::default();
        draft.push_text("first part");
        draft.push_text("  second part  ");
        let (text, attachments) = draft.into_parts();
        assert_eq!(text, "first part\n\nsecond part");
        assert!(attachments.is_empty());
    }

    #[test]
    fn draft_ignores_blank_segments() {
        let mut draft = SubmissionDraft::default();
        draft.push_text("   ");
        assert!(draft.is_empty());
    }

    #[test]
    fn draft_with_only_attachments_is_not_empty() {
        let mut draft = SubmissionDraft::default();
        draft.push_attachment(photo("f1"));
        assert!(!draft.is_empty());
        assert_eq!(draft.attachment_count(), 1);
    }

    // -- serde defaults --

    #[test]
    fn missing_text_and_attachments_default_to_empty() {
        let json = serde_json::json!({
            "user_id": 100,
            "user_name": "Ada Lovelace",
            "user_display_id": 1,
            "task_id": "3",
            "task_title": "Share the post",
            "task_description": "Repost and send a screenshot",
            "task_points": 10,
            "task_kind": "daily",
            "content_kind": "text",
            "submitted_at": "2024-05-01T12:00:00Z",
            "status": "pending"
        });
        let s: Submission = serde_json::from_value(json).unwrap();
        assert!(s.text.is_empty());
        assert!(s.attachments.is_empty());
    }
}
