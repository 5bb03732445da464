//! Task catalog entries.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{PlatformId, Timestamp};

// ---------------------------------------------------------------------------
// Task kind
// ---------------------------------------------------------------------------

/// How often a member may complete a task.
///
/// The wire strings are `"once"` and `"daily"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    #[serde(rename = "once")]
    OneTime,
    #[serde(rename = "daily")]
    Daily,
}

impl TaskKind {
    /// Parse a kind string from a stored document.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "once" => Ok(Self::OneTime),
            "daily" => Ok(Self::Daily),
            _ => Err(CoreError::Validation(format!(
                "Invalid task kind '{s}'. Must be one of: once, daily"
            ))),
        }
    }

    /// Convert to the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneTime => "once",
            Self::Daily => "daily",
        }
    }

    /// Human-readable label for menus and notifications.
    pub fn label(&self) -> &'static str {
        match self {
            Self::OneTime => "One-time",
            Self::Daily => "Daily",
        }
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A task members can complete for points. Immutable once created; removal
/// is the only edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub title: String,
    pub description: String,
    /// Reward credited on approval. Always positive.
    pub points: i64,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub created_at: Timestamp,
    pub created_by: PlatformId,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a task or product title/description: non-empty after trimming.
pub fn validate_text_field(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("The {field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
