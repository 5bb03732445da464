//! Task availability rules.
//!
//! Whether a member may start a task depends only on their *approved*
//! submissions for that task. Pending and rejected submissions never block
//! a new attempt.

use chrono::Duration;

use crate::submission::{Submission, SubmissionStatus};
use crate::task::TaskKind;
use crate::types::{PlatformId, Timestamp};

/// Lockout window for daily tasks.
pub const DAILY_COOLDOWN_HOURS: i64 = 24;

/// Outcome of an availability check for one (member, task) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAvailability {
    Available,
    /// One-time task with an approved submission on record.
    AlreadyCompleted,
    /// Daily task approved within the last 24 hours.
    CoolingDown { remaining: Duration },
}

impl TaskAvailability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Evaluate availability given the approval timestamps for the pair.
///
/// A daily task approved exactly 24 hours ago is available again; the
/// remaining lockout is `24h - (now - latest approval)`.
pub fn check(kind: TaskKind, approved_at: &[Timestamp], now: Timestamp) -> TaskAvailability {
    match kind {
        TaskKind::OneTime => {
            if approved_at.is_empty() {
                TaskAvailability::Available
            } else {
                TaskAvailability::AlreadyCompleted
            }
        }
        TaskKind::Daily => {
            let Some(latest) = approved_at.iter().max().copied() else {
                return TaskAvailability::Available;
            };
            let cooldown = Duration::hours(DAILY_COOLDOWN_HOURS);
            let elapsed = now - latest;
            if elapsed < cooldown {
                TaskAvailability::CoolingDown {
                    remaining: cooldown - elapsed,
                }
            } else {
                TaskAvailability::Available
            }
        }
    }
}

/// Collect the approval timestamps for a (member, task) pair.
pub fn approved_times<'a>(
    submissions: impl IntoIterator<Item = &'a Submission>,
    user_id: PlatformId,
    task_id: &str,
) -> Vec<Timestamp> {
    submissions
        .into_iter()
        .filter(|s| {
            s.user_id == user_id && s.task_id == task_id && s.status == SubmissionStatus::Approved
        })
        .map(|s| s.submitted_at)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
