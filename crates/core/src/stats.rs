//! Leaderboard ranking and system-wide counters.

use crate::submission::{Submission, SubmissionStatus};
use crate::user::User;

/// One leaderboard row, ranked by lifetime earnings.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: usize,
    pub full_name: String,
    pub display_id: u32,
    pub total_earned: i64,
}

/// Rank members by lifetime earnings, descending.
///
/// Ties keep registration order (lower display id first) so repeated
/// renders are stable.
pub fn leaderboard(users: &[User]) -> Vec<LeaderboardEntry> {
    let mut sorted: Vec<&User> = users.iter().collect();
    sorted.sort_by(|a, b| {
        b.total_earned
            .cmp(&a.total_earned)
            .then(a.display_id.cmp(&b.display_id))
    });

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, user)| LeaderboardEntry {
            rank: i + 1,
            full_name: user.full_name(),
            display_id: user.display_id,
            total_earned: user.total_earned,
        })
        .collect()
}

/// Aggregate counters for the admin statistics screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemStats {
    pub total_users: usize,
    /// Spendable points currently in circulation.
    pub total_points: i64,
    /// Lifetime points ever credited.
    pub total_earned: i64,
    pub total_tasks: usize,
    pub pending_submissions: usize,
    pub approved_submissions: usize,
    pub rejected_submissions: usize,
}

impl SystemStats {
    /// Mean spendable balance, zero for an empty system.
    pub fn average_points(&self) -> f64 {
        if self.total_users == 0 {
            0.0
        } else {
            self.total_points as f64 / self.total_users as f64
        }
    }

    /// Mean lifetime earnings, zero for an empty system.
    pub fn average_earned(&self) -> f64 {
        if self.total_users == 0 {
            0.0
        } else {
            self.total_earned as f64 / self.total_users as f64
        }
    }
}

/// Compute system counters from full collection snapshots.
pub fn system_stats(users: &[User], total_tasks: usize, submissions: &[Submission]) -> SystemStats {
    let count = |status: SubmissionStatus| submissions.iter().filter(|s| s.status == status).count();

    SystemStats {
        total_users: users.len(),
        total_points: users.iter().map(|u| u.points).sum(),
        total_earned: users.iter().map(|u| u.total_earned).sum(),
        total_tasks,
        pending_submissions: count(SubmissionStatus::Pending),
        approved_submissions: count(SubmissionStatus::Approved),
        rejected_submissions: count(SubmissionStatus::Rejected),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::submission::ContentKind;
    use crate::task::TaskKind;

    use super::*;

    fn member(display_id: u32, points: i64, total_earned: i64) -> User {
        User {
            platform_id: display_id as i64 * 100,
            first_name: format!("Member{display_id}"),
            surname: "Test".to_string(),
            display_id,
            points,
            total_earned,
            registered_at: Utc::now(),
        }
    }

    fn submission_with_status(status: SubmissionStatus) -> Submission {
        Submission {
            user_id: 100,
            user_name: "Member1 Test".to_string(),
            user_display_id: 1,
            task_id: "1".to_string(),
            task_title: "t".to_string(),
            task_description: "d".to_string(),
            task_points: 10,
            task_kind: TaskKind::OneTime,
            content_kind: ContentKind::Text,
            text: "done".to_string(),
            attachments: Vec::new(),
            submitted_at: Utc::now(),
            status,
        }
    }

    #[test]
    fn leaderboard_ranks_by_lifetime_earnings() {
        let users = vec![member(1, 50, 10), member(2, 0, 30), member(3, 5, 20)];
        let board = leaderboard(&users);

        assert_eq!(board[0].display_id, 2);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].display_id, 3);
        assert_eq!(board[2].display_id, 1);
    }

    #[test]
    fn leaderboard_ignores_spendable_balance() {
        // Big spender keeps first place: only total_earned counts.
        let users = vec![member(1, 0, 100), member(2, 99, 50)];
        let board = leaderboard(&users);
        assert_eq!(board[0].display_id, 1);
    }

    #[test]
    fn leaderboard_ties_keep_registration_order() {
        let users = vec![member(2, 0, 10), member(1, 0, 10)];
        let board = leaderboard(&users);
        assert_eq!(board[0].display_id, 1);
        assert_eq!(board[1].display_id, 2);
    }

    #[test]
    fn system_stats_counts_by_status() {
        let users = vec![member(1, 5, 10), member(2, 15, 20)];
        let submissions = vec![
            submission_with_status(SubmissionStatus::Pending),
            submission_with_status(SubmissionStatus::Approved),
            submission_with_status(SubmissionStatus::Approved),
            submission_with_status(SubmissionStatus::Rejected),
        ];

        let stats = system_stats(&users, 3, &submissions);
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.total_points, 20);
        assert_eq!(stats.total_earned, 30);
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.pending_submissions, 1);
        assert_eq!(stats.approved_submissions, 2);
        assert_eq!(stats.rejected_submissions, 1);
        assert_eq!(stats.average_points(), 10.0);
    }

    #[test]
    fn averages_are_zero_for_empty_system() {
        let stats = system_stats(&[], 0, &[]);
        assert_eq!(stats.average_points(), 0.0);
        assert_eq!(stats.average_earned(), 0.0);
    }
}
