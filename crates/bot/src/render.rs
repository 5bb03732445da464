//! Message texts and keyboards.
//!
//! Everything the bot says lives here as pure builders over domain values,
//! so handlers stay thin and the wording is testable without a transport.
//! Button labels double as the match keys for reply-keyboard presses, which
//! is why they are constants and not inline literals.

use chrono::Duration;

use kudos_core::availability::TaskAvailability;
use kudos_core::order::Order;
use kudos_core::product::Product;
use kudos_core::stats::{LeaderboardEntry, SystemStats};
use kudos_core::submission::{ContentKind, Submission};
use kudos_core::task::Task;
use kudos_core::user::User;
use kudos_core::{CoreError, SeqKey};
use kudos_store::ResetCounts;

use crate::transport::Keyboard;

// ---------------------------------------------------------------------------
// Button labels
// ---------------------------------------------------------------------------

// Main menu
pub const BTN_PROFILE: &str = "Profile";
pub const BTN_SHOP: &str = "Shop";
pub const BTN_LEADERBOARD: &str = "Leaderboard";
pub const BTN_SUBMIT_TASK: &str = "Submit task";
pub const BTN_ADMIN_PANEL: &str = "Admin panel";

// Admin menu
pub const BTN_USERS: &str = "Members";
pub const BTN_GRANT_POINTS: &str = "Grant points";
pub const BTN_CREATE_TASK: &str = "Create task";
pub const BTN_TASK_LIST: &str = "Task list";
pub const BTN_DELETE_TASK: &str = "Delete task";
pub const BTN_REVIEW: &str = "Review submissions";
pub const BTN_ADD_PRODUCT: &str = "Add product";
pub const BTN_PRODUCT_LIST: &str = "Product list";
pub const BTN_DELETE_PRODUCT: &str = "Delete product";
pub const BTN_STATS: &str = "Statistics";
pub const BTN_FIX_ID: &str = "Fix display id";
pub const BTN_RESET: &str = "Reset all data";
pub const BTN_MAIN_MENU: &str = "Main menu";

// Wizard buttons
pub const BTN_CANCEL: &str = "Cancel";
pub const BTN_FINISH: &str = "Finish submission";
pub const BTN_KIND_ONCE: &str = "One-time task";
pub const BTN_KIND_DAILY: &str = "Daily task";
pub const BTN_CONFIRM_BUY: &str = "Yes, buy it";
pub const BTN_DECLINE_BUY: &str = "No, cancel";

// ---------------------------------------------------------------------------
// Fixed texts
// ---------------------------------------------------------------------------

/// Exact phrase an admin must type to execute the full reset.
pub const RESET_CONFIRM_PHRASE: &str = "CONFIRM RESET";

pub const GENERIC_FAILURE: &str = "Something went wrong on our side. Please try again.";
pub const NOT_REGISTERED: &str = "You are not registered yet. Send /start to register.";
pub const NO_ACCESS: &str = "This section is for admins only.";
pub const LOST_PLACE: &str = "I lost track of where we were. Please start over from the menu.";

/// Submission text is cut to this many characters on the review screen.
pub const TEXT_PREVIEW_MAX: usize = 1000;

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M";

// ---------------------------------------------------------------------------
// Keyboards
// ---------------------------------------------------------------------------

fn row(buttons: &[&str]) -> Vec<String> {
    buttons.iter().map(|s| s.to_string()).collect()
}

pub fn main_menu(is_admin: bool) -> Keyboard {
    let mut rows = vec![
        row(&[BTN_PROFILE, BTN_SHOP]),
        row(&[BTN_LEADERBOARD, BTN_SUBMIT_TASK]),
    ];
    if is_admin {
        rows.push(row(&[BTN_ADMIN_PANEL]));
    }
    Keyboard::Reply(rows)
}

pub fn admin_menu() -> Keyboard {
    Keyboard::Reply(vec![
        row(&[BTN_USERS, BTN_GRANT_POINTS]),
        row(&[BTN_CREATE_TASK, BTN_TASK_LIST]),
        row(&[BTN_DELETE_TASK, BTN_REVIEW]),
        row(&[BTN_ADD_PRODUCT, BTN_PRODUCT_LIST]),
        row(&[BTN_DELETE_PRODUCT, BTN_STATS]),
        row(&[BTN_FIX_ID, BTN_RESET]),
        row(&[BTN_MAIN_MENU]),
    ])
}

pub fn cancel_keyboard() -> Keyboard {
    Keyboard::Reply(vec![row(&[BTN_CANCEL])])
}

pub fn task_kind_keyboard() -> Keyboard {
    Keyboard::Reply(vec![row(&[BTN_KIND_ONCE, BTN_KIND_DAILY]), row(&[BTN_CANCEL])])
}

pub fn purchase_confirm_keyboard() -> Keyboard {
    Keyboard::Reply(vec![row(&[BTN_CONFIRM_BUY, BTN_DECLINE_BUY])])
}

pub fn submission_content_keyboard() -> Keyboard {
    Keyboard::Reply(vec![row(&[BTN_FINISH]), row(&[BTN_CANCEL])])
}

// ---------------------------------------------------------------------------
// Member-facing texts
// ---------------------------------------------------------------------------

pub fn profile_text(user: &User) -> String {
    format!(
        "Your profile\n\n\
         Name: {}\n\
         Member #: {}\n\
         Balance: {} pts\n\
         Earned all-time: {} pts\n\
         Registered: {}",
        user.full_name(),
        user.display_id,
        user.points,
        user.total_earned,
        user.registered_at.format(DATE_FMT),
    )
}

fn medal(rank: usize) -> Option<&'static str> {
    match rank {
        1 => Some("\u{1F947}"),
        2 => Some("\u{1F948}"),
        3 => Some("\u{1F949}"),
        _ => None,
    }
}

pub fn leaderboard_text(entries: &[LeaderboardEntry]) -> String {
    if entries.is_empty() {
        return "The leaderboard is empty. Complete tasks to earn the first points!".to_string();
    }
    let mut lines = vec!["Leaderboard".to_string(), String::new()];
    for entry in entries {
        let prefix = match medal(entry.rank) {
            Some(m) => m.to_string(),
            None => format!("{}.", entry.rank),
        };
        lines.push(format!(
            "{prefix} {} (#{}) - {} pts",
            entry.full_name, entry.display_id, entry.total_earned
        ));
    }
    lines.join("\n")
}

/// Render a cooldown as fractional hours, e.g. `"1.5 h"`.
pub fn remaining_hours(remaining: Duration) -> String {
    let hours = remaining.num_seconds() as f64 / 3600.0;
    format!("{hours:.1} h")
}

/// Task picker: every task with its availability, so members see why a
/// task cannot be picked right now.
pub fn submit_task_list(rows: &[(SeqKey, Task, TaskAvailability)]) -> String {
    let mut lines = vec!["Pick a task to submit:".to_string(), String::new()];
    for (key, task, availability) in rows {
        let suffix = match availability {
            TaskAvailability::Available => String::new(),
            TaskAvailability::AlreadyCompleted => " - already completed".to_string(),
            TaskAvailability::CoolingDown { remaining } => {
                format!(" - available again in {}", remaining_hours(*remaining))
            }
        };
        lines.push(format!(
            "#{key} {} - {} pts ({}){suffix}",
            task.title,
            task.points,
            task.kind.label()
        ));
    }
    lines.join("\n")
}

pub fn shop_text(balance: i64, products: &[(SeqKey, Product)]) -> String {
    let mut lines = vec![format!("The shop. Your balance: {balance} pts"), String::new()];
    for (key, product) in products {
        let stock = match product.remaining() {
            Some(n) => format!("{n} left"),
            None => "unlimited".to_string(),
        };
        lines.push(format!("#{key} {} - {} pts ({stock})", product.name, product.price));
        lines.push(format!("    {}", product.description));
    }
    lines.join("\n")
}

pub fn purchase_confirm_text(product: &Product, balance: i64) -> String {
    let stock = match product.remaining() {
        Some(n) => format!("{n} left"),
        None => "unlimited".to_string(),
    };
    format!(
        "You are about to buy:\n\n\
         {} - {} pts\n\
         {}\n\n\
         Stock: {stock}\n\
         Your balance: {balance} pts, after the purchase: {} pts\n\n\
         Confirm?",
        product.name,
        product.price,
        product.description,
        balance - product.price,
    )
}

// ---------------------------------------------------------------------------
// Admin-facing texts
// ---------------------------------------------------------------------------

pub fn task_admin_list(rows: &[(SeqKey, Task)]) -> String {
    let mut lines = vec![format!("Task catalog ({})", rows.len()), String::new()];
    for (key, task) in rows {
        lines.push(format!(
            "#{key} {} ({}, {} pts)",
            task.title,
            task.kind.label(),
            task.points
        ));
        lines.push(format!("    {}", task.description));
    }
    lines.join("\n")
}

pub fn product_admin_list(rows: &[(SeqKey, Product)]) -> String {
    let mut lines = vec![format!("Product catalog ({})", rows.len()), String::new()];
    for (key, product) in rows {
        let stock = match product.remaining() {
            Some(_) => format!("sold {}/{}", product.sold, product.quantity),
            None => "unlimited".to_string(),
        };
        let marker = if product.is_available() { "" } else { " - sold out" };
        lines.push(format!(
            "#{key} {} - {} pts ({stock}){marker}",
            product.name, product.price
        ));
    }
    lines.join("\n")
}

pub fn users_list_text(users: &[User]) -> String {
    let mut sorted: Vec<&User> = users.iter().collect();
    sorted.sort_by_key(|u| u.display_id);

    let mut lines = vec![format!("Members ({})", sorted.len()), String::new()];
    for user in sorted {
        lines.push(format!(
            "#{} {} - {} pts (earned {})",
            user.display_id,
            user.full_name(),
            user.points,
            user.total_earned
        ));
    }
    lines.join("\n")
}

fn content_label(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Text => "Text",
        ContentKind::Photo => "Photo",
        ContentKind::Document => "Document",
        ContentKind::Video => "Video",
        ContentKind::Multiple => "Multiple attachments",
    }
}

/// Full review screen for one submission.
pub fn submission_details(key: &str, submission: &Submission) -> String {
    let mut text = format!(
        "Submission #{key}\n\n\
         Member: {} (#{})\n\
         Task: {} ({}, {} pts)\n\
         Submitted: {}\n\
         Content: {}",
        submission.user_name,
        submission.user_display_id,
        submission.task_title,
        submission.task_kind.label(),
        submission.task_points,
        submission.submitted_at.format(DATETIME_FMT),
        content_label(submission.content_kind),
    );
    if !submission.attachments.is_empty() {
        text.push_str(&format!("\nAttachments: {}", submission.attachments.len()));
    }
    if !submission.text.is_empty() {
        text.push_str("\n\n");
        text.push_str(&truncate_chars(&submission.text, TEXT_PREVIEW_MAX));
    }
    text
}

pub fn stats_text(stats: &SystemStats) -> String {
    format!(
        "System statistics\n\n\
         Members: {}\n\
         Tasks: {}\n\
         Points in circulation: {}\n\
         Points earned all-time: {}\n\
         Average balance: {:.1} pts\n\
         Average earned: {:.1} pts\n\n\
         Submissions: {} pending, {} approved, {} rejected",
        stats.total_users,
        stats.total_tasks,
        stats.total_points,
        stats.total_earned,
        stats.average_points(),
        stats.average_earned(),
        stats.pending_submissions,
        stats.approved_submissions,
        stats.rejected_submissions,
    )
}

pub fn reset_warning(member_count: usize, total_points: i64) -> String {
    format!(
        "\u{26A0} FULL DATA RESET\n\n\
         This will permanently delete:\n\
         - {member_count} member record(s) holding {total_points} pts\n\
         - every task, submission, product, and order\n\n\
         Type \"{RESET_CONFIRM_PHRASE}\" exactly to proceed, or press {BTN_CANCEL}."
    )
}

pub fn reset_done(counts: &ResetCounts) -> String {
    format!(
        "Reset complete. Removed {} members, {} tasks, {} submissions, \
         {} products, {} orders.",
        counts.users, counts.tasks, counts.submissions, counts.products, counts.orders
    )
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Admin alert for a fresh submission.
pub fn submission_notification(key: &str, submission: &Submission) -> String {
    format!(
        "New submission #{key}\n\n\
         Member: {} (#{})\n\
         Task: {} ({} pts)\n\n\
         Open \"{BTN_REVIEW}\" in the admin panel to decide.",
        submission.user_name,
        submission.user_display_id,
        submission.task_title,
        submission.task_points,
    )
}

/// Member notice after approval. `balance` is included when known.
pub fn approval_notice(key: &str, submission: &Submission, balance: Option<i64>) -> String {
    let mut text = format!(
        "\u{2705} Submission #{key} approved!\n\n\
         \"{}\" earned you {} pts.",
        submission.task_title, submission.task_points
    );
    if let Some(balance) = balance {
        text.push_str(&format!("\nYour balance: {balance} pts"));
    }
    text
}

pub fn rejection_notice(key: &str, submission: &Submission) -> String {
    format!(
        "\u{274C} Submission #{key} was rejected.\n\n\
         Task: \"{}\". You can submit it again with different content.",
        submission.task_title
    )
}

/// Member notice for an admin grant. `balance` is included when known.
pub fn grant_notice(amount: i64, balance: Option<i64>) -> String {
    let mut text = format!("You received {amount} pts from an admin!");
    if let Some(balance) = balance {
        text.push_str(&format!("\nYour balance: {balance} pts"));
    }
    text
}

/// Admin alert for a completed purchase. `product` carries the live stock
/// when the product still exists.
pub fn order_notice(key: &str, order: &Order, product: Option<&Product>) -> String {
    let mut text = format!(
        "\u{1F6D2} New order #{key}\n\n\
         Member: {} (#{})\n\
         Product: {} - {} pts",
        order.user_name, order.user_display_id, order.product_name, order.price
    );
    if let Some(product) = product {
        let stock = match product.remaining() {
            Some(n) => format!("{n} left"),
            None => "unlimited".to_string(),
        };
        text.push_str(&format!("\nStock: {stock}"));
    }
    text
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Turn an expected domain refusal into the reply the member sees.
pub fn refusal_text(err: &CoreError) -> String {
    match err {
        CoreError::Validation(msg) => msg.clone(),
        CoreError::Conflict(msg) => msg.clone(),
        CoreError::InsufficientPoints {
            required,
            available,
        } => format!("Not enough points: you need {required} but have {available}."),
        CoreError::OutOfStock(name) => format!("\"{name}\" is sold out."),
        other => other.to_string(),
    }
}

/// Cut to `max` characters (not bytes) with an ellipsis.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use kudos_core::stats::LeaderboardEntry;

    use super::*;

    // -- keyboards --

    #[test]
    fn main_menu_admin_row_is_gated() {
        let Keyboard::Reply(rows) = main_menu(false) else {
            panic!("expected reply keyboard");
        };
        assert!(!rows.iter().flatten().any(|b| b == BTN_ADMIN_PANEL));

        let Keyboard::Reply(rows) = main_menu(true) else {
            panic!("expected reply keyboard");
        };
        assert!(rows.iter().flatten().any(|b| b == BTN_ADMIN_PANEL));
    }

    #[test]
    fn admin_menu_offers_the_way_back() {
        let Keyboard::Reply(rows) = admin_menu() else {
            panic!("expected reply keyboard");
        };
        assert_eq!(rows.last().unwrap(), &vec![BTN_MAIN_MENU.to_string()]);
    }

    // -- texts --

    #[test]
    fn leaderboard_medals_top_three_then_numbers() {
        let entries: Vec<LeaderboardEntry> = (1..=4)
            .map(|rank| LeaderboardEntry {
                rank,
                full_name: format!("Member {rank}"),
                display_id: rank as u32,
                total_earned: 100 - rank as i64,
            })
            .collect();
        let text = leaderboard_text(&entries);
        assert!(text.contains("\u{1F947} Member 1"));
        assert!(text.contains("\u{1F949} Member 3"));
        assert!(text.contains("4. Member 4"));
    }

    #[test]
    fn remaining_hours_renders_fractional() {
        assert_eq!(remaining_hours(Duration::minutes(90)), "1.5 h");
        assert_eq!(remaining_hours(Duration::hours(23)), "23.0 h");
    }

    #[test]
    fn truncate_at_exact_boundary() {
        let exact = "x".repeat(TEXT_PREVIEW_MAX);
        assert_eq!(truncate_chars(&exact, TEXT_PREVIEW_MAX), exact);

        let over = "x".repeat(TEXT_PREVIEW_MAX + 1);
        let cut = truncate_chars(&over, TEXT_PREVIEW_MAX);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), TEXT_PREVIEW_MAX + 3);
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        // Four Cyrillic characters are eight bytes but still under the cap.
        assert_eq!(truncate_chars("Тест", 4), "Тест");
        assert_eq!(truncate_chars("Тест", 3), "Тес...");
    }

    #[test]
    fn profile_shows_both_ledgers() {
        let user = User {
            platform_id: 100,
            first_name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            display_id: 1,
            points: 15,
            total_earned: 40,
            registered_at: Utc::now(),
        };
        let text = profile_text(&user);
        assert!(text.contains("Ada Lovelace"));
        assert!(text.contains("Balance: 15 pts"));
        assert!(text.contains("Earned all-time: 40 pts"));
    }

    #[test]
    fn refusal_text_keeps_validation_message() {
        let err = CoreError::Validation("The title must not be empty".to_string());
        assert_eq!(refusal_text(&err), "The title must not be empty");

        let err = CoreError::InsufficientPoints {
            required: 50,
            available: 20,
        };
        assert_eq!(
            refusal_text(&err),
            "Not enough points: you need 50 but have 20."
        );
    }

    #[test]
    fn reset_warning_names_the_phrase() {
        let text = reset_warning(3, 120);
        assert!(text.contains(RESET_CONFIRM_PHRASE));
        assert!(text.contains("3 member record(s)"));
        assert!(text.contains("120 pts"));
    }
}
