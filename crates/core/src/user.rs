//! Member records and the points ledger.
//!
//! Every member carries two ledgers: `points` is the spendable balance,
//! debited by shop purchases; `total_earned` is the lifetime total, credited
//! together with `points` and never decremented. Rankings are computed from
//! `total_earned` so that spending does not move a member down the board.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{PlatformId, Timestamp};

/// Minimum accepted length for a first name or surname (after trimming).
pub const MIN_NAME_LEN: usize = 2;

/// Maximum accepted length for a first name or surname (after trimming).
pub const MAX_NAME_LEN: usize = 50;

/// A registered member.
///
/// Keyed in the store by the decimal string of `platform_id`. `display_id`
/// is the human-facing sequence number shown in lists and receipts; it is
/// unique across members and may be reassigned by an admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub platform_id: PlatformId,
    pub first_name: String,
    pub surname: String,
    pub display_id: u32,
    /// Spendable balance.
    #[serde(default)]
    pub points: i64,
    /// Lifetime earnings. Absent in documents written before the split
    /// ledger existed, so it defaults to zero on read.
    #[serde(default)]
    pub total_earned: i64,
    pub registered_at: Timestamp,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }

    /// Credit earned points to both ledgers.
    ///
    /// Used by task approval and admin grants. The caller validates the
    /// amount with [`validate_points_amount`] first.
    pub fn credit_earned(&mut self, amount: i64) {
        self.points += amount;
        self.total_earned += amount;
    }

    /// Debit the spendable balance; `total_earned` is untouched.
    ///
    /// Fails without mutating when the balance does not cover the amount.
    /// A balance exactly equal to the amount is sufficient.
    pub fn debit(&mut self, amount: i64) -> Result<(), CoreError> {
        if self.points < amount {
            return Err(CoreError::InsufficientPoints {
                required: amount,
                available: self.points,
            });
        }
        self.points -= amount;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a first name or surname and return the trimmed value.
///
/// `field` names the input in the error message ("first name", "surname").
pub fn validate_person_name(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < MIN_NAME_LEN || len > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "The {field} must be between {MIN_NAME_LEN} and {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate a points amount for grants and task rewards (strictly positive).
pub fn validate_points_amount(amount: i64) -> Result<(), CoreError> {
    if amount <= 0 {
        return Err(CoreError::Validation(format!(
            "Points amount must be a positive number, got {amount}"
        )));
    }
    Ok(())
}

/// Validate a display id entered by an admin (strictly positive).
pub fn validate_display_id(id: i64) -> Result<u32, CoreError> {
    if id <= 0 || id > u32::MAX as i64 {
        return Err(CoreError::Validation(format!(
            "Display id must be a positive number, got {id}"
        )));
    }
    Ok(id as u32)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
