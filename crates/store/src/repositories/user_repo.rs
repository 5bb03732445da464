//! Repository for the users collection.
//!
//! Members are keyed by the decimal form of their platform id. The
//! human-facing display id is a field, allocated inside the registration
//! write so two concurrent registrations cannot observe the same maximum.

use kudos_core::error::CoreError;
use kudos_core::types::{PlatformId, Timestamp};
use kudos_core::user::{self, User};

use crate::error::{RepoError, StoreError};
use crate::store::JsonStore;

/// Result of a registration attempt.
///
/// Registration re-checks for an existing record under the write lock, so
/// a concurrent duplicate resolves to `AlreadyRegistered` instead of a
/// second record.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    Created(User),
    AlreadyRegistered(User),
}

pub struct UserRepo;

impl UserRepo {
    fn key(platform_id: PlatformId) -> String {
        platform_id.to_string()
    }

    /// Register a new member.
    ///
    /// Validates both names, allocates the next display id (`max + 1`,
    /// or 1 for the first member), and persists the record with zeroed
    /// ledgers.
    pub async fn register(
        store: &JsonStore,
        platform_id: PlatformId,
        first_name: &str,
        surname: &str,
        now: Timestamp,
    ) -> Result<RegisterOutcome, RepoError> {
        let first_name = user::validate_person_name("first name", first_name)?;
        let surname = user::validate_person_name("surname", surname)?;

        store
            .users()
            .mutate(|records| {
                let key = Self::key(platform_id);
                if let Some(existing) = records.get(&key) {
                    return Ok(RegisterOutcome::AlreadyRegistered(existing.clone()));
                }

                let display_id = records
                    .values()
                    .map(|u| u.display_id)
                    .max()
                    .unwrap_or(0)
                    + 1;

                let created = User {
                    platform_id,
                    first_name,
                    surname,
                    display_id,
                    points: 0,
                    total_earned: 0,
                    registered_at: now,
                };
                records.insert(key, created.clone());
                Ok(RegisterOutcome::Created(created))
            })
            .await
    }

    /// Find a member by platform id.
    pub async fn find(
        store: &JsonStore,
        platform_id: PlatformId,
    ) -> Result<Option<User>, StoreError> {
        Ok(store.users().get(&Self::key(platform_id)).await)
    }

    /// Fetch a member, failing with not-found when unregistered.
    pub async fn get(store: &JsonStore, platform_id: PlatformId) -> Result<User, RepoError> {
        Self::find(store, platform_id)
            .await?
            .ok_or_else(|| CoreError::not_found("user", Self::key(platform_id)).into())
    }

    /// Snapshot all members.
    pub async fn list(store: &JsonStore) -> Result<Vec<User>, StoreError> {
        Ok(store.users().values().await)
    }

    /// Credit earned points to both ledgers, returning the updated record.
    pub async fn credit_earned(
        store: &JsonStore,
        platform_id: PlatformId,
        amount: i64,
    ) -> Result<User, RepoError> {
        user::validate_points_amount(amount)?;
        store
            .users()
            .mutate(|records| {
                let key = Self::key(platform_id);
                let member = records
                    .get_mut(&key)
                    .ok_or_else(|| CoreError::not_found("user", key.clone()))?;
                member.credit_earned(amount);
                Ok(member.clone())
            })
            .await
    }

    /// Debit the spendable balance, returning the updated record.
    ///
    /// The balance check runs under the collection write lock, so two
    /// concurrent purchases cannot both spend the same points.
    pub async fn debit(
        store: &JsonStore,
        platform_id: PlatformId,
        amount: i64,
    ) -> Result<User, RepoError> {
        store
            .users()
            .mutate(|records| {
                let key = Self::key(platform_id);
                let member = records
                    .get_mut(&key)
                    .ok_or_else(|| CoreError::not_found("user", key.clone()))?;
                member.debit(amount)?;
                Ok(member.clone())
            })
            .await
    }

    /// Return points to the spendable balance only.
    ///
    /// Unwinds a half-committed purchase when the stock step fails after
    /// the debit. The lifetime ledger is untouched.
    pub async fn refund(
        store: &JsonStore,
        platform_id: PlatformId,
        amount: i64,
    ) -> Result<User, RepoError> {
        user::validate_points_amount(amount)?;
        store
            .users()
            .mutate(|records| {
                let key = Self::key(platform_id);
                let member = records
                    .get_mut(&key)
                    .ok_or_else(|| CoreError::not_found("user", key.clone()))?;
                member.points += amount;
                Ok(member.clone())
            })
            .await
    }

    /// Reassign a member's display id.
    ///
    /// Fails with a conflict when another member already holds the id;
    /// assigning a member their current id is a no-op that succeeds.
    pub async fn set_display_id(
        store: &JsonStore,
        platform_id: PlatformId,
        display_id: u32,
    ) -> Result<User, RepoError> {
        store
            .users()
            .mutate(|records| {
                let key = Self::key(platform_id);
                let taken = records
                    .values()
                    .any(|u| u.display_id == display_id && u.platform_id != platform_id);
                if taken {
                    return Err(RepoError::Core(CoreError::Conflict(format!(
                        "Display id #{display_id} is already assigned to another member"
                    ))));
                }

                let member = records
                    .get_mut(&key)
                    .ok_or_else(|| CoreError::not_found("user", key.clone()))?;
                member.display_id = display_id;
                Ok(member.clone())
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
