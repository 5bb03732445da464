//! Repository for the submissions collection.

use kudos_core::availability;
use kudos_core::error::CoreError;
use kudos_core::submission::{Submission, SubmissionStatus};
use kudos_core::types::{PlatformId, SeqKey, Timestamp};

use crate::error::{RepoError, StoreError};
use crate::store::JsonStore;

pub struct SubmissionRepo;

impl SubmissionRepo {
    /// Persist a finished submission (already assembled with its
    /// snapshots) under a fresh sequence key.
    pub async fn create(store: &JsonStore, submission: Submission) -> Result<SeqKey, StoreError> {
        store.submissions().append(submission).await
    }

    pub async fn find(store: &JsonStore, key: &str) -> Result<Option<Submission>, StoreError> {
        Ok(store.submissions().get(key).await)
    }

    pub async fn get(store: &JsonStore, key: &str) -> Result<Submission, RepoError> {
        Self::find(store, key)
            .await?
            .ok_or_else(|| CoreError::not_found("submission", key).into())
    }

    /// Snapshot the review queue in numeric key order.
    pub async fn pending(store: &JsonStore) -> Result<Vec<(SeqKey, Submission)>, StoreError> {
        Ok(store
            .submissions()
            .list()
            .await
            .into_iter()
            .filter(|(_, s)| s.status == SubmissionStatus::Pending)
            .collect())
    }

    /// Apply a one-shot review decision under the collection write lock.
    ///
    /// A submission that is no longer pending fails with a conflict, which
    /// is how a double-tap on the review buttons resolves.
    pub async fn decide(
        store: &JsonStore,
        key: &str,
        decision: SubmissionStatus,
    ) -> Result<Submission, RepoError> {
        store
            .submissions()
            .mutate(|records| {
                let submission = records
                    .get_mut(key)
                    .ok_or_else(|| CoreError::not_found("submission", key))?;
                submission.decide(decision)?;
                Ok(submission.clone())
            })
            .await
    }

    /// Approval timestamps for one (member, task) pair, for the
    /// availability rules.
    pub async fn approved_times(
        store: &JsonStore,
        user_id: PlatformId,
        task_id: &str,
    ) -> Result<Vec<Timestamp>, StoreError> {
        let values = store.submissions().values().await;
        Ok(availability::approved_times(&values, user_id, task_id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
