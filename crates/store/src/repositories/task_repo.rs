//! Repository for the tasks collection.

use kudos_core::error::CoreError;
use kudos_core::task::{self, Task, TaskKind};
use kudos_core::types::{PlatformId, SeqKey, Timestamp};
use kudos_core::user::validate_points_amount;

use crate::error::{RepoError, StoreError};
use crate::store::JsonStore;

/// Outcome of a task deletion: the removed task plus how many of its
/// submissions went with it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDeletion {
    pub task: Task,
    pub removed_submissions: usize,
}

pub struct TaskRepo;

impl TaskRepo {
    /// Create a task under a fresh sequence key.
    pub async fn create(
        store: &JsonStore,
        title: &str,
        description: &str,
        points: i64,
        kind: TaskKind,
        created_by: PlatformId,
        now: Timestamp,
    ) -> Result<(SeqKey, Task), RepoError> {
        let title = task::validate_text_field("title", title)?;
        let description = task::validate_text_field("description", description)?;
        validate_points_amount(points)?;

        let created = Task {
            title,
            description,
            points,
            kind,
            created_at: now,
            created_by,
        };
        let key = store.tasks().append(created.clone()).await?;
        Ok((key, created))
    }

    pub async fn find(store: &JsonStore, key: &str) -> Result<Option<Task>, StoreError> {
        Ok(store.tasks().get(key).await)
    }

    pub async fn get(store: &JsonStore, key: &str) -> Result<Task, RepoError> {
        Self::find(store, key)
            .await?
            .ok_or_else(|| CoreError::not_found("task", key).into())
    }

    /// Snapshot the catalog in numeric key order.
    pub async fn list(store: &JsonStore) -> Result<Vec<(SeqKey, Task)>, StoreError> {
        Ok(store.tasks().list().await)
    }

    /// Delete a task; with `cascade` every submission referencing it is
    /// removed as well.
    ///
    /// The two collections are updated one after the other, so a crash in
    /// between can leave submissions pointing at a missing task. Readers
    /// treat such references as already-deleted work.
    pub async fn delete(
        store: &JsonStore,
        key: &str,
        cascade: bool,
    ) -> Result<TaskDeletion, RepoError> {
        let task = store
            .tasks()
            .mutate(|records| {
                records
                    .remove(key)
                    .ok_or_else(|| RepoError::from(CoreError::not_found("task", key)))
            })
            .await?;

        let removed_submissions = if cascade {
            store
                .submissions()
                .mutate(|records| {
                    let before = records.len();
                    records.retain(|_, s| s.task_id != key);
                    Ok::<_, StoreError>(before - records.len())
                })
                .await?
        } else {
            0
        };

        Ok(TaskDeletion {
            task,
            removed_submissions,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
