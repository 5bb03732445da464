//! Per-conversation wizard sessions.
//!
//! Multi-step flows (registration, task creation, submission content,
//! purchases, grants, the reset confirmation) park their progress here
//! between updates. A conversation with no session is idle. Sessions are
//! in-memory only: a restart drops every half-finished wizard, which is
//! acceptable because each one restarts from a menu button.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use kudos_core::submission::SubmissionDraft;
use kudos_core::{PlatformId, SeqKey};

use crate::transport::ConversationId;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Which wizard step the conversation is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    // Registration
    AwaitingFirstName,
    AwaitingSurname,
    // Task creation
    TaskTitle,
    TaskDescription,
    TaskPoints,
    TaskKind,
    // Submission content collection
    CollectingContent,
    // Product creation
    ProductName,
    ProductDescription,
    ProductPrice,
    ProductQuantity,
    // Purchase
    ConfirmPurchase,
    // Admin one-offs
    GrantAmount,
    FixIdValue,
    ConfirmReset,
}

/// Values accumulated by the active wizard.
///
/// Entering a wizard resets the scratch; advancing within one keeps it.
#[derive(Debug, Clone, Default)]
pub struct Scratch {
    pub first_name: Option<String>,
    pub task_title: Option<String>,
    pub task_description: Option<String>,
    pub task_points: Option<i64>,
    pub selected_task: Option<SeqKey>,
    pub draft: Option<SubmissionDraft>,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub product_price: Option<i64>,
    pub selected_product: Option<SeqKey>,
    pub target_user: Option<PlatformId>,
}

#[derive(Debug)]
struct Session {
    state: WizardState,
    scratch: Scratch,
    touched_at: Instant,
}

// ---------------------------------------------------------------------------
// Session map
// ---------------------------------------------------------------------------

/// All live wizard sessions, keyed by conversation.
#[derive(Debug)]
pub struct SessionMap {
    inner: Mutex<HashMap<ConversationId, Session>>,
    ttl: Duration,
}

impl SessionMap {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Current wizard step, or `None` when the conversation is idle.
    pub async fn state(&self, conversation: ConversationId) -> Option<WizardState> {
        self.inner
            .lock()
            .await
            .get(&conversation)
            .map(|session| session.state)
    }

    /// Start a wizard with empty scratch.
    pub async fn enter(&self, conversation: ConversationId, state: WizardState) {
        self.enter_with(conversation, state, |_| {}).await;
    }

    /// Start a wizard, seeding the fresh scratch before the first step.
    pub async fn enter_with(
        &self,
        conversation: ConversationId,
        state: WizardState,
        seed: impl FnOnce(&mut Scratch),
    ) {
        let mut scratch = Scratch::default();
        seed(&mut scratch);
        self.inner.lock().await.insert(
            conversation,
            Session {
                state,
                scratch,
                touched_at: Instant::now(),
            },
        );
    }

    /// Move the active wizard to its next step, updating scratch in place.
    ///
    /// Tolerates a missing session (swept mid-wizard) by recreating one,
    /// so the handler's own lost-place checks decide what to do next.
    pub async fn advance(
        &self,
        conversation: ConversationId,
        state: WizardState,
        update: impl FnOnce(&mut Scratch),
    ) {
        let mut sessions = self.inner.lock().await;
        let session = sessions.entry(conversation).or_insert_with(|| Session {
            state,
            scratch: Scratch::default(),
            touched_at: Instant::now(),
        });
        session.state = state;
        session.touched_at = Instant::now();
        update(&mut session.scratch);
    }

    /// Snapshot of the conversation's scratch (empty when idle).
    pub async fn scratch(&self, conversation: ConversationId) -> Scratch {
        self.inner
            .lock()
            .await
            .get(&conversation)
            .map(|session| session.scratch.clone())
            .unwrap_or_default()
    }

    /// Finish or abandon the conversation's wizard.
    pub async fn clear(&self, conversation: ConversationId) {
        self.inner.lock().await.remove(&conversation);
    }

    /// Drop sessions idle past the TTL. Returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let mut sessions = self.inner.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.touched_at.elapsed() < self.ttl);
        before - sessions.len()
    }
}

// ---------------------------------------------------------------------------
// Background sweeper
// ---------------------------------------------------------------------------

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically expire idle sessions until cancelled.
pub async fn run_sweeper(sessions: Arc<SessionMap>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session sweeper shutting down");
                break;
            }
            _ = interval.tick() => {
                let dropped = sessions.sweep().await;
                if dropped > 0 {
                    tracing::debug!(dropped, "Expired idle wizard sessions");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn idle_conversation_has_no_state() {
        let sessions = SessionMap::new(Duration::from_secs(1800));
        assert_eq!(sessions.state(1).await, None);
    }

    #[tokio::test]
    async fn enter_sets_state_and_clear_removes_it() {
        let sessions = SessionMap::new(Duration::from_secs(1800));
        sessions.enter(1, WizardState::TaskTitle).await;
        assert_eq!(sessions.state(1).await, Some(WizardState::TaskTitle));
        sessions.clear(1).await;
        assert_eq!(sessions.state(1).await, None);
    }

    #[tokio::test]
    async fn advance_keeps_scratch_across_steps() {
        let sessions = SessionMap::new(Duration::from_secs(1800));
        sessions.enter(1, WizardState::TaskTitle).await;
        sessions
            .advance(1, WizardState::TaskDescription, |scratch| {
                scratch.task_title = Some("Share the post".to_string());
            })
            .await;
        sessions
            .advance(1, WizardState::TaskPoints, |scratch| {
                scratch.task_description = Some("With a screenshot".to_string());
            })
            .await;
        let scratch = sessions.scratch(1).await;
        assert_eq!(scratch.task_title.as_deref(), Some("Share the post"));
        assert_eq!(scratch.task_description.as_deref(), Some("With a screenshot"));
    }

    #[tokio::test]
    async fn enter_resets_scratch_from_previous_wizard() {
        let sessions = SessionMap::new(Duration::from_secs(1800));
        sessions
            .enter_with(1, WizardState::GrantAmount, |scratch| {
                scratch.target_user = Some(900);
            })
            .await;
        sessions.enter(1, WizardState::TaskTitle).await;
        assert_eq!(sessions.scratch(1).await.target_user, None);
    }

    #[tokio::test]
    async fn sweep_drops_expired_sessions_only() {
        let sessions = SessionMap::new(Duration::ZERO);
        sessions.enter(1, WizardState::ConfirmReset).await;
        sessions.enter(2, WizardState::TaskTitle).await;
        let dropped = sessions.sweep().await;
        assert_eq!(dropped, 2);
        assert_eq!(sessions.state(1).await, None);

        let sessions = SessionMap::new(Duration::from_secs(1800));
        sessions.enter(1, WizardState::ConfirmReset).await;
        assert_eq!(sessions.sweep().await, 0);
        assert_eq!(sessions.state(1).await, Some(WizardState::ConfirmReset));
    }

    #[tokio::test]
    async fn sessions_are_isolated_per_conversation() {
        let sessions = SessionMap::new(Duration::from_secs(1800));
        sessions.enter(1, WizardState::TaskTitle).await;
        sessions.enter(2, WizardState::ProductName).await;
        assert_eq!(sessions.state(1).await, Some(WizardState::TaskTitle));
        assert_eq!(sessions.state(2).await, Some(WizardState::ProductName));
    }
}
