//! Event-to-notification routing.
//!
//! [`NotificationRouter`] subscribes to the event bus and turns each
//! [`BotEvent`] into chat messages: fresh submissions and orders go to
//! the admins, review decisions and grants go to the affected member.
//! Routing failures are logged and never propagate back to the operation
//! that published the event.

use std::sync::Arc;

use tokio::sync::broadcast;

use kudos_core::PlatformId;
use kudos_events::{
    BotEvent, ORDER_COMPLETED, POINTS_GRANTED, SUBMISSION_APPROVED, SUBMISSION_RECEIVED,
    SUBMISSION_REJECTED, SYSTEM_RESET,
};
use kudos_store::repositories::{ProductRepo, SubmissionRepo};
use kudos_store::JsonStore;

use crate::error::BotResult;
use crate::render;
use crate::transport::{ChatTransport, ConversationId, OutgoingAttachment, OutgoingMessage};

/// Routes bot events to admin alerts and member notices.
pub struct NotificationRouter {
    store: Arc<JsonStore>,
    transport: Arc<dyn ChatTransport>,
    admin_ids: Vec<PlatformId>,
}

impl NotificationRouter {
    pub fn new(
        store: Arc<JsonStore>,
        transport: Arc<dyn ChatTransport>,
        admin_ids: Vec<PlatformId>,
    ) -> Self {
        Self {
            store,
            transport,
            admin_ids,
        }
    }

    /// Run the main routing loop.
    ///
    /// Processes events until the channel closes, which happens when the
    /// [`EventBus`](kudos_events::EventBus) is dropped at shutdown.
    pub async fn run(self, mut receiver: broadcast::Receiver<BotEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Route a single event to whoever should hear about it.
    async fn route_event(&self, event: &BotEvent) -> BotResult<()> {
        match event.event_type.as_str() {
            SUBMISSION_RECEIVED => self.on_submission_received(event).await,
            SUBMISSION_APPROVED => self.on_submission_decided(event, true).await,
            SUBMISSION_REJECTED => self.on_submission_decided(event, false).await,
            POINTS_GRANTED => self.on_points_granted(event).await,
            ORDER_COMPLETED => self.on_order_completed(event).await,
            // The reset outcome is reported in the admin's own chat.
            SYSTEM_RESET => Ok(()),
            other => {
                tracing::debug!(event_type = other, "No notification route for event");
                Ok(())
            }
        }
    }

    fn source_key<'a>(&self, event: &'a BotEvent) -> Option<&'a str> {
        let key = event.source_entity_key.as_deref();
        if key.is_none() {
            tracing::warn!(event_type = %event.event_type, "Event arrived without a source key");
        }
        key
    }

    /// A private chat shares the member's platform id, which is how a
    /// notification reaches a member directly.
    async fn send_to(&self, conversation: ConversationId, text: String) {
        if let Err(err) = self
            .transport
            .send_message(conversation, OutgoingMessage::text(text))
            .await
        {
            tracing::warn!(error = %err, conversation, "Failed to deliver a notification");
        }
    }

    /// New submission: every admin gets the attachments plus the summary.
    async fn on_submission_received(&self, event: &BotEvent) -> BotResult<()> {
        let Some(key) = self.source_key(event) else {
            return Ok(());
        };
        let Some(submission) = SubmissionRepo::find(&self.store, key).await? else {
            tracing::warn!(key, "Submission vanished before its notification went out");
            return Ok(());
        };

        let text = render::submission_notification(key, &submission);
        for &admin in &self.admin_ids {
            for attachment in &submission.attachments {
                let outgoing = OutgoingAttachment {
                    kind: attachment.kind,
                    file_ref: attachment.file_ref.clone(),
                    file_name: attachment.file_name.clone(),
                    caption: attachment.caption.clone(),
                };
                if let Err(err) = self.transport.send_attachment(admin, outgoing).await {
                    tracing::warn!(error = %err, admin, "Failed to forward an attachment");
                }
            }
            self.send_to(admin, text.clone()).await;
        }
        Ok(())
    }

    /// Review decision: tell the member who submitted.
    async fn on_submission_decided(&self, event: &BotEvent, approved: bool) -> BotResult<()> {
        let Some(key) = self.source_key(event) else {
            return Ok(());
        };
        let Some(submission) = SubmissionRepo::find(&self.store, key).await? else {
            tracing::warn!(key, "Submission vanished before its notification went out");
            return Ok(());
        };

        let text = if approved {
            let balance = event.payload.get("balance").and_then(|v| v.as_i64());
            render::approval_notice(key, &submission, balance)
        } else {
            render::rejection_notice(key, &submission)
        };
        self.send_to(submission.user_id, text).await;
        Ok(())
    }

    /// Grant: tell the member. The source key is the member's platform id.
    async fn on_points_granted(&self, event: &BotEvent) -> BotResult<()> {
        let Some(key) = self.source_key(event) else {
            return Ok(());
        };
        let Ok(user_id) = key.parse::<PlatformId>() else {
            tracing::warn!(key, "Grant event carries a non-numeric source key");
            return Ok(());
        };
        let Some(amount) = event.payload.get("amount").and_then(|v| v.as_i64()) else {
            tracing::warn!(key, "Grant event arrived without an amount");
            return Ok(());
        };
        let balance = event.payload.get("balance").and_then(|v| v.as_i64());
        self.send_to(user_id, render::grant_notice(amount, balance)).await;
        Ok(())
    }

    /// Completed order: every admin gets the receipt.
    async fn on_order_completed(&self, event: &BotEvent) -> BotResult<()> {
        let Some(key) = self.source_key(event) else {
            return Ok(());
        };
        let Some(order) = self.store.orders().get(key).await else {
            tracing::warn!(key, "Order vanished before its notification went out");
            return Ok(());
        };

        // The product may already be deleted; the receipt stands alone.
        let product = ProductRepo::find(&self.store, &order.product_id).await?;
        let text = render::order_notice(key, &order, product.as_ref());
        for &admin in &self.admin_ids {
            self.send_to(admin, text.clone()).await;
        }
        Ok(())
    }
}
