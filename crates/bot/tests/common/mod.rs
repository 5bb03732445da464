//! Shared harness for the scenario tests: a recording transport plus
//! drivers that feed updates through the dispatcher the way a platform
//! binding would.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use kudos_bot::config::BotConfig;
use kudos_bot::dispatcher;
use kudos_bot::session::SessionMap;
use kudos_bot::state::BotContext;
use kudos_bot::transport::{
    ChatTransport, ConversationId, MessageId, OutgoingAttachment, OutgoingMessage, TransportError,
    Update, UpdatePayload,
};
use kudos_core::submission::AttachmentKind;
use kudos_core::PlatformId;
use kudos_events::EventBus;
use kudos_store::JsonStore;

// ---------------------------------------------------------------------------
// Recording transport
// ---------------------------------------------------------------------------

/// One outbound delivery captured by [`MockTransport`].
#[derive(Debug, Clone)]
pub enum Outbound {
    Message {
        conversation: ConversationId,
        message: OutgoingMessage,
    },
    Attachment {
        conversation: ConversationId,
        attachment: OutgoingAttachment,
    },
    Edit {
        conversation: ConversationId,
        message: MessageId,
        replacement: OutgoingMessage,
    },
}

/// Transport that records everything instead of delivering it.
#[derive(Default)]
pub struct MockTransport {
    outbox: Mutex<Vec<Outbound>>,
}

impl MockTransport {
    /// Message and edit texts delivered to one conversation, in order.
    pub async fn texts_for(&self, conversation: ConversationId) -> Vec<String> {
        self.outbox
            .lock()
            .await
            .iter()
            .filter_map(|entry| match entry {
                Outbound::Message {
                    conversation: c,
                    message,
                } if *c == conversation => Some(message.text.clone()),
                Outbound::Edit {
                    conversation: c,
                    replacement,
                    ..
                } if *c == conversation => Some(replacement.text.clone()),
                _ => None,
            })
            .collect()
    }

    /// The most recent text shown in one conversation, or `""`.
    pub async fn last_text_for(&self, conversation: ConversationId) -> String {
        self.texts_for(conversation)
            .await
            .last()
            .cloned()
            .unwrap_or_default()
    }

    pub async fn attachment_count_for(&self, conversation: ConversationId) -> usize {
        self.outbox
            .lock()
            .await
            .iter()
            .filter(|entry| {
                matches!(entry, Outbound::Attachment { conversation: c, .. } if *c == conversation)
            })
            .count()
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send_message(
        &self,
        conversation: ConversationId,
        message: OutgoingMessage,
    ) -> Result<(), TransportError> {
        self.outbox.lock().await.push(Outbound::Message {
            conversation,
            message,
        });
        Ok(())
    }

    async fn send_attachment(
        &self,
        conversation: ConversationId,
        attachment: OutgoingAttachment,
    ) -> Result<(), TransportError> {
        self.outbox.lock().await.push(Outbound::Attachment {
            conversation,
            attachment,
        });
        Ok(())
    }

    async fn edit_message(
        &self,
        conversation: ConversationId,
        message: MessageId,
        replacement: OutgoingMessage,
    ) -> Result<(), TransportError> {
        self.outbox.lock().await.push(Outbound::Edit {
            conversation,
            message,
            replacement,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Context construction
// ---------------------------------------------------------------------------

/// Build a bot context over a fresh store in `data_dir`, returning the
/// recording transport alongside for assertions.
pub fn test_context(
    data_dir: &Path,
    admin_ids: Vec<PlatformId>,
) -> (BotContext, Arc<MockTransport>) {
    let store = Arc::new(JsonStore::open(data_dir).expect("store should open in a fresh dir"));
    let config = Arc::new(BotConfig {
        data_dir: data_dir.to_path_buf(),
        admin_ids,
        session_ttl_secs: 1800,
        task_delete_cascade: true,
    });
    let transport = Arc::new(MockTransport::default());

    let context = BotContext {
        store,
        config,
        sessions: Arc::new(SessionMap::new(Duration::from_secs(1800))),
        event_bus: Arc::new(EventBus::default()),
        transport: Arc::clone(&transport) as Arc<dyn ChatTransport>,
    };
    (context, transport)
}

// ---------------------------------------------------------------------------
// Update drivers
// ---------------------------------------------------------------------------

/// A member's private chat shares their platform id.
fn update(sender: PlatformId, payload: UpdatePayload) -> Update {
    Update {
        conversation: sender,
        sender,
        payload,
    }
}

pub async fn send_command(ctx: &BotContext, sender: PlatformId, command: &str) {
    dispatcher::dispatch(
        ctx.clone(),
        update(sender, UpdatePayload::Command(command.to_string())),
    )
    .await;
}

pub async fn send_text(ctx: &BotContext, sender: PlatformId, text: &str) {
    dispatcher::dispatch(
        ctx.clone(),
        update(sender, UpdatePayload::Text(text.to_string())),
    )
    .await;
}

pub async fn send_callback(ctx: &BotContext, sender: PlatformId, token: &str) {
    dispatcher::dispatch(
        ctx.clone(),
        update(
            sender,
            UpdatePayload::Callback {
                token: token.to_string(),
                message: 1,
            },
        ),
    )
    .await;
}

pub async fn send_media(ctx: &BotContext, sender: PlatformId, kind: AttachmentKind, file_ref: &str) {
    dispatcher::dispatch(
        ctx.clone(),
        update(
            sender,
            UpdatePayload::Media {
                kind,
                file_ref: file_ref.to_string(),
                file_name: None,
                caption: None,
            },
        ),
    )
    .await;
}

/// Walk a member through the /start registration wizard.
pub async fn register(ctx: &BotContext, sender: PlatformId, first_name: &str, surname: &str) {
    send_command(ctx, sender, "start").await;
    send_text(ctx, sender, first_name).await;
    send_text(ctx, sender, surname).await;
}
