//! The seam to the chat platform.
//!
//! The bot never talks to a messenger SDK directly. Everything outbound
//! goes through [`ChatTransport`]; everything inbound arrives as an
//! [`Update`] handed to the dispatcher. Tests drive the bot through a
//! recording mock; the binary wires [`LogTransport`] until a real platform
//! binding is attached.

use async_trait::async_trait;

use kudos_core::submission::AttachmentKind;
use kudos_core::PlatformId;

/// Conversation (chat) identifier.
///
/// In a private chat this equals the member's platform id, which is how
/// notifications reach a member directly.
pub type ConversationId = i64;

/// Identifier of a message within a conversation.
pub type MessageId = i64;

// ---------------------------------------------------------------------------
// Outbound model
// ---------------------------------------------------------------------------

/// One inline button: a label plus the callback token it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub token: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// Keyboard attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Persistent reply keyboard: rows of text buttons. Pressing one
    /// arrives back as a plain [`UpdatePayload::Text`].
    Reply(Vec<Vec<String>>),
    /// One-shot inline keyboard under a single message. Pressing a button
    /// arrives back as an [`UpdatePayload::Callback`].
    Inline(Vec<Vec<InlineButton>>),
    /// Remove whatever reply keyboard is currently visible.
    Remove,
}

/// Text message with an optional keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// A stored attachment re-sent by its opaque file reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingAttachment {
    pub kind: AttachmentKind,
    pub file_ref: String,
    pub file_name: Option<String>,
    pub caption: Option<String>,
}

// ---------------------------------------------------------------------------
// Inbound model
// ---------------------------------------------------------------------------

/// One incoming update from the platform.
#[derive(Debug, Clone)]
pub struct Update {
    pub conversation: ConversationId,
    /// Platform id of the sending member.
    pub sender: PlatformId,
    pub payload: UpdatePayload,
}

/// What the member actually sent.
#[derive(Debug, Clone)]
pub enum UpdatePayload {
    /// A `/command`, without the leading slash.
    Command(String),
    /// Plain text, including presses of reply-keyboard buttons.
    Text(String),
    /// A media message with an optional caption.
    Media {
        kind: AttachmentKind,
        file_ref: String,
        file_name: Option<String>,
        caption: Option<String>,
    },
    /// An inline-button press. `message` is the message the button sits
    /// under, so the handler can edit it in place.
    Callback { token: String, message: MessageId },
}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// A delivery failure reported by the platform binding.
#[derive(Debug, thiserror::Error)]
#[error("Transport failure: {0}")]
pub struct TransportError(pub String);

/// Outbound operations a platform binding must provide.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(
        &self,
        conversation: ConversationId,
        message: OutgoingMessage,
    ) -> Result<(), TransportError>;

    async fn send_attachment(
        &self,
        conversation: ConversationId,
        attachment: OutgoingAttachment,
    ) -> Result<(), TransportError>;

    /// Replace the text (and inline keyboard) of an already-sent message.
    /// Reply keyboards cannot be attached through an edit.
    async fn edit_message(
        &self,
        conversation: ConversationId,
        message: MessageId,
        replacement: OutgoingMessage,
    ) -> Result<(), TransportError>;
}

// ---------------------------------------------------------------------------
// Logging stand-in
// ---------------------------------------------------------------------------

/// Transport that logs outbound traffic instead of delivering it.
///
/// Used by the binary while no platform binding is configured.
#[derive(Debug, Default)]
pub struct LogTransport;

#[async_trait]
impl ChatTransport for LogTransport {
    async fn send_message(
        &self,
        conversation: ConversationId,
        message: OutgoingMessage,
    ) -> Result<(), TransportError> {
        tracing::info!(conversation, text = %message.text, "send_message");
        Ok(())
    }

    async fn send_attachment(
        &self,
        conversation: ConversationId,
        attachment: OutgoingAttachment,
    ) -> Result<(), TransportError> {
        tracing::info!(
            conversation,
            kind = attachment.kind.as_str(),
            file_ref = %attachment.file_ref,
            "send_attachment"
        );
        Ok(())
    }

    async fn edit_message(
        &self,
        conversation: ConversationId,
        message: MessageId,
        replacement: OutgoingMessage,
    ) -> Result<(), TransportError> {
        tracing::info!(conversation, message, text = %replacement.text, "edit_message");
        Ok(())
    }
}
