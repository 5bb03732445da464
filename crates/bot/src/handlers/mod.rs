//! Update handlers, one module per surface.
//!
//! Each submodule provides async functions the dispatcher routes into.
//! Handlers read and advance wizard sessions, delegate domain work to the
//! repositories in `kudos_store`, and speak through [`crate::render`]
//! builders. Expected refusals become replies; everything else propagates
//! as [`BotError`] for the dispatcher to log.

pub mod admin;
pub mod menu;
pub mod registration;
pub mod shop;
pub mod tasks;

use kudos_core::user::User;
use kudos_core::PlatformId;
use kudos_store::repositories::UserRepo;

use crate::error::{BotError, BotResult};
use crate::render;
use crate::state::BotContext;
use crate::transport::{ConversationId, Keyboard, MessageId, OutgoingMessage};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub(crate) async fn say(
    ctx: &BotContext,
    conversation: ConversationId,
    text: impl Into<String>,
) -> BotResult<()> {
    ctx.transport
        .send_message(conversation, OutgoingMessage::text(text))
        .await
        .map_err(BotError::from)
}

pub(crate) async fn say_with(
    ctx: &BotContext,
    conversation: ConversationId,
    text: impl Into<String>,
    keyboard: Keyboard,
) -> BotResult<()> {
    ctx.transport
        .send_message(
            conversation,
            OutgoingMessage::text(text).with_keyboard(keyboard),
        )
        .await
        .map_err(BotError::from)
}

pub(crate) async fn edit(
    ctx: &BotContext,
    conversation: ConversationId,
    message: MessageId,
    text: impl Into<String>,
) -> BotResult<()> {
    ctx.transport
        .edit_message(conversation, message, OutgoingMessage::text(text))
        .await
        .map_err(BotError::from)
}

pub(crate) async fn edit_with(
    ctx: &BotContext,
    conversation: ConversationId,
    message: MessageId,
    text: impl Into<String>,
    keyboard: Keyboard,
) -> BotResult<()> {
    ctx.transport
        .edit_message(
            conversation,
            message,
            OutgoingMessage::text(text).with_keyboard(keyboard),
        )
        .await
        .map_err(BotError::from)
}

/// Load the sender's member record, or tell them to register.
pub(crate) async fn require_member(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<Option<User>> {
    match UserRepo::find(&ctx.store, sender).await? {
        Some(user) => Ok(Some(user)),
        None => {
            say(ctx, conversation, render::NOT_REGISTERED).await?;
            Ok(None)
        }
    }
}

/// Check the admin allowlist, or refuse.
pub(crate) async fn require_admin(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<bool> {
    if ctx.config.is_admin(sender) {
        Ok(true)
    } else {
        say(ctx, conversation, render::NO_ACCESS).await?;
        Ok(false)
    }
}

/// Leave the active wizard and land back on the admin menu.
pub(crate) async fn exit_to_admin(
    ctx: &BotContext,
    conversation: ConversationId,
    text: impl Into<String>,
) -> BotResult<()> {
    ctx.sessions.clear(conversation).await;
    say_with(ctx, conversation, text, render::admin_menu()).await
}

/// Leave the active wizard and land back on the main menu.
pub(crate) async fn exit_to_main(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    text: impl Into<String>,
) -> BotResult<()> {
    ctx.sessions.clear(conversation).await;
    say_with(
        ctx,
        conversation,
        text,
        render::main_menu(ctx.config.is_admin(sender)),
    )
    .await
}
