//! Update routing.
//!
//! One entry point, [`dispatch`], fans an [`Update`] out to the right
//! handler: wizard state first, then menu button labels, then callback
//! tokens. A handler error is logged, the conversation's session is
//! dropped so the member is not stuck mid-wizard, and a generic apology
//! goes out.

use kudos_core::submission::{AttachmentKind, SubmissionStatus};
use kudos_core::PlatformId;

use crate::callback::CallbackAction;
use crate::error::BotResult;
use crate::handlers::{self, admin, menu, registration, shop, tasks};
use crate::render;
use crate::session::WizardState;
use crate::state::BotContext;
use crate::transport::{ConversationId, MessageId, OutgoingMessage, Update, UpdatePayload};

/// Handle one update start to finish.
pub async fn dispatch(ctx: BotContext, update: Update) {
    let conversation = update.conversation;
    let sender = update.sender;
    if let Err(err) = route(&ctx, update).await {
        tracing::error!(error = %err, conversation, sender, "Update handling failed");
        ctx.sessions.clear(conversation).await;
        let apology = OutgoingMessage::text(render::GENERIC_FAILURE);
        if let Err(send_err) = ctx.transport.send_message(conversation, apology).await {
            tracing::warn!(error = %send_err, conversation, "Failed to send the failure notice");
        }
    }
}

/// Spawn [`dispatch`] on its own task, one per update.
pub fn spawn(ctx: BotContext, update: Update) -> tokio::task::JoinHandle<()> {
    tokio::spawn(dispatch(ctx, update))
}

async fn route(ctx: &BotContext, update: Update) -> BotResult<()> {
    let conversation = update.conversation;
    let sender = update.sender;
    match update.payload {
        UpdatePayload::Command(command) => {
            route_command(ctx, conversation, sender, &command).await
        }
        UpdatePayload::Text(text) => route_text(ctx, conversation, sender, &text).await,
        UpdatePayload::Media {
            kind,
            file_ref,
            file_name,
            caption,
        } => route_media(ctx, conversation, sender, kind, file_ref, file_name, caption).await,
        UpdatePayload::Callback { token, message } => {
            route_callback(ctx, conversation, sender, &token, message).await
        }
    }
}

async fn route_command(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    command: &str,
) -> BotResult<()> {
    match command {
        "start" => registration::start(ctx, conversation, sender).await,
        other => {
            tracing::debug!(command = other, sender, "Unknown command");
            handlers::say(ctx, conversation, "Unknown command. Send /start to begin.").await
        }
    }
}

/// Plain text: an active wizard consumes it, otherwise it must be a menu
/// button label.
async fn route_text(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    text: &str,
) -> BotResult<()> {
    if let Some(state) = ctx.sessions.state(conversation).await {
        return route_wizard_text(ctx, conversation, sender, state, text).await;
    }
    route_menu_label(ctx, conversation, sender, text).await
}

async fn route_wizard_text(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    state: WizardState,
    text: &str,
) -> BotResult<()> {
    match state {
        WizardState::AwaitingFirstName => registration::first_name(ctx, conversation, text).await,
        WizardState::AwaitingSurname => {
            registration::surname(ctx, conversation, sender, text).await
        }
        WizardState::TaskTitle => tasks::create_title(ctx, conversation, text).await,
        WizardState::TaskDescription => tasks::create_description(ctx, conversation, text).await,
        WizardState::TaskPoints => tasks::create_points(ctx, conversation, text).await,
        WizardState::TaskKind => tasks::create_kind(ctx, conversation, sender, text).await,
        WizardState::CollectingContent => tasks::content_text(ctx, conversation, sender, text).await,
        WizardState::ProductName => shop::create_name(ctx, conversation, text).await,
        WizardState::ProductDescription => shop::create_description(ctx, conversation, text).await,
        WizardState::ProductPrice => shop::create_price(ctx, conversation, text).await,
        WizardState::ProductQuantity => shop::create_quantity(ctx, conversation, sender, text).await,
        WizardState::ConfirmPurchase => shop::confirm(ctx, conversation, sender, text).await,
        WizardState::GrantAmount => admin::grant_amount(ctx, conversation, sender, text).await,
        WizardState::FixIdValue => admin::fix_id_value(ctx, conversation, sender, text).await,
        WizardState::ConfirmReset => admin::reset_confirm(ctx, conversation, sender, text).await,
    }
}

async fn route_menu_label(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    text: &str,
) -> BotResult<()> {
    match text {
        render::BTN_PROFILE => menu::profile(ctx, conversation, sender).await,
        render::BTN_SHOP => shop::browse(ctx, conversation, sender).await,
        render::BTN_LEADERBOARD => menu::leaderboard(ctx, conversation, sender).await,
        render::BTN_SUBMIT_TASK => tasks::submit_entry(ctx, conversation, sender).await,
        render::BTN_ADMIN_PANEL => admin::panel(ctx, conversation, sender).await,
        render::BTN_USERS => admin::users_list(ctx, conversation, sender).await,
        render::BTN_GRANT_POINTS => admin::grant_start(ctx, conversation, sender).await,
        render::BTN_CREATE_TASK => tasks::create_start(ctx, conversation, sender).await,
        render::BTN_TASK_LIST => tasks::catalog(ctx, conversation, sender).await,
        render::BTN_DELETE_TASK => tasks::delete_start(ctx, conversation, sender).await,
        render::BTN_REVIEW => tasks::review_entry(ctx, conversation, sender).await,
        render::BTN_ADD_PRODUCT => shop::create_start(ctx, conversation, sender).await,
        render::BTN_PRODUCT_LIST => shop::catalog(ctx, conversation, sender).await,
        render::BTN_DELETE_PRODUCT => shop::delete_start(ctx, conversation, sender).await,
        render::BTN_STATS => admin::statistics(ctx, conversation, sender).await,
        render::BTN_FIX_ID => admin::fix_id_start(ctx, conversation, sender).await,
        render::BTN_RESET => admin::reset_start(ctx, conversation, sender).await,
        render::BTN_MAIN_MENU => menu::to_main_menu(ctx, conversation, sender).await,
        other => {
            // Free text outside a wizard gets no reply.
            tracing::debug!(text = other, sender, "Unroutable text ignored");
            Ok(())
        }
    }
}

async fn route_media(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    kind: AttachmentKind,
    file_ref: String,
    file_name: Option<String>,
    caption: Option<String>,
) -> BotResult<()> {
    match ctx.sessions.state(conversation).await {
        Some(WizardState::CollectingContent) => {
            tasks::content_media(ctx, conversation, kind, file_ref, file_name, caption).await
        }
        _ => {
            tracing::debug!(sender, "Media outside a submission ignored");
            Ok(())
        }
    }
}

async fn route_callback(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    token: &str,
    message: MessageId,
) -> BotResult<()> {
    // Buttons on old messages can outlive the code that made them.
    let Some(action) = CallbackAction::parse(token) else {
        tracing::debug!(token, sender, "Unparseable callback token ignored");
        return Ok(());
    };

    match action {
        CallbackAction::SubmitTask(key) => {
            tasks::on_task_picked(ctx, conversation, sender, message, &key).await
        }
        CallbackAction::ReviewSubmission(key) => {
            tasks::on_review_picked(ctx, conversation, sender, message, &key).await
        }
        CallbackAction::ApproveSubmission(key) => {
            tasks::on_decision(ctx, conversation, sender, message, &key, SubmissionStatus::Approved)
                .await
        }
        CallbackAction::RejectSubmission(key) => {
            tasks::on_decision(ctx, conversation, sender, message, &key, SubmissionStatus::Rejected)
                .await
        }
        CallbackAction::DeleteTask(key) => {
            tasks::on_delete_picked(ctx, conversation, sender, message, &key).await
        }
        CallbackAction::ConfirmDeleteTask(key) => {
            tasks::on_delete_confirmed(ctx, conversation, sender, message, &key).await
        }
        CallbackAction::DeleteProduct(key) => {
            shop::on_delete_picked(ctx, conversation, sender, message, &key).await
        }
        CallbackAction::ConfirmDeleteProduct(key) => {
            shop::on_delete_confirmed(ctx, conversation, sender, message, &key).await
        }
        CallbackAction::BuyProduct(key) => {
            shop::on_buy_picked(ctx, conversation, sender, message, &key).await
        }
        CallbackAction::GrantPointsTo(target) => {
            admin::on_grant_user_picked(ctx, conversation, sender, message, target).await
        }
        CallbackAction::FixDisplayIdOf(target) => {
            admin::on_fix_user_picked(ctx, conversation, sender, message, target).await
        }
        CallbackAction::Cancel => handlers::edit(ctx, conversation, message, "Cancelled.").await,
    }
}
