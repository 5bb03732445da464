//! Admin panel: member list, point grants, display-id fixes, the full
//! reset, and statistics.

use kudos_core::stats;
use kudos_core::user::{validate_display_id, validate_points_amount, User};
use kudos_core::{CoreError, PlatformId};
use kudos_events::{BotEvent, POINTS_GRANTED, SYSTEM_RESET};
use kudos_store::repositories::{TaskRepo, UserRepo};
use kudos_store::RepoError;

use crate::callback::CallbackAction;
use crate::error::BotResult;
use crate::render;
use crate::session::WizardState;
use crate::state::BotContext;
use crate::transport::{ConversationId, InlineButton, Keyboard, MessageId};

use super::{edit, exit_to_admin, require_admin, say, say_with};

pub async fn panel(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    say_with(ctx, conversation, "Admin panel.", render::admin_menu()).await
}

pub async fn users_list(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    let users = UserRepo::list(&ctx.store).await?;
    if users.is_empty() {
        return say(ctx, conversation, "No members yet.").await;
    }
    say(ctx, conversation, render::users_list_text(&users)).await
}

// ---------------------------------------------------------------------------
// Point grants
// ---------------------------------------------------------------------------

fn member_buttons(
    users: &[User],
    action: impl Fn(PlatformId) -> CallbackAction,
) -> Vec<Vec<InlineButton>> {
    let mut buttons: Vec<Vec<InlineButton>> = users
        .iter()
        .map(|user| {
            vec![InlineButton::new(
                format!("#{} {} ({} pts)", user.display_id, user.full_name(), user.points),
                action(user.platform_id).encode(),
            )]
        })
        .collect();
    buttons.push(vec![InlineButton::new(
        render::BTN_CANCEL,
        CallbackAction::Cancel.encode(),
    )]);
    buttons
}

pub async fn grant_start(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    let mut users = UserRepo::list(&ctx.store).await?;
    if users.is_empty() {
        return say(ctx, conversation, "No members to grant points to.").await;
    }
    users.sort_by_key(|u| u.display_id);
    say_with(
        ctx,
        conversation,
        "Who receives the points?",
        Keyboard::Inline(member_buttons(&users, CallbackAction::GrantPointsTo)),
    )
    .await
}

pub async fn on_grant_user_picked(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    message: MessageId,
    target: PlatformId,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    let Some(user) = UserRepo::find(&ctx.store, target).await? else {
        return edit(ctx, conversation, message, "That member no longer exists.").await;
    };
    ctx.sessions
        .enter_with(conversation, WizardState::GrantAmount, |scratch| {
            scratch.target_user = Some(target);
        })
        .await;
    edit(
        ctx,
        conversation,
        message,
        format!("Granting points to {} (#{}).", user.full_name(), user.display_id),
    )
    .await?;
    say_with(ctx, conversation, "How many points?", render::cancel_keyboard()).await
}

pub async fn grant_amount(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    text: &str,
) -> BotResult<()> {
    if text == render::BTN_CANCEL {
        return exit_to_admin(ctx, conversation, "Grant cancelled.").await;
    }
    let amount: i64 = match text.trim().parse() {
        Ok(amount) => amount,
        Err(_) => {
            return say(ctx, conversation, "Enter a whole number of points.").await;
        }
    };
    if let Err(err) = validate_points_amount(amount) {
        return say(
            ctx,
            conversation,
            format!("{} Try again.", render::refusal_text(&err)),
        )
        .await;
    }
    let Some(target) = ctx.sessions.scratch(conversation).await.target_user else {
        ctx.sessions.clear(conversation).await;
        return say_with(ctx, conversation, render::LOST_PLACE, render::admin_menu()).await;
    };

    match UserRepo::credit_earned(&ctx.store, target, amount).await {
        Ok(member) => {
            tracing::info!(
                admin = sender,
                user_id = target,
                amount,
                "Points granted"
            );
            ctx.event_bus.publish(
                BotEvent::new(POINTS_GRANTED)
                    .with_source("user", target.to_string())
                    .with_actor(sender)
                    .with_payload(serde_json::json!({
                        "amount": amount,
                        "balance": member.points,
                    })),
            );
            exit_to_admin(
                ctx,
                conversation,
                format!(
                    "Granted {amount} pts to {} (#{}). New balance: {} pts.",
                    member.full_name(),
                    member.display_id,
                    member.points
                ),
            )
            .await
        }
        Err(RepoError::Core(CoreError::NotFound { .. })) => {
            exit_to_admin(
                ctx,
                conversation,
                "That member no longer exists. Nothing was granted.",
            )
            .await
        }
        Err(err) => Err(err.into()),
    }
}

// ---------------------------------------------------------------------------
// Display-id fixes
// ---------------------------------------------------------------------------

pub async fn fix_id_start(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    let mut users = UserRepo::list(&ctx.store).await?;
    if users.is_empty() {
        return say(ctx, conversation, "No members yet.").await;
    }
    users.sort_by_key(|u| u.display_id);
    say_with(
        ctx,
        conversation,
        "Whose display id needs fixing?",
        Keyboard::Inline(member_buttons(&users, CallbackAction::FixDisplayIdOf)),
    )
    .await
}

pub async fn on_fix_user_picked(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    message: MessageId,
    target: PlatformId,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    let Some(user) = UserRepo::find(&ctx.store, target).await? else {
        return edit(ctx, conversation, message, "That member no longer exists.").await;
    };
    ctx.sessions
        .enter_with(conversation, WizardState::FixIdValue, |scratch| {
            scratch.target_user = Some(target);
        })
        .await;
    edit(
        ctx,
        conversation,
        message,
        format!(
            "Fixing the display id of {} (currently #{}).",
            user.full_name(),
            user.display_id
        ),
    )
    .await?;
    say_with(ctx, conversation, "Send the new display id:", render::cancel_keyboard()).await
}

pub async fn fix_id_value(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    text: &str,
) -> BotResult<()> {
    if text == render::BTN_CANCEL {
        return exit_to_admin(ctx, conversation, "Display id change cancelled.").await;
    }
    let raw: i64 = match text.trim().parse() {
        Ok(raw) => raw,
        Err(_) => {
            return say(ctx, conversation, "Enter a whole number.").await;
        }
    };
    let display_id = match validate_display_id(raw) {
        Ok(display_id) => display_id,
        Err(err) => {
            return say(
                ctx,
                conversation,
                format!("{} Try again.", render::refusal_text(&err)),
            )
            .await;
        }
    };
    let Some(target) = ctx.sessions.scratch(conversation).await.target_user else {
        ctx.sessions.clear(conversation).await;
        return say_with(ctx, conversation, render::LOST_PLACE, render::admin_menu()).await;
    };

    match UserRepo::set_display_id(&ctx.store, target, display_id).await {
        Ok(member) => {
            tracing::info!(admin = sender, user_id = target, display_id, "Display id reassigned");
            exit_to_admin(
                ctx,
                conversation,
                format!("{} is now member #{}.", member.full_name(), member.display_id),
            )
            .await
        }
        // Taken id: stay in the wizard so the admin can try another.
        Err(RepoError::Core(CoreError::Conflict(msg))) => {
            say(ctx, conversation, format!("{msg}. Pick another:")).await
        }
        Err(RepoError::Core(CoreError::NotFound { .. })) => {
            exit_to_admin(ctx, conversation, "That member no longer exists.").await
        }
        Err(err) => Err(err.into()),
    }
}

// ---------------------------------------------------------------------------
// Full reset
// ---------------------------------------------------------------------------

pub async fn reset_start(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    let users = UserRepo::list(&ctx.store).await?;
    let empty = users.is_empty()
        && ctx.store.tasks().is_empty().await
        && ctx.store.submissions().is_empty().await
        && ctx.store.products().is_empty().await
        && ctx.store.orders().is_empty().await;
    if empty {
        return say(ctx, conversation, "There is nothing to reset.").await;
    }

    let total_points: i64 = users.iter().map(|u| u.points).sum();
    ctx.sessions.enter(conversation, WizardState::ConfirmReset).await;
    say_with(
        ctx,
        conversation,
        render::reset_warning(users.len(), total_points),
        render::cancel_keyboard(),
    )
    .await
}

pub async fn reset_confirm(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    text: &str,
) -> BotResult<()> {
    if text == render::BTN_CANCEL {
        return exit_to_admin(ctx, conversation, "Reset cancelled. Nothing was deleted.").await;
    }
    if text != render::RESET_CONFIRM_PHRASE {
        return say(
            ctx,
            conversation,
            format!(
                "That did not match. Type \"{}\" exactly, or press {}.",
                render::RESET_CONFIRM_PHRASE,
                render::BTN_CANCEL
            ),
        )
        .await;
    }

    let counts = ctx.store.reset_all().await?;
    tracing::warn!(
        admin = sender,
        users = counts.users,
        tasks = counts.tasks,
        submissions = counts.submissions,
        products = counts.products,
        orders = counts.orders,
        "Full data reset executed"
    );
    ctx.event_bus.publish(
        BotEvent::new(SYSTEM_RESET)
            .with_actor(sender)
            .with_payload(serde_json::json!({ "destroyed": counts.total() })),
    );
    exit_to_admin(ctx, conversation, render::reset_done(&counts)).await
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

pub async fn statistics(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    let users = UserRepo::list(&ctx.store).await?;
    let tasks = TaskRepo::list(&ctx.store).await?;
    let submissions = ctx.store.submissions().values().await;
    let summary = stats::system_stats(&users, tasks.len(), &submissions);
    say(ctx, conversation, render::stats_text(&summary)).await
}
