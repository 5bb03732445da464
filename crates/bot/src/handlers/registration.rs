//! Registration: `/start` plus the two-step name wizard.

use chrono::Utc;

use kudos_core::user::validate_person_name;
use kudos_core::PlatformId;
use kudos_store::repositories::{RegisterOutcome, UserRepo};

use crate::error::BotResult;
use crate::render;
use crate::session::WizardState;
use crate::state::BotContext;
use crate::transport::{ConversationId, Keyboard};

use super::{say, say_with};

/// Handle `/start`: greet a registered member, or begin the name wizard.
pub async fn start(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    if let Some(user) = UserRepo::find(&ctx.store, sender).await? {
        ctx.sessions.clear(conversation).await;
        return say_with(
            ctx,
            conversation,
            format!("Welcome back!\n\n{}", render::profile_text(&user)),
            render::main_menu(ctx.config.is_admin(sender)),
        )
        .await;
    }

    ctx.sessions
        .enter(conversation, WizardState::AwaitingFirstName)
        .await;
    say_with(
        ctx,
        conversation,
        "Welcome! Let's get you registered.\n\nWhat is your first name?",
        Keyboard::Remove,
    )
    .await
}

/// First wizard step: validate and stash the first name.
pub async fn first_name(
    ctx: &BotContext,
    conversation: ConversationId,
    text: &str,
) -> BotResult<()> {
    let name = match validate_person_name("first name", text) {
        Ok(name) => name,
        Err(err) => {
            return say(
                ctx,
                conversation,
                format!("{} Please try again.", render::refusal_text(&err)),
            )
            .await;
        }
    };

    ctx.sessions
        .advance(conversation, WizardState::AwaitingSurname, |scratch| {
            scratch.first_name = Some(name);
        })
        .await;
    say(ctx, conversation, "And your surname?").await
}

/// Second wizard step: validate the surname and create the member.
pub async fn surname(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    text: &str,
) -> BotResult<()> {
    let Some(first_name) = ctx.sessions.scratch(conversation).await.first_name else {
        ctx.sessions.clear(conversation).await;
        return say(
            ctx,
            conversation,
            format!("{} Send /start to begin again.", render::LOST_PLACE),
        )
        .await;
    };

    let surname = match validate_person_name("surname", text) {
        Ok(surname) => surname,
        Err(err) => {
            return say(
                ctx,
                conversation,
                format!("{} Please try again.", render::refusal_text(&err)),
            )
            .await;
        }
    };

    let outcome = UserRepo::register(&ctx.store, sender, &first_name, &surname, Utc::now()).await?;
    ctx.sessions.clear(conversation).await;

    match outcome {
        RegisterOutcome::Created(user) => {
            tracing::info!(
                platform_id = sender,
                display_id = user.display_id,
                "Member registered"
            );
            say_with(
                ctx,
                conversation,
                format!(
                    "You're in, {}! Your member number is #{}.",
                    user.first_name, user.display_id
                ),
                render::main_menu(ctx.config.is_admin(sender)),
            )
            .await
        }
        RegisterOutcome::AlreadyRegistered(user) => {
            say_with(
                ctx,
                conversation,
                format!("You are already registered.\n\n{}", render::profile_text(&user)),
                render::main_menu(ctx.config.is_admin(sender)),
            )
            .await
        }
    }
}
