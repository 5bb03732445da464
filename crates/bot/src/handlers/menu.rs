//! Main-menu screens: profile, leaderboard, and the way back.

use kudos_core::stats;
use kudos_core::PlatformId;
use kudos_store::repositories::UserRepo;

use crate::error::BotResult;
use crate::render;
use crate::state::BotContext;
use crate::transport::ConversationId;

use super::{exit_to_main, require_member, say};

pub async fn profile(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    let Some(user) = require_member(ctx, conversation, sender).await? else {
        return Ok(());
    };
    say(ctx, conversation, render::profile_text(&user)).await
}

pub async fn leaderboard(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    if require_member(ctx, conversation, sender).await?.is_none() {
        return Ok(());
    }
    let users = UserRepo::list(&ctx.store).await?;
    let board = stats::leaderboard(&users);
    say(ctx, conversation, render::leaderboard_text(&board)).await
}

/// "Main menu" from anywhere outside a wizard.
pub async fn to_main_menu(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    exit_to_main(ctx, conversation, sender, "Main menu.").await
}
