//! Shop workflows: product creation, browsing, the purchase commit, and
//! product deletion.

use chrono::Utc;

use kudos_core::order::Order;
use kudos_core::product::{validate_price, validate_quantity};
use kudos_core::task::validate_text_field;
use kudos_core::{CoreError, PlatformId, SeqKey};
use kudos_events::{BotEvent, ORDER_COMPLETED};
use kudos_store::repositories::{OrderRepo, ProductRepo, UserRepo};
use kudos_store::RepoError;

use crate::callback::CallbackAction;
use crate::error::BotResult;
use crate::render;
use crate::session::WizardState;
use crate::state::BotContext;
use crate::transport::{ConversationId, InlineButton, Keyboard, MessageId};

use super::{
    edit, edit_with, exit_to_admin, exit_to_main, require_admin, require_member, say, say_with,
};

// ---------------------------------------------------------------------------
// Creation wizard
// ---------------------------------------------------------------------------

pub async fn create_start(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    ctx.sessions.enter(conversation, WizardState::ProductName).await;
    say_with(
        ctx,
        conversation,
        "Adding a product. What is it called?",
        render::cancel_keyboard(),
    )
    .await
}

pub async fn create_name(
    ctx: &BotContext,
    conversation: ConversationId,
    text: &str,
) -> BotResult<()> {
    if text == render::BTN_CANCEL {
        return exit_to_admin(ctx, conversation, "Product creation cancelled.").await;
    }
    let name = match validate_text_field("name", text) {
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
        .advance(conversation, WizardState::ProductDescription, |scratch| {
            scratch.product_name = Some(name);
        })
        .await;
    say(ctx, conversation, "Now the description:").await
}

pub async fn create_description(
    ctx: &BotContext,
    conversation: ConversationId,
    text: &str,
) -> BotResult<()> {
    if text == render::BTN_CANCEL {
        return exit_to_admin(ctx, conversation, "Product creation cancelled.").await;
    }
    let description = match validate_text_field("description", text) {
        Ok(description) => description,
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
        .advance(conversation, WizardState::ProductPrice, |scratch| {
            scratch.product_description = Some(description);
        })
        .await;
    say(ctx, conversation, "What does it cost, in points?").await
}

pub async fn create_price(
    ctx: &BotContext,
    conversation: ConversationId,
    text: &str,
) -> BotResult<()> {
    if text == render::BTN_CANCEL {
        return exit_to_admin(ctx, conversation, "Product creation cancelled.").await;
    }
    let price: i64 = match text.trim().parse() {
        Ok(price) => price,
        Err(_) => {
            return say(ctx, conversation, "Enter a whole number of points.").await;
        }
    };
    if let Err(err) = validate_price(price) {
        return say(
            ctx,
            conversation,
            format!("{} Try again.", render::refusal_text(&err)),
        )
        .await;
    }
    ctx.sessions
        .advance(conversation, WizardState::ProductQuantity, |scratch| {
            scratch.product_price = Some(price);
        })
        .await;
    say(
        ctx,
        conversation,
        "How many units are in stock? Send 0 for unlimited.",
    )
    .await
}

pub async fn create_quantity(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    text: &str,
) -> BotResult<()> {
    if text == render::BTN_CANCEL {
        return exit_to_admin(ctx, conversation, "Product creation cancelled.").await;
    }
    let quantity: i64 = match text.trim().parse() {
        Ok(quantity) => quantity,
        Err(_) => {
            return say(ctx, conversation, "Enter a whole number.").await;
        }
    };
    if let Err(err) = validate_quantity(quantity) {
        return say(
            ctx,
            conversation,
            format!("{} Try again.", render::refusal_text(&err)),
        )
        .await;
    }

    let scratch = ctx.sessions.scratch(conversation).await;
    let (Some(name), Some(description), Some(price)) = (
        scratch.product_name,
        scratch.product_description,
        scratch.product_price,
    ) else {
        ctx.sessions.clear(conversation).await;
        return say_with(ctx, conversation, render::LOST_PLACE, render::admin_menu()).await;
    };

    let (key, product) =
        ProductRepo::create(&ctx.store, &name, &description, price, quantity, sender, Utc::now())
            .await?;
    tracing::info!(%key, name = %product.name, price, quantity, "Product added");

    let stock = match product.remaining() {
        Some(n) => format!("{n} in stock"),
        None => "unlimited stock".to_string(),
    };
    exit_to_admin(
        ctx,
        conversation,
        format!(
            "Product #{key} added: {} - {} pts ({stock}).",
            product.name, product.price
        ),
    )
    .await
}

// ---------------------------------------------------------------------------
// Catalogs
// ---------------------------------------------------------------------------

/// Admin view: every product with its sold counters.
pub async fn catalog(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    let rows = ProductRepo::list(&ctx.store).await?;
    if rows.is_empty() {
        return say(ctx, conversation, "No products yet. Add the first one!").await;
    }
    say(ctx, conversation, render::product_admin_list(&rows)).await
}

/// Member view: available products with buy buttons.
pub async fn browse(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    let Some(user) = require_member(ctx, conversation, sender).await? else {
        return Ok(());
    };
    let rows = ProductRepo::available(&ctx.store).await?;
    if rows.is_empty() {
        return say(ctx, conversation, "The shop is empty for now. Check back later!").await;
    }
    let buttons: Vec<Vec<InlineButton>> = rows
        .iter()
        .map(|(key, product)| {
            vec![InlineButton::new(
                format!("#{key} {} - {} pts", product.name, product.price),
                CallbackAction::BuyProduct(key.clone()).encode(),
            )]
        })
        .collect();
    say_with(
        ctx,
        conversation,
        render::shop_text(user.points, &rows),
        Keyboard::Inline(buttons),
    )
    .await
}

// ---------------------------------------------------------------------------
// Purchase
// ---------------------------------------------------------------------------

/// The member picked a product: pre-check stock and balance, then ask for
/// confirmation.
pub async fn on_buy_picked(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    message: MessageId,
    key: &SeqKey,
) -> BotResult<()> {
    let Some(user) = require_member(ctx, conversation, sender).await? else {
        return Ok(());
    };
    let Some(product) = ProductRepo::find(&ctx.store, key).await? else {
        return edit(
            ctx,
            conversation,
            message,
            format!("Product #{key} is no longer available."),
        )
        .await;
    };
    if !product.is_available() {
        return edit(
            ctx,
            conversation,
            message,
            format!("\"{}\" is sold out.", product.name),
        )
        .await;
    }
    if user.points < product.price {
        return edit(
            ctx,
            conversation,
            message,
            format!(
                "Not enough points for \"{}\": you need {} but have {}.",
                product.name, product.price, user.points
            ),
        )
        .await;
    }

    ctx.sessions
        .enter_with(conversation, WizardState::ConfirmPurchase, |scratch| {
            scratch.selected_product = Some(key.clone());
        })
        .await;
    edit(ctx, conversation, message, format!("Product #{key} \"{}\".", product.name)).await?;
    say_with(
        ctx,
        conversation,
        render::purchase_confirm_text(&product, user.points),
        render::purchase_confirm_keyboard(),
    )
    .await
}

/// The confirmation answer.
pub async fn confirm(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    text: &str,
) -> BotResult<()> {
    match text {
        render::BTN_CONFIRM_BUY => commit(ctx, conversation, sender).await,
        render::BTN_DECLINE_BUY | render::BTN_CANCEL => {
            exit_to_main(ctx, conversation, sender, "Purchase cancelled.").await
        }
        _ => say(ctx, conversation, "Please answer with the buttons.").await,
    }
}

/// The actual purchase: re-validate, debit, count the sale, write the
/// receipt.
///
/// Collections commit independently, so the order is chosen to fail
/// safe: a debit that loses the stock race is refunded; once the sale is
/// counted the remaining steps only add records.
async fn commit(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    let Some(key) = ctx.sessions.scratch(conversation).await.selected_product else {
        ctx.sessions.clear(conversation).await;
        return say(ctx, conversation, render::LOST_PLACE).await;
    };
    let Some(user) = require_member(ctx, conversation, sender).await? else {
        ctx.sessions.clear(conversation).await;
        return Ok(());
    };
    let Some(product) = ProductRepo::find(&ctx.store, &key).await? else {
        return exit_to_main(
            ctx,
            conversation,
            sender,
            "That product was removed. You were not charged.",
        )
        .await;
    };
    if !product.is_available() {
        return exit_to_main(
            ctx,
            conversation,
            sender,
            format!(
                "\"{}\" sold out while you decided. You were not charged.",
                product.name
            ),
        )
        .await;
    }

    // Debit first. The balance check runs inside the users write lock.
    let user_after = match UserRepo::debit(&ctx.store, user.platform_id, product.price).await {
        Ok(user_after) => user_after,
        Err(RepoError::Core(err)) => {
            ctx.sessions.clear(conversation).await;
            return say_with(
                ctx,
                conversation,
                format!("{} You were not charged.", render::refusal_text(&err)),
                render::main_menu(ctx.config.is_admin(sender)),
            )
            .await;
        }
        Err(err) => return Err(err.into()),
    };

    // Count the sale. Losing the race here refunds the debit.
    let product_after = match ProductRepo::record_sale(&ctx.store, &key).await {
        Ok(product_after) => product_after,
        Err(RepoError::Core(CoreError::OutOfStock(_) | CoreError::NotFound { .. })) => {
            match UserRepo::refund(&ctx.store, user.platform_id, product.price).await {
                Ok(_) => {
                    tracing::warn!(
                        %key,
                        user_id = user.platform_id,
                        "Purchase lost the stock race; points returned"
                    );
                    return exit_to_main(
                        ctx,
                        conversation,
                        sender,
                        "Someone beat you to the last unit. Your points were returned.",
                    )
                    .await;
                }
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        %key,
                        user_id = user.platform_id,
                        amount = product.price,
                        "Failed to refund a debited purchase"
                    );
                    return Err(err.into());
                }
            }
        }
        Err(err) => return Err(err.into()),
    };

    let order = Order::completed(&user_after, key.clone(), &product_after, Utc::now());
    let order_key = OrderRepo::create(&ctx.store, order).await?;
    tracing::info!(
        %order_key,
        user_id = user.platform_id,
        product = %product_after.name,
        price = product_after.price,
        "Order completed"
    );

    ctx.event_bus.publish(
        BotEvent::new(ORDER_COMPLETED)
            .with_source("order", order_key.clone())
            .with_actor(user.platform_id),
    );

    exit_to_main(
        ctx,
        conversation,
        sender,
        format!(
            "Order #{order_key} placed! \"{}\" is yours for {} pts. Your balance: {} pts.",
            product_after.name, product_after.price, user_after.points
        ),
    )
    .await
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

pub async fn delete_start(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    let rows = ProductRepo::list(&ctx.store).await?;
    if rows.is_empty() {
        return say(ctx, conversation, "No products to delete.").await;
    }
    let mut buttons: Vec<Vec<InlineButton>> = rows
        .iter()
        .map(|(key, product)| {
            vec![InlineButton::new(
                format!("#{key} {} ({} pts)", product.name, product.price),
                CallbackAction::DeleteProduct(key.clone()).encode(),
            )]
        })
        .collect();
    buttons.push(vec![InlineButton::new(
        render::BTN_CANCEL,
        CallbackAction::Cancel.encode(),
    )]);
    say_with(
        ctx,
        conversation,
        "Pick a product to delete:",
        Keyboard::Inline(buttons),
    )
    .await
}

pub async fn on_delete_picked(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    message: MessageId,
    key: &SeqKey,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    let Some(product) = ProductRepo::find(&ctx.store, key).await? else {
        return edit(ctx, conversation, message, format!("Product #{key} is already gone.")).await;
    };
    let buttons = vec![vec![
        InlineButton::new(
            "Yes, delete it",
            CallbackAction::ConfirmDeleteProduct(key.clone()).encode(),
        ),
        InlineButton::new(render::BTN_CANCEL, CallbackAction::Cancel.encode()),
    ]];
    edit_with(
        ctx,
        conversation,
        message,
        format!(
            "Delete product #{key} \"{}\"? Past orders keep their receipts.",
            product.name
        ),
        Keyboard::Inline(buttons),
    )
    .await
}

pub async fn on_delete_confirmed(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    message: MessageId,
    key: &SeqKey,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    match ProductRepo::delete(&ctx.store, key).await {
        Ok(product) => {
            tracing::info!(%key, name = %product.name, "Product deleted");
            edit(
                ctx,
                conversation,
                message,
                format!("Product #{key} \"{}\" deleted.", product.name),
            )
            .await
        }
        Err(RepoError::Core(CoreError::NotFound { .. })) => {
            edit(ctx, conversation, message, format!("Product #{key} is already gone.")).await
        }
        Err(err) => Err(err.into()),
    }
}
