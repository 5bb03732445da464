//! End-to-end scenarios driven through the dispatcher: registration,
//! the task and review cycle, shop purchases, and the admin wizards.
//!
//! Every test talks to the bot exactly like a platform binding would,
//! by handing updates to the dispatcher, and asserts on the recorded
//! outbound traffic plus the store contents.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{register, send_callback, send_command, send_media, send_text, test_context};

use kudos_bot::callback::CallbackAction;
use kudos_bot::notifications::NotificationRouter;
use kudos_bot::render;
use kudos_bot::session::WizardState;
use kudos_core::submission::AttachmentKind;
use kudos_core::PlatformId;
use kudos_store::repositories::{OrderRepo, ProductRepo, UserRepo};
use kudos_store::StoreError;

const ADMIN: PlatformId = 9_000;
const ALICE: PlatformId = 100;
const BOB: PlatformId = 200;
const CARA: PlatformId = 300;

// ---------------------------------------------------------------------------
// Wizard drivers
// ---------------------------------------------------------------------------

/// Drive the task creation wizard as the admin.
async fn create_task(ctx: &kudos_bot::BotContext, title: &str, points: &str, kind_button: &str) {
    send_text(ctx, ADMIN, render::BTN_CREATE_TASK).await;
    send_text(ctx, ADMIN, title).await;
    send_text(ctx, ADMIN, "Do it and report back").await;
    send_text(ctx, ADMIN, points).await;
    send_text(ctx, ADMIN, kind_button).await;
}

/// Drive the product creation wizard as the admin.
async fn create_product(ctx: &kudos_bot::BotContext, name: &str, price: &str, quantity: &str) {
    send_text(ctx, ADMIN, render::BTN_ADD_PRODUCT).await;
    send_text(ctx, ADMIN, name).await;
    send_text(ctx, ADMIN, "A reward from the shop").await;
    send_text(ctx, ADMIN, price).await;
    send_text(ctx, ADMIN, quantity).await;
}

/// Drive the grant wizard as the admin.
async fn grant_points(ctx: &kudos_bot::BotContext, target: PlatformId, amount: &str) {
    send_text(ctx, ADMIN, render::BTN_GRANT_POINTS).await;
    send_callback(ctx, ADMIN, &CallbackAction::GrantPointsTo(target).encode()).await;
    send_text(ctx, ADMIN, amount).await;
}

/// Submit text work for a task and finish the draft.
async fn submit_text_work(ctx: &kudos_bot::BotContext, member: PlatformId, task_key: &str) {
    send_text(ctx, member, render::BTN_SUBMIT_TASK).await;
    send_callback(
        ctx,
        member,
        &CallbackAction::SubmitTask(task_key.to_string()).encode(),
    )
    .await;
    send_text(ctx, member, "Done, here is the proof").await;
    send_text(ctx, member, render::BTN_FINISH).await;
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Members get display ids 1, 2, 3 in registration order, a too-short
/// name re-prompts without losing the wizard, and a second /start does
/// not register twice.
#[tokio::test]
async fn registration_assigns_sequential_display_ids() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, transport) = test_context(dir.path(), vec![ADMIN]);

    register(&ctx, ALICE, "Alice", "Anderson").await;

    // A one-character first name is refused and the question repeats.
    send_command(&ctx, BOB, "start").await;
    send_text(&ctx, BOB, "B").await;
    assert!(transport
        .last_text_for(BOB)
        .await
        .contains("must be between"));
    send_text(&ctx, BOB, "Bob").await;
    send_text(&ctx, BOB, "Baker").await;

    register(&ctx, CARA, "Cara", "Carver").await;

    let alice = UserRepo::find(&ctx.store, ALICE).await.unwrap().unwrap();
    let bob = UserRepo::find(&ctx.store, BOB).await.unwrap().unwrap();
    let cara = UserRepo::find(&ctx.store, CARA).await.unwrap().unwrap();
    assert_eq!(alice.display_id, 1);
    assert_eq!(bob.display_id, 2);
    assert_eq!(cara.display_id, 3);
    assert_eq!(alice.points, 0);

    // A repeated /start shows the profile instead of re-registering.
    send_command(&ctx, ALICE, "start").await;
    assert!(transport.last_text_for(ALICE).await.contains("Welcome back"));
    assert_eq!(ctx.store.users().len().await, 3);
}

// ---------------------------------------------------------------------------
// Task and review cycle
// ---------------------------------------------------------------------------

/// A daily task pays into both ledgers on approval, refuses a repeat
/// inside 24 hours, and accepts one again after the window has passed.
#[tokio::test]
async fn daily_task_cycle_credits_both_ledgers() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, transport) = test_context(dir.path(), vec![ADMIN]);

    register(&ctx, ALICE, "Alice", "Anderson").await;
    create_task(&ctx, "Morning workout", "30", render::BTN_KIND_DAILY).await;

    submit_text_work(&ctx, ALICE, "1").await;
    assert_eq!(ctx.store.submissions().len().await, 1);

    // The admin opens the submission, then approves it.
    send_text(&ctx, ADMIN, render::BTN_REVIEW).await;
    send_callback(
        &ctx,
        ADMIN,
        &CallbackAction::ReviewSubmission("1".to_string()).encode(),
    )
    .await;
    assert!(transport
        .last_text_for(ADMIN)
        .await
        .contains("Morning workout"));
    send_callback(
        &ctx,
        ADMIN,
        &CallbackAction::ApproveSubmission("1".to_string()).encode(),
    )
    .await;

    let alice = UserRepo::find(&ctx.store, ALICE).await.unwrap().unwrap();
    assert_eq!(alice.points, 30);
    assert_eq!(alice.total_earned, 30);

    // Too soon: the picker refuses even a direct button press.
    send_callback(
        &ctx,
        ALICE,
        &CallbackAction::SubmitTask("1".to_string()).encode(),
    )
    .await;
    assert!(transport
        .last_text_for(ALICE)
        .await
        .contains("available again in"));

    // Age the approval past the 24-hour window.
    ctx.store
        .submissions()
        .mutate(|records| {
            for submission in records.values_mut() {
                submission.submitted_at -= chrono::Duration::hours(25);
            }
            Ok::<_, StoreError>(())
        })
        .await
        .unwrap();

    submit_text_work(&ctx, ALICE, "1").await;
    send_callback(
        &ctx,
        ADMIN,
        &CallbackAction::ApproveSubmission("2".to_string()).encode(),
    )
    .await;

    let alice = UserRepo::find(&ctx.store, ALICE).await.unwrap().unwrap();
    assert_eq!(alice.points, 60);
    assert_eq!(alice.total_earned, 60);
}

/// A decided submission cannot be decided again; the points land once.
#[tokio::test]
async fn review_is_one_shot() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, transport) = test_context(dir.path(), vec![ADMIN]);

    register(&ctx, ALICE, "Alice", "Anderson").await;
    create_task(&ctx, "Write a guide", "40", render::BTN_KIND_ONCE).await;
    submit_text_work(&ctx, ALICE, "1").await;

    let approve = CallbackAction::ApproveSubmission("1".to_string()).encode();
    send_callback(&ctx, ADMIN, &approve).await;
    send_callback(&ctx, ADMIN, &approve).await;
    send_callback(
        &ctx,
        ADMIN,
        &CallbackAction::RejectSubmission("1".to_string()).encode(),
    )
    .await;
    assert!(transport.last_text_for(ADMIN).await.contains("already"));

    let alice = UserRepo::find(&ctx.store, ALICE).await.unwrap().unwrap();
    assert_eq!(alice.points, 40);
    assert_eq!(alice.total_earned, 40);
}

// ---------------------------------------------------------------------------
// Shop
// ---------------------------------------------------------------------------

/// A two-unit product sells exactly twice; the third attempt is refused
/// and charges nothing.
#[tokio::test]
async fn limited_product_sells_out() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, transport) = test_context(dir.path(), vec![ADMIN]);

    register(&ctx, ALICE, "Alice", "Anderson").await;
    register(&ctx, BOB, "Bob", "Baker").await;
    create_product(&ctx, "Team mug", "25", "2").await;
    grant_points(&ctx, ALICE, "100").await;
    grant_points(&ctx, BOB, "100").await;

    let buy = CallbackAction::BuyProduct("1".to_string()).encode();
    for _ in 0..2 {
        send_callback(&ctx, ALICE, &buy).await;
        send_text(&ctx, ALICE, render::BTN_CONFIRM_BUY).await;
    }

    // Stock is gone. Bob's stale button is refused at pick time.
    send_callback(&ctx, BOB, &buy).await;
    assert!(transport.last_text_for(BOB).await.contains("sold out"));

    let product = ProductRepo::find(&ctx.store, "1").await.unwrap().unwrap();
    assert_eq!(product.sold, 2);
    assert!(!product.is_available());
    assert_eq!(OrderRepo::list(&ctx.store).await.unwrap().len(), 2);

    let alice = UserRepo::find(&ctx.store, ALICE).await.unwrap().unwrap();
    let bob = UserRepo::find(&ctx.store, BOB).await.unwrap().unwrap();
    assert_eq!(alice.points, 50);
    assert_eq!(bob.points, 100);
    // Purchases never touch the lifetime ledger.
    assert_eq!(alice.total_earned, 100);
}

/// A balance exactly equal to the price is enough; one point less is not.
#[tokio::test]
async fn purchase_balance_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, transport) = test_context(dir.path(), vec![ADMIN]);

    register(&ctx, ALICE, "Alice", "Anderson").await;
    create_product(&ctx, "Sticker pack", "50", "0").await;
    grant_points(&ctx, ALICE, "49").await;

    let buy = CallbackAction::BuyProduct("1".to_string()).encode();
    send_callback(&ctx, ALICE, &buy).await;
    assert!(transport
        .last_text_for(ALICE)
        .await
        .contains("Not enough points"));
    assert!(OrderRepo::list(&ctx.store).await.unwrap().is_empty());

    grant_points(&ctx, ALICE, "1").await;
    send_callback(&ctx, ALICE, &buy).await;
    send_text(&ctx, ALICE, render::BTN_CONFIRM_BUY).await;

    let alice = UserRepo::find(&ctx.store, ALICE).await.unwrap().unwrap();
    assert_eq!(alice.points, 0);
    assert_eq!(OrderRepo::list(&ctx.store).await.unwrap().len(), 1);
    assert!(transport.last_text_for(ALICE).await.contains("Order #1"));
}

// ---------------------------------------------------------------------------
// Admin panel
// ---------------------------------------------------------------------------

/// The destructive reset demands the exact phrase and then empties every
/// collection; display ids restart from 1 afterwards.
#[tokio::test]
async fn reset_requires_exact_phrase() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, transport) = test_context(dir.path(), vec![ADMIN]);

    register(&ctx, ALICE, "Alice", "Anderson").await;
    create_task(&ctx, "Clean the hall", "10", render::BTN_KIND_ONCE).await;

    send_text(&ctx, ADMIN, render::BTN_RESET).await;
    assert!(transport
        .last_text_for(ADMIN)
        .await
        .contains(render::RESET_CONFIRM_PHRASE));

    // Case matters; the wizard stays armed after a mismatch.
    send_text(&ctx, ADMIN, "confirm reset").await;
    assert!(transport.last_text_for(ADMIN).await.contains("did not match"));
    assert_eq!(
        ctx.sessions.state(ADMIN).await,
        Some(WizardState::ConfirmReset)
    );

    send_text(&ctx, ADMIN, render::RESET_CONFIRM_PHRASE).await;
    assert!(ctx.store.users().is_empty().await);
    assert!(ctx.store.tasks().is_empty().await);
    assert!(ctx.store.submissions().is_empty().await);
    assert!(ctx.store.products().is_empty().await);
    assert!(ctx.store.orders().is_empty().await);

    register(&ctx, BOB, "Bob", "Baker").await;
    let bob = UserRepo::find(&ctx.store, BOB).await.unwrap().unwrap();
    assert_eq!(bob.display_id, 1);
}

/// Admin surfaces refuse non-admins and never open a wizard for them.
#[tokio::test]
async fn admin_surfaces_refuse_members() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, transport) = test_context(dir.path(), vec![ADMIN]);

    register(&ctx, ALICE, "Alice", "Anderson").await;

    send_text(&ctx, ALICE, render::BTN_CREATE_TASK).await;
    assert_eq!(transport.last_text_for(ALICE).await, render::NO_ACCESS);
    assert_eq!(ctx.sessions.state(ALICE).await, None);

    send_callback(&ctx, ALICE, &CallbackAction::GrantPointsTo(ALICE).encode()).await;
    assert_eq!(transport.last_text_for(ALICE).await, render::NO_ACCESS);
    assert_eq!(ctx.sessions.state(ALICE).await, None);

    let alice = UserRepo::find(&ctx.store, ALICE).await.unwrap().unwrap();
    assert_eq!(alice.points, 0);
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// A media submission reaches every admin through the router: the
/// attachments are forwarded first, then the summary text.
#[tokio::test]
async fn router_forwards_submissions_to_admins() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, transport) = test_context(dir.path(), vec![ADMIN]);

    let router = NotificationRouter::new(
        Arc::clone(&ctx.store),
        Arc::clone(&ctx.transport),
        vec![ADMIN],
    );
    let router_handle = tokio::spawn(router.run(ctx.event_bus.subscribe()));

    register(&ctx, ALICE, "Alice", "Anderson").await;
    create_task(&ctx, "Photo challenge", "15", render::BTN_KIND_ONCE).await;

    send_text(&ctx, ALICE, render::BTN_SUBMIT_TASK).await;
    send_callback(
        &ctx,
        ALICE,
        &CallbackAction::SubmitTask("1".to_string()).encode(),
    )
    .await;
    send_media(&ctx, ALICE, AttachmentKind::Photo, "file-abc").await;
    send_text(&ctx, ALICE, render::BTN_FINISH).await;

    // The router runs on its own task; wait for the delivery.
    for _ in 0..100 {
        if transport.attachment_count_for(ADMIN).await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(transport.attachment_count_for(ADMIN).await, 1);
    let admin_texts = transport.texts_for(ADMIN).await;
    assert!(admin_texts
        .iter()
        .any(|text| text.contains("New submission #1")));

    // Dropping the context drops the bus sender, which stops the router.
    drop(ctx);
    let _ = tokio::time::timeout(Duration::from_secs(1), router_handle).await;
}
