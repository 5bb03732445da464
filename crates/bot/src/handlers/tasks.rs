//! Task workflows: the creation wizard, catalog and deletion, the
//! submission flow, and review.

use chrono::Utc;

use kudos_core::availability::{self, TaskAvailability};
use kudos_core::submission::{
    Attachment, AttachmentKind, ContentKind, Submission, SubmissionDraft, SubmissionStatus,
};
use kudos_core::task::{validate_text_field, TaskKind};
use kudos_core::user::validate_points_amount;
use kudos_core::{CoreError, PlatformId, SeqKey};
use kudos_events::{BotEvent, SUBMISSION_APPROVED, SUBMISSION_RECEIVED, SUBMISSION_REJECTED};
use kudos_store::repositories::{SubmissionRepo, TaskRepo, UserRepo};
use kudos_store::RepoError;

use crate::callback::CallbackAction;
use crate::error::BotResult;
use crate::render;
use crate::session::WizardState;
use crate::state::BotContext;
use crate::transport::{ConversationId, InlineButton, Keyboard, MessageId, OutgoingAttachment};

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
    ctx.sessions.enter(conversation, WizardState::TaskTitle).await;
    say_with(
        ctx,
        conversation,
        "Creating a task. What is the title?",
        render::cancel_keyboard(),
    )
    .await
}

pub async fn create_title(
    ctx: &BotContext,
    conversation: ConversationId,
    text: &str,
) -> BotResult<()> {
    if text == render::BTN_CANCEL {
        return exit_to_admin(ctx, conversation, "Task creation cancelled.").await;
    }
    let title = match validate_text_field("title", text) {
        Ok(title) => title,
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
        .advance(conversation, WizardState::TaskDescription, |scratch| {
            scratch.task_title = Some(title);
        })
        .await;
    say(ctx, conversation, "Got it. Now the description:").await
}

pub async fn create_description(
    ctx: &BotContext,
    conversation: ConversationId,
    text: &str,
) -> BotResult<()> {
    if text == render::BTN_CANCEL {
        return exit_to_admin(ctx, conversation, "Task creation cancelled.").await;
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
        .advance(conversation, WizardState::TaskPoints, |scratch| {
            scratch.task_description = Some(description);
        })
        .await;
    say(ctx, conversation, "How many points is it worth?").await
}

pub async fn create_points(
    ctx: &BotContext,
    conversation: ConversationId,
    text: &str,
) -> BotResult<()> {
    if text == render::BTN_CANCEL {
        return exit_to_admin(ctx, conversation, "Task creation cancelled.").await;
    }
    let points: i64 = match text.trim().parse() {
        Ok(points) => points,
        Err(_) => {
            return say(ctx, conversation, "Enter a whole number of points.").await;
        }
    };
    if let Err(err) = validate_points_amount(points) {
        return say(
            ctx,
            conversation,
            format!("{} Try again.", render::refusal_text(&err)),
        )
        .await;
    }
    ctx.sessions
        .advance(conversation, WizardState::TaskKind, |scratch| {
            scratch.task_points = Some(points);
        })
        .await;
    say_with(
        ctx,
        conversation,
        "One-time tasks can be completed once per member; daily tasks once \
         every 24 hours. Which kind is this?",
        render::task_kind_keyboard(),
    )
    .await
}

pub async fn create_kind(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    text: &str,
) -> BotResult<()> {
    if text == render::BTN_CANCEL {
        return exit_to_admin(ctx, conversation, "Task creation cancelled.").await;
    }
    let kind = match text {
        render::BTN_KIND_ONCE => TaskKind::OneTime,
        render::BTN_KIND_DAILY => TaskKind::Daily,
        _ => {
            return say_with(
                ctx,
                conversation,
                "Please pick the kind with the buttons.",
                render::task_kind_keyboard(),
            )
            .await;
        }
    };

    let scratch = ctx.sessions.scratch(conversation).await;
    let (Some(title), Some(description), Some(points)) =
        (scratch.task_title, scratch.task_description, scratch.task_points)
    else {
        ctx.sessions.clear(conversation).await;
        return say_with(ctx, conversation, render::LOST_PLACE, render::admin_menu()).await;
    };

    let (key, task) =
        TaskRepo::create(&ctx.store, &title, &description, points, kind, sender, Utc::now())
            .await?;
    tracing::info!(%key, title = %task.title, kind = task.kind.as_str(), points, "Task created");
    exit_to_admin(
        ctx,
        conversation,
        format!(
            "Task #{key} created: {} ({}, {} pts).",
            task.title,
            task.kind.label(),
            task.points
        ),
    )
    .await
}

// ---------------------------------------------------------------------------
// Catalog and deletion
// ---------------------------------------------------------------------------

pub async fn catalog(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    let rows = TaskRepo::list(&ctx.store).await?;
    if rows.is_empty() {
        return say(ctx, conversation, "No tasks yet. Create the first one!").await;
    }
    say(ctx, conversation, render::task_admin_list(&rows)).await
}

pub async fn delete_start(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    let rows = TaskRepo::list(&ctx.store).await?;
    if rows.is_empty() {
        return say(ctx, conversation, "No tasks to delete.").await;
    }
    let mut buttons: Vec<Vec<InlineButton>> = rows
        .iter()
        .map(|(key, task)| {
            vec![InlineButton::new(
                format!("#{key} {} ({} pts)", task.title, task.points),
                CallbackAction::DeleteTask(key.clone()).encode(),
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
        "Pick a task to delete:",
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
    let Some(task) = TaskRepo::find(&ctx.store, key).await? else {
        return edit(ctx, conversation, message, format!("Task #{key} is already gone.")).await;
    };
    let cascade_note = if ctx.config.task_delete_cascade {
        "Its submissions will be removed too."
    } else {
        "Its submissions will be kept."
    };
    let buttons = vec![vec![
        InlineButton::new(
            "Yes, delete it",
            CallbackAction::ConfirmDeleteTask(key.clone()).encode(),
        ),
        InlineButton::new(render::BTN_CANCEL, CallbackAction::Cancel.encode()),
    ]];
    edit_with(
        ctx,
        conversation,
        message,
        format!("Delete task #{key} \"{}\"? {cascade_note}", task.title),
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
    match TaskRepo::delete(&ctx.store, key, ctx.config.task_delete_cascade).await {
        Ok(deletion) => {
            tracing::info!(
                %key,
                removed_submissions = deletion.removed_submissions,
                "Task deleted"
            );
            let mut text = format!("Task #{key} \"{}\" deleted.", deletion.task.title);
            if deletion.removed_submissions > 0 {
                text.push_str(&format!(
                    " Removed {} related submission(s).",
                    deletion.removed_submissions
                ));
            }
            edit(ctx, conversation, message, text).await
        }
        Err(RepoError::Core(CoreError::NotFound { .. })) => {
            edit(ctx, conversation, message, format!("Task #{key} is already gone.")).await
        }
        Err(err) => Err(err.into()),
    }
}

// ---------------------------------------------------------------------------
// Submission flow
// ---------------------------------------------------------------------------

/// "Submit task": list every task with availability, buttons for the
/// available ones.
pub async fn submit_entry(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    let Some(user) = require_member(ctx, conversation, sender).await? else {
        return Ok(());
    };
    let tasks = TaskRepo::list(&ctx.store).await?;
    if tasks.is_empty() {
        return say(ctx, conversation, "There are no tasks yet. Check back later!").await;
    }

    let now = Utc::now();
    let mut rows = Vec::with_capacity(tasks.len());
    for (key, task) in tasks {
        let approved = SubmissionRepo::approved_times(&ctx.store, user.platform_id, &key).await?;
        let state = availability::check(task.kind, &approved, now);
        rows.push((key, task, state));
    }

    let buttons: Vec<Vec<InlineButton>> = rows
        .iter()
        .filter(|(_, _, state)| state.is_available())
        .map(|(key, task, _)| {
            vec![InlineButton::new(
                format!("#{key} {} ({} pts)", task.title, task.points),
                CallbackAction::SubmitTask(key.clone()).encode(),
            )]
        })
        .collect();

    let text = render::submit_task_list(&rows);
    if buttons.is_empty() {
        return say(
            ctx,
            conversation,
            format!("{text}\n\nNothing is available right now."),
        )
        .await;
    }
    say_with(ctx, conversation, text, Keyboard::Inline(buttons)).await
}

/// The member picked a task; re-check availability and start collecting.
pub async fn on_task_picked(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    message: MessageId,
    key: &SeqKey,
) -> BotResult<()> {
    let Some(user) = require_member(ctx, conversation, sender).await? else {
        return Ok(());
    };
    let Some(task) = TaskRepo::find(&ctx.store, key).await? else {
        return edit(ctx, conversation, message, format!("Task #{key} no longer exists.")).await;
    };

    // The picker list may be stale; the check runs again here.
    let approved = SubmissionRepo::approved_times(&ctx.store, user.platform_id, key).await?;
    match availability::check(task.kind, &approved, Utc::now()) {
        TaskAvailability::AlreadyCompleted => {
            edit(
                ctx,
                conversation,
                message,
                format!("You have already completed \"{}\".", task.title),
            )
            .await
        }
        TaskAvailability::CoolingDown { remaining } => {
            edit(
                ctx,
                conversation,
                message,
                format!(
                    "\"{}\" is available again in {}.",
                    task.title,
                    render::remaining_hours(remaining)
                ),
            )
            .await
        }
        TaskAvailability::Available => {
            ctx.sessions
                .enter_with(conversation, WizardState::CollectingContent, |scratch| {
                    scratch.selected_task = Some(key.clone());
                    scratch.draft = Some(SubmissionDraft::default());
                })
                .await;
            edit(
                ctx,
                conversation,
                message,
                format!("Task #{key} \"{}\" selected.", task.title),
            )
            .await?;
            say_with(
                ctx,
                conversation,
                "Send your proof: text, photos, documents, or videos. You can \
                 send several messages, then press Finish submission.",
                render::submission_content_keyboard(),
            )
            .await
        }
    }
}

/// Text while collecting: a control button or another draft segment.
pub async fn content_text(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    text: &str,
) -> BotResult<()> {
    match text {
        render::BTN_FINISH => finish(ctx, conversation, sender).await,
        render::BTN_CANCEL => exit_to_main(ctx, conversation, sender, "Submission cancelled.").await,
        _ => {
            ctx.sessions
                .advance(conversation, WizardState::CollectingContent, |scratch| {
                    scratch
                        .draft
                        .get_or_insert_with(SubmissionDraft::default)
                        .push_text(text);
                })
                .await;
            say(
                ctx,
                conversation,
                "Added. Send more or press Finish submission.",
            )
            .await
        }
    }
}

/// Media while collecting: append an attachment to the draft.
pub async fn content_media(
    ctx: &BotContext,
    conversation: ConversationId,
    kind: AttachmentKind,
    file_ref: String,
    file_name: Option<String>,
    caption: Option<String>,
) -> BotResult<()> {
    let mut count = 0;
    ctx.sessions
        .advance(conversation, WizardState::CollectingContent, |scratch| {
            let draft = scratch.draft.get_or_insert_with(SubmissionDraft::default);
            draft.push_attachment(Attachment {
                kind,
                file_ref,
                file_name,
                caption,
            });
            count = draft.attachment_count();
        })
        .await;
    say(
        ctx,
        conversation,
        format!("Attachment added ({count} so far). Send more or press Finish submission."),
    )
    .await
}

async fn finish(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    let scratch = ctx.sessions.scratch(conversation).await;
    let (Some(task_id), Some(draft)) = (scratch.selected_task, scratch.draft) else {
        ctx.sessions.clear(conversation).await;
        return say(ctx, conversation, render::LOST_PLACE).await;
    };
    if draft.is_empty() {
        return say(
            ctx,
            conversation,
            "Your submission is empty. Send some text or attachments first.",
        )
        .await;
    }
    let Some(user) = require_member(ctx, conversation, sender).await? else {
        ctx.sessions.clear(conversation).await;
        return Ok(());
    };
    let Some(task) = TaskRepo::find(&ctx.store, &task_id).await? else {
        return exit_to_main(
            ctx,
            conversation,
            sender,
            "That task was removed before you finished. Nothing was submitted.",
        )
        .await;
    };

    let (text, attachments) = draft.into_parts();
    let submission = Submission {
        user_id: user.platform_id,
        user_name: user.full_name(),
        user_display_id: user.display_id,
        task_id: task_id.clone(),
        task_title: task.title.clone(),
        task_description: task.description.clone(),
        task_points: task.points,
        task_kind: task.kind,
        content_kind: ContentKind::derive(&attachments),
        text,
        attachments,
        submitted_at: Utc::now(),
        status: SubmissionStatus::Pending,
    };
    let key = SubmissionRepo::create(&ctx.store, submission).await?;
    tracing::info!(%key, user_id = user.platform_id, task_id = %task_id, "Submission received");

    ctx.event_bus.publish(
        BotEvent::new(SUBMISSION_RECEIVED)
            .with_source("submission", key.clone())
            .with_actor(user.platform_id),
    );

    exit_to_main(
        ctx,
        conversation,
        sender,
        format!("Submission #{key} sent for review. You'll hear back once an admin decides."),
    )
    .await
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

pub async fn review_entry(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    let pending = SubmissionRepo::pending(&ctx.store).await?;
    if pending.is_empty() {
        return say(ctx, conversation, "Nothing pending review.").await;
    }
    let buttons: Vec<Vec<InlineButton>> = pending
        .iter()
        .map(|(key, submission)| {
            vec![InlineButton::new(
                format!("#{key} {} - {}", submission.user_name, submission.task_title),
                CallbackAction::ReviewSubmission(key.clone()).encode(),
            )]
        })
        .collect();
    say_with(
        ctx,
        conversation,
        format!("Pending submissions ({}):", pending.len()),
        Keyboard::Inline(buttons),
    )
    .await
}

/// Open one submission: forward its attachments, then the details with
/// the approve / reject buttons.
pub async fn on_review_picked(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    message: MessageId,
    key: &SeqKey,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    let Some(submission) = SubmissionRepo::find(&ctx.store, key).await? else {
        return edit(
            ctx,
            conversation,
            message,
            format!("Submission #{key} no longer exists."),
        )
        .await;
    };
    if submission.status != SubmissionStatus::Pending {
        return edit(
            ctx,
            conversation,
            message,
            format!("Submission #{key} was already {}.", submission.status.as_str()),
        )
        .await;
    }

    edit(ctx, conversation, message, format!("Reviewing submission #{key}.")).await?;

    for attachment in &submission.attachments {
        let outgoing = OutgoingAttachment {
            kind: attachment.kind,
            file_ref: attachment.file_ref.clone(),
            file_name: attachment.file_name.clone(),
            caption: attachment.caption.clone(),
        };
        if let Err(err) = ctx.transport.send_attachment(conversation, outgoing).await {
            tracing::warn!(error = %err, %key, "Failed to forward an attachment for review");
        }
    }

    let buttons = vec![vec![
        InlineButton::new("Approve", CallbackAction::ApproveSubmission(key.clone()).encode()),
        InlineButton::new("Reject", CallbackAction::RejectSubmission(key.clone()).encode()),
    ]];
    say_with(
        ctx,
        conversation,
        render::submission_details(key, &submission),
        Keyboard::Inline(buttons),
    )
    .await
}

/// Approve or reject. The decision is one-shot; a second press resolves
/// to a conflict message instead of a double credit.
pub async fn on_decision(
    ctx: &BotContext,
    conversation: ConversationId,
    sender: PlatformId,
    message: MessageId,
    key: &SeqKey,
    decision: SubmissionStatus,
) -> BotResult<()> {
    if !require_admin(ctx, conversation, sender).await? {
        return Ok(());
    }
    let submission = match SubmissionRepo::decide(&ctx.store, key, decision).await {
        Ok(submission) => submission,
        Err(RepoError::Core(CoreError::Conflict(msg))) => {
            return edit(ctx, conversation, message, msg).await;
        }
        Err(RepoError::Core(CoreError::NotFound { .. })) => {
            return edit(
                ctx,
                conversation,
                message,
                format!("Submission #{key} no longer exists."),
            )
            .await;
        }
        Err(err) => return Err(err.into()),
    };

    if decision == SubmissionStatus::Approved {
        match UserRepo::credit_earned(&ctx.store, submission.user_id, submission.task_points).await
        {
            Ok(member) => {
                tracing::info!(
                    %key,
                    user_id = submission.user_id,
                    points = submission.task_points,
                    "Submission approved"
                );
                ctx.event_bus.publish(
                    BotEvent::new(SUBMISSION_APPROVED)
                        .with_source("submission", key.clone())
                        .with_actor(sender)
                        .with_payload(serde_json::json!({
                            "points": submission.task_points,
                            "balance": member.points,
                        })),
                );
                edit(
                    ctx,
                    conversation,
                    message,
                    format!(
                        "Submission #{key} approved. {} earned {} pts.",
                        submission.user_name, submission.task_points
                    ),
                )
                .await
            }
            Err(RepoError::Core(CoreError::NotFound { .. })) => {
                tracing::warn!(
                    %key,
                    user_id = submission.user_id,
                    "Approved submission for a missing member; no points credited"
                );
                edit(
                    ctx,
                    conversation,
                    message,
                    format!(
                        "Submission #{key} approved, but the member no longer exists. \
                         No points were credited."
                    ),
                )
                .await
            }
            Err(err) => Err(err.into()),
        }
    } else {
        tracing::info!(%key, user_id = submission.user_id, "Submission rejected");
        ctx.event_bus.publish(
            BotEvent::new(SUBMISSION_REJECTED)
                .with_source("submission", key.clone())
                .with_actor(sender),
        );
        edit(ctx, conversation, message, format!("Submission #{key} rejected.")).await
    }
}
