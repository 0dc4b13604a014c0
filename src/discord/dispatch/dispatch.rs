// Framework hooks: which invocations run, and what users see when one fails.

use crate::config::DebugSettings;
use crate::core::grading::GradingError;
use crate::core::school::SchoolError;
use crate::discord::guild_roles::guild_permissions;
use crate::discord::{Context, Data, Error};

pub const GENERIC_FAILURE: &str = "Please check the command and/or its arguments.";

/// Skip commands in channels where the bot could not reply anyway.
///
/// Anything missing from the cache is let through; Discord will reject the
/// reply itself if it really is not allowed.
pub async fn bot_can_reply(ctx: Context<'_>) -> Result<bool, Error> {
    let bot_id = ctx.framework().bot_id;
    let channel_id = ctx.channel_id();

    let allowed = match ctx.guild() {
        Some(guild) => match (guild.channels.get(&channel_id), guild.members.get(&bot_id)) {
            (Some(channel), Some(member)) => {
                guild_permissions(&guild, member).administrator()
                    || guild.user_permissions_in(channel, member).send_messages()
            }
            _ => true,
        },
        None => true,
    };

    if !allowed {
        tracing::debug!(
            channel_id = channel_id.get(),
            command = %ctx.command().qualified_name,
            "Ignoring command in a channel the bot cannot write to"
        );
    }
    Ok(allowed)
}

/// Reply to failed invocations; everything else goes to poise's defaults.
pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(
                command = %ctx.command().qualified_name,
                user_id = ctx.author().id.get(),
                "Command failed: {}",
                error
            );
            reply_with_failure(ctx, &error.to_string()).await;
        }
        poise::FrameworkError::ArgumentParse {
            error, input, ctx, ..
        } => {
            tracing::warn!(
                command = %ctx.command().qualified_name,
                input = input.as_deref().unwrap_or(""),
                "Could not parse arguments: {}",
                error
            );
            reply_with_failure(ctx, &error.to_string()).await;
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Messages sent for a failed invocation, in order.
fn failure_replies(debug: &DebugSettings, author_id: u64, reason: &str) -> Vec<String> {
    let mut replies = vec![GENERIC_FAILURE.to_string()];
    if debug.reveals_errors_to(author_id) {
        replies.push(format!("```\n{}\n```", reason));
    }
    replies
}

async fn reply_with_failure(ctx: Context<'_>, reason: &str) {
    for reply in failure_replies(&ctx.data().debug, ctx.author().id.get(), reason) {
        if let Err(e) = ctx.say(reply).await {
            tracing::warn!("Failed to send failure reply: {}", e);
            return;
        }
    }
}

// ============================================================================
// REJECTIONS
// ============================================================================
// A rejected request (unknown course, bad grade text, ...) is answered with
// its message. Store failures still go to `on_error`.

pub async fn school_outcome<T>(
    ctx: Context<'_>,
    result: Result<T, SchoolError>,
) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            ctx.say(format!("❌ {}", e)).await?;
            Ok(None)
        }
    }
}

pub async fn grading_outcome<T>(
    ctx: Context<'_>,
    result: Result<T, GradingError>,
) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(GradingError::Grade(e)) => {
            ctx.say(format!("❌ {}", e)).await?;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
