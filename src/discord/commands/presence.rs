// Bot presence.
//
// Discord-layer glue only: the activity text comes from configuration.

use poise::serenity_prelude as serenity;

/// Show "Playing <activity>" under the bot's name.
pub fn set_activity(ctx: &serenity::Context, activity: &str) {
    ctx.set_presence(
        Some(serenity::ActivityData::playing(activity)),
        serenity::OnlineStatus::Online,
    );
}

/// Called once the bot is ready.
pub fn on_ready(ctx: &serenity::Context, activity: &str) {
    set_activity(ctx, activity);
    tracing::info!(activity, "Presence set");
}
