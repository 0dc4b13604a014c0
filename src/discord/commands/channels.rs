// Channel commands: voice roster, private class channels and channel deletion.

use crate::core::roles::{
    class_channel_name, class_role_name, classify_member, normalize_class_name, Roster,
    RosterSection, CLASS_CATEGORY,
};
use crate::discord::guild_roles::{find_role, get_or_create_category, guild_permissions};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use std::time::Duration;

const CONFIRM_EMOJI: &str = "🔥";
const CONFIRM_WINDOW: Duration = Duration::from_secs(2);
const DELETE_GRACE: Duration = Duration::from_millis(500);

/// List who is in your current voice channel, grouped by role.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    category = "Channels",
    aliases("list")
)]
pub async fn listchannel(ctx: Context<'_>) -> Result<(), Error> {
    let author_id = ctx.author().id;

    // Everything is read from the cache in one go; the guild ref can't cross an await.
    let snapshot = ctx.guild().and_then(|guild| {
        let channel_id = guild.voice_states.get(&author_id)?.channel_id?;
        let channel_name = guild
            .channels
            .get(&channel_id)
            .map(|channel| channel.name.clone())
            .unwrap_or_else(|| channel_id.to_string());

        let mut roster = Roster::default();
        for state in guild
            .voice_states
            .values()
            .filter(|state| state.channel_id == Some(channel_id))
        {
            let mention = format!("<@{}>", state.user_id);
            let Some(member) = guild.members.get(&state.user_id).or(state.member.as_ref()) else {
                roster.push(RosterSection::Others, mention);
                continue;
            };

            let is_admin = guild_permissions(&guild, member).administrator();
            let role_names = member
                .roles
                .iter()
                .filter_map(|id| guild.roles.get(id))
                .map(|role| role.name.as_str());
            roster.push(classify_member(is_admin, role_names), mention);
        }

        Some((channel_name, roster))
    });

    let Some((channel_name, roster)) = snapshot else {
        ctx.say(":x: You don't seem to be in a voice channel right now :man_shrugging:")
            .await?;
        return Ok(());
    };

    let author = ctx.author();
    let mut embed = serenity::CreateEmbed::new()
        .author(serenity::CreateEmbedAuthor::new(author.name.clone()).icon_url(author.face()))
        .description(format!(":scroll: Members of **{}**", channel_name))
        .colour(serenity::Colour::BLURPLE)
        .timestamp(serenity::Timestamp::now());

    for (title, body) in roster.sections() {
        embed = embed.field(title, body, false);
    }

    ctx.send(poise::CreateReply::default().embed(embed).reply(true))
        .await?;
    Ok(())
}

/// Create a private text channel that only a class can see.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    category = "Channels",
    required_permissions = "MANAGE_CHANNELS",
    required_bot_permissions = "MANAGE_CHANNELS | MANAGE_ROLES"
)]
pub async fn classchannel(
    ctx: Context<'_>,
    #[description = "Class the channel is for"] class_name: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let Some(class_name) = class_name else {
        ctx.say("❌ Tell me which class the channel is for, e.g. `!classchannel 7A`.")
            .await?;
        return Ok(());
    };
    let class = normalize_class_name(&class_name);

    let Some(class_role) = find_role(ctx, guild_id, &class_role_name(class)).await? else {
        ctx.say("❌ Sorry, there is no class with that name on this server.")
            .await?;
        return Ok(());
    };

    let category = get_or_create_category(ctx, guild_id, CLASS_CATEGORY).await?;

    // @everyone role ID is same as guild ID
    let overwrites = vec![
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::empty(),
            deny: serenity::Permissions::VIEW_CHANNEL,
            kind: serenity::PermissionOverwriteType::Role(serenity::RoleId::new(guild_id.get())),
        },
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::VIEW_CHANNEL,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Role(class_role.id),
        },
    ];

    let channel = guild_id
        .create_channel(
            ctx.http(),
            serenity::CreateChannel::new(class_channel_name(class))
                .kind(serenity::ChannelType::Text)
                .category(category)
                .permissions(overwrites),
        )
        .await?;

    tracing::info!(
        guild_id = guild_id.get(),
        channel_id = channel.id.get(),
        class,
        "Class channel created"
    );
    ctx.say(format!("✅ Class channel <#{}> created!", channel.id))
        .await?;
    Ok(())
}

/// Delete this channel. React with 🔥 within two seconds to confirm.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    category = "Channels",
    required_permissions = "MANAGE_CHANNELS",
    required_bot_permissions = "MANAGE_CHANNELS | ADD_REACTIONS | READ_MESSAGE_HISTORY"
)]
pub async fn destroy(ctx: Context<'_>) -> Result<(), Error> {
    let reply = ctx
        .say(format!(
            "⚠️ This channel will be deleted. React with {} to confirm.",
            CONFIRM_EMOJI
        ))
        .await?;
    let warning = reply.message().await?.into_owned();

    let fire = serenity::ReactionType::Unicode(CONFIRM_EMOJI.to_string());
    warning.react(ctx.http(), fire.clone()).await?;

    tokio::time::sleep(CONFIRM_WINDOW).await;

    let reactors = warning
        .reaction_users(ctx.http(), fire, Some(100), None::<serenity::UserId>)
        .await?;
    if !reactors.iter().any(|user| user.id == ctx.author().id) {
        tracing::debug!(
            channel_id = ctx.channel_id().get(),
            "Channel deletion not confirmed"
        );
        return Ok(());
    }

    tokio::time::sleep(DELETE_GRACE).await;

    tracing::info!(
        channel_id = ctx.channel_id().get(),
        user_id = ctx.author().id.get(),
        "Deleting channel on request"
    );
    ctx.channel_id().delete(ctx.http()).await?;
    Ok(())
}
