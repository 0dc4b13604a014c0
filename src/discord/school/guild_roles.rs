// Guild lookups shared by the school commands.
//
// Roles and channels are looked up by name over HTTP so a stale cache never
// makes us create a duplicate. Permission math uses the cache.

use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Permissions and mention flag used when a school role has to be created.
#[derive(Debug, Clone, Copy)]
pub struct RoleTemplate {
    pub permissions: serenity::Permissions,
    pub mentionable: bool,
}

impl RoleTemplate {
    pub fn teacher() -> Self {
        Self {
            permissions: serenity::Permissions::MANAGE_CHANNELS
                | serenity::Permissions::MANAGE_MESSAGES
                | serenity::Permissions::MANAGE_NICKNAMES
                | serenity::Permissions::PRIORITY_SPEAKER,
            mentionable: true,
        }
    }

    pub fn student() -> Self {
        Self {
            permissions: serenity::Permissions::SPEAK
                | serenity::Permissions::SEND_MESSAGES
                | serenity::Permissions::VIEW_CHANNEL,
            mentionable: true,
        }
    }

    /// Class and supervisor roles carry no permissions of their own.
    pub fn marker() -> Self {
        Self {
            permissions: serenity::Permissions::empty(),
            mentionable: false,
        }
    }
}

/// Find a role by exact name.
pub async fn find_role(
    ctx: Context<'_>,
    guild_id: serenity::GuildId,
    name: &str,
) -> Result<Option<serenity::Role>, Error> {
    let roles = guild_id.roles(ctx.http()).await?;
    Ok(roles.into_values().find(|role| role.name == name))
}

/// Find a role by name, creating it from `template` if it does not exist.
pub async fn get_or_create_role(
    ctx: Context<'_>,
    guild_id: serenity::GuildId,
    name: &str,
    template: RoleTemplate,
) -> Result<serenity::Role, Error> {
    if let Some(role) = find_role(ctx, guild_id, name).await? {
        return Ok(role);
    }

    let role = guild_id
        .create_role(
            ctx.http(),
            serenity::EditRole::new()
                .name(name)
                .permissions(template.permissions)
                .mentionable(template.mentionable),
        )
        .await?;

    tracing::info!(guild_id = guild_id.get(), role = name, "Created role");
    Ok(role)
}

/// Largest page the member list endpoint returns.
const MEMBER_PAGE: u64 = 1000;

/// Where the next member page starts, or `None` once a short page came back.
fn next_cursor(fetched: usize, last: Option<serenity::UserId>) -> Option<serenity::UserId> {
    if (fetched as u64) < MEMBER_PAGE {
        return None;
    }
    last
}

/// Every member currently holding `role_id`.
pub async fn role_holders(
    ctx: Context<'_>,
    guild_id: serenity::GuildId,
    role_id: serenity::RoleId,
) -> Result<Vec<serenity::UserId>, Error> {
    let mut holders = Vec::new();
    let mut after: Option<serenity::UserId> = None;

    loop {
        let members = guild_id
            .members(ctx.http(), Some(MEMBER_PAGE), after)
            .await?;
        let fetched = members.len();
        let last = members.last().map(|member| member.user.id);

        holders.extend(
            members
                .into_iter()
                .filter(|member| member.roles.contains(&role_id))
                .map(|member| member.user.id),
        );

        match next_cursor(fetched, last) {
            Some(cursor) => after = Some(cursor),
            None => break,
        }
    }

    Ok(holders)
}

/// Find a category channel by name, creating it if needed.
pub async fn get_or_create_category(
    ctx: Context<'_>,
    guild_id: serenity::GuildId,
    name: &str,
) -> Result<serenity::ChannelId, Error> {
    let channels = guild_id.channels(ctx.http()).await?;
    if let Some(category) = channels
        .values()
        .find(|c| c.kind == serenity::ChannelType::Category && c.name == name)
    {
        return Ok(category.id);
    }

    let category = guild_id
        .create_channel(
            ctx.http(),
            serenity::CreateChannel::new(name).kind(serenity::ChannelType::Category),
        )
        .await?;
    Ok(category.id)
}

/// Guild-wide permissions of a member: @everyone plus each of their roles.
pub fn guild_permissions(guild: &serenity::Guild, member: &serenity::Member) -> serenity::Permissions {
    if guild.owner_id == member.user.id {
        return serenity::Permissions::all();
    }

    // @everyone role ID is same as guild ID
    let everyone = serenity::RoleId::new(guild.id.get());
    let mut permissions = guild
        .roles
        .get(&everyone)
        .map(|role| role.permissions)
        .unwrap_or_else(serenity::Permissions::empty);

    for role_id in &member.roles {
        if let Some(role) = guild.roles.get(role_id) {
            permissions |= role.permissions;
        }
    }

    if permissions.administrator() {
        serenity::Permissions::all()
    } else {
        permissions
    }
}

/// Whether the bot itself may kick members, according to the cache.
pub fn bot_can_kick(ctx: Context<'_>) -> bool {
    let bot_id = ctx.framework().bot_id;
    ctx.guild()
        .and_then(|guild| {
            guild
                .members
                .get(&bot_id)
                .map(|member| guild_permissions(&guild, member).kick_members())
        })
        .unwrap_or(false)
}

/// Display name of the current guild, used when a school is first created.
pub fn guild_name(ctx: Context<'_>, guild_id: serenity::GuildId) -> String {
    ctx.guild()
        .map(|guild| guild.name.clone())
        .unwrap_or_else(|| format!("Guild {}", guild_id))
}
