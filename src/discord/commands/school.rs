// School role commands.
//
// **Pattern:**
// 1. Resolve the roles involved on Discord (creating them when needed)
// 2. Change member roles
// 3. Mirror the change into the school model
//
// Commands taking a list of members are prefix-only: slash commands cannot
// take a variable number of arguments.

use crate::core::roles::{
    class_role_name, is_enrollment_role, is_school_role, is_supervision_role,
    normalize_class_name, supervisor_role_name, STUDENT_ROLE, TEACHER_ROLE,
};
use crate::core::school::SchoolError;
use crate::discord::guild_roles::{
    bot_can_kick, find_role, get_or_create_role, guild_name, role_holders, RoleTemplate,
};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Add `role_id` to every member that does not have it yet. Returns how many changed.
async fn grant_role(
    ctx: Context<'_>,
    members: &[serenity::Member],
    role_id: serenity::RoleId,
) -> Result<usize, Error> {
    let mut granted = 0;
    for member in members {
        if !member.roles.contains(&role_id) {
            member.add_role(ctx.http(), role_id).await?;
            granted += 1;
        }
    }
    Ok(granted)
}

/// Roles of `member` whose names match `keep`.
async fn member_roles_matching(
    ctx: Context<'_>,
    guild_id: serenity::GuildId,
    member: &serenity::Member,
    keep: fn(&str) -> bool,
) -> Result<Vec<serenity::RoleId>, Error> {
    let roles = guild_id.roles(ctx.http()).await?;
    Ok(member
        .roles
        .iter()
        .filter(|id| roles.get(id).is_some_and(|role| keep(&role.name)))
        .copied()
        .collect())
}

/// Give one or more members the Teacher role.
#[poise::command(
    prefix_command,
    guild_only,
    category = "School Roles",
    aliases(
        "addteachers",
        "set_teachers",
        "add_teachers",
        "setteacher",
        "teacher",
        "addteacher"
    ),
    required_permissions = "ADMINISTRATOR",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn setteachers(
    ctx: Context<'_>,
    #[description = "Members to add as teachers"] members: Vec<serenity::Member>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    if members.is_empty() {
        ctx.say("❌ Mention at least one member, e.g. `!setteachers @Ann @Bob`.")
            .await?;
        return Ok(());
    }

    let role = get_or_create_role(ctx, guild_id, TEACHER_ROLE, RoleTemplate::teacher()).await?;
    let granted = grant_role(ctx, &members, role.id).await?;

    tracing::info!(guild_id = guild_id.get(), granted, "Teachers assigned");
    ctx.say("✅ Teacher(s) added successfully!").await?;
    Ok(())
}

/// Give one or more members the Student role.
#[poise::command(
    prefix_command,
    guild_only,
    category = "School Roles",
    aliases(
        "addstudents",
        "set_students",
        "add_students",
        "setstudent",
        "students",
        "addstudent"
    ),
    required_permissions = "MANAGE_ROLES",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn setstudents(
    ctx: Context<'_>,
    #[description = "Members to add as students"] members: Vec<serenity::Member>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    if members.is_empty() {
        ctx.say("❌ Mention at least one member, e.g. `!setstudents @Ann @Bob`.")
            .await?;
        return Ok(());
    }

    let role = get_or_create_role(ctx, guild_id, STUDENT_ROLE, RoleTemplate::student()).await?;
    let granted = grant_role(ctx, &members, role.id).await?;

    tracing::info!(guild_id = guild_id.get(), granted, "Students assigned");
    ctx.say("✅ Student(s) added successfully!").await?;
    Ok(())
}

/// Put members into a class, creating the class if it does not exist.
///
/// Members who are not teachers also receive the Student role.
#[poise::command(
    prefix_command,
    guild_only,
    category = "Classes",
    required_permissions = "MANAGE_ROLES",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn addclass(
    ctx: Context<'_>,
    #[description = "Class name"] name: String,
    #[description = "Members to put in the class"] members: Vec<serenity::Member>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let class = normalize_class_name(&name);
    if class.is_empty() {
        ctx.say("❌ Give the class a name, e.g. `!addclass 7A @Ann @Bob`.")
            .await?;
        return Ok(());
    }

    let class_role =
        get_or_create_role(ctx, guild_id, &class_role_name(class), RoleTemplate::marker()).await?;
    let teacher_role = find_role(ctx, guild_id, TEACHER_ROLE).await?;

    let mut student_role_id: Option<serenity::RoleId> = None;
    let mut student_ids = Vec::new();

    for member in &members {
        if !member.roles.contains(&class_role.id) {
            member.add_role(ctx.http(), class_role.id).await?;
        }

        let is_teacher = teacher_role
            .as_ref()
            .is_some_and(|role| member.roles.contains(&role.id));
        if is_teacher {
            continue;
        }

        let student_role = match student_role_id {
            Some(id) => id,
            None => {
                let role =
                    get_or_create_role(ctx, guild_id, STUDENT_ROLE, RoleTemplate::student())
                        .await?;
                student_role_id = Some(role.id);
                role.id
            }
        };
        if !member.roles.contains(&student_role) {
            member.add_role(ctx.http(), student_role).await?;
        }
        student_ids.push(member.user.id.get());
    }

    ctx.data()
        .school
        .register_group(
            guild_id.get(),
            &guild_name(ctx, guild_id),
            class,
            &student_ids,
        )
        .await?;

    ctx.say("✅ Class added successfully!").await?;
    Ok(())
}

/// Make a teacher the supervisor of a class. One supervisor per class.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    category = "Classes",
    aliases("setclassroomteacher"),
    required_permissions = "ADMINISTRATOR",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn setsupervisor(
    ctx: Context<'_>,
    #[description = "Class name"] class_name: String,
    #[description = "Teacher who will supervise the class"] teacher: serenity::Member,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let class = normalize_class_name(&class_name);

    let Some(class_role) = find_role(ctx, guild_id, &class_role_name(class)).await? else {
        ctx.say("❌ Sorry, there is no class with that name on this server.")
            .await?;
        return Ok(());
    };

    if !teacher.roles.contains(&class_role.id) {
        teacher.add_role(ctx.http(), class_role.id).await?;
    }

    let supervisor_name = supervisor_role_name(class);
    if let Some(existing) = find_role(ctx, guild_id, &supervisor_name).await? {
        let holders = role_holders(ctx, guild_id, existing.id).await?;
        if holders.iter().any(|id| *id != teacher.user.id) {
            ctx.say("❌ Sorry, this class is already supervised by another teacher 😞")
                .await?;
            return Ok(());
        }
    }

    match ctx
        .data()
        .school
        .set_supervisor(
            guild_id.get(),
            &guild_name(ctx, guild_id),
            class,
            teacher.user.id.get(),
        )
        .await
    {
        Ok(()) => {}
        Err(e @ SchoolError::SupervisorTaken { .. }) => {
            ctx.say(format!("❌ {}", e)).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let supervisor_role =
        get_or_create_role(ctx, guild_id, &supervisor_name, RoleTemplate::marker()).await?;
    if !teacher.roles.contains(&supervisor_role.id) {
        teacher.add_role(ctx.http(), supervisor_role.id).await?;
    }

    ctx.say("✅ Supervisor role added successfully!").await?;
    Ok(())
}

/// Take all class and supervisor roles away from a teacher.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    category = "Classes",
    aliases("removeclassroomteacher"),
    required_permissions = "ADMINISTRATOR",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn removesupervisor(
    ctx: Context<'_>,
    #[description = "Teacher to release"] teacher: serenity::Member,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let to_remove = member_roles_matching(ctx, guild_id, &teacher, is_supervision_role).await?;
    if to_remove.is_empty() {
        ctx.say(format!(
            "ℹ️ <@{}> has no class or supervisor roles.",
            teacher.user.id
        ))
        .await?;
        return Ok(());
    }

    teacher.remove_roles(ctx.http(), &to_remove).await?;
    ctx.data()
        .school
        .clear_supervisor(guild_id.get(), teacher.user.id.get())
        .await?;

    ctx.say(format!(
        "✅ Removed {} role(s) successfully!",
        to_remove.len()
    ))
    .await?;
    Ok(())
}

/// Delete a class role.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    category = "Classes",
    required_permissions = "ADMINISTRATOR",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn removeclass(
    ctx: Context<'_>,
    #[description = "Class to delete"] class_name: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let Some(class_name) = class_name else {
        ctx.say("❌ Looks like you forgot to name (or mistyped) the class you want to delete 🤷")
            .await?;
        return Ok(());
    };
    let class = normalize_class_name(&class_name);

    let Some(role) = find_role(ctx, guild_id, &class_role_name(class)).await? else {
        ctx.say("❌ Oops, I can't find that class role.").await?;
        return Ok(());
    };

    guild_id.delete_role(ctx.http(), role.id).await?;
    ctx.data().school.remove_group(guild_id.get(), class).await?;

    tracing::info!(guild_id = guild_id.get(), class, "Class removed");
    ctx.say("✅ The class role was deleted successfully!").await?;
    Ok(())
}

/// Expel a student: remove their class and Student roles, optionally kick them.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    category = "School Roles",
    aliases("expell"),
    required_permissions = "ADMINISTRATOR",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn expel(
    ctx: Context<'_>,
    #[description = "Student to expel"] student: serenity::Member,
    #[description = "Also kick them from the server"] kick: Option<bool>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let to_remove = member_roles_matching(ctx, guild_id, &student, is_enrollment_role).await?;
    if !to_remove.is_empty() {
        student.remove_roles(ctx.http(), &to_remove).await?;
    }

    let school = &ctx.data().school;
    let classes: Vec<String> = school
        .school(guild_id.get())
        .await?
        .map(|s| {
            s.groups_of(student.user.id.get())
                .into_iter()
                .map(|group| group.name.clone())
                .collect()
        })
        .unwrap_or_default();
    school
        .expel_student(guild_id.get(), student.user.id.get())
        .await?;

    let mut reply = String::from("✅ Student expelled successfully!");
    if !classes.is_empty() {
        reply.push_str(&format!(" Removed from: {}.", classes.join(", ")));
    }
    if kick.unwrap_or(false) {
        if bot_can_kick(ctx) {
            student.kick(ctx.http()).await?;
            reply.push_str(" They were also kicked from the server.");
        } else {
            tracing::warn!(
                guild_id = guild_id.get(),
                "Kick requested but the bot lacks KICK_MEMBERS"
            );
            reply.push_str(" I am not allowed to kick members, so they stay on the server.");
        }
    }

    ctx.say(reply).await?;
    Ok(())
}

/// Delete every school role on the server and forget the school.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    category = "School Roles",
    required_permissions = "ADMINISTRATOR",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn clearschool(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let roles = guild_id.roles(ctx.http()).await?;
    let mut deleted = 0;
    for role in roles.values().filter(|role| is_school_role(&role.name)) {
        guild_id.delete_role(ctx.http(), role.id).await?;
        deleted += 1;
    }
    ctx.data().school.clear(guild_id.get()).await?;

    tracing::info!(guild_id = guild_id.get(), deleted, "School cleared");
    ctx.say("✅ All school roles were deleted, the server is clean!")
        .await?;
    Ok(())
}
