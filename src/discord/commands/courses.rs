use crate::discord::dispatch::school_outcome;
use crate::discord::guild_roles::guild_name;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Manage the school's courses
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    category = "Courses & Grades",
    subcommands("create", "list", "enroll", "close"),
    subcommand_required
)]
pub async fn course(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Create a course; you become its first teacher
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_ROLES"
)]
pub async fn create(
    ctx: Context<'_>,
    #[description = "Course name"] name: String,
    #[description = "What the course is about"] description: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let name = name.trim();

    let result = ctx
        .data()
        .school
        .create_course(
            guild_id.get(),
            &guild_name(ctx, guild_id),
            name,
            description.as_deref().unwrap_or(""),
            ctx.author().id.get(),
        )
        .await;

    if let Some(course) = school_outcome(ctx, result).await? {
        ctx.say(format!("✅ Course **{}** created!", course.name))
            .await?;
    }
    Ok(())
}

/// List the courses of this server
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let courses = ctx.data().school.courses(guild_id.get()).await?;

    if courses.is_empty() {
        ctx.say("📚 No courses yet. Create one with `/course create`.")
            .await?;
        return Ok(());
    }

    let mut embed = serenity::CreateEmbed::new()
        .title("📚 Courses")
        .colour(serenity::Colour::DARK_GREEN)
        .timestamp(serenity::Timestamp::now());

    // Discord caps embeds at 25 fields.
    for course in courses.iter().take(25) {
        let status = match course.end_date {
            Some(end) => format!("closed {}", end.format("%Y-%m-%d")),
            None => format!("open since {}", course.start_date.format("%Y-%m-%d")),
        };
        let mut body = format!(
            "{} teacher(s) · {} student(s) · {}",
            course.teacher_ids.len(),
            course.student_ids.len(),
            status
        );
        if !course.description.is_empty() {
            body = format!("{}\n{}", course.description, body);
        }
        embed = embed.field(&course.name, body, false);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Add a member to a course
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_ROLES"
)]
pub async fn enroll(
    ctx: Context<'_>,
    #[description = "Course name"] course: String,
    #[description = "Member to enroll"] member: serenity::Member,
    #[description = "Enroll them as a teacher instead of a student"] as_teacher: Option<bool>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let as_teacher = as_teacher.unwrap_or(false);

    let result = ctx
        .data()
        .school
        .enroll(guild_id.get(), course.trim(), member.user.id.get(), as_teacher)
        .await;

    if school_outcome(ctx, result).await?.is_some() {
        let role = if as_teacher { "teacher" } else { "student" };
        ctx.say(format!(
            "✅ <@{}> joined **{}** as a {}.",
            member.user.id,
            course.trim(),
            role
        ))
        .await?;
    }
    Ok(())
}

/// Close a course; no more grades can be recorded in it
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_ROLES"
)]
pub async fn close(
    ctx: Context<'_>,
    #[description = "Course name"] course: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let result = ctx
        .data()
        .school
        .close_course(guild_id.get(), course.trim())
        .await;

    if school_outcome(ctx, result).await?.is_some() {
        ctx.say(format!("✅ Course **{}** is now closed.", course.trim()))
            .await?;
    }
    Ok(())
}
