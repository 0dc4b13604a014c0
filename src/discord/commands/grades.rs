// Grade commands. All text goes through the guild's grade format.

use super::embed_pages::{clamp_text, fields_from_sections, send_paged, NAME_LIMIT};
use crate::core::grading::GradingError;
use crate::core::roles::normalize_class_name;
use crate::discord::dispatch::{grading_outcome, school_outcome};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Render, read and record grades
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    category = "Courses & Grades",
    subcommands("render", "parse", "record", "show", "book"),
    subcommand_required
)]
pub async fn grade(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show how a number is written in this server's grade format
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn render(
    ctx: Context<'_>,
    #[description = "Numeric grade"] value: f64,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let result = ctx.data().grading.render(guild_id.get(), value).await;
    if let Some((_, text)) = grading_outcome(ctx, result).await? {
        ctx.say(format!("`{}` → **{}**", value, text)).await?;
    }
    Ok(())
}

/// Read a grade written in this server's grade format
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn parse(
    ctx: Context<'_>,
    #[description = "Grade text, e.g. A or 7"] text: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let grading = &ctx.data().grading;

    let result = grading.parse(guild_id.get(), text.trim()).await;
    let Some(grade) = grading_outcome(ctx, result).await? else {
        return Ok(());
    };

    let format = grading.format_for(guild_id.get()).await?;
    let meaning = if !grade.is_sentinel() {
        format!("{} out of {}", grade.magnitude(), format.scale_limit)
    } else if grade.is_special() {
        "special grade".to_string()
    } else {
        "temporary grade".to_string()
    };

    ctx.say(format!(
        "**{}** → {} (written as **{}**)",
        text.trim(),
        meaning,
        format.display(&grade)
    ))
    .await?;
    Ok(())
}

/// Record a grade for a student of a class
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_ROLES"
)]
pub async fn record(
    ctx: Context<'_>,
    #[description = "Course name"] course: String,
    #[description = "Class the student belongs to"] class_name: String,
    #[description = "Student"] student: serenity::Member,
    #[description = "Grade text, e.g. A or 7"] grade: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let data = ctx.data();
    let class = normalize_class_name(&class_name);

    // The grade keeps the scale it was given on.
    let format = data.grading.format_for(guild_id.get()).await?;
    let parsed = format.decode(grade.trim()).map_err(GradingError::from);
    let Some(parsed) = grading_outcome(ctx, parsed).await? else {
        return Ok(());
    };

    let result = data
        .school
        .record_grade(
            guild_id.get(),
            course.trim(),
            class,
            student.user.id.get(),
            parsed,
            format.scale_limit,
            ctx.author().id.get(),
        )
        .await;

    if school_outcome(ctx, result).await?.is_some() {
        ctx.say(format!(
            "✅ Recorded **{}** for <@{}> in {} ({}).",
            format.display(&parsed),
            student.user.id,
            course.trim(),
            class
        ))
        .await?;
    }
    Ok(())
}

/// Show the latest grades of a student in a course (yours by default)
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn show(
    ctx: Context<'_>,
    #[description = "Course name"] course: String,
    #[description = "Student (defaults to you)"] student: Option<serenity::User>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let data = ctx.data();
    let student = student.as_ref().unwrap_or_else(|| ctx.author());

    let result = data
        .school
        .student_grades(guild_id.get(), course.trim(), student.id.get())
        .await;
    let Some(by_class) = school_outcome(ctx, result).await? else {
        return Ok(());
    };

    if by_class.is_empty() {
        ctx.say(format!(
            "📭 <@{}> has no grades in {} yet.",
            student.id,
            course.trim()
        ))
        .await?;
        return Ok(());
    }

    let format = data.grading.format_for(guild_id.get()).await?;
    let embed = serenity::CreateEmbed::new()
        .author(serenity::CreateEmbedAuthor::new(student.name.clone()).icon_url(student.face()))
        .title(clamp_text(&format!("📝 Grades in {}", course.trim()), NAME_LIMIT))
        .colour(serenity::Colour::GOLD)
        .timestamp(serenity::Timestamp::now());

    let sections = by_class
        .into_iter()
        .map(|(class, entries)| {
            let lines = entries
                .iter()
                .rev()
                .take(15)
                .map(|entry| {
                    format!(
                        "**{}** · {} · by <@{}>",
                        entry.render(&format),
                        entry.recorded_at.format("%Y-%m-%d"),
                        entry.recorded_by
                    )
                })
                .collect();
            (class, lines)
        })
        .collect();

    send_paged(ctx, embed, fields_from_sections(sections)).await
}

/// Show every class's gradebook for a course
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_ROLES"
)]
pub async fn book(
    ctx: Context<'_>,
    #[description = "Course name"] course: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let data = ctx.data();

    let result = data.school.gradebooks(guild_id.get(), course.trim()).await;
    let Some(books) = school_outcome(ctx, result).await? else {
        return Ok(());
    };

    if books.iter().all(|book| book.is_empty()) {
        ctx.say(format!("📭 No grades recorded in {} yet.", course.trim()))
            .await?;
        return Ok(());
    }

    let format = data.grading.format_for(guild_id.get()).await?;
    let embed = serenity::CreateEmbed::new()
        .title(clamp_text(&format!("📒 Gradebook for {}", course.trim()), NAME_LIMIT))
        .colour(serenity::Colour::GOLD)
        .timestamp(serenity::Timestamp::now());

    let mut sections = Vec::new();
    for book in books.iter().filter(|book| !book.is_empty()) {
        let mut lines = Vec::new();
        for (student_id, entries) in book.entries() {
            let grades = entries
                .iter()
                .map(|entry| entry.render(&format))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("<@{}>: {}", student_id, grades));
        }
        sections.push((book.group.clone(), lines));
    }

    send_paged(ctx, embed, fields_from_sections(sections)).await
}
