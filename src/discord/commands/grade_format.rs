use crate::core::grading::{Grade, GradeFormat};
use crate::discord::dispatch::grading_outcome;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// View or change how grades are written on this server
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    category = "Courses & Grades",
    subcommands("show", "set", "reset"),
    subcommand_required
)]
pub async fn gradeformat(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

fn format_embed(format: &GradeFormat) -> serenity::CreateEmbed {
    let style = match (format.use_letters, format.descending) {
        (true, true) => "letters, scale counted down",
        (true, false) => "letters",
        (false, true) => "numbers, scale counted down",
        (false, false) => "numbers",
    };

    let lowest = Grade::try_from_int(1, format.scale_limit)
        .map(|grade| format.encode(&grade))
        .unwrap_or_default();
    let best = format.encode(&Grade::best(format.scale_limit));

    serenity::CreateEmbed::new()
        .title("📐 Grade format")
        .colour(serenity::Colour::BLURPLE)
        .field("Scale", format!("1 to {}", format.scale_limit), true)
        .field("Written as", format!("`{}` up to `{}`", lowest, best), true)
        .field("Style", style, true)
        .field("Special", format!("`{}`", format.special_label), true)
        .field("Temporary", format!("`{}`", format.temporary_label), true)
}

/// Show the current grade format
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn show(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let format = ctx.data().grading.format_for(guild_id.get()).await?;

    ctx.send(poise::CreateReply::default().embed(format_embed(&format)))
        .await?;
    Ok(())
}

/// Change part of the grade format; unset options keep their value
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn set(
    ctx: Context<'_>,
    #[description = "Highest numeric grade"] scale_limit: Option<u32>,
    #[description = "Write grades as letters"] letters: Option<bool>,
    #[description = "Count down from the top of the scale"] descending: Option<bool>,
    #[description = "Label for special grades"] special_label: Option<String>,
    #[description = "Label for temporary grades"] temporary_label: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let grading = &ctx.data().grading;

    let mut format = grading.format_for(guild_id.get()).await?;
    if let Some(limit) = scale_limit {
        format.scale_limit = limit;
    }
    if let Some(letters) = letters {
        format.use_letters = letters;
    }
    if let Some(descending) = descending {
        format.descending = descending;
    }
    if let Some(label) = special_label {
        format.special_label = label.trim().to_string();
    }
    if let Some(label) = temporary_label {
        format.temporary_label = label.trim().to_string();
    }

    let result = grading.set_format(guild_id.get(), format.clone()).await;
    if grading_outcome(ctx, result).await?.is_some() {
        ctx.send(
            poise::CreateReply::default()
                .content("✅ Grade format updated.")
                .embed(format_embed(&format)),
        )
        .await?;
    }
    Ok(())
}

/// Go back to the default grade format
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn reset(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    if ctx.data().grading.reset_format(guild_id.get()).await? {
        ctx.say("✅ Grade format reset to the defaults.").await?;
    } else {
        ctx.say("ℹ️ This server already uses the default grade format.")
            .await?;
    }
    Ok(())
}
