use super::embed_pages::chunk_entries;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use std::collections::HashMap;

// Category definitions with emojis and order
const CATEGORY_ORDER: &[&str] = &[
    "School Roles",
    "Classes",
    "Courses & Grades",
    "Channels",
    "Utilities",
];

fn get_category_emoji(category: &str) -> &'static str {
    match category {
        "School Roles" => "🏫",
        "Classes" => "🧑‍🏫",
        "Courses & Grades" => "📝",
        "Channels" => "💬",
        "Utilities" => "🧰",
        _ => "•",
    }
}

struct CommandMetadata {
    priority: i32,
    usage: Option<&'static str>,
    note: Option<&'static str>,
}

fn get_command_metadata(name: &str) -> CommandMetadata {
    match name {
        "setteachers" => CommandMetadata {
            priority: 100,
            usage: Some("setteachers @member..."),
            note: Some("Prefix only. Creates the Teacher role if needed."),
        },
        "setstudents" => CommandMetadata {
            priority: 90,
            usage: Some("setstudents @member..."),
            note: Some("Prefix only."),
        },
        "expel" => CommandMetadata {
            priority: 50,
            usage: Some("expel @student [kick]"),
            note: Some("Also answers to `expell`."),
        },
        "clearschool" => CommandMetadata {
            priority: 0, // Destructive, keep it last
            usage: None,
            note: Some("Deletes every school role on the server."),
        },
        "addclass" => CommandMetadata {
            priority: 100,
            usage: Some("addclass <name> @member..."),
            note: Some("Prefix only. Non-teachers also become students."),
        },
        "setsupervisor" => CommandMetadata {
            priority: 80,
            usage: Some("setsupervisor <class> @teacher"),
            note: Some("One supervisor per class."),
        },
        "course" => CommandMetadata {
            priority: 100,
            usage: Some("course create|list|enroll|close"),
            note: None,
        },
        "grade" => CommandMetadata {
            priority: 90,
            usage: Some("grade render|parse|record|show|book"),
            note: None,
        },
        "gradeformat" => CommandMetadata {
            priority: 80,
            usage: Some("gradeformat show|set|reset"),
            note: None,
        },
        "listchannel" => CommandMetadata {
            priority: 100,
            usage: None,
            note: Some("Also answers to `list`."),
        },
        "destroy" => CommandMetadata {
            priority: 0,
            usage: None,
            note: Some("Needs a 🔥 reaction from you within two seconds."),
        },
        _ => CommandMetadata {
            priority: 10,
            usage: None,
            note: None,
        },
    }
}

/// Show a categorized list of commands.
#[poise::command(slash_command, prefix_command, category = "Utilities")]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let prefix = ctx.prefix();
    let mut categories: HashMap<&str, Vec<(i32, String)>> = HashMap::new();

    for command in &ctx.framework().options().commands {
        if command.hide_in_help || command.name == "help" {
            continue;
        }

        let metadata = get_command_metadata(&command.name);
        let category = command.category.as_deref().unwrap_or("Utilities");

        let description = command
            .description
            .as_deref()
            .or(command.help_text.as_deref())
            .unwrap_or("No description provided.");

        let usage = metadata
            .usage
            .map(str::to_string)
            .unwrap_or_else(|| command.name.clone());
        let mut entry = format!("• **{}{}** - {}", prefix, usage, description);

        if let Some(note) = metadata.note {
            entry.push_str(&format!("\n  ⤷ {}", note));
        }

        categories
            .entry(category)
            .or_default()
            .push((metadata.priority, entry));
    }

    let mut embed = serenity::CreateEmbed::new()
        .title("School Bot Command Guide")
        .description(format!(
            "Commands work with the `{}` prefix, and most of them as slash commands too.",
            prefix
        ))
        .color(serenity::Colour::from_rgb(88, 101, 242))
        .timestamp(serenity::Timestamp::now());

    if let Ok(user) = ctx.framework().bot_id.to_user(&ctx).await {
        embed = embed.thumbnail(user.face());
    }

    // Sort categories based on defined order, then alphabetically for others
    let mut sorted_categories: Vec<_> = categories.keys().cloned().collect();
    sorted_categories.sort_by(|a, b| {
        let pos_a = CATEGORY_ORDER.iter().position(|&x| x == *a).unwrap_or(999);
        let pos_b = CATEGORY_ORDER.iter().position(|&x| x == *b).unwrap_or(999);
        pos_a.cmp(&pos_b).then(a.cmp(b))
    });

    for category in sorted_categories {
        if let Some(entries) = categories.get_mut(category) {
            // Sort by priority (descending), then name (ascending)
            entries.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

            let title = format!("{} {}", get_category_emoji(category), category);
            let formatted_entries: Vec<String> = entries.iter().map(|(_, s)| s.clone()).collect();

            for (i, chunk) in chunk_entries(&formatted_entries).iter().enumerate() {
                let field_name = if i == 0 {
                    title.clone()
                } else {
                    format!("{} (cont.)", title)
                };

                embed = embed.field(field_name, chunk.join("\n"), false);
            }
        }
    }

    embed = embed.footer(serenity::CreateEmbedFooter::new(
        "Role commands need the matching server permissions.",
    ));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}
