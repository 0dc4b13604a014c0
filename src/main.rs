// This is the entry point of the school bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (grades, school model, role naming rules)
// - `infra/` = Implementations of core traits (JSON file, in-memory)
// - `discord/` = Discord-specific adapters (commands, dispatch hooks)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework and start the client

mod config;

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::config::BotConfig;
use crate::core::grading::GradingService;
use crate::core::school::SchoolService;
use crate::discord::commands::{self, presence};
use crate::discord::{dispatch, Data};
use crate::infra::grading::JsonGradeFormatStore;
use crate::infra::school::InMemorySchoolStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    let config = BotConfig::from_env()?;

    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.data_dir.display()
        )
    })?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let format_store = JsonGradeFormatStore::new(config.grade_formats_path())
        .context("Failed to open the grade format store")?;
    let grading_service = Arc::new(GradingService::new(format_store));
    let school_service = Arc::new(SchoolService::new(InMemorySchoolStore::new()));

    let data = Data {
        grading: Arc::clone(&grading_service),
        school: Arc::clone(&school_service),
        debug: config.debug,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required for prefix commands
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_VOICE_STATES // listchannel reads voice states
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS;

    let activity = config.activity.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.prefix.clone()),
                mention_as_prefix: true,
                ..Default::default()
            },
            on_error: |error| Box::pin(dispatch::on_error(error)),
            command_check: Some(|ctx| Box::pin(dispatch::bot_can_reply(ctx))),
            pre_command: |ctx| {
                Box::pin(async move {
                    tracing::debug!(
                        command = %ctx.command().qualified_name,
                        user_id = ctx.author().id.get(),
                        "Running command"
                    );
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!(user = %ready.user.name, "Bot is starting up");

                // Register slash commands globally (can take up to an hour to propagate)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered");

                presence::on_ready(ctx, &activity);
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
