// Discord layer - commands, dispatch hooks and guild helpers.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "dispatch/dispatch.rs"]
pub mod dispatch;

#[path = "school/guild_roles.rs"]
pub mod guild_roles;

use crate::config::DebugSettings;
use crate::core::grading::GradingService;
use crate::core::school::SchoolService;
use crate::infra::grading::JsonGradeFormatStore;
use crate::infra::school::InMemorySchoolStore;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command.
pub struct Data {
    pub grading: Arc<GradingService<JsonGradeFormatStore>>,
    pub school: Arc<SchoolService<InMemorySchoolStore>>,
    pub debug: DebugSettings,
}
