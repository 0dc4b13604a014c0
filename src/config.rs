// Bot configuration, read once at startup.
//
// Everything comes from the environment (optionally via a .env file).
// The token may instead live in a JSON file of the form {"token": "..."},
// which is how older deployments of this bot stored it.

use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_PREFIX: &str = "!";
const DEFAULT_ACTIVITY: &str = "Mini-Project";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_TOKEN_FILE: &str = "token.json";

/// Who gets to see raw error reasons when a command fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugSettings {
    pub enabled: bool,
    pub owner_id: Option<u64>,
}

impl DebugSettings {
    pub fn reveals_errors_to(&self, user_id: u64) -> bool {
        self.enabled && self.owner_id == Some(user_id)
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub prefix: String,
    pub activity: String,
    pub data_dir: PathBuf,
    pub debug: DebugSettings,
}

#[derive(Deserialize)]
struct TokenFile {
    token: String,
}

impl BotConfig {
    /// Load `.env` (if present) and build the config from the environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let vars: HashMap<String, String> = env::vars().collect();
        Self::from_vars(&vars)
    }

    fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = match get("DISCORD_TOKEN") {
            Some(token) => token,
            None => {
                let path = get("TOKEN_FILE").unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string());
                read_token_file(Path::new(&path)).with_context(|| {
                    format!(
                        "Missing DISCORD_TOKEN environment variable and no usable token file at {}",
                        path
                    )
                })?
            }
        };

        let owner_id = match get("DEBUG_OWNER_ID") {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .with_context(|| format!("DEBUG_OWNER_ID is not a user id: {}", raw))?,
            ),
            None => None,
        };

        Ok(Self {
            token,
            prefix: get("BOT_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            activity: get("BOT_ACTIVITY").unwrap_or_else(|| DEFAULT_ACTIVITY.to_string()),
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            debug: DebugSettings {
                enabled: get("DEBUG_MODE").map(|v| parse_bool(&v)).unwrap_or(false),
                owner_id,
            },
        })
    }

    pub fn grade_formats_path(&self) -> PathBuf {
        self.data_dir.join("grade_formats.json")
    }
}

fn read_token_file(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let parsed: TokenFile = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON object with a \"token\" key", path.display()))?;
    Ok(parsed.token)
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
