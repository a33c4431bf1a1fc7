use std::{
    env,
    fmt::{self, Display},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};

use tracing::{info, warn};

use crate::{
    error::AppError,
    models::{DEFAULT_ENDPOINT, DEFAULT_MODEL},
};

pub const API_KEY_NAME: &str = "DASHSCOPE_API_KEY";
const SECRETS_DIR: &str = "/run/secrets";

pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
    pub chat: ChatConfig,
}

#[derive(Clone)]
pub struct ChatConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Ok(Self {
            port: try_load("PORT", "3000")?,
            database_path: try_load("DATABASE_PATH", "feedback.db")?,
            chat: ChatConfig {
                endpoint: try_load("CHAT_ENDPOINT", DEFAULT_ENDPOINT)?,
                model: try_load("CHAT_MODEL", DEFAULT_MODEL)?,
                api_key: read_secret(API_KEY_NAME, Path::new(SECRETS_DIR))?,
            },
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    parse_or_default(key, var(key), default)
}

fn parse_or_default<T: FromStr>(key: &str, raw: Option<String>, default: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    let value = raw.unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        AppError::Config(format!("invalid {key} value {value:?}: {e}"))
    })
}

/// Environment first, then the mounted secrets file. Blank values count as missing.
fn read_secret(secret_name: &str, secrets_dir: &Path) -> Result<String, AppError> {
    if let Some(value) = var(secret_name).map(|s| s.trim().to_string()) {
        if !value.is_empty() {
            return Ok(value);
        }
    }

    let path = secrets_dir.join(secret_name);
    let value = read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
            AppError::Config(format!(
                "{secret_name} must be set in the environment or at {}",
                path.display()
            ))
        })?;

    if value.is_empty() {
        return Err(AppError::Config(format!("{secret_name} is empty")));
    }

    Ok(value)
}
