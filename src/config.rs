use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::foods::StoreConfig;
use crate::quiz::ScoringMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("{present} is set but {missing} is not")]
    Incomplete {
        present: &'static str,
        missing: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub dialogue_db_path: String,
    /// `None` means the built-in question set.
    pub questions_path: Option<PathBuf>,
    pub scoring_mode: ScoringMode,
    /// `None` when no record store is configured.
    pub store: Option<StoreConfig>,
    pub foods_path: PathBuf,
    pub chat_reply_delay: Duration,
    pub chat_history_limit: usize,
}

impl Config {
    /// Reads the bot configuration from the environment. The bot token itself
    /// is picked up by `Bot::from_env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dialogue_db_path: get_var_or("DIALOGUE_DB_PATH", "db.sqlite"),
            questions_path: env::var("PRAKRITI_QUESTIONS_PATH").ok().map(PathBuf::from),
            scoring_mode: parse_var("SCORING_MODE", "per_question")?,
            store: store_from_env()?,
            foods_path: PathBuf::from(get_var_or("FOODS_PATH", "data/foods.json")),
            chat_reply_delay: Duration::from_millis(parse_var("CHAT_REPLY_DELAY_MS", "1500")?),
            chat_history_limit: parse_var("CHAT_HISTORY_LIMIT", "50")?,
        })
    }
}

fn store_from_env() -> Result<Option<StoreConfig>, ConfigError> {
    let base_url = env::var("SUPABASE_URL").ok();
    let anon_key = env::var("SUPABASE_ANON_KEY").ok();

    match (base_url, anon_key) {
        (Some(base_url), Some(anon_key)) => Ok(Some(StoreConfig {
            base_url,
            anon_key,
            timeout_secs: parse_var("STORE_TIMEOUT_SECS", "15")?,
        })),
        (Some(_), None) => Err(ConfigError::Incomplete {
            present: "SUPABASE_URL",
            missing: "SUPABASE_ANON_KEY",
        }),
        (None, Some(_)) => Err(ConfigError::Incomplete {
            present: "SUPABASE_ANON_KEY",
            missing: "SUPABASE_URL",
        }),
        (None, None) => Ok(None),
    }
}

fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_var<T>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_var_or(key, default)
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })
}
