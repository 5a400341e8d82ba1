use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::llm::LlmSettings;

pub const DEFAULT_SUMMARY_LENGTH: usize = 300;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    /// Fallback key used when a request does not carry its own.
    pub openrouter_api_key: Option<String>,
    pub llm: LlmSettings,
    pub fetch_timeout: Duration,
    /// `None` disables writing results to disk.
    pub output_dir: Option<PathBuf>,
    pub default_summary_length: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        let openrouter_api_key = optional_var("OPENROUTER_API_KEY")?;

        let host = env_or("HOST", "127.0.0.1")?;
        let port = parse_var::<u16>("PORT", "3000")?;
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;
        let server_addr = SocketAddr::new(ip, port);

        let defaults = LlmSettings::default();
        let base_url = env_or("LLM_BASE_URL", &defaults.base_url)?;
        let models = match optional_var("LLM_MODELS")? {
            Some(raw) => parse_model_list(&raw)?,
            None => defaults.models,
        };
        let llm_timeout = parse_var::<u64>("LLM_TIMEOUT_SECS", "60")?;

        let fetch_timeout = parse_var::<u64>("FETCH_TIMEOUT_SECS", "10")?;
        let output_dir = env_or("OUTPUT_DIR", "scraped_data")?;
        let output_dir = (!output_dir.trim().is_empty()).then(|| PathBuf::from(output_dir));
        let default_summary_length =
            parse_var::<usize>("DEFAULT_SUMMARY_LENGTH", &DEFAULT_SUMMARY_LENGTH.to_string())?;

        Ok(Config {
            server_addr,
            openrouter_api_key,
            llm: LlmSettings {
                base_url,
                models,
                timeout: Duration::from_secs(llm_timeout),
            },
            fetch_timeout: Duration::from_secs(fetch_timeout),
            output_dir,
            default_summary_length,
        })
    }
}

fn optional_var(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn env_or(key: &str, default: &str) -> Result<String> {
    match env::var(key) {
        Ok(value) => Ok(value),
        Err(env::VarError::NotPresent) => Ok(default.to_string()),
        Err(e) => Err(e.into()),
    }
}

fn parse_var<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env_or(key, default)?;
    raw.trim()
        .parse::<T>()
        .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", key, e)))
}

fn parse_model_list(raw: &str) -> Result<Vec<String>> {
    let models: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect();

    if models.is_empty() {
        return Err(AppError::ConfigError("LLM_MODELS lists no models".to_string()));
    }
    Ok(models)
}
