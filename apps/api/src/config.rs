use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_API_URL, DEFAULT_MODEL};

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";

/// Application configuration loaded from environment variables.
/// Startup fails if `GROQ_API_KEY` is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub groq_model: String,
    pub groq_api_url: String,
    pub llm_timeout_secs: u64,
    pub llm_max_attempts: u32,
    pub cors_origins: Vec<String>,
    pub template_path: PathBuf,
    pub output_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup (the process environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            groq_api_key: lookup("GROQ_API_KEY")
                .filter(|key| !key.trim().is_empty())
                .context("Required environment variable 'GROQ_API_KEY' is not set")?,
            groq_model: get("GROQ_MODEL", DEFAULT_MODEL),
            groq_api_url: get("GROQ_API_URL", DEFAULT_API_URL),
            llm_timeout_secs: get("LLM_TIMEOUT_SECS", "60")
                .parse()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            llm_max_attempts: get("LLM_MAX_ATTEMPTS", "1")
                .parse()
                .context("LLM_MAX_ATTEMPTS must be a positive integer")?,
            cors_origins: parse_origins(&get("CORS_ORIGINS", DEFAULT_CORS_ORIGINS)),
            template_path: PathBuf::from(get("TEMPLATE_PATH", "templates/loi_template.docx")),
            output_dir: PathBuf::from(get("OUTPUT_DIR", "generated")),
            port: get("PORT", "8000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG", "info"),
        })
    }
}

/// Comma-separated origin list; blanks dropped.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
