use anyhow::{bail, Context, Result};

/// Which backend turns document text into resume fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    Heuristic,
    Llm,
}

impl std::str::FromStr for ExtractionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" | "" => Ok(ExtractionMode::Heuristic),
            "llm" => Ok(ExtractionMode::Llm),
            other => bail!("EXTRACTION_MODE must be 'heuristic' or 'llm', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if a value is present but malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub extraction_mode: ExtractionMode,
    pub anthropic_api_key: Option<String>,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let extraction_mode: ExtractionMode = std::env::var("EXTRACTION_MODE")
            .unwrap_or_default()
            .parse()?;

        let anthropic_api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        if extraction_mode == ExtractionMode::Llm && anthropic_api_key.is_none() {
            bail!("ANTHROPIC_API_KEY is required when EXTRACTION_MODE=llm");
        }

        let max_upload_bytes = upload_limit_bytes(
            &std::env::var("MAX_UPLOAD_MB").unwrap_or_else(|_| "25".to_string()),
        )?;

        Ok(Config {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://resumes.db".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8501".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            extraction_mode,
            anthropic_api_key,
            max_upload_bytes,
        })
    }
}

fn upload_limit_bytes(raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .context("MAX_UPLOAD_MB must be a whole number of megabytes")?
        .checked_mul(1024 * 1024)
        .context("MAX_UPLOAD_MB is too large")
}
