use crate::locale::LocaleCode;
use anyhow::{bail, Context, Result};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o";

#[derive(Debug, Clone)]
pub struct Config {
    // Locales (first = default/source)
    pub supported_languages: Vec<LocaleCode>,

    // Translation API
    pub api: ApiConfig,

    // Model behaviour
    pub settings: TranslationSettings,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bearer token. Left empty when unset so the client can report it.
    pub key: String,
    pub url: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TranslationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Retranslate existing target values when an update changes the source value.
    pub refresh_on_source_change: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let languages = std::env::var("TRANSLATION_SUPPORTED_LANGUAGES")
            .unwrap_or_else(|_| "en,ar".to_string());

        Ok(Self {
            supported_languages: parse_locale_list(&languages)
                .context("TRANSLATION_SUPPORTED_LANGUAGES is invalid")?,

            api: ApiConfig {
                // No fallback default: the key must be set explicitly
                key: std::env::var("TRANSLATION_API_KEY").unwrap_or_default(),
                url: std::env::var("TRANSLATION_API_URL")
                    .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
                model: std::env::var("TRANSLATION_MODEL")
                    .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
                timeout: Duration::from_secs(
                    std::env::var("TRANSLATION_API_TIMEOUT")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .filter(|secs| *secs > 0)
                        .unwrap_or(10),
                ),
            },

            settings: TranslationSettings {
                temperature: std::env::var("TRANSLATION_TEMPERATURE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0.3),
                max_tokens: std::env::var("TRANSLATION_MAX_TOKENS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(200),
                refresh_on_source_change: std::env::var("TRANSLATION_REFRESH_ON_CHANGE")
                    .ok()
                    .and_then(|v| parse_flag(&v))
                    .unwrap_or(false),
            },
        })
    }
}

/// Parse a comma separated locale list, preserving order and dropping duplicates.
fn parse_locale_list(raw: &str) -> Result<Vec<LocaleCode>> {
    let mut locales: Vec<LocaleCode> = Vec::new();

    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let locale = LocaleCode::new(part)?;
        if !locales.contains(&locale) {
            locales.push(locale);
        }
    }

    if locales.is_empty() {
        bail!("at least one supported language is required");
    }

    Ok(locales)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
