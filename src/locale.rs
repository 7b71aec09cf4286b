//! Locale resolution: which locale is the source of a write and which
//! locales need a translated value.
//!
//! There is no ambient "current locale". Callers build a [`LocaleContext`]
//! per request or task and pass it into every resolver call.

use crate::config::Config;
use anyhow::{bail, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::OnceLock;

static LOCALE_REGEX: OnceLock<Regex> = OnceLock::new();

fn locale_regex() -> &'static Regex {
    LOCALE_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z]{2,3}(?:[-_][A-Za-z0-9]{2,8})*$").expect("valid locale regex")
    })
}

/// A validated locale code (e.g. "en", "ar", "pt-BR").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocaleCode(String);

impl LocaleCode {
    /// Validate and wrap a locale code.
    ///
    /// # Returns
    /// * `Ok(LocaleCode)` if the code looks like a BCP 47 style tag
    /// * `Err` for empty strings, whitespace or punctuation
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();
        if !locale_regex().is_match(code) {
            bail!("Invalid locale code: '{}'", code);
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary language subtag ("pt" for "pt-BR").
    pub fn primary(&self) -> &str {
        self.0.split(['-', '_']).next().unwrap_or(&self.0)
    }
}

impl fmt::Display for LocaleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for LocaleCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for LocaleCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LocaleCode {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        LocaleCode::new(&value)
    }
}

impl From<LocaleCode> for String {
    fn from(value: LocaleCode) -> Self {
        value.0
    }
}

/// Request- or task-scoped locale context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleContext {
    locale: Option<LocaleCode>,
}

impl LocaleContext {
    /// A context with no explicit locale; resolves to the default locale.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locale(locale: LocaleCode) -> Self {
        Self {
            locale: Some(locale),
        }
    }

    /// Build a context from an `Accept-Language` header value.
    ///
    /// Only the first language range is considered. It is accepted when the
    /// exact tag or its primary subtag is supported; otherwise the context is
    /// left empty and the resolver falls back to the default locale.
    pub fn from_accept_language(header: Option<&str>, resolver: &LocaleResolver) -> Self {
        let Some(first) = header
            .and_then(|h| h.split(',').map(str::trim).find(|r| !r.is_empty()))
        else {
            return Self::new();
        };

        let tag = first.split(';').next().unwrap_or("").trim();
        let Ok(requested) = LocaleCode::new(tag) else {
            return Self::new();
        };

        let matched = resolver
            .find(requested.as_str())
            .or_else(|| resolver.find(requested.primary()))
            .cloned();

        Self { locale: matched }
    }

    pub fn locale(&self) -> Option<&LocaleCode> {
        self.locale.as_ref()
    }
}

/// Resolves source and target locales against the configured locale list.
#[derive(Debug, Clone)]
pub struct LocaleResolver {
    supported: Vec<LocaleCode>,
}

impl LocaleResolver {
    /// Create a resolver. The first locale is the default/source locale.
    pub fn new(supported: Vec<LocaleCode>) -> Result<Self> {
        if supported.is_empty() {
            bail!("At least one supported locale must be configured");
        }
        Ok(Self { supported })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.supported_languages.clone())
    }

    pub fn default_locale(&self) -> &LocaleCode {
        &self.supported[0]
    }

    /// All configured locales, in configured order.
    pub fn all(&self) -> &[LocaleCode] {
        &self.supported
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.find(code).is_some()
    }

    fn find(&self, code: &str) -> Option<&LocaleCode> {
        self.supported
            .iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(code))
    }

    /// The active source locale: the context's locale, or the default.
    pub fn current_locale(&self, ctx: &LocaleContext) -> LocaleCode {
        ctx.locale()
            .cloned()
            .unwrap_or_else(|| self.default_locale().clone())
    }

    /// Configured locales minus `excluding` (the current locale when `None`),
    /// in configured order.
    pub fn supported_locales(
        &self,
        ctx: &LocaleContext,
        excluding: Option<&LocaleCode>,
    ) -> Vec<LocaleCode> {
        let excluded = excluding
            .cloned()
            .unwrap_or_else(|| self.current_locale(ctx));

        self.supported
            .iter()
            .filter(|l| **l != excluded)
            .cloned()
            .collect()
    }
}
