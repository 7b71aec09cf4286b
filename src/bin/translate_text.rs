//! Translate a string into every configured locale and print the results.
//!
//! Handy for checking API credentials and prompt behaviour without a host
//! application.
//!
//! Usage:
//!   cargo run --bin translate-text -- "Hello world"
//!   cargo run --bin translate-text -- --from ar "مرحبا"
//!
//! Required environment variables:
//! - TRANSLATION_API_KEY
//!
//! Optional:
//! - TRANSLATION_SUPPORTED_LANGUAGES (defaults to en,ar)
//! - TRANSLATION_API_URL, TRANSLATION_MODEL, TRANSLATION_API_TIMEOUT
//! - TRANSLATION_TEMPERATURE, TRANSLATION_MAX_TOKENS

use anyhow::{bail, Context, Result};
use auto_translate::config::Config;
use auto_translate::error::render_chain;
use auto_translate::locale::{LocaleCode, LocaleContext, LocaleResolver};
use auto_translate::translation::{TranslationClient, Translator};
use tracing::info;

struct Args {
    from: Option<String>,
    text: String,
}

fn parse_args() -> Result<Args> {
    let mut from = None;
    let mut words = Vec::new();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        if arg == "--from" {
            from = Some(args.next().context("--from needs a locale code")?);
        } else {
            words.push(arg);
        }
    }

    if words.is_empty() {
        bail!("Usage: translate-text [--from <locale>] <text>");
    }

    Ok(Args {
        from,
        text: words.join(" "),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("auto_translate=info".parse()?),
        )
        .init();

    let args = parse_args()?;
    let config = Config::from_env()?;
    let resolver = LocaleResolver::from_config(&config)?;

    let ctx = match args.from.as_deref() {
        Some(code) => LocaleContext::with_locale(LocaleCode::new(code)?),
        None => LocaleContext::new(),
    };
    let source = resolver.current_locale(&ctx);
    let targets = resolver.supported_locales(&ctx, Some(&source));

    if targets.is_empty() {
        bail!("No target locales configured besides '{}'", source);
    }

    let client = TranslationClient::new(&config)?;

    info!(
        "Translating from {} into {} locale(s) with {}",
        source,
        targets.len(),
        config.api.model
    );

    println!("\n{}", "=".repeat(60));
    println!("[{}] {}", source, args.text);
    println!("{}", "=".repeat(60));

    for target in &targets {
        match client.translate(&args.text, &source, target).await {
            Ok(translated) => println!("[{}] {}", target, translated),
            Err(e) => println!("[{}] ERROR: {}", target, render_chain(&e)),
        }
    }

    println!("{}\n", "=".repeat(60));

    let report = client.metrics().report();
    info!(
        "API calls: {}, failures: {}",
        report.api_calls, report.api_failures
    );

    Ok(())
}
