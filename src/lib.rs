//! Automatic translation of locale-keyed record fields.
//!
//! When a host record is created or its source-locale text changes, the
//! missing locales of each translatable field are filled in through an
//! OpenAI-compatible chat-completion API and written back in one quiet update.

pub mod config;
pub mod diff;
pub mod entity;
pub mod error;
pub mod hooks;
pub mod host;
pub mod locale;
pub mod metrics;
pub mod orchestrator;
pub mod query;
pub mod retry;
pub mod store;
pub mod translation;

pub use entity::{EntitySnapshot, LocaleMap, TranslatableEntity, TranslationPatch};
pub use error::{StoreError, SyncError, TranslateError};
pub use hooks::{AsyncTranslationHooks, TranslationHooks};
pub use host::{EntityStore, ErrorSink, SyncFailure, SyncTrigger, TracingErrorSink};
pub use locale::{LocaleCode, LocaleContext, LocaleResolver};
pub use orchestrator::{SyncOutcome, TranslationOrchestrator};
pub use translation::{TranslationClient, Translator};
