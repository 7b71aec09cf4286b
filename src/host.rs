//! Collaborators the host application provides to the orchestrator.

use crate::entity::TranslationPatch;
use crate::error::{render_chain, StoreError, SyncError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::error;

/// Persistence used to commit translations.
///
/// Hosts usually have two save paths: a normal save that fires their
/// created/updated hooks, and a quiet one that does not. The orchestrator only
/// ever calls the quiet one, so writing translations back never triggers
/// another sync.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Merge every field of `patch` into the record in one atomic update,
    /// without firing lifecycle hooks.
    ///
    /// Keys the patch does not name stay as stored. A field whose stored value
    /// is not a JSON object is replaced by the patch map.
    async fn save_quietly(
        &self,
        entity_type: &str,
        id: &str,
        patch: &TranslationPatch,
    ) -> Result<(), StoreError>;
}

/// Lifecycle event that started a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    Created,
    Updated,
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncTrigger::Created => f.write_str("created"),
            SyncTrigger::Updated => f.write_str("updated"),
        }
    }
}

/// Everything needed to diagnose a failed sync and retry it later.
#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    pub entity_type: String,
    pub entity_id: String,
    pub trigger: SyncTrigger,
    /// Field and target locale of the failed translation, if any
    pub field: Option<String>,
    pub target_locale: Option<String>,
    /// Upstream HTTP status, when the API answered
    pub status: Option<u16>,
    pub error: String,
    pub occurred_at: DateTime<Utc>,
}

impl SyncFailure {
    pub fn new(entity_type: &str, entity_id: &str, trigger: SyncTrigger, error: &SyncError) -> Self {
        let (field, target_locale, status) = match error {
            SyncError::Translation {
                field,
                target,
                source,
            } => (Some(field.clone()), Some(target.clone()), source.status()),
            SyncError::PersistenceFailure(_) => (None, None, None),
        };

        Self {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            trigger,
            field,
            target_locale,
            status,
            error: render_chain(error),
            occurred_at: Utc::now(),
        }
    }
}

/// Receives failed syncs. Must not panic.
pub trait ErrorSink: Send + Sync {
    fn report(&self, failure: &SyncFailure);
}

/// Default sink: logs failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, failure: &SyncFailure) {
        error!(
            entity_type = %failure.entity_type,
            entity_id = %failure.entity_id,
            trigger = %failure.trigger,
            field = failure.field.as_deref().unwrap_or("-"),
            target_locale = failure.target_locale.as_deref().unwrap_or("-"),
            status = ?failure.status,
            "Translation sync failed: {}",
            failure.error
        );
    }
}
