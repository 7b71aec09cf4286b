use thiserror::Error;

/// Errors produced by a single translation request.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// A required API setting is empty. Checked before any network call.
    #[error("Translation API is not configured: {0} is missing")]
    ConfigurationMissing(&'static str),

    /// Network failure, timeout or 5xx response. Eligible for retry.
    #[error("Transient translation API error ({}): {detail}", status_label(.status))]
    TransientApi { status: Option<u16>, detail: String },

    /// The API rejected the request (4xx, or an `error` payload). Never retried.
    #[error("Translation API rejected the request ({status}): {detail}")]
    ClientApi { status: u16, detail: String },

    /// The response carried no non-empty translated text.
    #[error("Translation API response contained no translated text")]
    EmptyModelResponse,

    /// Final failure after the retry policy gave up.
    #[error("Translation failed after {attempts} attempt(s)")]
    TranslationFailed {
        attempts: u32,
        #[source]
        source: Box<TranslateError>,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no response".to_string(),
    }
}

impl TranslateError {
    /// Whether the retry policy may try again after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, TranslateError::TransientApi { .. })
    }

    /// Upstream HTTP status, looking through `TranslationFailed`.
    pub fn status(&self) -> Option<u16> {
        match self {
            TranslateError::TransientApi { status, .. } => *status,
            TranslateError::ClientApi { status, .. } => Some(*status),
            TranslateError::TranslationFailed { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// Errors raised by a host entity store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No table registered for entity type '{0}'")]
    UnknownEntityType(String),

    #[error("Invalid SQL identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Entity {entity_type}#{id} not found")]
    NotFound { entity_type: String, id: String },

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Other(String),
}

/// Reasons a sync aborted without committing anything.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Translating field '{field}' to '{target}' failed")]
    Translation {
        field: String,
        target: String,
        #[source]
        source: TranslateError,
    },

    #[error("Persisting translations failed")]
    PersistenceFailure(#[from] StoreError),
}

/// Render an error and its `source()` chain as `outer: inner: root`.
///
/// Wrapper variants keep their cause out of their own message, so this is
/// how the full detail reaches logs and error reports.
pub fn render_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut cause = error.source();
    while let Some(inner) = cause {
        rendered.push_str(": ");
        rendered.push_str(&inner.to_string());
        cause = inner.source();
    }
    rendered
}

pub type Result<T> = std::result::Result<T, TranslateError>;
