//! Translation orchestration: works out which (field, locale) pairs are
//! missing, translates them and commits the results in one quiet write.
//!
//! A sync moves through `DiffCheck → Resolving → Translating → Committing`
//! and ends as a no-op, a commit, or a failure. Nothing is kept between calls.

use crate::config::Config;
use crate::diff::{any_source_value_changed, source_value_changed};
use crate::entity::{LocaleMap, TranslatableEntity, TranslationPatch};
use crate::error::SyncError;
use crate::host::{EntityStore, ErrorSink, SyncFailure, SyncTrigger, TracingErrorSink};
use crate::locale::{LocaleCode, LocaleContext, LocaleResolver};
use crate::metrics::TranslationMetrics;
use crate::translation::{TranslationClient, Translator};
use futures::future::try_join_all;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// How a successful sync ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No translatable fields were given
    NoFields,
    /// Update did not touch any source-locale value
    Unchanged,
    /// Every target locale already had a value
    UpToDate,
    /// Translations were written in one quiet update
    Committed { translations: usize },
}

/// One translation to perform: source text of `field` into `target`.
struct PendingTranslation<'a> {
    field: &'a str,
    target: LocaleCode,
    text: String,
}

pub struct TranslationOrchestrator {
    resolver: LocaleResolver,
    translator: Arc<dyn Translator>,
    store: Arc<dyn EntityStore>,
    errors: Arc<dyn ErrorSink>,
    metrics: Arc<TranslationMetrics>,
    refresh_on_source_change: bool,
}

impl TranslationOrchestrator {
    pub fn new(
        resolver: LocaleResolver,
        translator: Arc<dyn Translator>,
        store: Arc<dyn EntityStore>,
    ) -> Self {
        Self {
            resolver,
            translator,
            store,
            errors: Arc::new(TracingErrorSink),
            metrics: Arc::new(TranslationMetrics::new()),
            refresh_on_source_change: false,
        }
    }

    /// Wire an orchestrator to the chat-completion client described by `config`.
    pub fn from_config(config: &Config, store: Arc<dyn EntityStore>) -> anyhow::Result<Self> {
        let metrics = Arc::new(TranslationMetrics::new());
        let client = TranslationClient::new(config)?.with_metrics(Arc::clone(&metrics));

        Ok(Self::new(LocaleResolver::from_config(config)?, Arc::new(client), store)
            .with_metrics(metrics)
            .with_refresh_on_source_change(config.settings.refresh_on_source_change))
    }

    pub fn with_error_sink(mut self, errors: Arc<dyn ErrorSink>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<TranslationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_refresh_on_source_change(mut self, refresh: bool) -> Self {
        self.refresh_on_source_change = refresh;
        self
    }

    pub fn resolver(&self) -> &LocaleResolver {
        &self.resolver
    }

    pub fn metrics(&self) -> &Arc<TranslationMetrics> {
        &self.metrics
    }

    /// Translate the missing target-locale values of `fields` and commit them.
    ///
    /// Any single translation failure aborts the sync before anything is
    /// written. Existing locale keys are never removed.
    pub async fn sync_translations(
        &self,
        entity: &dyn TranslatableEntity,
        fields: &[String],
        trigger: SyncTrigger,
        ctx: &LocaleContext,
    ) -> Result<SyncOutcome, SyncError> {
        let result = self.sync_inner(entity, fields, trigger, ctx).await;

        match &result {
            Ok(SyncOutcome::Committed { translations }) => {
                self.metrics.record_sync_committed(*translations)
            }
            Ok(_) => self.metrics.record_sync_skipped(),
            Err(_) => self.metrics.record_sync_failed(),
        }

        result
    }

    async fn sync_inner(
        &self,
        entity: &dyn TranslatableEntity,
        fields: &[String],
        trigger: SyncTrigger,
        ctx: &LocaleContext,
    ) -> Result<SyncOutcome, SyncError> {
        if fields.is_empty() {
            return Ok(SyncOutcome::NoFields);
        }

        let entity_type = entity.entity_type();
        let entity_id = entity.id();
        let source = self.resolver.current_locale(ctx);

        if trigger == SyncTrigger::Updated && !any_source_value_changed(entity, fields, &source) {
            debug!(
                entity_type,
                entity_id = %entity_id,
                source = %source,
                "No source-locale change, skipping translation"
            );
            return Ok(SyncOutcome::Unchanged);
        }

        let targets = self.resolver.supported_locales(ctx, Some(&source));

        let mut current_maps: BTreeMap<&str, LocaleMap> = BTreeMap::new();
        // Fields whose stored value is not yet a locale object
        let mut not_objects: BTreeSet<&str> = BTreeSet::new();
        let mut pending: Vec<PendingTranslation<'_>> = Vec::new();

        for field in fields.iter().map(String::as_str) {
            if current_maps.contains_key(field) {
                continue;
            }

            let raw = entity.attribute(field);
            if !matches!(raw, Some(Value::Object(_))) {
                not_objects.insert(field);
            }
            let current = LocaleMap::from_value(raw.as_ref(), &source);

            let Some(text) = current
                .get(source.as_str())
                .filter(|text| !text.trim().is_empty())
                .map(str::to_string)
            else {
                debug!(
                    entity_type,
                    entity_id = %entity_id,
                    field = %field,
                    "No source-locale value to translate from"
                );
                current_maps.insert(field, current);
                continue;
            };

            let refresh = self.refresh_on_source_change
                && trigger == SyncTrigger::Updated
                && source_value_changed(entity, field, &source);

            for target in &targets {
                if refresh || !current.has_value(target.as_str()) {
                    pending.push(PendingTranslation {
                        field,
                        target: target.clone(),
                        text: text.clone(),
                    });
                }
            }

            current_maps.insert(field, current);
        }

        if pending.is_empty() {
            debug!(entity_type, entity_id = %entity_id, "All target locales already translated");
            return Ok(SyncOutcome::UpToDate);
        }

        debug!(
            entity_type,
            entity_id = %entity_id,
            "Translating {} missing value(s)",
            pending.len()
        );

        let translator = &self.translator;
        let source = &source;
        let translated = try_join_all(pending.into_iter().map(|job| async move {
            match translator.translate(&job.text, source, &job.target).await {
                Ok(text) => Ok((job.field, job.target, text)),
                Err(e) => Err(SyncError::Translation {
                    field: job.field.to_string(),
                    target: job.target.to_string(),
                    source: e,
                }),
            }
        }))
        .await?;

        let mut patch = TranslationPatch::new();
        for (field, target, text) in translated {
            patch.stage(field, target, text);
        }
        for field in not_objects {
            if patch.get(field).is_none() {
                continue;
            }
            if let Some(existing) = current_maps.get(field) {
                patch.carry(field, existing);
            }
        }

        self.store
            .save_quietly(entity_type, &entity_id, &patch)
            .await?;

        let translations = patch.translation_count();
        info!(
            entity_type,
            entity_id = %entity_id,
            "Committed {} translation(s)",
            translations
        );

        Ok(SyncOutcome::Committed { translations })
    }

    /// Run a sync and report any failure to the error sink instead of
    /// returning it. Used by the lifecycle hooks.
    pub async fn run(
        &self,
        entity: &dyn TranslatableEntity,
        fields: &[String],
        trigger: SyncTrigger,
        ctx: &LocaleContext,
    ) -> Option<SyncOutcome> {
        match self.sync_translations(entity, fields, trigger, ctx).await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                let failure = SyncFailure::new(entity.entity_type(), &entity.id(), trigger, &err);
                self.errors.report(&failure);
                None
            }
        }
    }
}
