//! Lifecycle hooks the host calls after an entity is persisted.

use crate::entity::TranslatableEntity;
use crate::host::SyncTrigger;
use crate::locale::LocaleContext;
use crate::orchestrator::TranslationOrchestrator;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

/// Entry points for the host's created/updated events.
///
/// Implementations must not block the host's write path and must never
/// surface a translation failure to it.
pub trait TranslationHooks: Send + Sync {
    fn on_entity_created(
        &self,
        entity: Arc<dyn TranslatableEntity>,
        fields: Vec<String>,
        ctx: LocaleContext,
    ) -> JoinHandle<()>;

    fn on_entity_updated(
        &self,
        entity: Arc<dyn TranslatableEntity>,
        fields: Vec<String>,
        ctx: LocaleContext,
    ) -> JoinHandle<()>;
}

/// Runs each sync as a background task on a Tokio runtime.
///
/// The returned handle can be awaited (in tests, or for a graceful shutdown)
/// but the host is free to drop it.
#[derive(Clone)]
pub struct AsyncTranslationHooks {
    orchestrator: Arc<TranslationOrchestrator>,
    runtime: Handle,
}

impl AsyncTranslationHooks {
    pub fn new(orchestrator: Arc<TranslationOrchestrator>, runtime: Handle) -> Self {
        Self {
            orchestrator,
            runtime,
        }
    }

    /// Spawn onto the runtime the caller is running in.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn on_current_runtime(orchestrator: Arc<TranslationOrchestrator>) -> Self {
        Self::new(orchestrator, Handle::current())
    }

    fn dispatch(
        &self,
        entity: Arc<dyn TranslatableEntity>,
        fields: Vec<String>,
        ctx: LocaleContext,
        trigger: SyncTrigger,
    ) -> JoinHandle<()> {
        let orchestrator = Arc::clone(&self.orchestrator);

        self.runtime.spawn(async move {
            let outcome = orchestrator
                .run(entity.as_ref(), &fields, trigger, &ctx)
                .await;
            debug!(
                entity_type = entity.entity_type(),
                trigger = %trigger,
                "Translation sync finished: {:?}",
                outcome
            );
        })
    }
}

impl TranslationHooks for AsyncTranslationHooks {
    fn on_entity_created(
        &self,
        entity: Arc<dyn TranslatableEntity>,
        fields: Vec<String>,
        ctx: LocaleContext,
    ) -> JoinHandle<()> {
        self.dispatch(entity, fields, ctx, SyncTrigger::Created)
    }

    fn on_entity_updated(
        &self,
        entity: Arc<dyn TranslatableEntity>,
        fields: Vec<String>,
        ctx: LocaleContext,
    ) -> JoinHandle<()> {
        self.dispatch(entity, fields, ctx, SyncTrigger::Updated)
    }
}
