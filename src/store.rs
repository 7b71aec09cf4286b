//! PostgreSQL implementation of [`EntityStore`].
//!
//! Translatable fields are `jsonb` columns holding `{locale: text}` objects.

use crate::entity::TranslationPatch;
use crate::error::StoreError;
use crate::host::EntityStore;
use crate::locale::LocaleCode;
use crate::query::{push_fully_translated, quote_identifier};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::{debug, info};

/// Where an entity type lives: quoted table and id column names.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TableMapping {
    table: String,
    id_column: String,
}

#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
    tables: HashMap<String, TableMapping>,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            tables: HashMap::new(),
        }
    }

    /// Open a connection pool to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        info!("Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Route writes for `entity_type` to `table`, keyed by `id_column`.
    pub fn register(
        mut self,
        entity_type: impl Into<String>,
        table: &str,
        id_column: &str,
    ) -> std::result::Result<Self, StoreError> {
        let mapping = TableMapping {
            table: quote_identifier(table)?,
            id_column: quote_identifier(id_column)?,
        };
        self.tables.insert(entity_type.into(), mapping);
        Ok(self)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn mapping(&self, entity_type: &str) -> std::result::Result<&TableMapping, StoreError> {
        self.tables
            .get(entity_type)
            .ok_or_else(|| StoreError::UnknownEntityType(entity_type.to_string()))
    }

    /// Ids of the `entity_type` records that hold a value for every locale in
    /// every field.
    pub async fn fully_translated_ids(
        &self,
        entity_type: &str,
        fields: &[String],
        locales: &[LocaleCode],
    ) -> std::result::Result<Vec<String>, StoreError> {
        let mapping = self.mapping(entity_type)?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {}::text FROM {} WHERE ",
            mapping.id_column, mapping.table
        ));
        push_fully_translated(&mut builder, fields, locales)?;

        let ids = builder
            .build_query_scalar::<String>()
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }
}

/// Build the single `UPDATE` that merges every staged field into its column.
///
/// The merge (`||`) only adds or overwrites keys. A column that is null or
/// holds a legacy scalar starts from an empty object; the patch already
/// carries the scalar under the source locale.
fn build_update(
    mapping: &TableMapping,
    id: &str,
    patch: &TranslationPatch,
) -> std::result::Result<QueryBuilder<'static, Postgres>, StoreError> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", mapping.table));

    for (index, (field, locales)) in patch.fields().enumerate() {
        let column = quote_identifier(field)?;
        if index > 0 {
            builder.push(", ");
        }
        builder.push(format!(
            "{column} = (CASE WHEN jsonb_typeof({column}) = 'object' THEN {column} ELSE '{{}}'::jsonb END) || "
        ));
        builder.push_bind(locales.to_value());
        builder.push("::jsonb");
    }

    builder.push(format!(" WHERE {}::text = ", mapping.id_column));
    builder.push_bind(id.to_string());

    Ok(builder)
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn save_quietly(
        &self,
        entity_type: &str,
        id: &str,
        patch: &TranslationPatch,
    ) -> std::result::Result<(), StoreError> {
        let mapping = self.mapping(entity_type)?;

        if patch.is_empty() {
            return Ok(());
        }

        let mut builder = build_update(mapping, id, patch)?;
        let result = builder.build().execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity_type: entity_type.to_string(),
                id: id.to_string(),
            });
        }

        debug!(
            entity_type,
            entity_id = id,
            "Saved {} translation(s) without firing hooks",
            patch.translation_count()
        );
        Ok(())
    }
}
