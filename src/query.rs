//! "Fully translated" predicate, both in memory and as a SQL filter.
//!
//! A record is fully translated when every translatable field holds a
//! non-null value for every given locale. Legacy scalar values hold no
//! locale keys and never qualify.

use crate::entity::TranslatableEntity;
use crate::error::StoreError;
use crate::locale::LocaleCode;
use regex::Regex;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use std::sync::OnceLock;

static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();

fn identifier_regex() -> &'static Regex {
    IDENTIFIER_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("valid identifier regex"))
}

/// Validate a table or column name and return it double-quoted.
pub(crate) fn quote_identifier(name: &str) -> Result<String, StoreError> {
    if identifier_regex().is_match(name) {
        Ok(format!("\"{}\"", name))
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

/// In-memory check of the fully-translated predicate.
pub fn is_fully_translated(
    entity: &dyn TranslatableEntity,
    fields: &[String],
    locales: &[LocaleCode],
) -> bool {
    fields.iter().all(|field| match entity.attribute(field) {
        Some(Value::Object(map)) => locales
            .iter()
            .all(|locale| map.get(locale.as_str()).is_some_and(|v| !v.is_null())),
        _ => locales.is_empty(),
    })
}

/// Append the fully-translated predicate to a query under construction.
///
/// Produces `(("field" ->> $1::text) IS NOT NULL AND ...)` with locale keys
/// bound as parameters, or `TRUE` when there is nothing to check.
pub fn push_fully_translated(
    builder: &mut QueryBuilder<'_, Postgres>,
    fields: &[String],
    locales: &[LocaleCode],
) -> Result<(), StoreError> {
    let columns = fields
        .iter()
        .map(|field| quote_identifier(field))
        .collect::<Result<Vec<_>, _>>()?;

    if columns.is_empty() || locales.is_empty() {
        builder.push("TRUE");
        return Ok(());
    }

    builder.push("(");
    let mut first = true;
    for column in &columns {
        for locale in locales {
            if !first {
                builder.push(" AND ");
            }
            first = false;

            builder.push(format!("({} ->> ", column));
            builder.push_bind(locale.to_string());
            builder.push("::text) IS NOT NULL");
        }
    }
    builder.push(")");

    Ok(())
}
