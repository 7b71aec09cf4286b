use crate::entity::{LocaleMap, TranslatableEntity};
use crate::locale::LocaleCode;

/// Whether an update changed the source-locale value of `field`.
///
/// Edits to other locales (for example a hand-corrected translation) do not
/// count. A missing or unparseable persisted value is treated as empty.
pub fn source_value_changed(
    entity: &dyn TranslatableEntity,
    field: &str,
    source: &LocaleCode,
) -> bool {
    if !entity.is_dirty(field) {
        return false;
    }

    let before = LocaleMap::from_persisted(entity.original(field).as_ref(), source);
    let after = LocaleMap::from_value(entity.attribute(field).as_ref(), source);

    before.get(source.as_str()) != after.get(source.as_str())
}

/// True if any of `fields` had its source-locale value changed.
pub fn any_source_value_changed(
    entity: &dyn TranslatableEntity,
    fields: &[String],
    source: &LocaleCode,
) -> bool {
    fields
        .iter()
        .any(|field| source_value_changed(entity, field, source))
}
