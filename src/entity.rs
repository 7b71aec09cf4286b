//! Host-owned records and their per-locale field values.

use crate::locale::LocaleCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Per-locale values of a single field (`locale → text`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleMap(BTreeMap<LocaleCode, String>);

impl LocaleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a current field value.
    ///
    /// Objects keep their string entries, a JSON object encoded as a string is
    /// decoded, and any other plain string is a legacy scalar that becomes
    /// `{source: value}`. Null, missing and non-text values are empty.
    pub fn from_value(value: Option<&Value>, source: &LocaleCode) -> Self {
        match value {
            Some(Value::Object(map)) => Self::from_object(map),
            Some(Value::String(text)) => match parse_object(text) {
                Some(map) => Self::from_object(&map),
                None => {
                    let mut locales = Self::new();
                    locales.insert(source.clone(), text.clone());
                    locales
                }
            },
            _ => Self::new(),
        }
    }

    /// Normalize a persisted (pre-update) value. Unlike [`from_value`], a
    /// string that looks like JSON but does not parse is treated as empty.
    ///
    /// [`from_value`]: LocaleMap::from_value
    pub fn from_persisted(value: Option<&Value>, source: &LocaleCode) -> Self {
        match value {
            Some(Value::String(text)) if text.trim_start().starts_with('{') => {
                parse_object(text)
                    .map(|map| Self::from_object(&map))
                    .unwrap_or_default()
            }
            other => Self::from_value(other, source),
        }
    }

    fn from_object(map: &Map<String, Value>) -> Self {
        let entries = map
            .iter()
            .filter_map(|(key, value)| {
                let locale = LocaleCode::new(key).ok()?;
                let text = value.as_str()?;
                Some((locale, text.to_string()))
            })
            .collect();
        Self(entries)
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }

    /// Present and not blank.
    pub fn has_value(&self, locale: &str) -> bool {
        self.get(locale).is_some_and(|v| !v.trim().is_empty())
    }

    pub fn contains(&self, locale: &str) -> bool {
        self.0.contains_key(locale)
    }

    pub fn insert(&mut self, locale: LocaleCode, text: String) {
        self.0.insert(locale, text);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LocaleCode, &String)> {
        self.0.iter()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(locale, text)| (locale.to_string(), Value::String(text.clone())))
                .collect(),
        )
    }
}

impl FromIterator<(LocaleCode, String)> for LocaleMap {
    fn from_iter<I: IntoIterator<Item = (LocaleCode, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    if !text.trim_start().starts_with('{') {
        return None;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// A record whose fields carry per-locale values.
///
/// Implemented by the host. The core reads fields and dirty state through it
/// and never owns or mutates the record.
pub trait TranslatableEntity: Send + Sync {
    /// Record type, used for routing writes and for error reports.
    fn entity_type(&self) -> &str;

    fn id(&self) -> String;

    /// Current (in-memory) value of a field.
    fn attribute(&self, field: &str) -> Option<Value>;

    /// Persisted value of a field before the current update.
    fn original(&self, field: &str) -> Option<Value>;

    /// Whether the field was modified by the current update.
    fn is_dirty(&self, field: &str) -> bool;
}

/// Owned snapshot of a record, with dirty tracking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub entity_type: String,
    pub id: String,
    pub attributes: BTreeMap<String, Value>,
    pub original: BTreeMap<String, Value>,
    pub dirty: BTreeSet<String>,
}

impl EntitySnapshot {
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set a persisted attribute (not dirty).
    pub fn with_attribute(mut self, field: impl Into<String>, value: Value) -> Self {
        let field = field.into();
        self.original.insert(field.clone(), value.clone());
        self.attributes.insert(field, value);
        self
    }

    /// Change an attribute in memory, marking it dirty when it differs from
    /// the persisted value.
    pub fn set_attribute(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        if self.original.get(&field) == Some(&value) {
            self.dirty.remove(&field);
        } else {
            self.dirty.insert(field.clone());
        }
        self.attributes.insert(field, value);
    }

    /// Mark the current attributes as persisted.
    pub fn sync_original(&mut self) {
        self.original = self.attributes.clone();
        self.dirty.clear();
    }
}

impl TranslatableEntity for EntitySnapshot {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn attribute(&self, field: &str) -> Option<Value> {
        self.attributes.get(field).cloned()
    }

    fn original(&self, field: &str) -> Option<Value> {
        self.original.get(field).cloned()
    }

    fn is_dirty(&self, field: &str) -> bool {
        self.dirty.contains(field)
    }
}

/// Translations staged by one sync, committed in a single write.
///
/// A patch is a merge delta, not a replacement: each entry holds only the
/// locale keys to add or overwrite. Stores merge it into the field's stored
/// object and keep every key the patch does not mention. A stored value that
/// is not an object (null, a legacy scalar) is replaced by an object, so the
/// orchestrator carries the normalized values of such fields into the patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranslationPatch {
    fields: BTreeMap<String, LocaleMap>,
    translations: usize,
}

impl TranslationPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a translated value for `field`.
    pub fn stage(&mut self, field: &str, locale: LocaleCode, text: String) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .insert(locale, text);
        self.translations += 1;
    }

    /// Carry existing values of a field that is not yet stored as an object.
    /// Staged translations win over carried values.
    pub fn carry(&mut self, field: &str, existing: &LocaleMap) {
        let entry = self.fields.entry(field.to_string()).or_default();
        for (locale, text) in existing.iter() {
            if !entry.contains(locale.as_str()) {
                entry.insert(locale.clone(), text.clone());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.translations == 0
    }

    /// Number of (field, locale) translations staged.
    pub fn translation_count(&self) -> usize {
        self.translations
    }

    pub fn get(&self, field: &str) -> Option<&LocaleMap> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &LocaleMap)> {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn en() -> LocaleCode {
        LocaleCode::new("en").unwrap()
    }

    fn ar() -> LocaleCode {
        LocaleCode::new("ar").unwrap()
    }

    // ==================== LocaleMap Normalization ====================

    #[test]
    fn test_from_value_object() {
        let value = json!({"en": "Hello", "ar": "مرحبا"});
        let map = LocaleMap::from_value(Some(&value), &en());
        assert_eq!(map.get("en"), Some("Hello"));
        assert_eq!(map.get("ar"), Some("مرحبا"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_from_value_drops_null_and_non_text_entries() {
        let value = json!({"en": "Hello", "ar": null, "es": 42, "bad key": "x"});
        let map = LocaleMap::from_value(Some(&value), &en());
        assert_eq!(map.len(), 1);
        assert!(!map.contains("ar"));
    }

    #[test]
    fn test_from_value_scalar_becomes_source_locale() {
        let value = json!("Hello");
        let map = LocaleMap::from_value(Some(&value), &en());
        assert_eq!(map.get("en"), Some("Hello"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_from_value_json_encoded_object() {
        let value = json!(r#"{"en":"Hello","ar":"مرحبا"}"#);
        let map = LocaleMap::from_value(Some(&value), &en());
        assert_eq!(map.get("ar"), Some("مرحبا"));
    }

    #[test]
    fn test_from_value_broken_json_is_scalar_text() {
        let value = json!("{not json");
        let map = LocaleMap::from_value(Some(&value), &en());
        assert_eq!(map.get("en"), Some("{not json"));
    }

    #[test]
    fn test_from_value_missing_or_null() {
        assert!(LocaleMap::from_value(None, &en()).is_empty());
        assert!(LocaleMap::from_value(Some(&Value::Null), &en()).is_empty());
        assert!(LocaleMap::from_value(Some(&json!(7)), &en()).is_empty());
    }

    #[test]
    fn test_from_persisted_broken_json_is_empty() {
        let value = json!("{not json");
        assert!(LocaleMap::from_persisted(Some(&value), &en()).is_empty());
    }

    #[test]
    fn test_from_persisted_scalar_and_object() {
        let scalar = json!("Hi");
        assert_eq!(
            LocaleMap::from_persisted(Some(&scalar), &en()).get("en"),
            Some("Hi")
        );

        let object = json!({"ar": "أهلاً"});
        assert_eq!(
            LocaleMap::from_persisted(Some(&object), &en()).get("ar"),
            Some("أهلاً")
        );
    }

    #[test]
    fn test_has_value_rejects_blank() {
        let value = json!({"en": "Hello", "ar": "  "});
        let map = LocaleMap::from_value(Some(&value), &en());
        assert!(map.has_value("en"));
        assert!(!map.has_value("ar"));
        assert!(!map.has_value("es"));
    }

    #[test]
    fn test_to_value() {
        let map: LocaleMap = vec![(en(), "Hello".to_string()), (ar(), "مرحبا".to_string())]
            .into_iter()
            .collect();
        assert_eq!(map.to_value(), json!({"en": "Hello", "ar": "مرحبا"}));
    }

    // ==================== EntitySnapshot ====================

    #[test]
    fn test_snapshot_with_attribute_is_clean() {
        let entity = EntitySnapshot::new("post", "1").with_attribute("name", json!({"en": "Hi"}));
        assert!(!entity.is_dirty("name"));
        assert_eq!(entity.attribute("name"), Some(json!({"en": "Hi"})));
        assert_eq!(entity.original("name"), Some(json!({"en": "Hi"})));
    }

    #[test]
    fn test_snapshot_set_attribute_tracks_dirty() {
        let mut entity =
            EntitySnapshot::new("post", "1").with_attribute("name", json!({"en": "Hi"}));

        entity.set_attribute("name", json!({"en": "Hello"}));
        assert!(entity.is_dirty("name"));
        assert_eq!(entity.original("name"), Some(json!({"en": "Hi"})));

        // Reverting to the persisted value clears the dirty flag
        entity.set_attribute("name", json!({"en": "Hi"}));
        assert!(!entity.is_dirty("name"));
    }

    #[test]
    fn test_snapshot_sync_original() {
        let mut entity = EntitySnapshot::new("post", "1");
        entity.set_attribute("name", json!("Hi"));
        assert!(entity.is_dirty("name"));

        entity.sync_original();
        assert!(!entity.is_dirty("name"));
        assert_eq!(entity.original("name"), Some(json!("Hi")));
    }

    // ==================== TranslationPatch ====================

    #[test]
    fn test_patch_holds_only_staged_keys() {
        let mut patch = TranslationPatch::new();
        assert!(patch.is_empty());

        patch.stage("name", ar(), "مرحبا".to_string());

        let staged = patch.get("name").unwrap();
        assert_eq!(staged.len(), 1);
        assert_eq!(staged.get("ar"), Some("مرحبا"));
        assert_eq!(patch.translation_count(), 1);
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_multiple_locales_same_field() {
        let es = LocaleCode::new("es").unwrap();
        let mut patch = TranslationPatch::new();

        patch.stage("name", ar(), "مرحبا".to_string());
        patch.stage("name", es, "Hola".to_string());

        assert_eq!(patch.get("name").unwrap().len(), 2);
        assert_eq!(patch.translation_count(), 2);
        assert_eq!(patch.fields().count(), 1);
    }

    #[test]
    fn test_patch_carry_keeps_staged_values() {
        let existing: LocaleMap = vec![(en(), "Hello".to_string()), (ar(), "old".to_string())]
            .into_iter()
            .collect();
        let mut patch = TranslationPatch::new();

        patch.stage("name", ar(), "مرحبا".to_string());
        patch.carry("name", &existing);

        let staged = patch.get("name").unwrap();
        assert_eq!(staged.get("en"), Some("Hello"));
        assert_eq!(staged.get("ar"), Some("مرحبا"));
        // Carried values are not translations
        assert_eq!(patch.translation_count(), 1);
    }
}
