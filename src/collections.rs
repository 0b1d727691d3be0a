//! Transient parse-time collections.
//!
//! Parsers fill a [`StringSet`] with [`GenericTranslation`] records; the
//! handler walks it when saving to the store. Nothing here touches storage.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{PluralRule, normalize_context};

/// One parsed translatable unit, before it is matched against the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GenericTranslation {
    /// The source string this record belongs to (the key, for key-value
    /// formats).
    pub source_entity: String,
    /// The parsed value; the source string itself in source files.
    pub translation: String,
    pub context: String,
    pub rule: PluralRule,
    pub pluralized: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    #[serde(default)]
    pub occurrences: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    #[serde(default)]
    pub comment: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    #[serde(default)]
    pub flags: String,
    pub fuzzy: bool,
    pub obsolete: bool,
    pub order: usize,
}

impl GenericTranslation {
    pub fn new(
        source_entity: impl Into<String>,
        translation: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        GenericTranslation {
            source_entity: source_entity.into(),
            translation: translation.into(),
            context: normalize_context(context.into()),
            rule: PluralRule::Other,
            pluralized: false,
            occurrences: String::new(),
            comment: String::new(),
            flags: String::new(),
            fuzzy: false,
            obsolete: false,
            order: 0,
        }
    }

    pub fn with_rule(mut self, rule: PluralRule) -> Self {
        self.rule = rule;
        self.pluralized = rule != PluralRule::Other || self.pluralized;
        self
    }

    /// Dedup key inside a StringSet.
    fn key(&self) -> (String, String, PluralRule) {
        (self.source_entity.clone(), self.context.clone(), self.rule)
    }
}

/// An ordered set of parsed translations.
///
/// Deduplicates on `(source string, context, rule)`. Adding a duplicate key
/// replaces the earlier record in place, so the last occurrence in a file
/// wins while file order is preserved.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StringSet {
    entries: Vec<GenericTranslation>,
    #[serde(skip)]
    index: HashMap<(String, String, PluralRule), usize>,
}

impl StringSet {
    pub fn new() -> Self {
        StringSet::default()
    }

    /// Adds a record, replacing any earlier record with the same key.
    pub fn add(&mut self, translation: GenericTranslation) {
        let key = translation.key();
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos] = translation,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(translation);
            }
        }
    }

    pub fn get(&self, source_entity: &str, context: &str, rule: PluralRule) -> Option<&GenericTranslation> {
        let key = (
            source_entity.to_string(),
            normalize_context(context.to_string()),
            rule,
        );
        self.index.get(&key).map(|&pos| &self.entries[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenericTranslation> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

impl<'a> IntoIterator for &'a StringSet {
    type Item = &'a GenericTranslation;
    type IntoIter = std::slice::Iter<'a, GenericTranslation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_preserves_order() {
        let mut set = StringSet::new();
        set.add(GenericTranslation::new("a", "1", ""));
        set.add(GenericTranslation::new("b", "2", ""));
        set.add(GenericTranslation::new("c", "3", ""));
        let keys: Vec<_> = set.iter().map(|t| t.source_entity.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_key_last_wins_in_place() {
        let mut set = StringSet::new();
        set.add(GenericTranslation::new("Key1", "Value", ""));
        set.add(GenericTranslation::new("Key2", "Other", ""));
        set.add(GenericTranslation::new("Key1", "Value2", ""));
        assert_eq!(set.len(), 2);
        let first = set.iter().next().unwrap();
        assert_eq!(first.source_entity, "Key1");
        assert_eq!(first.translation, "Value2");
    }

    #[test]
    fn test_context_distinguishes_keys() {
        let mut set = StringSet::new();
        set.add(GenericTranslation::new("Save", "Save", ""));
        set.add(GenericTranslation::new("Save", "Save", "menu"));
        assert_eq!(set.len(), 2);
        assert!(set.get("Save", "", PluralRule::Other).is_some());
        assert!(set.get("Save", "menu", PluralRule::Other).is_some());
    }

    #[test]
    fn test_rules_distinguish_keys() {
        let mut set = StringSet::new();
        set.add(
            GenericTranslation::new("%d file", "%d file", "").with_rule(PluralRule::One),
        );
        set.add(
            GenericTranslation::new("%d file", "%d files", "").with_rule(PluralRule::Other),
        );
        assert_eq!(set.len(), 2);
        assert!(
            set.get("%d file", "", PluralRule::One)
                .is_some_and(|t| t.translation == "%d file")
        );
    }
}
