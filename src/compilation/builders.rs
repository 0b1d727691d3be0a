//! Builders for the set of translations used during compilation.
//!
//! A builder decides which stored strings end up in the compiled file:
//! everything, reviewed rows only, nothing, or source strings standing in
//! for missing translations. Marked variants tag the stand-ins so the
//! format's post-compile step can comment them out.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::compilation::Mode;
use crate::store::Store;
use crate::types::PluralRule;

/// Suffix marking a source string standing in for a missing translation.
pub const MARKED_SOURCE_SUFFIX: &str = "_txss";

/// Entity id to per-rule strings. Non-pluralized entities only populate the
/// `Other` slot.
pub type TranslationMap = HashMap<u64, BTreeMap<PluralRule, String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationsBuilder {
    /// Every stored translation for the language.
    All,
    /// No translations at all (templates).
    Empty,
    /// Only rows marked reviewed.
    Reviewed,
    /// All rows, with source strings filling untranslated entities.
    Source,
    /// Like `Source`, with the stand-ins marked.
    MarkedSource,
    /// Reviewed rows, with marked source strings filling the rest.
    ReviewedMarkedSource,
}

impl TranslationsBuilder {
    /// Collects the translation strings to compile with.
    pub fn build(self, store: &Store, resource: &str, language: &str) -> TranslationMap {
        match self {
            TranslationsBuilder::All => collect(store, resource, language, false),
            TranslationsBuilder::Empty => TranslationMap::new(),
            TranslationsBuilder::Reviewed => collect(store, resource, language, true),
            TranslationsBuilder::Source => {
                let mut map = collect(store, resource, language, false);
                fill_from_source(store, resource, &mut map, false);
                map
            }
            TranslationsBuilder::MarkedSource => {
                let mut map = collect(store, resource, language, false);
                fill_from_source(store, resource, &mut map, true);
                map
            }
            TranslationsBuilder::ReviewedMarkedSource => {
                let mut map = collect(store, resource, language, true);
                fill_from_source(store, resource, &mut map, true);
                map
            }
        }
    }
}

fn collect(store: &Store, resource: &str, language: &str, reviewed_only: bool) -> TranslationMap {
    let mut map = TranslationMap::new();
    for t in store.translations_for(resource, language) {
        if reviewed_only && !t.reviewed {
            continue;
        }
        map.entry(t.source_entity)
            .or_default()
            .insert(t.rule, t.string.clone());
    }
    map
}

/// Fills entities absent from `map` with their source language strings.
fn fill_from_source(store: &Store, resource: &str, map: &mut TranslationMap, marked: bool) {
    let source_language = match store.resource(resource) {
        Some(r) => r.source_language.clone(),
        None => return,
    };
    let translated: HashSet<u64> = map.keys().copied().collect();
    for t in store.translations_for(resource, &source_language) {
        if translated.contains(&t.source_entity) {
            continue;
        }
        let mut string = t.string.clone();
        if marked {
            string.push_str(MARKED_SOURCE_SUFFIX);
        }
        map.entry(t.source_entity)
            .or_default()
            .insert(t.rule, string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Method;
    use crate::types::{Resource, SourceEntity};

    fn seeded_store() -> (Store, u64, u64) {
        let mut store = Store::new();
        store.add_resource(Resource::new("p.r", "r", Method::Properties, "en"));
        let a = store.allocate_entity_id();
        store.insert_entity(SourceEntity::new(a, "p.r", "Hello", ""));
        store.set_translation(a, "en", PluralRule::Other, "Hello", false);
        store.set_translation(a, "el", PluralRule::Other, "Gia", true);
        let b = store.allocate_entity_id();
        store.insert_entity(SourceEntity::new(b, "p.r", "Goodbye", ""));
        store.set_translation(b, "en", PluralRule::Other, "Goodbye", false);
        store.set_translation(b, "el", PluralRule::Other, "Antio", false);
        (store, a, b)
    }

    fn single(map: &TranslationMap, id: u64) -> Option<&str> {
        map.get(&id)
            .and_then(|forms| forms.get(&PluralRule::Other))
            .map(String::as_str)
    }

    #[test]
    fn test_all_builder() {
        let (store, a, b) = seeded_store();
        let map = TranslationsBuilder::All.build(&store, "p.r", "el");
        assert_eq!(single(&map, a), Some("Gia"));
        assert_eq!(single(&map, b), Some("Antio"));
    }

    #[test]
    fn test_empty_builder() {
        let (store, _, _) = seeded_store();
        assert!(TranslationsBuilder::Empty.build(&store, "p.r", "el").is_empty());
    }

    #[test]
    fn test_reviewed_builder() {
        let (store, a, b) = seeded_store();
        let map = TranslationsBuilder::Reviewed.build(&store, "p.r", "el");
        assert_eq!(single(&map, a), Some("Gia"));
        assert!(map.get(&b).is_none());
    }

    #[test]
    fn test_source_builder_fills_missing() {
        let (mut store, a, b) = seeded_store();
        store.delete_translation(b, "el", PluralRule::Other);
        let map = TranslationsBuilder::Source.build(&store, "p.r", "el");
        assert_eq!(single(&map, a), Some("Gia"));
        assert_eq!(single(&map, b), Some("Goodbye"));
    }

    #[test]
    fn test_marked_source_builder_marks_stand_ins() {
        let (mut store, a, b) = seeded_store();
        store.delete_translation(b, "el", PluralRule::Other);
        let map = TranslationsBuilder::MarkedSource.build(&store, "p.r", "el");
        assert_eq!(single(&map, a), Some("Gia"));
        assert_eq!(single(&map, b), Some("Goodbye_txss"));
    }

    #[test]
    fn test_reviewed_marked_source_builder() {
        let (store, a, b) = seeded_store();
        // b is translated but not reviewed, so it falls back to marked source.
        let map = TranslationsBuilder::ReviewedMarkedSource.build(&store, "p.r", "el");
        assert_eq!(single(&map, a), Some("Gia"));
        assert_eq!(single(&map, b), Some("Goodbye_txss"));
    }
}
