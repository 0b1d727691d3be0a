//! In-memory persistence backend.
//!
//! The store owns every entity, translation, suggestion and template the
//! engine knows about. Handlers never mutate a store directly during a save;
//! they work on a clone and swap it in on success, so a failed save leaves
//! the store untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{PluralRule, Resource, SourceEntity, Suggestion, Translation};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Store {
    resources: HashMap<String, Resource>,
    entities: Vec<SourceEntity>,
    translations: Vec<Translation>,
    suggestions: Vec<Suggestion>,
    /// Resource slug to stored template content.
    templates: HashMap<String, String>,
    next_entity_id: u64,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    // resources

    pub fn add_resource(&mut self, resource: Resource) {
        self.resources.insert(resource.slug.clone(), resource);
    }

    pub fn resource(&self, slug: &str) -> Option<&Resource> {
        self.resources.get(slug)
    }

    // source entities

    pub fn allocate_entity_id(&mut self) -> u64 {
        self.next_entity_id += 1;
        self.next_entity_id
    }

    pub fn insert_entity(&mut self, entity: SourceEntity) {
        self.entities.push(entity);
    }

    pub fn entity(&self, id: u64) -> Option<&SourceEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: u64) -> Option<&mut SourceEntity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Entities of a resource, in their stored order.
    pub fn entities_for(&self, resource: &str) -> Vec<&SourceEntity> {
        let mut out: Vec<&SourceEntity> = self
            .entities
            .iter()
            .filter(|e| e.resource == resource)
            .collect();
        out.sort_by_key(|e| e.order);
        out
    }

    pub fn find_entity(&self, resource: &str, string: &str, context: &str) -> Option<&SourceEntity> {
        self.entities
            .iter()
            .find(|e| e.resource == resource && e.string == string && e.context == context)
    }

    /// Removes the entity together with its translations and suggestions.
    pub fn delete_entity(&mut self, id: u64) {
        self.entities.retain(|e| e.id != id);
        self.translations.retain(|t| t.source_entity != id);
        self.suggestions.retain(|s| s.source_entity != id);
    }

    // translations

    pub fn translation(&self, entity: u64, language: &str, rule: PluralRule) -> Option<&Translation> {
        self.translations
            .iter()
            .find(|t| t.source_entity == entity && t.language == language && t.rule == rule)
    }

    /// Inserts or updates a translation row. Returns true when a new row was
    /// created, false when an existing one changed.
    pub fn set_translation(
        &mut self,
        entity: u64,
        language: &str,
        rule: PluralRule,
        string: impl Into<String>,
        reviewed: bool,
    ) -> bool {
        let string = string.into();
        for t in &mut self.translations {
            if t.source_entity == entity && t.language == language && t.rule == rule {
                t.string = string;
                t.reviewed = reviewed;
                return false;
            }
        }
        self.translations.push(Translation {
            source_entity: entity,
            language: language.to_string(),
            rule,
            string,
            reviewed,
        });
        true
    }

    /// Removes one translation row. Returns true when a row existed.
    pub fn delete_translation(&mut self, entity: u64, language: &str, rule: PluralRule) -> bool {
        let before = self.translations.len();
        self.translations
            .retain(|t| !(t.source_entity == entity && t.language == language && t.rule == rule));
        self.translations.len() != before
    }

    /// Marks a stored row reviewed or not, when it exists.
    pub fn set_reviewed(&mut self, entity: u64, language: &str, rule: PluralRule, reviewed: bool) {
        for t in &mut self.translations {
            if t.source_entity == entity && t.language == language && t.rule == rule {
                t.reviewed = reviewed;
            }
        }
    }

    pub fn translations_for_entity(&self, entity: u64) -> Vec<&Translation> {
        self.translations
            .iter()
            .filter(|t| t.source_entity == entity)
            .collect()
    }

    /// Every translation of a resource in the given language.
    pub fn translations_for(&self, resource: &str, language: &str) -> Vec<&Translation> {
        let ids: Vec<u64> = self
            .entities
            .iter()
            .filter(|e| e.resource == resource)
            .map(|e| e.id)
            .collect();
        self.translations
            .iter()
            .filter(|t| t.language == language && ids.contains(&t.source_entity))
            .collect()
    }

    // suggestions

    /// Adds a suggestion unless an identical one already exists.
    pub fn add_suggestion(&mut self, entity: u64, language: &str, string: impl Into<String>) -> bool {
        let string = string.into();
        let exists = self.suggestions.iter().any(|s| {
            s.source_entity == entity && s.language == language && s.string == string
        });
        if exists {
            return false;
        }
        self.suggestions.push(Suggestion {
            source_entity: entity,
            language: language.to_string(),
            string,
        });
        true
    }

    pub fn suggestions_for(&self, entity: u64) -> Vec<&Suggestion> {
        self.suggestions
            .iter()
            .filter(|s| s.source_entity == entity)
            .collect()
    }

    // templates

    pub fn set_template(&mut self, resource: &str, template: impl Into<String>) {
        self.templates.insert(resource.to_string(), template.into());
    }

    pub fn template(&self, resource: &str) -> Option<&str> {
        self.templates.get(resource).map(String::as_str)
    }
}
