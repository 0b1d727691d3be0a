//! The per-file orchestration layer.
//!
//! A [`Handler`] binds content, a language and a resource, parses the file
//! through the format module its [`Method`] dispatches to, saves the result
//! into a [`Store`] transactionally, and compiles stored templates back into
//! files. Handlers never mutate a store on a failed save: all work happens
//! on a clone that is swapped in on success.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::Path;

use encoding_rs_io::DecodeReaderBytes;

use crate::collections::StringSet;
use crate::compilation::{
    CompileContext, Decorator, EscapeFn, Mode, TranslationsBuilder, compile_plural,
    compile_single,
};
use crate::error::Error;
use crate::formats::{joomla, po, properties, qt, strings};
use crate::plural_rules::Language;
use crate::pseudo::PseudoType;
use crate::registry::Method;
use crate::store::Store;
use crate::suggestions::{SuggestionPolicy, convert_to_suggestions};
use crate::types::{PluralRule, Resource, SourceEntity};
use crate::validators::{ValidatorConfig, ValidatorContext};

/// What a save did, handed to registered observers after the store swap.
#[derive(Debug, Clone)]
pub struct SaveEvent {
    pub resource: String,
    pub language: Option<String>,
    pub is_source: bool,
    pub added: usize,
    pub updated: usize,
}

type SaveObserver = Box<dyn Fn(&SaveEvent)>;

pub struct Handler {
    method: Method,
    content: Option<String>,
    filename: Option<String>,
    language: Option<Language>,
    resource: Option<String>,
    stringset: StringSet,
    suggestions: StringSet,
    template: Option<String>,
    warnings: BTreeMap<String, String>,
    observers: Vec<SaveObserver>,
    suggestion_policy: SuggestionPolicy,
}

impl Handler {
    pub fn new(method: Method) -> Self {
        Handler {
            method,
            content: None,
            filename: None,
            language: None,
            resource: None,
            stringset: StringSet::new(),
            suggestions: StringSet::new(),
            template: None,
            warnings: BTreeMap::new(),
            observers: Vec::new(),
            suggestion_policy: SuggestionPolicy::default(),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn bind_content(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
    }

    /// Reads and decodes a file. A byte-order mark selects the transcoding
    /// (UTF-16 Apple `.strings` files arrive this way); without one the
    /// content must be valid UTF-8.
    pub fn bind_file(&mut self, path: &Path) -> Result<(), Error> {
        let file = std::fs::File::open(path)?;
        let mut decoder = DecodeReaderBytes::new(file);
        let mut content = String::new();
        decoder.read_to_string(&mut content)?;
        self.content = Some(content);
        self.filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(())
    }

    /// Binds the language the file is in. Only POT handlers accept `None`,
    /// since a template has no language of its own.
    pub fn set_language(&mut self, language: Option<Language>) -> Result<(), Error> {
        if language.is_none() && self.method != Method::Pot {
            return Err(Error::MissingLanguage);
        }
        self.language = language;
        Ok(())
    }

    pub fn bind_resource(&mut self, slug: impl Into<String>) {
        self.resource = Some(slug.into());
    }

    /// Registers an after-save callback.
    pub fn on_save(&mut self, observer: impl Fn(&SaveEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn set_suggestion_policy(&mut self, policy: SuggestionPolicy) {
        self.suggestion_policy = policy;
    }

    pub fn stringset(&self) -> &StringSet {
        &self.stringset
    }

    pub fn suggestions(&self) -> &StringSet {
        &self.suggestions
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Messages accumulated by the last parse and save, keyed by topic.
    pub fn warnings(&self) -> &BTreeMap<String, String> {
        &self.warnings
    }

    /// Parses the bound content.
    ///
    /// Source files also produce the hash-keyed template. For formats with
    /// plural support the bound language drives the plural slot mapping, so
    /// source files must be bound to the resource's source language.
    pub fn parse_file(&mut self, is_source: bool) -> Result<(), Error> {
        let content = self.content.as_deref().ok_or(Error::MissingContent)?;
        if !is_source && self.language.is_none() && self.method != Method::Pot {
            return Err(Error::MissingLanguage);
        }
        let outcome = match self.method {
            Method::Po | Method::Pot => po::parse(content, is_source, self.language.as_ref())?,
            Method::Properties => properties::parse(content, is_source, properties::Dialect::Java)?,
            Method::MozillaProperties => {
                properties::parse(content, is_source, properties::Dialect::Mozilla)?
            }
            Method::Joomla => joomla::parse(content, is_source)?,
            Method::Strings => strings::parse(content, is_source)?,
            Method::Qt => {
                let language = self.language.as_ref().ok_or(Error::MissingLanguage)?;
                qt::parse(content, is_source, language)?
            }
        };
        self.stringset = outcome.stringset;
        self.suggestions = outcome.suggestions;
        self.template = outcome.template;
        self.warnings = outcome.warnings;
        Ok(())
    }

    /// Saves the parsed strings into the store.
    ///
    /// The whole call is transactional: it runs on a clone of the store and
    /// the clone replaces the original only when everything succeeded.
    /// Returns `(added, updated)` counts of source strings; importing the
    /// same file twice yields `(0, 0)`.
    pub fn save2db(
        &mut self,
        store: &mut Store,
        is_source: bool,
        config: &ValidatorConfig,
    ) -> Result<(usize, usize), Error> {
        let slug = self.resource.clone().ok_or(Error::MissingResource)?;
        let mut scratch = store.clone();
        let resource = scratch
            .resource(&slug)
            .cloned()
            .ok_or(Error::MissingResource)?;

        let (added, updated, warnings) = if is_source {
            self.save_source(&mut scratch, &resource)?
        } else {
            self.save_translations(&mut scratch, &resource, config)?
        };

        if let Some(language) = self.language.as_ref() {
            for gt in self.suggestions.iter() {
                if gt.translation.is_empty() {
                    continue;
                }
                if let Some(id) = scratch
                    .find_entity(&slug, &gt.source_entity, &gt.context)
                    .map(|e| e.id)
                {
                    scratch.add_suggestion(id, &language.code, gt.translation.clone());
                }
            }
        }

        *store = scratch;
        self.warnings.extend(warnings);

        let event = SaveEvent {
            resource: slug,
            language: self.language.as_ref().map(|l| l.code.clone()),
            is_source,
            added,
            updated,
        };
        for observer in &self.observers {
            observer(&event);
        }
        Ok((added, updated))
    }

    fn save_source(
        &self,
        store: &mut Store,
        resource: &Resource,
    ) -> Result<(usize, usize, Vec<(String, String)>), Error> {
        let slug = resource.slug.as_str();
        let language = resource.source_language.as_str();
        let previous_ids: Vec<u64> = store.entities_for(slug).iter().map(|e| e.id).collect();

        let mut seen: HashSet<u64> = HashSet::new();
        let mut new_ids: Vec<u64> = Vec::new();
        let mut added = 0;
        let mut updated = 0;

        for gt in self.stringset.iter() {
            let entity_id = match store
                .find_entity(slug, &gt.source_entity, &gt.context)
                .map(|e| e.id)
            {
                Some(id) => {
                    if seen.insert(id) {
                        if let Some(entity) = store.entity_mut(id) {
                            entity.pluralized = gt.pluralized;
                            entity.developer_comment = gt.comment.clone();
                            entity.occurrences = gt.occurrences.clone();
                            entity.flags = gt.flags.clone();
                            entity.order = gt.order;
                        }
                    }
                    id
                }
                None => {
                    let id = store.allocate_entity_id();
                    let mut entity =
                        SourceEntity::new(id, slug, gt.source_entity.clone(), gt.context.clone());
                    entity.pluralized = gt.pluralized;
                    entity.developer_comment = gt.comment.clone();
                    entity.occurrences = gt.occurrences.clone();
                    entity.flags = gt.flags.clone();
                    entity.order = gt.order;
                    store.insert_entity(entity);
                    seen.insert(id);
                    new_ids.push(id);
                    id
                }
            };

            let previous = store
                .translation(entity_id, language, gt.rule)
                .map(|t| t.string.clone());
            match previous {
                None => {
                    store.set_translation(entity_id, language, gt.rule, gt.translation.clone(), false);
                    if gt.rule == PluralRule::Other {
                        added += 1;
                    }
                }
                Some(old) if old != gt.translation => {
                    store.set_translation(entity_id, language, gt.rule, gt.translation.clone(), false);
                    if gt.rule == PluralRule::Other {
                        updated += 1;
                    }
                }
                Some(_) => {}
            }
        }

        let old_ids: Vec<u64> = previous_ids
            .into_iter()
            .filter(|id| !seen.contains(id))
            .collect();
        convert_to_suggestions(store, slug, &old_ids, &new_ids, &self.suggestion_policy);
        for id in &old_ids {
            store.delete_entity(*id);
        }

        if let Some(template) = &self.template {
            store.set_template(slug, template.clone());
        }
        Ok((added, updated, Vec::new()))
    }

    fn save_translations(
        &self,
        store: &mut Store,
        resource: &Resource,
        config: &ValidatorConfig,
    ) -> Result<(usize, usize, Vec<(String, String)>), Error> {
        let slug = resource.slug.as_str();
        let language = self.language.as_ref().ok_or(Error::MissingLanguage)?;
        let ctx_base = ValidatorContext {
            source_nplurals: Language::from_code(&resource.source_language).nplurals(),
            target_nplurals: language.nplurals(),
            rule: PluralRule::Other,
        };
        let error_validators = config.error_validators(self.method);
        let warning_validators = config.warning_validators(self.method);

        let mut added = 0;
        let mut updated = 0;
        let mut warnings: Vec<(String, String)> = Vec::new();

        for gt in self.stringset.iter() {
            // Strings with no matching source entity are silently dropped.
            let Some(id) = store
                .find_entity(slug, &gt.source_entity, &gt.context)
                .map(|e| e.id)
            else {
                continue;
            };

            // An empty translation deletes the stored row for the slot.
            if gt.translation.is_empty() {
                store.delete_translation(id, &language.code, gt.rule);
                continue;
            }

            // Validators compare against the stored source-language text of
            // the same plural slot, not the entity key. A slot the source
            // language does not declare falls back to the Other form.
            let source_string = store
                .translation(id, &resource.source_language, gt.rule)
                .or_else(|| store.translation(id, &resource.source_language, PluralRule::Other))
                .map(|t| t.string.clone())
                .unwrap_or_default();

            let ctx = ValidatorContext {
                rule: gt.rule,
                ..ctx_base
            };
            let mut blocked = false;
            for validator in error_validators {
                if let Err(err) = validator.check(&source_string, &gt.translation, &ctx) {
                    warnings.push((format!("{}#{}", gt.source_entity, gt.rule), err.0));
                    blocked = true;
                    break;
                }
            }
            if blocked {
                continue;
            }
            for validator in warning_validators {
                if let Err(err) = validator.check(&source_string, &gt.translation, &ctx) {
                    warnings.push((format!("{}#{}", gt.source_entity, gt.rule), err.0));
                }
            }

            let previous = store
                .translation(id, &language.code, gt.rule)
                .map(|t| t.string.clone());
            match previous {
                None => {
                    store.set_translation(id, &language.code, gt.rule, gt.translation.clone(), false);
                    if gt.rule == PluralRule::Other {
                        added += 1;
                    }
                }
                Some(old) if old != gt.translation => {
                    store.set_translation(id, &language.code, gt.rule, gt.translation.clone(), false);
                    if gt.rule == PluralRule::Other {
                        updated += 1;
                    }
                }
                Some(_) => {}
            }
        }
        Ok((added, updated, warnings))
    }

    /// Compiles the stored template of the bound resource.
    ///
    /// Missing translations never fail a compile; the builder policy of the
    /// format decides whether they come out empty, as marked source strings,
    /// or are dropped by a post-compile step.
    pub fn compile(
        &self,
        store: &Store,
        mode: Mode,
        pseudo: Option<PseudoType>,
    ) -> Result<Vec<u8>, Error> {
        let slug = self.resource.as_deref().ok_or(Error::MissingResource)?;
        let resource = store.resource(slug).ok_or(Error::MissingResource)?;
        let template = store
            .template(slug)
            .ok_or_else(|| Error::NoTemplate(slug.to_string()))?;

        // POT downloads compile against the source language with no
        // translations at all.
        let is_pot = self.method == Method::Pot;
        let language = if is_pot {
            Language::from_code(&resource.source_language)
        } else {
            self.language.clone().ok_or(Error::MissingLanguage)?
        };

        let joomla_dialect = joomla::detect_dialect(template);
        let escape: EscapeFn = match self.method {
            Method::Po | Method::Pot => po::escape,
            Method::Properties => properties::escape_java,
            Method::MozillaProperties => properties::escape_mozilla,
            Method::Joomla => match joomla_dialect {
                joomla::Dialect::Old => joomla::escape_old,
                joomla::Dialect::New => joomla::escape_new,
            },
            Method::Strings => strings::escape,
            Method::Qt => qt::escape,
        };
        let builder = match self.method {
            Method::Po => po::builder_for(mode),
            Method::Pot => TranslationsBuilder::Empty,
            Method::Properties | Method::MozillaProperties => properties::builder_for(mode),
            Method::Joomla => joomla::builder_for(mode),
            Method::Strings => strings::builder_for(mode),
            Method::Qt => qt::builder_for(mode),
        };
        let decorator = if is_pot {
            Decorator::Empty
        } else {
            match pseudo {
                Some(pseudo) => Decorator::Pseudo { escape, pseudo },
                None => Decorator::Normal { escape },
            }
        };
        let ctx = CompileContext {
            store,
            resource: slug,
            language: &language,
            builder,
            decorator,
        };

        let compiled = match self.method {
            Method::Po => compile_plural(template, &ctx, |t| po::adjust_plurals(t, &language)),
            Method::Pot => compile_plural(template, &ctx, po::adjust_pot),
            Method::Qt => {
                let out = compile_plural(template, &ctx, |t| qt::adjust_plurals(t, &language));
                qt::post_compile(&out)
            }
            Method::Properties | Method::MozillaProperties => {
                properties::post_compile(&compile_single(template, &ctx))
            }
            Method::Joomla => {
                joomla::post_compile(&compile_single(template, &ctx), joomla_dialect)
            }
            Method::Strings => strings::post_compile(&compile_single(template, &ctx)),
        };
        Ok(compiled.into_bytes())
    }
}
