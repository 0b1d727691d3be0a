//! Template compilation.
//!
//! A stored template carries one hash marker per translatable slot. The
//! compiler builds the replacement table from the chosen translations
//! builder, runs every value through the decorator and substitutes the
//! markers. Markers without a table entry are left in place, so a missing
//! entity never breaks the output.

use std::collections::HashMap;

use crate::compilation::builders::{TranslationMap, TranslationsBuilder};
use crate::compilation::decorators::Decorator;
use crate::hash_tag::{HASH_REGEX, PLURAL_HASH_REGEX};
use crate::plural_rules::Language;
use crate::store::Store;
use crate::types::PluralRule;

pub struct CompileContext<'a> {
    pub store: &'a Store,
    pub resource: &'a str,
    pub language: &'a Language,
    pub builder: TranslationsBuilder,
    pub decorator: Decorator,
}

impl<'a> CompileContext<'a> {
    fn translations(&self) -> TranslationMap {
        self.builder
            .build(self.store, self.resource, &self.language.code)
    }
}

/// Compiles a template of a non-pluralized format.
pub fn compile_single(template: &str, ctx: &CompileContext<'_>) -> String {
    let translations = ctx.translations();
    let mut table = HashMap::new();
    for entity in ctx.store.entities_for(ctx.resource) {
        let value = translations
            .get(&entity.id)
            .and_then(|forms| forms.get(&PluralRule::Other))
            .map(String::as_str)
            .unwrap_or("");
        table.insert(
            format!("{}_tr", entity.string_hash),
            ctx.decorator.apply(value),
        );
    }
    substitute(&HASH_REGEX, template, &table)
}

/// Compiles a template of a pluralized format.
///
/// `adjust_plurals` is the format hook that rewrites each plural block of
/// the template to carry one marker per target-language slot, before the
/// markers are substituted.
pub fn compile_plural(
    template: &str,
    ctx: &CompileContext<'_>,
    adjust_plurals: impl Fn(&str) -> String,
) -> String {
    let translations = ctx.translations();
    let mut table = HashMap::new();
    for entity in ctx.store.entities_for(ctx.resource) {
        let forms = translations.get(&entity.id);
        if entity.pluralized {
            for (index, rule) in ctx.language.rules.iter().enumerate() {
                let value = forms
                    .and_then(|f| f.get(rule))
                    .map(String::as_str)
                    .unwrap_or("");
                table.insert(
                    format!("{}_pl_{}", entity.string_hash, index),
                    ctx.decorator.apply(value),
                );
            }
        } else {
            let value = forms
                .and_then(|f| f.get(&PluralRule::Other))
                .map(String::as_str)
                .unwrap_or("");
            table.insert(
                format!("{}_tr", entity.string_hash),
                ctx.decorator.apply(value),
            );
        }
    }
    let content = adjust_plurals(template);
    substitute(&PLURAL_HASH_REGEX, &content, &table)
}

fn substitute(regex: &regex::Regex, content: &str, table: &HashMap<String, String>) -> String {
    regex
        .replace_all(content, |caps: &regex::Captures| {
            table
                .get(&caps[0])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
