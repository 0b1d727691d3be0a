//! Suggestion conversion between vanished and newly added entities.
//!
//! When a source file update removes entities and adds new ones, translations
//! of removed entities whose source text is close enough to a new entity are
//! kept alive as suggestions instead of being dropped on the floor.

use tracing::debug;

use crate::store::Store;
use crate::types::PluralRule;

/// Bounds on the similarity pass.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionPolicy {
    /// Skip the whole pass when `old * new` pair count reaches this.
    pub max_iterations: usize,
    /// Pairs with a percent difference below this qualify.
    pub max_distance: f64,
}

impl Default for SuggestionPolicy {
    fn default() -> Self {
        SuggestionPolicy {
            max_iterations: 10_000,
            max_distance: 30.0,
        }
    }
}

/// Levenshtein distance in characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Edit distance as a percentage of the longer string.
///
/// Two empty strings are identical, so the difference is zero.
pub fn percent_diff(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    100.0 * levenshtein(a, b) as f64 / longest as f64
}

/// Converts translations of `old_ids` entities into suggestions on similar
/// `new_ids` entities.
///
/// Both id lists must belong to the given resource. The pass is skipped
/// entirely when the pair count reaches the policy ceiling.
pub fn convert_to_suggestions(
    store: &mut Store,
    resource: &str,
    old_ids: &[u64],
    new_ids: &[u64],
    policy: &SuggestionPolicy,
) {
    let iterations = old_ids.len() * new_ids.len();
    if iterations >= policy.max_iterations {
        debug!(
            resource,
            iterations, "skipping suggestion conversion, pair count over budget"
        );
        return;
    }
    let source_language = match store.resource(resource) {
        Some(r) => r.source_language.clone(),
        None => return,
    };
    for &old_id in old_ids {
        for &new_id in new_ids {
            let old_source = store
                .translation(old_id, &source_language, PluralRule::Other)
                .map(|t| t.string.clone());
            let new_source = store
                .translation(new_id, &source_language, PluralRule::Other)
                .map(|t| t.string.clone());
            // Source language translations should always exist, but a
            // half-saved entity must not abort the pass.
            let (Some(old_source), Some(new_source)) = (old_source, new_source) else {
                continue;
            };
            if percent_diff(&old_source, &new_source) < policy.max_distance {
                copy_as_suggestions(store, old_id, new_id, &source_language);
                break;
            }
        }
    }
}

/// Copies every non-source-language translation of `from` onto `to` as a
/// suggestion. Identical existing suggestions stay as they are.
fn copy_as_suggestions(store: &mut Store, from: u64, to: u64, source_language: &str) {
    let translations: Vec<(String, String)> = store
        .translations_for_entity(from)
        .into_iter()
        .filter(|t| t.rule == PluralRule::Other && t.language != source_language)
        .map(|t| (t.language.clone(), t.string.clone()))
        .collect();
    for (language, string) in translations {
        store.add_suggestion(to, &language, string);
    }
}
