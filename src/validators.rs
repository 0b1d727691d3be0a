//! Per-string validators.
//!
//! A validator compares a new translation against the string it replaces
//! (the source string or a previous translation). Empty new strings always
//! pass, since deletions need no checks. Which validators run for which
//! format is driven by an explicit [`ValidatorConfig`].

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;
use crate::registry::Method;
use crate::types::PluralRule;

lazy_static! {
    /// printf-style conversion specifiers: `%s`, `%3$d`, `%(name)s`, `%%`.
    pub static ref PRINTF_REGEX: Regex = Regex::new(
        r"%((?:(?P<ord>\d+)\$|\((?P<key>\w+)\))?(?P<fullvar>[+#-]*(?:\d+)?(?:\.\d+)?(?:hh|h|l|ll)?(?P<type>[\w%])))"
    )
    .unwrap();

    static ref URL_REGEX: Regex = Regex::new(
        r"http[s]?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+"
    )
    .unwrap();

    static ref EMAIL_REGEX: Regex =
        Regex::new(r"([\w\-\.+]+@[\w\-]+\.+[\w\-]+)").unwrap();

    static ref NUMBER_REGEX: Regex = Regex::new(r"[-+]?[0-9]*\.?[0-9]+").unwrap();
}

/// Situation a validator runs in.
#[derive(Debug, Clone, Copy)]
pub struct ValidatorContext {
    pub source_nplurals: usize,
    pub target_nplurals: usize,
    pub rule: PluralRule,
}

impl Default for ValidatorContext {
    fn default() -> Self {
        ValidatorContext {
            source_nplurals: 2,
            target_nplurals: 2,
            rule: PluralRule::Other,
        }
    }
}

/// The available per-string checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    Space,
    MatchingBrackets,
    Urls,
    EmailAddresses,
    NewLineAtBeginning,
    NewLineAtEnd,
    Numbers,
    PrintfFormatNumber,
    PrintfFormatPluralizedNumber,
    PrintfFormatSource,
    PrintfFormatPluralizedSource,
    PrintfFormatTranslation,
}

impl Validator {
    /// Runs the check. `old` is the string being replaced, `new` the
    /// incoming translation.
    pub fn check(
        self,
        old: &str,
        new: &str,
        ctx: &ValidatorContext,
    ) -> Result<(), ValidationError> {
        if new.is_empty() || !self.precondition(ctx) {
            return Ok(());
        }
        match self {
            Validator::Space => check_space(new),
            Validator::MatchingBrackets => check_brackets(old, new),
            Validator::Urls => check_urls(old, new),
            Validator::EmailAddresses => check_emails(old, new),
            Validator::NewLineAtBeginning => check_newline_at_beginning(old, new),
            Validator::NewLineAtEnd => check_newline_at_end(old, new),
            Validator::Numbers => check_numbers(old, new),
            Validator::PrintfFormatNumber | Validator::PrintfFormatPluralizedNumber => {
                check_printf_count(old, new)
            }
            Validator::PrintfFormatSource | Validator::PrintfFormatPluralizedSource => {
                check_printf_subset(old, new, "translation")
            }
            Validator::PrintfFormatTranslation => check_printf_subset(new, old, "source string"),
        }
    }

    fn precondition(self, ctx: &ValidatorContext) -> bool {
        match self {
            Validator::PrintfFormatNumber => ctx.source_nplurals == ctx.target_nplurals,
            Validator::PrintfFormatPluralizedNumber => {
                ctx.rule != PluralRule::One && ctx.source_nplurals == ctx.target_nplurals
            }
            Validator::PrintfFormatPluralizedSource => ctx.rule != PluralRule::One,
            _ => true,
        }
    }
}

fn check_space(new: &str) -> Result<(), ValidationError> {
    if new.trim().is_empty() {
        return Err(ValidationError(
            "Translation string only contains whitespaces.".into(),
        ));
    }
    Ok(())
}

fn check_brackets(old: &str, new: &str) -> Result<(), ValidationError> {
    for c in ['[', '{', '(', ')', '}', ']'] {
        if new.matches(c).count() != old.matches(c).count() {
            return Err(ValidationError(format!(
                "Translation string doesn't contain the same number of '{}' as the source string.",
                c
            )));
        }
    }
    Ok(())
}

fn check_urls(old: &str, new: &str) -> Result<(), ValidationError> {
    for m in URL_REGEX.find_iter(old) {
        if !new.contains(m.as_str()) {
            return Err(ValidationError(format!(
                "The following url is either missing from the translation or has been translated: '{}'.",
                m.as_str()
            )));
        }
    }
    Ok(())
}

fn check_emails(old: &str, new: &str) -> Result<(), ValidationError> {
    for m in EMAIL_REGEX.find_iter(old) {
        if !new.contains(m.as_str()) {
            return Err(ValidationError(format!(
                "The following email is either missing from the translation or has been translated: '{}'.",
                m.as_str()
            )));
        }
    }
    Ok(())
}

fn check_newline_at_beginning(old: &str, new: &str) -> Result<(), ValidationError> {
    let old_has = old.starts_with('\n');
    let new_has = new.starts_with('\n');
    if old_has != new_has {
        let msg = if old_has {
            "Translation must start with a newline (\\n)"
        } else {
            "Translation should not start with a newline (\\n)"
        };
        return Err(ValidationError(msg.into()));
    }
    Ok(())
}

fn check_newline_at_end(old: &str, new: &str) -> Result<(), ValidationError> {
    let old_has = old.ends_with('\n');
    let new_has = new.ends_with('\n');
    if old_has != new_has {
        let msg = if old_has {
            "Translation must end with a newline (\\n)"
        } else {
            "Translation should not end with a newline (\\n)"
        };
        return Err(ValidationError(msg.into()));
    }
    Ok(())
}

fn check_numbers(old: &str, new: &str) -> Result<(), ValidationError> {
    for m in NUMBER_REGEX.find_iter(old) {
        if new.contains(m.as_str()) {
            continue;
        }
        // Accept a decimal-comma rendition of the same number.
        let swapped = m.as_str().replacen('.', ",", 1);
        if !new.contains(&swapped) {
            return Err(ValidationError(format!(
                "Number {} is in the source string but not in the translation.",
                swapped
            )));
        }
    }
    Ok(())
}

fn check_printf_count(old: &str, new: &str) -> Result<(), ValidationError> {
    let old_count = PRINTF_REGEX.find_iter(old).count();
    let new_count = PRINTF_REGEX.find_iter(new).count();
    if old_count != new_count {
        return Err(ValidationError(
            "The number of arguments seems to differ between the source string and the translation."
                .into(),
        ));
    }
    Ok(())
}

/// Checks that every specifier of `from` shows up in `into`.
fn check_printf_subset(from: &str, into: &str, where_: &str) -> Result<(), ValidationError> {
    let into_caps: Vec<regex::Captures> = PRINTF_REGEX.captures_iter(into).collect();
    let mut into_types: Vec<&str> = into_caps
        .iter()
        .filter_map(|c| c.name("type").map(|m| m.as_str()))
        .collect();
    let into_keys: Vec<Option<&str>> = into_caps
        .iter()
        .map(|c| c.name("key").map(|m| m.as_str()))
        .collect();

    for cap in PRINTF_REGEX.captures_iter(from) {
        let key = cap.name("key").map(|m| m.as_str());
        if !into_keys.contains(&key) {
            return Err(ValidationError(format!(
                "The expression '{}' is not present in the {}.",
                &cap[0], where_
            )));
        }
        let spec = cap.name("type").map(|m| m.as_str()).unwrap_or_default();
        match into_types.iter().position(|t| *t == spec) {
            Some(pos) => {
                into_types.remove(pos);
            }
            None => {
                return Err(ValidationError(format!(
                    "The expression '{}' is not present in the {}.",
                    &cap[0], where_
                )));
            }
        }
    }
    Ok(())
}

/// Ordered validator lists per method, with a fallback for methods that
/// have no entry of their own.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub errors: HashMap<Method, Vec<Validator>>,
    pub warnings: HashMap<Method, Vec<Validator>>,
    pub default_errors: Vec<Validator>,
    pub default_warnings: Vec<Validator>,
}

impl ValidatorConfig {
    pub fn error_validators(&self, method: Method) -> &[Validator] {
        self.errors.get(&method).unwrap_or(&self.default_errors)
    }

    pub fn warning_validators(&self, method: Method) -> &[Validator] {
        self.warnings.get(&method).unwrap_or(&self.default_warnings)
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        use Validator::*;
        let mut errors = HashMap::new();
        errors.insert(
            Method::Po,
            vec![
                NewLineAtBeginning,
                NewLineAtEnd,
                PrintfFormatNumber,
                PrintfFormatSource,
                PrintfFormatTranslation,
            ],
        );
        let mut warnings = HashMap::new();
        warnings.insert(
            Method::Po,
            vec![
                Space,
                MatchingBrackets,
                Urls,
                EmailAddresses,
                Numbers,
                PrintfFormatPluralizedNumber,
                PrintfFormatPluralizedSource,
            ],
        );
        ValidatorConfig {
            errors,
            warnings,
            default_errors: vec![NewLineAtBeginning, NewLineAtEnd],
            default_warnings: vec![Space, MatchingBrackets, Urls, EmailAddresses, Numbers],
        }
    }
}
