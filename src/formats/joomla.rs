//! Joomla INI language files.
//!
//! Two dialects share the `KEY=value` syntax. Joomla 1.5 writes bare values,
//! `&quot;` for double quotes and `#` comments; 1.6 and later wraps values in
//! double quotes, escapes inner quotes as `"_QQ_"` and comments with `;`.
//! The dialect is sniffed from the first parseable line.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::collections::GenericTranslation;
use crate::compilation::{Mode, TranslationsBuilder};
use crate::error::Error;
use crate::formats::{ParseOutcome, detect_linesep};
use crate::hash_tag::hash_tag;

lazy_static! {
    static ref MARKED_LINE_OLD: Regex = Regex::new(r"(.*)_txss").unwrap();
    static ref MARKED_LINE_NEW: Regex = Regex::new(r#"(.*)_txss""#).unwrap();
}

/// The two generations of the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Joomla 1.5: bare values, `#` comments.
    #[default]
    Old,
    /// Joomla 1.6+: quoted values, `;` comments.
    New,
}

impl Dialect {
    pub fn comment_char(self) -> char {
        match self {
            Dialect::Old => '#',
            Dialect::New => ';',
        }
    }
}

/// Sniffs the dialect from the first `KEY=value` line.
///
/// Values wrapped in double quotes mean the 1.6 dialect. Content without a
/// single parseable line falls back to the old dialect.
pub fn detect_dialect(content: &str) -> Dialect {
    for line in content.lines() {
        if line.is_empty() || line.starts_with(['#', ';']) {
            continue;
        }
        if let Some((_, value)) = line.split_once('=') {
            let value = value.trim();
            if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
                return Dialect::New;
            }
            return Dialect::Old;
        }
    }
    Dialect::default()
}

pub fn parse(content: &str, is_source: bool) -> Result<ParseOutcome, Error> {
    let linesep = detect_linesep(content);
    let dialect = detect_dialect(content);
    let mut outcome = ParseOutcome::default();
    let mut template = String::new();
    let mut comment = String::new();
    let mut order = 0;

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(['#', ';']) {
            if is_source {
                template.push_str(line);
                template.push_str(linesep);
            }
            if line.starts_with(['#', ';']) {
                comment = line[1..].to_string();
            } else {
                comment.clear();
            }
            continue;
        }
        let Some((raw_key, raw_value)) = line.split_once('=') else {
            warn!(line, "could not parse line, skipping");
            continue;
        };
        let key = raw_key.trim();
        let trimmed = raw_value.trim();
        let value = match dialect {
            Dialect::New if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') => {
                &trimmed[1..trimmed.len() - 1]
            }
            _ => trimmed,
        };

        if is_source {
            if value.trim().is_empty() {
                template.push_str(line);
                template.push_str(linesep);
                continue;
            }
            let marker = format!("{}_tr", hash_tag(key, ""));
            let remainder = &line[raw_key.len()..];
            template.push_str(raw_key);
            template.push_str(&remainder.replacen(value, &marker, 1));
            template.push_str(linesep);
        }

        let mut gt = GenericTranslation::new(key, unescape(value, dialect), "");
        gt.comment = comment.clone();
        gt.order = order;
        order += 1;
        outcome.stringset.add(gt);
        comment.clear();
    }

    if is_source {
        if let Some(stripped) = template.strip_suffix(linesep) {
            template.truncate(stripped.len());
        }
        outcome.template = Some(template);
    }
    Ok(outcome)
}

pub fn escape_old(s: &str) -> String {
    s.replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('"', "&quot;")
}

pub fn escape_new(s: &str) -> String {
    s.replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('"', "\"_QQ_\"")
}

fn unescape(s: &str, dialect: Dialect) -> String {
    let s = match dialect {
        Dialect::Old => s.replace("&quot;", "\""),
        Dialect::New => s.replace("&quot;", "\"").replace("\"_QQ_\"", "\""),
    };
    s.replace("\\n", "\n").replace("\\r", "\r")
}

pub fn builder_for(mode: Mode) -> TranslationsBuilder {
    if mode.contains(Mode::REVIEWED) {
        TranslationsBuilder::ReviewedMarkedSource
    } else {
        TranslationsBuilder::MarkedSource
    }
}

/// Comments out lines whose value is a marked source string, using the
/// dialect's comment character.
pub fn post_compile(compiled: &str, dialect: Dialect) -> String {
    match dialect {
        Dialect::Old => MARKED_LINE_OLD
            .replace_all(compiled, "# $1")
            .into_owned(),
        Dialect::New => MARKED_LINE_NEW
            .replace_all(compiled, "; $1\"")
            .into_owned(),
    }
}
