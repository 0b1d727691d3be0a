//! Apple `.strings` files.
//!
//! Entries are `"key" = "value";` pairs, optionally preceded by a
//! `/* comment */` block; bare-word keys are allowed. Anything between
//! entries other than comments and whitespace is a parse error. Input files
//! are frequently UTF-16 with a BOM; decoding happens at the binding layer
//! and a leading BOM character is carried into the template untouched.

use lazy_static::lazy_static;
use regex::Regex;

use crate::collections::GenericTranslation;
use crate::compilation::{Mode, TranslationsBuilder};
use crate::error::Error;
use crate::formats::ParseOutcome;
use crate::hash_tag::hash_tag;
use crate::registry::Method;

lazy_static! {
    static ref ENTRY: Regex = Regex::new(
        r#"(?s)(?:(?:/\*(?P<comment>(?:[^*]|(?:\*+[^*/]))*\**)\*/[ \t]*\n)|[\r\n]|\r)?(?P<line>(?:(?:"(?P<key>[^"\\]*(?:\\.[^"\\]*)*)")|(?P<property>\w+))\s*=\s*"(?P<value>[^"\\]*(?:\\.[^"\\]*)*)"\s*;)"#
    )
    .unwrap();

    static ref COMMENT: Regex = Regex::new(r"//[^\n]*\n|/\*(?:.|[\r\n])*?\*/").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    static ref MARKED_ENTRY: Regex = Regex::new(
        r#"(?s)(?P<prefix>(?:(?:"[^"\\]*(?:\\.[^"\\]*)*")|\w+)\s*=\s*"[^"\\]*(?:\\.[^"\\]*)*)_txss(?P<suffix>"\s*;)"#
    )
    .unwrap();
}

pub fn escape(s: &str) -> String {
    s.replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

fn unescape_key(s: &str) -> String {
    s.replace("\\\n", "")
}

fn unescape(s: &str) -> String {
    s.replace("\\\n", "")
        .replace("\\\"", "\"")
        .replace("\\n", "\n")
        .replace("\\r", "\r")
}

/// Consumes comments and whitespace between entries, appending them to the
/// template when one is being built. Anything else is a syntax error.
fn consume_gap(
    content: &str,
    mut pos: usize,
    limit: usize,
    template: Option<&mut String>,
) -> Result<usize, Error> {
    let mut template = template;
    while pos < limit {
        let m = COMMENT
            .find_at(content, pos)
            .filter(|m| m.start() == pos && m.end() <= limit)
            .or_else(|| {
                WHITESPACE
                    .find_at(content, pos)
                    .filter(|m| m.start() == pos)
            });
        let Some(m) = m else {
            return Err(Error::parse_error(
                Method::Strings,
                format!("invalid syntax: {}", &content[pos..limit]),
            ));
        };
        let end = m.end().min(limit);
        if let Some(buf) = template.as_deref_mut() {
            buf.push_str(&content[pos..end]);
        }
        if end == pos {
            break;
        }
        pos = end;
    }
    Ok(pos)
}

pub fn parse(content: &str, is_source: bool) -> Result<ParseOutcome, Error> {
    let (prefix, body) = match content.strip_prefix('\u{feff}') {
        Some(rest) => ("\u{feff}", rest),
        None => ("", content),
    };

    let mut outcome = ParseOutcome::default();
    let mut template = String::new();
    let mut end = 0;
    let mut order = 0;

    for caps in ENTRY.captures_iter(body) {
        let whole = caps.get(0).map(|m| m.end()).unwrap_or(end);
        let line = match caps.name("line") {
            Some(m) => m,
            None => continue,
        };
        let start = line.start();
        end = consume_gap(
            body,
            end,
            start,
            if is_source { Some(&mut template) } else { None },
        )?;
        end = whole;

        let key_raw = caps
            .name("key")
            .or_else(|| caps.name("property"))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let key = unescape_key(key_raw);
        let value = caps.name("value").map(|m| m.as_str()).unwrap_or_default();
        let comment = caps.name("comment").map(|m| m.as_str()).unwrap_or_default();

        if is_source {
            if value.trim().is_empty() {
                template.push_str(line.as_str());
                continue;
            }
            let span = caps
                .name("value")
                .map(|m| (m.start(), m.end()))
                .unwrap_or((start, start));
            template.push_str(&body[start..span.0]);
            template.push_str(&hash_tag(&key, ""));
            template.push_str("_tr");
            template.push_str(&body[span.1..end]);
        }

        let mut gt = GenericTranslation::new(key, unescape(value), "");
        gt.comment = comment.to_string();
        gt.order = order;
        order += 1;
        outcome.stringset.add(gt);
    }

    consume_gap(
        body,
        end,
        body.len(),
        if is_source { Some(&mut template) } else { None },
    )?;

    if is_source {
        outcome.template = Some(format!("{}{}", prefix, template));
    }
    Ok(outcome)
}

/// Offline translation downloads fall back to marked source strings; plain
/// and reviewed downloads carry translations only.
pub fn builder_for(mode: Mode) -> TranslationsBuilder {
    if mode.contains(Mode::TRANSLATED) {
        TranslationsBuilder::MarkedSource
    } else if mode.contains(Mode::REVIEWED) {
        TranslationsBuilder::Reviewed
    } else {
        TranslationsBuilder::All
    }
}

/// Wraps entries holding marked source strings in comments.
pub fn post_compile(compiled: &str) -> String {
    MARKED_ENTRY
        .replace_all(compiled, "/* $prefix$suffix */")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PluralRule;

    #[test]
    fn test_parse_source_entries() {
        let content = "/* greeting */\n\"hello\" = \"Hello\";\n\nbye = \"Goodbye\";\n";
        let outcome = parse(content, true).unwrap();
        assert_eq!(outcome.stringset.len(), 2);
        let hello = outcome.stringset.get("hello", "", PluralRule::Other).unwrap();
        assert_eq!(hello.translation, "Hello");
        assert_eq!(hello.comment, " greeting ");
        let template = outcome.template.unwrap();
        assert!(template.contains(&format!("\"hello\" = \"{}_tr\";", hash_tag("hello", ""))));
        assert!(template.contains("/* greeting */"));
        assert!(template.contains(&format!("bye = \"{}_tr\";", hash_tag("bye", ""))));
    }

    #[test]
    fn test_parse_escaped_quotes() {
        let content = "\"k\" = \"say \\\"hi\\\"\";\n";
        let outcome = parse(content, false).unwrap();
        let gt = outcome.stringset.get("k", "", PluralRule::Other).unwrap();
        assert_eq!(gt.translation, "say \"hi\"");
    }

    #[test]
    fn test_invalid_syntax_rejected() {
        let content = "\"k\" = \"v\";\ngarbage here\n";
        let err = parse(content, true).unwrap_err();
        assert!(err.to_string().contains("invalid syntax"));
    }

    #[test]
    fn test_double_slash_comments_allowed() {
        let content = "// top note\n\"k\" = \"v\";\n";
        let outcome = parse(content, true).unwrap();
        assert_eq!(outcome.stringset.len(), 1);
        assert!(outcome.template.unwrap().starts_with("// top note"));
    }

    #[test]
    fn test_bom_preserved_in_template() {
        let content = "\u{feff}\"k\" = \"v\";\n";
        let outcome = parse(content, true).unwrap();
        assert!(outcome.template.unwrap().starts_with('\u{feff}'));
    }

    #[test]
    fn test_empty_value_kept_for_translations() {
        let content = "\"k\" = \"\";\n";
        let outcome = parse(content, false).unwrap();
        let gt = outcome.stringset.get("k", "", PluralRule::Other).unwrap();
        assert_eq!(gt.translation, "");
    }

    #[test]
    fn test_escape_round_trip() {
        let original = "line one\nwith \"quotes\"";
        assert_eq!(unescape(&escape(original)), original);
    }

    #[test]
    fn test_builder_policy() {
        assert_eq!(builder_for(Mode::DEFAULT), TranslationsBuilder::All);
        assert_eq!(builder_for(Mode::REVIEWED), TranslationsBuilder::Reviewed);
        assert_eq!(
            builder_for(Mode::TRANSLATED),
            TranslationsBuilder::MarkedSource
        );
        assert_eq!(
            builder_for(Mode::TRANSLATED | Mode::REVIEWED),
            TranslationsBuilder::MarkedSource
        );
    }

    #[test]
    fn test_post_compile_wraps_marked_entries() {
        let compiled = "\"done\" = \"Fertig\";\n\"pending\" = \"Pending_txss\";\n";
        let out = post_compile(compiled);
        assert!(out.contains("\"done\" = \"Fertig\";"));
        assert!(out.contains("/* \"pending\" = \"Pending\"; */"));
    }
}
