//! Java and Mozilla `.properties` files.
//!
//! Both dialects share the line syntax: `key<separator>value`, backslash
//! continuation lines, `#`/`!` comments. They differ in the escaping
//! contract. Java escapes separators inside values and round-trips
//! non-Latin text through `\uXXXX` sequences; Mozilla keeps text as UTF-8
//! and only escapes backslashes and control characters.

use lazy_static::lazy_static;
use regex::Regex;

use crate::collections::GenericTranslation;
use crate::compilation::{Mode, TranslationsBuilder};
use crate::error::Error;
use crate::formats::{ParseOutcome, detect_linesep};
use crate::hash_tag::hash_tag;
use crate::registry::Method;

const SEPARATORS: [char; 5] = [' ', '\t', '\u{c}', '=', ':'];
const COMMENT_CHARS: [char; 2] = ['#', '!'];

lazy_static! {
    static ref UNICODE_ESCAPE: Regex = Regex::new(r"\\[uU]([0-9A-Fa-f]{4})").unwrap();
    static ref MARKED_LINE: Regex = Regex::new(r"(.*)_txss").unwrap();
    static ref LONE_BACKSLASH: Regex = Regex::new(r"\\([^uUnrt])").unwrap();
    static ref TRAILING_BACKSLASH: Regex = Regex::new(r"\\$").unwrap();
}

/// The two escaping contracts sharing this parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Java,
    Mozilla,
}

impl Dialect {
    fn method(self) -> Method {
        match self {
            Dialect::Java => Method::Properties,
            Dialect::Mozilla => Method::MozillaProperties,
        }
    }
}

/// Whether the character at byte index `idx` is escaped by backslashes.
///
/// An odd number of preceding backslashes means escaped.
fn is_escaped(line: &str, idx: usize) -> bool {
    let mut backslashes = 0;
    for c in line[..idx].chars().rev() {
        if c == '\\' {
            backslashes += 1;
        } else {
            break;
        }
    }
    backslashes % 2 == 1
}

/// Splits a logical line at the first unescaped separator.
fn split_key_value(line: &str) -> (String, Option<String>) {
    for (idx, c) in line.char_indices() {
        if SEPARATORS.contains(&c) && !is_escaped(line, idx) {
            let key = line[..idx].trim_start().to_string();
            let value = line[idx + c.len_utf8()..]
                .trim_start_matches(&SEPARATORS[..])
                .to_string();
            return (key, Some(value));
        }
    }
    (line.to_string(), None)
}

/// A value may escape its leading space to survive separator stripping.
fn check_escaped_ws(value: &str) -> &str {
    if value.starts_with("\\ ") { &value[1..] } else { value }
}

fn decode_unicode_escapes(value: &str, dialect: Dialect) -> String {
    UNICODE_ESCAPE
        .replace_all(value, |caps: &regex::Captures| {
            let code = &caps[1];
            // Mozilla parsers strip trailing spaces; an encoded u+0020
            // is the only way to keep one, so it stays encoded.
            if dialect == Dialect::Mozilla && code == "0020" {
                return caps[0].to_string();
            }
            u32::from_str_radix(code, 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

pub fn parse(content: &str, is_source: bool, dialect: Dialect) -> Result<ParseOutcome, Error> {
    let linesep = detect_linesep(content);
    let mut outcome = ParseOutcome::default();
    let mut template = String::new();
    let mut comment_lines: Vec<String> = Vec::new();
    let mut order = 0;

    let mut lines = content.lines().peekable();
    let mut lineno = 0;
    while let Some(raw) = lines.next() {
        lineno += 1;
        let mut line = raw.trim_start().trim_end_matches(['\r', '\n']).to_string();
        if line.is_empty() || line.starts_with(COMMENT_CHARS) {
            if is_source {
                template.push_str(&line);
                template.push_str(linesep);
            }
            if line.is_empty() {
                // License headers and such should not attach to the next key.
                comment_lines.clear();
            } else {
                comment_lines.push(line[1..].to_string());
            }
            continue;
        }
        // A trailing unescaped backslash joins the next line into the value.
        while line.ends_with('\\') && !is_escaped(&line, line.len() - 1) {
            let Some(next) = lines.next() else {
                return Err(Error::parse_error(
                    dialect.method(),
                    format!("line {}: unexpected end of file after line continuation", lineno),
                ));
            };
            lineno += 1;
            line.pop();
            line.push_str(check_escaped_ws(next.trim_start().trim_end_matches(['\r', '\n'])));
        }

        let (key, raw_value) = split_key_value(&line);
        let Some(raw_value) = raw_value else {
            // Keys with no value are not shown to translators.
            if is_source {
                template.push_str(&line);
                template.push_str(linesep);
            }
            continue;
        };
        let value = check_escaped_ws(&raw_value);
        let value = decode_unicode_escapes(value, dialect);

        if is_source {
            if value.trim().is_empty() {
                template.push_str(&line);
                template.push_str(linesep);
                continue;
            }
            let remainder = &line[key.len()..];
            let marker = format!("{}_tr", hash_tag(&key, ""));
            template.push_str(&key);
            template.push_str(&remainder.replacen(&raw_value, &marker, 1));
            template.push_str(linesep);
        }

        let mut gt = GenericTranslation::new(key, unescape(&value, dialect), "");
        gt.comment = comment_lines.join("\n");
        gt.order = order;
        order += 1;
        outcome.stringset.add(gt);
        comment_lines.clear();
    }

    if is_source {
        if let Some(stripped) = template.strip_suffix(linesep) {
            template.truncate(stripped.len());
        }
        outcome.template = Some(template);
    }
    Ok(outcome)
}

/// Escape for the Java dialect. Separators get backslashes the way the Java
/// `Properties.store` method writes them; characters outside Latin-1 go
/// through `\uXXXX`.
pub fn escape_java(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ':' => out.push_str("\\:"),
            '=' => out.push_str("\\="),
            '!' => out.push_str("\\!"),
            '#' => out.push_str("\\#"),
            '\t' => out.push_str("\\t"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if (127..160).contains(&(c as u32)) || c as u32 > 255 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    if out.starts_with(' ') {
        out.insert(0, '\\');
    }
    out
}

/// Escape for the Mozilla dialect. Text stays UTF-8; backslashes double
/// unless they already start an escape sequence.
pub fn escape_mozilla(s: &str) -> String {
    let s = s
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t");
    let s = LONE_BACKSLASH.replace_all(&s, "\\\\$1").into_owned();
    TRAILING_BACKSLASH.replace(&s, "\\\\").into_owned()
}

/// Reverses the escape of special characters.
fn unescape(value: &str, dialect: Dialect) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('f') => out.push('\u{c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(c @ (':' | '#' | '!' | '=' | ' ')) if dialect == Dialect::Java => out.push(c),
            // Java files go through native2ascii; decode \uXXXX back.
            Some('u') if dialect == Dialect::Java => {
                let hex: String = chars.clone().take(4).collect();
                let decoded = (hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit()))
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(c) => {
                        out.push(c);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    None => out.push('u'),
                }
            }
            Some(other) => {
                // Mozilla keeps unknown escapes verbatim; Java drops the
                // backslash.
                if dialect == Dialect::Mozilla {
                    out.push('\\');
                }
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Reviewed downloads fall back to marked source strings like everything
/// else in this family.
pub fn builder_for(mode: Mode) -> TranslationsBuilder {
    if mode.contains(Mode::REVIEWED) {
        TranslationsBuilder::ReviewedMarkedSource
    } else {
        TranslationsBuilder::MarkedSource
    }
}

/// Comments out lines whose value is a marked source string.
pub fn post_compile(compiled: &str) -> String {
    MARKED_LINE.replace_all(compiled, "# $1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PluralRule;
    use indoc::indoc;

    #[test]
    fn test_parse_source_basic() {
        let content = indoc! {"
            # greeting section
            hello=Hello
            bye = Goodbye
        "};
        let outcome = parse(content, true, Dialect::Java).unwrap();
        assert_eq!(outcome.stringset.len(), 2);
        let hello = outcome.stringset.get("hello", "", PluralRule::Other).unwrap();
        assert_eq!(hello.translation, "Hello");
        assert_eq!(hello.comment, " greeting section");
        let template = outcome.template.unwrap();
        assert!(template.contains(&format!("hello={}_tr", hash_tag("hello", ""))));
        assert!(template.contains("# greeting section"));
    }

    #[test]
    fn test_parse_continuation_lines() {
        let content = "msg=one \\\n    two\n";
        let outcome = parse(content, true, Dialect::Java).unwrap();
        let msg = outcome.stringset.get("msg", "", PluralRule::Other).unwrap();
        assert_eq!(msg.translation, "one two");
    }

    #[test]
    fn test_parse_continuation_at_eof_fails() {
        let err = parse("msg=one \\", true, Dialect::Java).unwrap_err();
        assert!(err.to_string().contains("line continuation"));
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let content = "Key1=Value\nKey1=Value2\n";
        let outcome = parse(content, true, Dialect::Java).unwrap();
        assert_eq!(outcome.stringset.len(), 1);
        assert_eq!(
            outcome
                .stringset
                .get("Key1", "", PluralRule::Other)
                .unwrap()
                .translation,
            "Value2"
        );
    }

    #[test]
    fn test_escaped_separator_stays_in_key() {
        let content = "a\\=b=c\n";
        let outcome = parse(content, false, Dialect::Java).unwrap();
        let gt = outcome.stringset.iter().next().unwrap();
        assert_eq!(gt.source_entity, "a\\=b");
        assert_eq!(gt.translation, "c");
    }

    #[test]
    fn test_keys_without_values_skipped() {
        let content = "lonely\nfull=value\n";
        let outcome = parse(content, true, Dialect::Java).unwrap();
        assert_eq!(outcome.stringset.len(), 1);
        assert!(outcome.template.unwrap().contains("lonely"));
    }

    #[test]
    fn test_empty_value_kept_for_translations() {
        // An empty translation value means "delete the stored row", so it
        // must survive parsing of translation files.
        let content = "hello=\n";
        let outcome = parse(content, false, Dialect::Java).unwrap();
        let gt = outcome.stringset.get("hello", "", PluralRule::Other).unwrap();
        assert_eq!(gt.translation, "");
    }

    #[test]
    fn test_java_unicode_escapes_decoded() {
        let content = "greek=\\u0393\\u03b5\\u03b9\\u03b1\n";
        let outcome = parse(content, false, Dialect::Java).unwrap();
        assert_eq!(
            outcome
                .stringset
                .get("greek", "", PluralRule::Other)
                .unwrap()
                .translation,
            "Γεια"
        );
    }

    #[test]
    fn test_mozilla_keeps_explicit_space_escape() {
        let content = "pad=word\\u0020\n";
        let outcome = parse(content, false, Dialect::Mozilla).unwrap();
        assert_eq!(
            outcome
                .stringset
                .get("pad", "", PluralRule::Other)
                .unwrap()
                .translation,
            "word\\u0020"
        );
    }

    #[test]
    fn test_escape_java() {
        assert_eq!(escape_java("a=b:c"), "a\\=b\\:c");
        assert_eq!(escape_java("tab\there"), "tab\\there");
        assert_eq!(escape_java(" lead"), "\\ lead");
        assert_eq!(escape_java("Γ"), "\\u0393");
    }

    #[test]
    fn test_escape_mozilla() {
        assert_eq!(escape_mozilla("line\nbreak"), "line\\nbreak");
        assert_eq!(escape_mozilla("Γεια"), "Γεια");
        assert_eq!(escape_mozilla("back\\slash"), "back\\\\slash");
        assert_eq!(escape_mozilla("keep\\u0020"), "keep\\u0020");
    }

    #[test]
    fn test_escape_unescape_java_round_trip() {
        let original = "a=b:c\twith\nnewline \\ and backslash";
        assert_eq!(unescape(&escape_java(original), Dialect::Java), original);
        let greek = "Τίτλος σελίδας";
        assert_eq!(unescape(&escape_java(greek), Dialect::Java), greek);
    }

    #[test]
    fn test_java_decodes_unicode_sequences() {
        let outcome = parse("k=\\u0393\\u03b5\\u03b9\\u03b1\n", false, Dialect::Java).unwrap();
        let gt = outcome.stringset.get("k", "", PluralRule::Other).unwrap();
        assert_eq!(gt.translation, "Γεια");
        // Malformed sequences lose the backslash like any unknown escape.
        let outcome = parse("k=\\u12xz\n", false, Dialect::Java).unwrap();
        let gt = outcome.stringset.get("k", "", PluralRule::Other).unwrap();
        assert_eq!(gt.translation, "u12xz");
    }

    #[test]
    fn test_builder_policy() {
        assert_eq!(builder_for(Mode::DEFAULT), TranslationsBuilder::MarkedSource);
        assert_eq!(
            builder_for(Mode::REVIEWED),
            TranslationsBuilder::ReviewedMarkedSource
        );
    }

    #[test]
    fn test_post_compile_comments_marked_lines() {
        let compiled = "done=Fertig\npending=Pending_txss\n";
        assert_eq!(post_compile(compiled), "done=Fertig\n# pending=Pending\n");
    }
}
