//! GNU gettext PO/POT catalogs.
//!
//! The parser is a line-based state machine over the catalog syntax:
//! translator/extracted comments, `#:` occurrences, `#,` flags, `msgctxt`,
//! `msgid`, `msgid_plural`, `msgstr` and indexed `msgstr[n]` blocks, with
//! multi-line quoted chunks. Obsolete (`#~`) entries are carried through to
//! the template verbatim but never reach the string set.

use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::collections::GenericTranslation;
use crate::compilation::{Mode, TranslationsBuilder};
use crate::error::Error;
use crate::formats::ParseOutcome;
use crate::hash_tag::{escape_context, hash_tag};
use crate::plural_rules::Language;
use crate::registry::Method;
use crate::types::PluralRule;

lazy_static! {
    /// Copyright attribution lines are kept out of templates.
    static ref COPYRIGHT_LINE: Regex =
        Regex::new(r"^# (.*?), ((\d{4}(, ?)?)+)\.?$").unwrap();
}

/// Gettext string escaping.
pub fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
        .replace('\r', "\\r")
        .replace('"', "\\\"")
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// One catalog message.
#[derive(Debug, Clone, Default)]
pub struct PoEntry {
    pub translator_comments: Vec<String>,
    pub extracted_comments: Vec<String>,
    pub occurrences: Vec<String>,
    pub flags: Vec<String>,
    pub previous: Vec<String>,
    pub msgctxt: Option<String>,
    pub msgid: String,
    pub msgid_plural: Option<String>,
    pub msgstr: String,
    pub msgstr_plural: BTreeMap<usize, String>,
}

impl PoEntry {
    pub fn is_fuzzy(&self) -> bool {
        self.flags.iter().any(|f| f == "fuzzy")
    }

    fn has_content(&self) -> bool {
        !self.msgid.is_empty()
            || !self.msgstr.is_empty()
            || !self.msgstr_plural.is_empty()
            || self.msgctxt.is_some()
    }
}

/// A parsed catalog: header metadata, messages and raw obsolete lines.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub header_comments: Vec<String>,
    pub header_fuzzy: bool,
    pub metadata: Vec<(String, String)>,
    pub entries: Vec<PoEntry>,
    pub obsolete_lines: Vec<String>,
}

impl Catalog {
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_metadata(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        for (k, v) in &mut self.metadata {
            if k == key {
                *v = value;
                return;
            }
        }
        self.metadata.push((key.to_string(), value));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Msgctxt,
    Msgid,
    MsgidPlural,
    Msgstr,
    MsgstrIndexed(usize),
}

/// Extracts the quoted payload of a catalog line.
fn quoted_payload(line: &str, lineno: usize) -> Result<String, Error> {
    let start = line.find('"');
    let end = line.rfind('"');
    match (start, end) {
        (Some(s), Some(e)) if e > s => Ok(unescape(&line[s + 1..e])),
        _ => Err(Error::parse_error(
            Method::Po,
            format!("line {}: expected a quoted string: {}", lineno, line),
        )),
    }
}

pub fn parse_catalog(content: &str) -> Result<Catalog, Error> {
    let mut catalog = Catalog::default();
    let mut entry = PoEntry::default();
    let mut field: Option<Field> = None;
    let mut seen_header = false;

    let mut flush =
        |catalog: &mut Catalog, entry: &mut PoEntry, seen_header: &mut bool| -> Result<(), Error> {
            if !entry.has_content() && entry.translator_comments.is_empty() {
                return Ok(());
            }
            let done = std::mem::take(entry);
            if !*seen_header && done.msgid.is_empty() && done.msgctxt.is_none() {
                *seen_header = true;
                catalog.header_comments = done.translator_comments;
                catalog.header_fuzzy = done.flags.iter().any(|f| f == "fuzzy");
                for line in done.msgstr.lines() {
                    if let Some((key, value)) = line.split_once(':') {
                        catalog
                            .metadata
                            .push((key.trim().to_string(), value.trim().to_string()));
                    }
                }
            } else {
                catalog.entries.push(done);
            }
            Ok(())
        };

    for (idx, raw) in content.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim_end_matches('\r');
        let trimmed = line.trim();

        if trimmed.is_empty() {
            flush(&mut catalog, &mut entry, &mut seen_header)?;
            field = None;
            continue;
        }
        if trimmed.starts_with("#~") {
            flush(&mut catalog, &mut entry, &mut seen_header)?;
            field = None;
            catalog.obsolete_lines.push(trimmed.to_string());
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix('#') {
            // A comment after message bodies starts the next entry.
            if matches!(field, Some(Field::Msgstr | Field::MsgstrIndexed(_))) {
                flush(&mut catalog, &mut entry, &mut seen_header)?;
                field = None;
            }
            match rest.chars().next() {
                Some('.') => entry.extracted_comments.push(rest[1..].trim().to_string()),
                Some(':') => entry
                    .occurrences
                    .extend(rest[1..].split_whitespace().map(str::to_string)),
                Some(',') => entry
                    .flags
                    .extend(rest[1..].split(',').map(|f| f.trim().to_string())),
                Some('|') => entry.previous.push(rest[1..].trim().to_string()),
                _ => entry
                    .translator_comments
                    .push(rest.strip_prefix(' ').unwrap_or(rest).to_string()),
            }
            continue;
        }
        if trimmed.starts_with("msgctxt") {
            if matches!(field, Some(Field::Msgstr | Field::MsgstrIndexed(_))) {
                flush(&mut catalog, &mut entry, &mut seen_header)?;
            }
            entry.msgctxt = Some(quoted_payload(trimmed, lineno)?);
            field = Some(Field::Msgctxt);
            continue;
        }
        if trimmed.starts_with("msgid_plural") {
            entry.msgid_plural = Some(quoted_payload(trimmed, lineno)?);
            field = Some(Field::MsgidPlural);
            continue;
        }
        if trimmed.starts_with("msgid") {
            if matches!(field, Some(Field::Msgstr | Field::MsgstrIndexed(_))) {
                flush(&mut catalog, &mut entry, &mut seen_header)?;
            }
            entry.msgid = quoted_payload(trimmed, lineno)?;
            field = Some(Field::Msgid);
            continue;
        }
        if trimmed.starts_with("msgstr[") {
            let close = trimmed.find(']').ok_or_else(|| {
                Error::parse_error(Method::Po, format!("line {}: malformed msgstr index", lineno))
            })?;
            let index: usize = trimmed[7..close].parse().map_err(|_| {
                Error::parse_error(Method::Po, format!("line {}: malformed msgstr index", lineno))
            })?;
            entry
                .msgstr_plural
                .insert(index, quoted_payload(trimmed, lineno)?);
            field = Some(Field::MsgstrIndexed(index));
            continue;
        }
        if trimmed.starts_with("msgstr") {
            entry.msgstr = quoted_payload(trimmed, lineno)?;
            field = Some(Field::Msgstr);
            continue;
        }
        if trimmed.starts_with('"') {
            let chunk = quoted_payload(trimmed, lineno)?;
            match field {
                Some(Field::Msgctxt) => {
                    if let Some(ctx) = entry.msgctxt.as_mut() {
                        ctx.push_str(&chunk);
                    }
                }
                Some(Field::Msgid) => entry.msgid.push_str(&chunk),
                Some(Field::MsgidPlural) => {
                    if let Some(plural) = entry.msgid_plural.as_mut() {
                        plural.push_str(&chunk);
                    }
                }
                Some(Field::Msgstr) => entry.msgstr.push_str(&chunk),
                Some(Field::MsgstrIndexed(index)) => {
                    entry.msgstr_plural.entry(index).or_default().push_str(&chunk);
                }
                None => {
                    return Err(Error::parse_error(
                        Method::Po,
                        format!("line {}: continuation outside of a message", lineno),
                    ));
                }
            }
            continue;
        }
        return Err(Error::parse_error(
            Method::Po,
            format!("line {}: unrecognized syntax: {}", lineno, trimmed),
        ));
    }
    flush(&mut catalog, &mut entry, &mut seen_header)?;
    Ok(catalog)
}

fn write_field(f: &mut fmt::Formatter<'_>, keyword: &str, value: &str) -> fmt::Result {
    writeln!(f, "{} \"{}\"", keyword, escape(value))
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for comment in &self.header_comments {
            if comment.is_empty() {
                writeln!(f, "#")?;
            } else {
                writeln!(f, "# {}", comment)?;
            }
        }
        if self.header_fuzzy {
            writeln!(f, "#, fuzzy")?;
        }
        writeln!(f, "msgid \"\"")?;
        writeln!(f, "msgstr \"\"")?;
        for (key, value) in &self.metadata {
            writeln!(f, "\"{}: {}\\n\"", key, escape(value))?;
        }
        for entry in &self.entries {
            writeln!(f)?;
            for comment in &entry.translator_comments {
                writeln!(f, "# {}", comment)?;
            }
            for comment in &entry.extracted_comments {
                writeln!(f, "#. {}", comment)?;
            }
            if !entry.occurrences.is_empty() {
                writeln!(f, "#: {}", entry.occurrences.join(" "))?;
            }
            if !entry.flags.is_empty() {
                writeln!(f, "#, {}", entry.flags.join(", "))?;
            }
            for prev in &entry.previous {
                writeln!(f, "#| {}", prev)?;
            }
            if let Some(ctx) = &entry.msgctxt {
                write_field(f, "msgctxt", ctx)?;
            }
            write_field(f, "msgid", &entry.msgid)?;
            if let Some(plural) = &entry.msgid_plural {
                write_field(f, "msgid_plural", plural)?;
                for (index, value) in &entry.msgstr_plural {
                    write_field(f, &format!("msgstr[{}]", index), value)?;
                }
            } else {
                write_field(f, "msgstr", &entry.msgstr)?;
            }
        }
        if !self.obsolete_lines.is_empty() {
            writeln!(f)?;
            for line in &self.obsolete_lines {
                writeln!(f, "{}", line)?;
            }
        }
        Ok(())
    }
}

fn check_required_metadata(catalog: &Catalog) -> Result<(), Error> {
    for key in ["Content-Type", "Content-Transfer-Encoding"] {
        if catalog.metadata_value(key).is_none() {
            return Err(Error::parse_error(
                Method::Po,
                format!("file header doesn't have '{}' metadata", key),
            ));
        }
    }
    Ok(())
}

/// Parses a PO/POT file.
///
/// `target_language` drives the plural slot mapping for translation files;
/// it is ignored for source files, whose plural entries must carry exactly
/// the two gettext source forms.
pub fn parse(
    content: &str,
    is_source: bool,
    target_language: Option<&Language>,
) -> Result<ParseOutcome, Error> {
    if content.trim().is_empty() {
        return Err(Error::parse_error(Method::Po, "uploaded file is empty"));
    }
    let mut catalog = parse_catalog(content)?;
    check_required_metadata(&catalog)?;

    let mut outcome = ParseOutcome::default();
    let mut order = 0;

    for entry in &mut catalog.entries {
        let context = entry
            .msgctxt
            .as_deref()
            .map(|c| escape_context(c))
            .unwrap_or_default();
        let occurrences = entry.occurrences.join(", ");

        if entry.is_fuzzy() {
            if !is_source {
                if entry.msgid_plural.is_none() {
                    let mut gt =
                        GenericTranslation::new(&entry.msgid, &entry.msgstr, context.clone());
                    gt.occurrences = occurrences.clone();
                    outcome.suggestions.add(gt);
                }
                continue;
            }
            // Templates never keep the fuzzy flag.
            entry.flags.retain(|flag| flag != "fuzzy");
        }

        let pluralized = entry.msgid_plural.is_some();
        let mut messages: Vec<(PluralRule, String)> = Vec::new();
        if let Some(msgid_plural) = &entry.msgid_plural {
            if is_source {
                if entry.msgstr_plural.len() != 2 {
                    return Err(Error::parse_error(
                        Method::Po,
                        "source file is not a POT file and carries a number of \
                         plural forms other than two, which is not supported",
                    ));
                }
                let singular = entry.msgstr_plural.get(&0).cloned().unwrap_or_default();
                let plural = entry.msgstr_plural.get(&1).cloned().unwrap_or_default();
                messages.push((
                    PluralRule::One,
                    if singular.is_empty() { entry.msgid.clone() } else { singular },
                ));
                messages.push((
                    PluralRule::Other,
                    if plural.is_empty() { msgid_plural.clone() } else { plural },
                ));
            } else {
                let Some(language) = target_language else {
                    continue;
                };
                if entry.msgstr_plural.len() != language.nplurals() {
                    warn!(
                        msgid = entry.msgid.as_str(),
                        file_nplurals = entry.msgstr_plural.len(),
                        language_nplurals = language.nplurals(),
                        "skipping pluralized entry with mismatched nplurals"
                    );
                    outcome.warnings.insert(
                        "nplural".to_string(),
                        format!(
                            "Pluralized entries of the file were skipped because the \
                             nplurals of the uploaded file differs from the nplurals \
                             ({}) for the given language.",
                            language.nplurals()
                        ),
                    );
                    continue;
                }
                for (slot, rule) in language.rules.iter().enumerate() {
                    let value = entry.msgstr_plural.get(&slot).cloned().unwrap_or_default();
                    messages.push((*rule, value));
                }
            }
        } else {
            let value = if is_source && entry.msgstr.is_empty() {
                entry.msgid.clone()
            } else {
                entry.msgstr.clone()
            };
            messages.push((PluralRule::Other, value));
        }

        for (rule, value) in messages {
            let mut gt = GenericTranslation::new(&entry.msgid, value, context.clone());
            gt.rule = rule;
            gt.pluralized = pluralized;
            gt.occurrences = occurrences.clone();
            gt.comment = entry.translator_comments.join("\n");
            gt.flags = entry.flags.join(", ");
            gt.order = order;
            outcome.stringset.add(gt);
        }
        order += 1;

        if is_source {
            let hash = hash_tag(&entry.msgid, &context);
            if entry.msgid_plural.is_some() {
                entry.msgstr_plural = (0..2).map(|n| (n, format!("{}_pl_{}", hash, n))).collect();
            } else {
                entry.msgstr = format!("{}_tr", hash);
            }
        }
    }

    if is_source {
        let serialized = catalog.to_string();
        let template: String = serialized
            .lines()
            .filter(|line| !COPYRIGHT_LINE.is_match(line))
            .map(|line| format!("{}\n", line))
            .collect();
        outcome.template = Some(template);
    }
    Ok(outcome)
}

/// Reviewed downloads carry only reviewed strings; everything else gets the
/// full translation set. POT downloads use the empty builder instead.
pub fn builder_for(mode: Mode) -> TranslationsBuilder {
    if mode.contains(Mode::REVIEWED) {
        TranslationsBuilder::Reviewed
    } else {
        TranslationsBuilder::All
    }
}

/// Rewrites a stored template for the target language before marker
/// substitution: refreshes the catalog headers and expands every plural
/// block to one marker per target plural slot.
pub fn adjust_plurals(template: &str, language: &Language) -> String {
    let mut catalog = match parse_catalog(template) {
        Ok(catalog) => catalog,
        Err(err) => {
            warn!(error = %err, "stored template failed to parse, compiling as-is");
            return template.to_string();
        }
    };
    catalog.set_metadata("Content-Type", "text/plain; charset=UTF-8");
    catalog.set_metadata("Plural-Forms", language.plural_forms_header());
    catalog.set_metadata("Language", language.code.clone());
    catalog.header_fuzzy = false;
    for entry in &mut catalog.entries {
        if entry.msgid_plural.is_none() {
            continue;
        }
        let context = entry
            .msgctxt
            .as_deref()
            .map(|c| escape_context(c))
            .unwrap_or_default();
        let hash = hash_tag(&entry.msgid, &context);
        entry.msgstr_plural = (0..language.nplurals())
            .map(|n| (n, format!("{}_pl_{}", hash, n)))
            .collect();
    }
    catalog.to_string()
}

/// POT downloads only refresh the charset header; plural blocks keep the
/// two source slots.
pub fn adjust_pot(template: &str) -> String {
    let mut catalog = match parse_catalog(template) {
        Ok(catalog) => catalog,
        Err(err) => {
            warn!(error = %err, "stored template failed to parse, compiling as-is");
            return template.to_string();
        }
    };
    catalog.set_metadata("Content-Type", "text/plain; charset=UTF-8");
    catalog.to_string()
}
