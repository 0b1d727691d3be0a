//! Qt Linguist TS files.
//!
//! A TS document groups `<message>` elements under `<context>` elements.
//! The context name, extended by the optional per-message `<comment>`,
//! disambiguates identical source strings. Messages with `numerus="yes"`
//! carry one `<numerusform>` per plural slot of the file's language.
//! Obsolete messages are carried through to the template untouched;
//! unfinished ones surface as suggestions in translation files.

use lazy_static::lazy_static;
use quick_xml::{
    Reader, Writer,
    events::{BytesEnd, BytesStart, BytesText, Event},
};
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
    static ref TS_TAG: Regex = Regex::new(r"<TS([^>]*)>").unwrap();
    static ref LANGUAGE_ATTR: Regex = Regex::new(r#"\s+language="[^"]*""#).unwrap();
    static ref PLURAL_BLOCK: Regex = Regex::new(
        r#"(?s)<translation([^>]*)>\s*<numerusform[^>]*>\s*(?P<hash>[0-9a-fA-F]{32})_pl_\d.*?</translation>"#
    )
    .unwrap();
    static ref TRANSLATION_RUN: Regex =
        Regex::new(r"(?s)<translation([^>]*)>(.*?)</translation>").unwrap();
    static ref EMPTY_FORM: Regex =
        Regex::new(r"<numerusform[^>]*>\s*</numerusform>|<numerusform[^>]*/>").unwrap();
    static ref ANY_FORM: Regex = Regex::new(r"<numerusform").unwrap();
}

/// XML escaping for compiled values, single and double quotes included.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Default)]
struct NumerusForm {
    text: String,
    variants: bool,
}

#[derive(Debug, Default)]
struct TranslationData {
    kind: Option<String>,
    variants: bool,
    text: String,
    numerusforms: Vec<NumerusForm>,
}

#[derive(Debug, Default)]
struct MessageData {
    numerus: bool,
    id: Option<String>,
    locations: Vec<String>,
    source: Option<String>,
    comment: Option<String>,
    extracomment: Option<String>,
    translation: Option<TranslationData>,
    events: Vec<Event<'static>>,
}

fn attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, Error> {
    for a in e.attributes().with_checks(false) {
        let a = a.map_err(|err| Error::parse_error(Method::Qt, err.to_string()))?;
        if a.key.as_ref() == name {
            return Ok(Some(a.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Routes a text chunk to the innermost field the element stack points at.
/// Markup nested inside a text container (html-like sources) lands in the
/// same field as serialized tags.
fn append_text(msg: &mut MessageData, stack: &[String], chunk: &str) {
    for name in stack.iter().rev() {
        match name.as_str() {
            "numerusform" => {
                if let Some(t) = msg.translation.as_mut() {
                    if let Some(form) = t.numerusforms.last_mut() {
                        form.text.push_str(chunk);
                    }
                }
                return;
            }
            "translation" => {
                if let Some(t) = msg.translation.as_mut() {
                    t.text.push_str(chunk);
                }
                return;
            }
            "source" => {
                msg.source.get_or_insert_with(String::new).push_str(chunk);
                return;
            }
            "comment" => {
                msg.comment.get_or_insert_with(String::new).push_str(chunk);
                return;
            }
            "extracomment" => {
                msg.extracomment
                    .get_or_insert_with(String::new)
                    .push_str(chunk);
                return;
            }
            "message" => return,
            _ => {}
        }
    }
}

const CONTAINERS: [&str; 6] = [
    "source",
    "comment",
    "extracomment",
    "translation",
    "numerusform",
    "location",
];

/// Parses a TS file.
///
/// For source files `language` is the resource's source language and drives
/// the plural slots of numerus messages; for translation files it is the
/// target language the numerusform count is checked against.
pub fn parse(content: &str, is_source: bool, language: &Language) -> Result<ParseOutcome, Error> {
    let mut reader = Reader::from_str(content);
    let mut writer = if is_source {
        Some(Writer::new(Vec::new()))
    } else {
        None
    };

    let mut outcome = ParseOutcome::default();
    let mut stack: Vec<String> = Vec::new();
    let mut context_name = String::new();
    let mut message: Option<MessageData> = None;
    let mut root_seen = false;
    let mut order = 0;

    loop {
        let ev = reader.read_event()?;
        match &ev {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if !root_seen {
                    if name != "TS" {
                        return Err(Error::parse_error(Method::Qt, "root element is not 'TS'"));
                    }
                    root_seen = true;
                }
                if message.is_none() && name == "message" {
                    let mut data = MessageData {
                        numerus: attr(e, b"numerus")?.as_deref() == Some("yes"),
                        id: attr(e, b"id")?,
                        ..MessageData::default()
                    };
                    data.events.push(ev.clone().into_owned());
                    stack.push(name);
                    message = Some(data);
                    continue;
                }
                if let Some(msg) = message.as_mut() {
                    match name.as_str() {
                        "translation" => {
                            msg.translation = Some(TranslationData {
                                kind: attr(e, b"type")?,
                                variants: attr(e, b"variants")?.as_deref() == Some("yes"),
                                ..TranslationData::default()
                            });
                        }
                        "numerusform" => {
                            if let Some(t) = msg.translation.as_mut() {
                                t.numerusforms.push(NumerusForm {
                                    text: String::new(),
                                    variants: attr(e, b"variants")?.as_deref() == Some("yes"),
                                });
                            }
                        }
                        "location" => {
                            if let (Some(file), Some(line)) =
                                (attr(e, b"filename")?, attr(e, b"line")?)
                            {
                                msg.locations.push(format!("{}:{}", file, line));
                            }
                        }
                        "source" | "comment" | "extracomment" => {}
                        _ => {
                            let raw = format!("<{}>", String::from_utf8_lossy(e));
                            append_text(msg, &stack, &raw);
                        }
                    }
                    msg.events.push(ev.clone().into_owned());
                    stack.push(name);
                    continue;
                }
                if name == "context" {
                    context_name.clear();
                }
                stack.push(name);
                if let Some(w) = writer.as_mut() {
                    w.write_event(ev.clone())?;
                }
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if let Some(msg) = message.as_mut() {
                    match name.as_str() {
                        "translation" => {
                            msg.translation = Some(TranslationData {
                                kind: attr(e, b"type")?,
                                variants: attr(e, b"variants")?.as_deref() == Some("yes"),
                                ..TranslationData::default()
                            });
                        }
                        "numerusform" => {
                            if let Some(t) = msg.translation.as_mut() {
                                t.numerusforms.push(NumerusForm::default());
                            }
                        }
                        "location" => {
                            if let (Some(file), Some(line)) =
                                (attr(e, b"filename")?, attr(e, b"line")?)
                            {
                                msg.locations.push(format!("{}:{}", file, line));
                            }
                        }
                        "source" | "comment" | "extracomment" => {}
                        _ => {
                            let raw = format!("<{}/>", String::from_utf8_lossy(e));
                            append_text(msg, &stack, &raw);
                        }
                    }
                    msg.events.push(ev.clone().into_owned());
                } else if let Some(w) = writer.as_mut() {
                    w.write_event(ev.clone())?;
                }
            }
            Event::Text(t) => {
                if let Some(msg) = message.as_mut() {
                    let chunk = t.unescape()?.into_owned();
                    append_text(msg, &stack, &chunk);
                    msg.events.push(ev.clone().into_owned());
                } else {
                    if stack.last().is_some_and(|n| n == "name")
                        && stack.iter().any(|n| n == "context")
                    {
                        context_name.push_str(&t.unescape()?);
                    }
                    if let Some(w) = writer.as_mut() {
                        w.write_event(ev.clone())?;
                    }
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if stack.last() == Some(&name) {
                    stack.pop();
                }
                if name == "message" && message.is_some() {
                    if let Some(mut msg) = message.take() {
                        msg.events.push(ev.clone().into_owned());
                        process_message(
                            msg,
                            &context_name,
                            is_source,
                            language,
                            &mut outcome,
                            writer.as_mut(),
                            &mut order,
                        )?;
                    }
                } else if let Some(msg) = message.as_mut() {
                    if !CONTAINERS.contains(&name.as_str()) {
                        append_text(msg, &stack, &format!("</{}>", name));
                    }
                    msg.events.push(ev.clone().into_owned());
                } else if let Some(w) = writer.as_mut() {
                    w.write_event(ev.clone())?;
                }
            }
            Event::Eof => break,
            _ => {
                if let Some(msg) = message.as_mut() {
                    msg.events.push(ev.clone().into_owned());
                } else if let Some(w) = writer.as_mut() {
                    w.write_event(ev.clone())?;
                }
            }
        }
    }

    if !root_seen {
        return Err(Error::parse_error(Method::Qt, "root element is not 'TS'"));
    }
    if let Some(w) = writer {
        let bytes = w.into_inner();
        outcome.template = Some(String::from_utf8_lossy(&bytes).into_owned());
    }
    Ok(outcome)
}

#[allow(clippy::too_many_arguments)]
fn process_message(
    msg: MessageData,
    context_name: &str,
    is_source: bool,
    language: &Language,
    outcome: &mut ParseOutcome,
    writer: Option<&mut Writer<Vec<u8>>>,
    order: &mut usize,
) -> Result<(), Error> {
    let mut parts: Vec<String> = Vec::new();
    if !context_name.is_empty() {
        parts.push(escape_context(context_name));
    }
    if let Some(comment) = msg.comment.as_deref() {
        if !comment.is_empty() {
            parts.push(escape_context(comment));
        }
    }
    let context = parts.join(":");

    let source_text = msg.source.clone().filter(|s| !s.is_empty());
    let source_string = match &msg.id {
        Some(id) => Some(id.clone()),
        None => source_text.clone(),
    };

    let translation = msg.translation.as_ref();
    let status = translation.and_then(|t| t.kind.as_deref().map(str::to_lowercase));
    let has_variants = translation
        .is_some_and(|t| t.variants || t.numerusforms.iter().any(|f| f.variants));

    if is_source {
        if has_variants {
            return Err(Error::parse_error(
                Method::Qt,
                "Qt Linguist variants are not supported",
            ));
        }
        if status.as_deref() == Some("obsolete") {
            return emit_unchanged(writer, &msg.events);
        }
        let Some(src) = source_string else {
            return emit_unchanged(writer, &msg.events);
        };
        let fallback = match msg.id.is_some() {
            true => source_text.unwrap_or_else(|| src.clone()),
            false => src.clone(),
        };

        let mut messages: Vec<(PluralRule, String)> = Vec::new();
        if msg.numerus {
            match translation {
                Some(t) if !t.numerusforms.is_empty() => {
                    for (n, form) in t.numerusforms.iter().enumerate() {
                        let Some(rule) = language.rules.get(n) else {
                            break;
                        };
                        let text = if form.text.is_empty() {
                            fallback.clone()
                        } else {
                            form.text.clone()
                        };
                        messages.push((*rule, text));
                    }
                }
                _ => {
                    for rule in &language.rules {
                        messages.push((*rule, fallback.clone()));
                    }
                }
            }
        } else {
            let text = translation
                .map(|t| t.text.clone())
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback);
            messages.push((PluralRule::Other, text));
        }
        add_messages(outcome, &src, &context, &messages, &msg, order);
        return emit_with_markers(writer, &msg, &src, &context, language);
    }

    let Some(src) = source_string else {
        return Ok(());
    };
    let Some(t) = translation else {
        return Ok(());
    };
    if has_variants {
        return Ok(());
    }
    match status.as_deref() {
        Some("obsolete") => return Ok(()),
        Some("unfinished") => {
            if !msg.numerus && !t.text.is_empty() {
                let mut gt = GenericTranslation::new(src, t.text.clone(), context);
                gt.occurrences = msg.locations.join(";");
                outcome.suggestions.add(gt);
            }
            return Ok(());
        }
        Some(other) => {
            warn!(
                status = other,
                "translation type is neither 'unfinished' nor 'obsolete', skipping"
            );
            return Ok(());
        }
        None => {}
    }

    let mut messages: Vec<(PluralRule, String)> = Vec::new();
    if msg.numerus {
        if t.numerusforms.len() != language.nplurals() {
            warn!(
                source = src.as_str(),
                file_nplurals = t.numerusforms.len(),
                language_nplurals = language.nplurals(),
                "skipping pluralized message with mismatched nplurals"
            );
            return Ok(());
        }
        for (n, form) in t.numerusforms.iter().enumerate() {
            let Some(rule) = language.rules.get(n) else {
                break;
            };
            messages.push((*rule, form.text.clone()));
        }
    } else {
        messages.push((PluralRule::Other, t.text.clone()));
    }
    add_messages(outcome, &src, &context, &messages, &msg, order);
    Ok(())
}

fn add_messages(
    outcome: &mut ParseOutcome,
    src: &str,
    context: &str,
    messages: &[(PluralRule, String)],
    msg: &MessageData,
    order: &mut usize,
) {
    for (rule, text) in messages {
        let mut gt = GenericTranslation::new(src, text.clone(), context);
        gt.rule = *rule;
        gt.pluralized = msg.numerus;
        gt.occurrences = msg.locations.join(";");
        gt.comment = msg.extracomment.clone().unwrap_or_default();
        gt.order = *order;
        outcome.stringset.add(gt);
    }
    *order += 1;
}

fn emit_unchanged(
    writer: Option<&mut Writer<Vec<u8>>>,
    events: &[Event<'static>],
) -> Result<(), Error> {
    let Some(w) = writer else { return Ok(()) };
    for ev in events {
        w.write_event(ev.clone())?;
    }
    Ok(())
}

/// Everything but the `type` attribute when it says unfinished; templates
/// never carry the unfinished state.
fn translation_attrs(e: &BytesStart<'_>) -> Result<Vec<(String, String)>, Error> {
    let mut attrs = Vec::new();
    for a in e.attributes().with_checks(false) {
        let a = a.map_err(|err| Error::parse_error(Method::Qt, err.to_string()))?;
        let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
        let value = a.unescape_value()?.into_owned();
        if key == "type" && value.eq_ignore_ascii_case("unfinished") {
            continue;
        }
        attrs.push((key, value));
    }
    Ok(attrs)
}

fn write_translation_start(
    w: &mut Writer<Vec<u8>>,
    attrs: &[(String, String)],
) -> Result<(), Error> {
    let mut e = BytesStart::new("translation");
    for (key, value) in attrs {
        e.push_attribute((key.as_str(), value.as_str()));
    }
    w.write_event(Event::Start(e))?;
    Ok(())
}

enum EmitState {
    Normal,
    SkipTranslation,
    InNumerusTranslation,
    SkipNumerusform,
}

/// Re-emits a message's events with the translation body replaced by hash
/// markers. Numerus messages get one marker per file plural slot.
fn emit_with_markers(
    writer: Option<&mut Writer<Vec<u8>>>,
    msg: &MessageData,
    src: &str,
    context: &str,
    language: &Language,
) -> Result<(), Error> {
    let Some(w) = writer else { return Ok(()) };
    let hash = hash_tag(src, context);
    let mut state = EmitState::Normal;
    let mut form_index = 0;
    let mut saw_translation = false;

    for (idx, ev) in msg.events.iter().enumerate() {
        let last = idx + 1 == msg.events.len();
        match state {
            EmitState::Normal => match ev {
                Event::Start(e) if e.name().as_ref() == b"translation" => {
                    saw_translation = true;
                    write_translation_start(w, &translation_attrs(e)?)?;
                    if msg.numerus {
                        state = EmitState::InNumerusTranslation;
                    } else {
                        let marker = format!("{}_tr", hash);
                        w.write_event(Event::Text(BytesText::new(&marker)))?;
                        state = EmitState::SkipTranslation;
                    }
                }
                Event::Empty(e) if e.name().as_ref() == b"translation" => {
                    saw_translation = true;
                    write_translation_start(w, &translation_attrs(e)?)?;
                    write_marker_body(w, msg.numerus, &hash, language.nplurals())?;
                    w.write_event(Event::End(BytesEnd::new("translation")))?;
                }
                Event::End(_) if last => {
                    if !saw_translation {
                        write_translation_start(w, &[])?;
                        write_marker_body(w, msg.numerus, &hash, language.nplurals())?;
                        w.write_event(Event::End(BytesEnd::new("translation")))?;
                    }
                    w.write_event(ev.clone())?;
                }
                _ => w.write_event(ev.clone())?,
            },
            EmitState::SkipTranslation => {
                if let Event::End(e) = ev {
                    if e.name().as_ref() == b"translation" {
                        w.write_event(ev.clone())?;
                        state = EmitState::Normal;
                    }
                }
            }
            EmitState::InNumerusTranslation => match ev {
                Event::Start(e) if e.name().as_ref() == b"numerusform" => {
                    w.write_event(ev.clone())?;
                    let marker = format!("{}_pl_{}", hash, form_index);
                    w.write_event(Event::Text(BytesText::new(&marker)))?;
                    form_index += 1;
                    state = EmitState::SkipNumerusform;
                }
                Event::Empty(e) if e.name().as_ref() == b"numerusform" => {
                    w.write_event(Event::Start(e.clone()))?;
                    let marker = format!("{}_pl_{}", hash, form_index);
                    w.write_event(Event::Text(BytesText::new(&marker)))?;
                    w.write_event(Event::End(BytesEnd::new("numerusform")))?;
                    form_index += 1;
                }
                Event::End(e) if e.name().as_ref() == b"translation" => {
                    w.write_event(ev.clone())?;
                    state = EmitState::Normal;
                }
                _ => {}
            },
            EmitState::SkipNumerusform => {
                if let Event::End(e) = ev {
                    if e.name().as_ref() == b"numerusform" {
                        w.write_event(ev.clone())?;
                        state = EmitState::InNumerusTranslation;
                    }
                }
            }
        }
    }
    Ok(())
}

fn write_marker_body(
    w: &mut Writer<Vec<u8>>,
    numerus: bool,
    hash: &str,
    nplurals: usize,
) -> Result<(), Error> {
    if numerus {
        for n in 0..nplurals {
            w.write_event(Event::Start(BytesStart::new("numerusform")))?;
            let marker = format!("{}_pl_{}", hash, n);
            w.write_event(Event::Text(BytesText::new(&marker)))?;
            w.write_event(Event::End(BytesEnd::new("numerusform")))?;
        }
    } else {
        let marker = format!("{}_tr", hash);
        w.write_event(Event::Text(BytesText::new(&marker)))?;
    }
    Ok(())
}

pub fn builder_for(mode: Mode) -> TranslationsBuilder {
    if mode.contains(Mode::REVIEWED) {
        TranslationsBuilder::Reviewed
    } else {
        TranslationsBuilder::All
    }
}

/// Rewrites a stored template for the target language: sets the root
/// `language` attribute and expands every numerus block to one marker per
/// target plural slot.
pub fn adjust_plurals(template: &str, language: &Language) -> String {
    let content = TS_TAG.replace(template, |caps: &regex::Captures| {
        let attrs = LANGUAGE_ATTR.replace(&caps[1], "");
        format!("<TS{} language=\"{}\">", attrs, language.code)
    });
    PLURAL_BLOCK
        .replace_all(&content, |caps: &regex::Captures| {
            let hash = &caps["hash"];
            let forms: String = (0..language.nplurals())
                .map(|n| format!("<numerusform>{}_pl_{}</numerusform>", hash, n))
                .collect();
            format!("<translation{}>{}</translation>", &caps[1], forms)
        })
        .into_owned()
}

/// Marks translation elements that came out empty as unfinished.
pub fn post_compile(compiled: &str) -> String {
    TRANSLATION_RUN
        .replace_all(compiled, |caps: &regex::Captures| {
            let attrs = &caps[1];
            let body = &caps[2];
            if attrs.contains("type=") {
                return caps[0].to_string();
            }
            if ANY_FORM.is_match(body) {
                if EMPTY_FORM.is_match(body) {
                    format!(
                        "<translation{} type=\"unfinished\">{}</translation>",
                        attrs, body
                    )
                } else {
                    caps[0].to_string()
                }
            } else if body.trim().is_empty() {
                format!("<translation{} type=\"unfinished\"></translation>", attrs)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_tag::hash_tag_parts;
    use indoc::indoc;

    fn source_ts() -> &'static str {
        indoc! {r#"
            <?xml version="1.0" encoding="utf-8"?>
            <TS version="2.0">
            <context>
                <name>MainWindow</name>
                <message>
                    <location filename="main.cpp" line="12"/>
                    <source>Hello</source>
                    <translation type="unfinished"></translation>
                </message>
                <message numerus="yes">
                    <source>%n file(s)</source>
                    <translation type="unfinished">
                        <numerusform></numerusform>
                        <numerusform></numerusform>
                    </translation>
                </message>
            </context>
            </TS>
        "#}
    }

    #[test]
    fn test_parse_source() {
        let en = Language::from_code("en");
        let outcome = parse(source_ts(), true, &en).unwrap();
        assert_eq!(outcome.stringset.len(), 3);
        let hello = outcome
            .stringset
            .get("Hello", "MainWindow", PluralRule::Other)
            .unwrap();
        assert_eq!(hello.translation, "Hello");
        assert_eq!(hello.occurrences, "main.cpp:12");
        let one = outcome
            .stringset
            .get("%n file(s)", "MainWindow", PluralRule::One)
            .unwrap();
        assert!(one.pluralized);
        assert_eq!(one.translation, "%n file(s)");
    }

    #[test]
    fn test_source_template_markers() {
        let en = Language::from_code("en");
        let outcome = parse(source_ts(), true, &en).unwrap();
        let template = outcome.template.unwrap();
        let hello_hash = hash_tag("Hello", "MainWindow");
        let plural_hash = hash_tag("%n file(s)", "MainWindow");
        assert!(template.contains(&format!("<translation>{}_tr</translation>", hello_hash)));
        assert!(template.contains(&format!("<numerusform>{}_pl_0</numerusform>", plural_hash)));
        assert!(template.contains(&format!("<numerusform>{}_pl_1</numerusform>", plural_hash)));
        assert!(!template.contains("type=\"unfinished\""));
    }

    #[test]
    fn test_comment_extends_context() {
        let content = indoc! {r#"
            <TS version="2.0">
            <context>
                <name>Dialog</name>
                <message>
                    <source>Open</source>
                    <comment>toolbar</comment>
                    <translation></translation>
                </message>
            </context>
            </TS>
        "#};
        let en = Language::from_code("en");
        let outcome = parse(content, true, &en).unwrap();
        assert!(
            outcome
                .stringset
                .get("Open", "Dialog:toolbar", PluralRule::Other)
                .is_some()
        );
        let template = outcome.template.unwrap();
        let hash = hash_tag_parts("Open", &["Dialog", "toolbar"]);
        assert!(template.contains(&format!("{}_tr", hash)));
    }

    #[test]
    fn test_parse_translation_file() {
        let content = indoc! {r#"
            <TS version="2.0" language="de">
            <context>
                <name>MainWindow</name>
                <message>
                    <source>Hello</source>
                    <translation>Hallo</translation>
                </message>
                <message>
                    <source>Goodbye</source>
                    <translation type="unfinished">Tschuss?</translation>
                </message>
                <message>
                    <source>Old</source>
                    <translation type="obsolete">Alt</translation>
                </message>
            </context>
            </TS>
        "#};
        let de = Language::from_code("de");
        let outcome = parse(content, false, &de).unwrap();
        assert_eq!(outcome.stringset.len(), 1);
        assert_eq!(
            outcome
                .stringset
                .get("Hello", "MainWindow", PluralRule::Other)
                .unwrap()
                .translation,
            "Hallo"
        );
        assert_eq!(outcome.suggestions.len(), 1);
        assert_eq!(
            outcome
                .suggestions
                .get("Goodbye", "MainWindow", PluralRule::Other)
                .unwrap()
                .translation,
            "Tschuss?"
        );
    }

    #[test]
    fn test_translation_numerusforms_map_to_rules() {
        let content = indoc! {r#"
            <TS version="2.0" language="cs">
            <context>
                <name>Files</name>
                <message numerus="yes">
                    <source>%n file(s)</source>
                    <translation>
                        <numerusform>%n soubor</numerusform>
                        <numerusform>%n soubory</numerusform>
                        <numerusform>%n souboru</numerusform>
                    </translation>
                </message>
            </context>
            </TS>
        "#};
        let cs = Language::from_code("cs");
        let outcome = parse(content, false, &cs).unwrap();
        assert_eq!(outcome.stringset.len(), 3);
        assert_eq!(
            outcome
                .stringset
                .get("%n file(s)", "Files", PluralRule::Few)
                .unwrap()
                .translation,
            "%n soubory"
        );
    }

    #[test]
    fn test_nplural_mismatch_skipped() {
        let content = indoc! {r#"
            <TS version="2.0" language="fr">
            <context>
                <name>Files</name>
                <message numerus="yes">
                    <source>%n file(s)</source>
                    <translation>
                        <numerusform>a</numerusform>
                        <numerusform>b</numerusform>
                        <numerusform>c</numerusform>
                    </translation>
                </message>
            </context>
            </TS>
        "#};
        let fr = Language::from_code("fr");
        let outcome = parse(content, false, &fr).unwrap();
        assert!(outcome.stringset.is_empty());
    }

    #[test]
    fn test_obsolete_kept_verbatim_in_template() {
        let content = indoc! {r#"
            <TS version="2.0">
            <context>
                <name>Ctx</name>
                <message>
                    <source>Old</source>
                    <translation type="obsolete">Alt</translation>
                </message>
            </context>
            </TS>
        "#};
        let en = Language::from_code("en");
        let outcome = parse(content, true, &en).unwrap();
        assert!(outcome.stringset.is_empty());
        let template = outcome.template.unwrap();
        assert!(template.contains("<translation type=\"obsolete\">Alt</translation>"));
    }

    #[test]
    fn test_variants_rejected_in_source() {
        let content = indoc! {r#"
            <TS version="2.0">
            <context>
                <name>Ctx</name>
                <message>
                    <source>Hi</source>
                    <translation variants="yes">Hi</translation>
                </message>
            </context>
            </TS>
        "#};
        let en = Language::from_code("en");
        assert!(parse(content, true, &en).is_err());
    }

    #[test]
    fn test_wrong_root_rejected() {
        let en = Language::from_code("en");
        assert!(parse("<resources></resources>", true, &en).is_err());
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a < b & 'c'"), "a &lt; b &amp; &apos;c&apos;");
    }

    #[test]
    fn test_escape_unescape_round_trip() {
        let original = "a < b && \"c\" > 'd'";
        let escaped = escape(original);
        assert!(!escaped.contains('<') && !escaped.contains('"'));
        assert_eq!(quick_xml::escape::unescape(&escaped).unwrap(), original);
    }

    #[test]
    fn test_adjust_plurals_expands_forms() {
        let en = Language::from_code("en");
        let outcome = parse(source_ts(), true, &en).unwrap();
        let template = outcome.template.unwrap();
        let ar = Language::from_code("ar");
        let adjusted = adjust_plurals(&template, &ar);
        let hash = hash_tag("%n file(s)", "MainWindow");
        for n in 0..6 {
            assert!(adjusted.contains(&format!("<numerusform>{}_pl_{}</numerusform>", hash, n)));
        }
        assert!(adjusted.contains("language=\"ar\""));
    }

    #[test]
    fn test_post_compile_marks_empty_unfinished() {
        let compiled = indoc! {r#"
            <TS version="2.0" language="de">
            <context>
                <name>Ctx</name>
                <message>
                    <source>Hello</source>
                    <translation>Hallo</translation>
                </message>
                <message>
                    <source>Goodbye</source>
                    <translation></translation>
                </message>
                <message numerus="yes">
                    <source>%n file(s)</source>
                    <translation><numerusform>%n Datei</numerusform><numerusform></numerusform></translation>
                </message>
            </context>
            </TS>
        "#};
        let out = post_compile(compiled);
        assert!(out.contains("<translation>Hallo</translation>"));
        assert!(out.contains("<translation type=\"unfinished\"></translation>"));
        assert!(out.contains(
            "<translation type=\"unfinished\"><numerusform>%n Datei</numerusform>"
        ));
    }

    #[test]
    fn test_builder_policy() {
        assert_eq!(builder_for(Mode::DEFAULT), TranslationsBuilder::All);
        assert_eq!(builder_for(Mode::REVIEWED), TranslationsBuilder::Reviewed);
    }
}
