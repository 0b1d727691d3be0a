//! Pseudo-localization.
//!
//! A pseudo type rewrites translatable text so layout and encoding problems
//! show up without real translations. Markup that must survive verbatim
//! (printf specifiers, tags, escapes, HTML entities) is protected by a chain
//! of splitters: the first splitter extracts its matches untouched and the
//! text between them falls through to the rest of the chain, until the empty
//! chain applies the transform itself.

use lazy_static::lazy_static;
use regex::Regex;

use crate::validators::PRINTF_REGEX;

lazy_static! {
    static ref TAG_REGEX: Regex = Regex::new(r"(<|&lt;)(.|\n)*?(>|&gt;)").unwrap();
    static ref ESCAPED_CHARS_REGEX: Regex = Regex::new(r"\\\w").unwrap();
    static ref HTML_ENTITY_REGEX: Regex = Regex::new(r"&[a-zA-Z]+;").unwrap();
}

/// A protected-token class the pseudo transform must not touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Splitter {
    /// printf placeholders, such as `%s`, `%d`, `%(foo)s`.
    Printf,
    /// XML/HTML tags, such as `<b>`, `</b>`, `<a href="">`.
    Tag,
    /// Escaped chars, such as `\n`, `\t`.
    EscapedChars,
    /// HTML special entities, such as `&lt;`, `&amp;`.
    HtmlEntity,
}

impl Splitter {
    fn regex(self) -> &'static Regex {
        match self {
            Splitter::Printf => &PRINTF_REGEX,
            Splitter::Tag => &TAG_REGEX,
            Splitter::EscapedChars => &ESCAPED_CHARS_REGEX,
            Splitter::HtmlEntity => &HTML_ENTITY_REGEX,
        }
    }
}

/// Applies `transform` to every unprotected segment of `input`.
pub fn split_and_apply(
    splitters: &[Splitter],
    transform: &dyn Fn(&str) -> String,
    input: &str,
) -> String {
    let Some((first, rest)) = splitters.split_first() else {
        return transform(input);
    };
    let mut out = String::new();
    let mut last = 0;
    for m in first.regex().find_iter(input) {
        out.push_str(&split_and_apply(rest, transform, &input[last..m.start()]));
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&split_and_apply(rest, transform, &input[last..]));
    out
}

/// The pseudo transforms the engine ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoType {
    /// Wrap every segment in brackets to spot concatenated strings.
    Brackets,
    /// Swap letters for accented counterparts to spot encoding issues.
    Unicode,
    /// Stretch the text to spot layouts that break on longer languages.
    Extend,
}

impl PseudoType {
    const SPLITTERS: [Splitter; 4] = [
        Splitter::Printf,
        Splitter::Tag,
        Splitter::EscapedChars,
        Splitter::HtmlEntity,
    ];

    /// Produces the pseudo rendition of a translation string.
    pub fn compile(self, text: &str) -> String {
        match self {
            PseudoType::Brackets => {
                if text.is_empty() {
                    return String::new();
                }
                format!("[{}]", split_and_apply(&Self::SPLITTERS, &|s| s.to_string(), text))
            }
            PseudoType::Unicode => split_and_apply(&Self::SPLITTERS, &unicode_swap, text),
            PseudoType::Extend => split_and_apply(&Self::SPLITTERS, &extend_vowels, text),
        }
    }
}

fn unicode_swap(segment: &str) -> String {
    segment
        .chars()
        .map(|c| match c {
            'a' => 'á',
            'e' => 'é',
            'i' => 'í',
            'o' => 'ó',
            'u' => 'ú',
            'c' => 'ç',
            'n' => 'ñ',
            'y' => 'ý',
            'A' => 'Á',
            'E' => 'É',
            'I' => 'Í',
            'O' => 'Ó',
            'U' => 'Ú',
            'C' => 'Ç',
            'N' => 'Ñ',
            'Y' => 'Ý',
            other => other,
        })
        .collect()
}

fn extend_vowels(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() * 2);
    for c in segment.chars() {
        out.push(c);
        if matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'A' | 'E' | 'I' | 'O' | 'U') {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chain_applies_transform() {
        let upper = |s: &str| s.to_uppercase();
        assert_eq!(split_and_apply(&[], &upper, "hello"), "HELLO");
    }

    #[test]
    fn test_printf_tokens_survive() {
        let out = PseudoType::Unicode.compile("Downloaded %(total)s files");
        assert!(out.contains("%(total)s"));
        assert!(out.contains("Dówñlóádéd"));
    }

    #[test]
    fn test_tags_survive() {
        let out = PseudoType::Unicode.compile("Click <a href=\"x\">here</a>");
        assert!(out.contains("<a href=\"x\">"));
        assert!(out.contains("</a>"));
        assert!(out.contains("héré"));
    }

    #[test]
    fn test_escaped_chars_and_entities_survive() {
        let out = PseudoType::Unicode.compile("one\\ntwo &amp; three");
        assert!(out.contains("\\n"));
        assert!(out.contains("&amp;"));
    }

    #[test]
    fn test_brackets_wrap_whole_string() {
        assert_eq!(PseudoType::Brackets.compile("Save %s"), "[Save %s]");
        assert_eq!(PseudoType::Brackets.compile(""), "");
    }

    #[test]
    fn test_extend_lengthens_text() {
        let out = PseudoType::Extend.compile("read %d books");
        assert!(out.contains("%d"));
        assert!(out.len() > "read %d books".len());
    }

    #[test]
    fn test_later_splitter_tokens_inside_segments() {
        // The tag splitter runs after printf, so tags inside non-printf
        // segments still pass through untouched.
        let out = PseudoType::Unicode.compile("%s <b>bold</b> end");
        assert!(out.contains("%s"));
        assert!(out.contains("<b>"));
    }
}
