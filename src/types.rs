//! Core, format-agnostic types for txfmt.
//! Parsers normalize into these; compilers read them back out of the store.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::hash_tag::hash_tag;
use crate::registry::Method;

/// A grammatical number slot.
///
/// `Other` always exists for every language and doubles as the slot for
/// non-pluralized strings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
pub enum PluralRule {
    Zero = 0,
    One = 1,
    Two = 2,
    Few = 3,
    Many = 4,
    Other = 5,
}

impl PluralRule {
    /// All rules, in slot order.
    pub const ALL: [PluralRule; 6] = [
        PluralRule::Zero,
        PluralRule::One,
        PluralRule::Two,
        PluralRule::Few,
        PluralRule::Many,
        PluralRule::Other,
    ];

    /// The numeric slot of the rule.
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Maps a numeric slot back to a rule.
    pub fn from_number(n: u8) -> Option<PluralRule> {
        PluralRule::ALL.iter().copied().find(|r| r.number() == n)
    }
}

impl Display for PluralRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PluralRule::Zero => "zero",
            PluralRule::One => "one",
            PluralRule::Two => "two",
            PluralRule::Few => "few",
            PluralRule::Many => "many",
            PluralRule::Other => "other",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PluralRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero" => Ok(PluralRule::Zero),
            "one" => Ok(PluralRule::One),
            "two" => Ok(PluralRule::Two),
            "few" => Ok(PluralRule::Few),
            "many" => Ok(PluralRule::Many),
            "other" => Ok(PluralRule::Other),
            other => Err(Error::Backend(format!("unknown plural rule `{}`", other))),
        }
    }
}

/// The translatable resource a handler is bound to.
///
/// This is the surface of the external collaborator that owns resources;
/// only the fields the engine needs are modeled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Resource {
    /// Unique key of the resource, e.g. `project.resource`.
    pub slug: String,
    pub name: String,
    pub i18n_method: Method,
    /// Language code the source file is written in.
    pub source_language: String,
}

impl Resource {
    pub fn new(
        slug: impl Into<String>,
        name: impl Into<String>,
        i18n_method: Method,
        source_language: impl Into<String>,
    ) -> Self {
        Resource {
            slug: slug.into(),
            name: name.into(),
            i18n_method,
            source_language: source_language.into(),
        }
    }
}

/// Serde/registry support needs Method to serialize by name.
impl Serialize for Method {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A translatable unit of a resource.
///
/// Identity within a resource is the `(string, context)` pair; `string_hash`
/// is derived from it and keys the template markers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceEntity {
    pub id: u64,
    pub resource: String,
    pub string: String,
    /// Disambiguation context; `"None"` when the format carries none.
    pub context: String,
    pub string_hash: String,
    pub pluralized: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    #[serde(default)]
    pub developer_comment: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    #[serde(default)]
    pub occurrences: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    #[serde(default)]
    pub flags: String,
    pub order: usize,
}

impl SourceEntity {
    pub fn new(
        id: u64,
        resource: impl Into<String>,
        string: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        let string = string.into();
        let context = normalize_context(context.into());
        let string_hash = hash_tag(&string, &context);
        SourceEntity {
            id,
            resource: resource.into(),
            string,
            context,
            string_hash,
            pluralized: false,
            developer_comment: String::new(),
            occurrences: String::new(),
            flags: String::new(),
            order: 0,
        }
    }
}

/// Empty contexts are stored as the literal `"None"`.
pub fn normalize_context(context: String) -> String {
    if context.is_empty() {
        "None".to_string()
    } else {
        context
    }
}

/// One stored translation string for an entity, language and plural slot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Translation {
    pub source_entity: u64,
    pub language: String,
    pub rule: PluralRule,
    pub string: String,
    pub reviewed: bool,
}

/// A candidate translation attached to an entity without being active.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Suggestion {
    pub source_entity: u64,
    pub language: String,
    pub string: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_rule_numbers() {
        assert_eq!(PluralRule::Zero.number(), 0);
        assert_eq!(PluralRule::Other.number(), 5);
        assert_eq!(PluralRule::from_number(3), Some(PluralRule::Few));
        assert_eq!(PluralRule::from_number(6), None);
    }

    #[test]
    fn test_plural_rule_round_trip() {
        for rule in PluralRule::ALL {
            let parsed: PluralRule = rule.to_string().parse().unwrap();
            assert_eq!(parsed, rule);
        }
    }

    #[test]
    fn test_source_entity_hash_follows_context() {
        let plain = SourceEntity::new(1, "r", "Save", "");
        let ctx = SourceEntity::new(2, "r", "Save", "toolbar");
        assert_eq!(plain.context, "None");
        assert_ne!(plain.string_hash, ctx.string_hash);
        assert_eq!(plain.string_hash.len(), 32);
    }

    #[test]
    fn test_method_serde_by_name() {
        let json = serde_json::to_string(&Method::Joomla).unwrap();
        assert_eq!(json, "\"INI\"");
        let back: Method = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Method::Joomla);
    }
}
