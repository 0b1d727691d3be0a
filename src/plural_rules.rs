//! Per-language plural data.
//!
//! A curated CLDR-style table keyed by base language subtag. Each entry
//! carries the ordered plural slots the language uses and the gettext-style
//! equation written into PO headers. Unknown languages fall back to the
//! two-form gettext default.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::types::PluralRule;

#[derive(Clone, Copy)]
struct PluralData {
    rules: &'static [PluralRule],
    equation: &'static str,
}

const TWO_FORM: PluralData = PluralData {
    rules: &[PluralRule::One, PluralRule::Other],
    equation: "(n != 1)",
};

lazy_static! {
    /// Static mapping from base language subtag to plural data.
    static ref PLURAL_TABLE: BTreeMap<&'static str, PluralData> = {
        use PluralRule::*;
        let mut m: BTreeMap<&'static str, PluralData> = BTreeMap::new();

        // One/Other (most Indo-European languages without complex rules)
        for code in [
            "en","de","nl","sv","da","nb","nn","no","is","fi","et","fa","hi","bn","gu",
            "ta","te","kn","ml","mr","it","es","pt","mk","el","eu","gl","af","sw","ur",
            "fil","tl","hy","kab"
        ] {
            m.insert(code, TWO_FORM);
        }

        // French group counts zero as singular
        for code in ["fr", "tr", "id", "ms"] {
            m.insert(code, PluralData {
                rules: &[One, Other],
                equation: "(n > 1)",
            });
        }

        // Only Other (East/Southeast Asian common cases)
        for code in ["ja","zh","ko","th","vi","km","lo","my","yue"] {
            m.insert(code, PluralData { rules: &[Other], equation: "0" });
        }

        // Slavic (Russian group): one, few, many, other
        for code in ["ru","uk","be","sr","hr","bs","sh","pl"] {
            m.insert(code, PluralData {
                rules: &[One, Few, Many, Other],
                equation: "(n%10==1 && n%100!=11 ? 0 : n%10>=2 && n%10<=4 && \
                           (n%100<12 || n%100>14) ? 1 : n%10==0 || (n%10>=5 && n%10<=9) \
                           || (n%100>=11 && n%100<=14) ? 2 : 3)",
            });
        }

        // Czech/Slovak
        for code in ["cs","sk"] {
            m.insert(code, PluralData {
                rules: &[One, Few, Other],
                equation: "(n==1) ? 0 : (n>=2 && n<=4) ? 1 : 2",
            });
        }

        // Lithuanian
        m.insert("lt", PluralData {
            rules: &[One, Few, Other],
            equation: "(n%10==1 && n%100!=11 ? 0 : n%10>=2 && (n%100<10 || n%100>=20) ? 1 : 2)",
        });

        // Romanian
        m.insert("ro", PluralData {
            rules: &[One, Few, Other],
            equation: "(n==1 ? 0 : (n==0 || (n%100>0 && n%100<20)) ? 1 : 2)",
        });

        // Slovenian
        m.insert("sl", PluralData {
            rules: &[One, Two, Few, Other],
            equation: "(n%100==1 ? 0 : n%100==2 ? 1 : n%100==3 || n%100==4 ? 2 : 3)",
        });

        // Latvian
        m.insert("lv", PluralData {
            rules: &[Zero, One, Other],
            equation: "(n==0 ? 0 : n%10==1 && n%100!=11 ? 1 : 2)",
        });

        // Irish Gaelic
        m.insert("ga", PluralData {
            rules: &[One, Two, Few, Many, Other],
            equation: "(n==1 ? 0 : n==2 ? 1 : n<7 ? 2 : n<11 ? 3 : 4)",
        });

        // Arabic
        m.insert("ar", PluralData {
            rules: &[Zero, One, Two, Few, Many, Other],
            equation: "(n==0 ? 0 : n==1 ? 1 : n==2 ? 2 : n%100>=3 && n%100<=10 ? 3 : \
                       n%100>=11 ? 4 : 5)",
        });

        // Hebrew (legacy code iw also maps here)
        for code in ["he","iw"] {
            m.insert(code, PluralData {
                rules: &[One, Two, Many, Other],
                equation: "(n==1 ? 0 : n==2 ? 1 : n>10 && n%10==0 ? 2 : 3)",
            });
        }

        m
    };
}

/// Plural data for a concrete target language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Language {
    /// The code as given by the caller, e.g. `pt_BR`.
    pub code: String,
    /// Ordered plural slots this language uses. `Other` is always present.
    pub rules: Vec<PluralRule>,
    /// Gettext-style plural selection expression over `n`.
    pub plural_equation: String,
}

impl Language {
    /// Resolves plural data for a language code.
    ///
    /// Accepts underscores, normalizes to hyphen and selects on the base
    /// subtag only. Unknown codes get the two-form gettext default.
    pub fn from_code(code: impl Into<String>) -> Language {
        let code = code.into();
        let normalized = code.replace('_', "-");
        let base = normalized
            .parse::<LanguageIdentifier>()
            .map(|id| id.language.as_str().to_string())
            .unwrap_or_default();
        let data = PLURAL_TABLE.get(base.as_str()).copied().unwrap_or(TWO_FORM);
        Language {
            code,
            rules: data.rules.to_vec(),
            plural_equation: data.equation.to_string(),
        }
    }

    /// Number of plural forms a file in this language carries.
    pub fn nplurals(&self) -> usize {
        self.rules.len()
    }

    /// The `Plural-Forms:` header value for gettext catalogs.
    pub fn plural_forms_header(&self) -> String {
        format!(
            "nplurals={}; plural={};",
            self.nplurals(),
            self.plural_equation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PluralRule::*;

    #[test]
    fn test_two_form_default() {
        let en = Language::from_code("en");
        assert_eq!(en.rules, vec![One, Other]);
        assert_eq!(en.nplurals(), 2);
        assert_eq!(en.plural_forms_header(), "nplurals=2; plural=(n != 1);");
    }

    #[test]
    fn test_single_form() {
        let ja = Language::from_code("ja");
        assert_eq!(ja.rules, vec![Other]);
        assert_eq!(ja.nplurals(), 1);
    }

    #[test]
    fn test_slavic_forms() {
        let ru = Language::from_code("ru");
        assert_eq!(ru.rules, vec![One, Few, Many, Other]);
        assert_eq!(ru.nplurals(), 4);
    }

    #[test]
    fn test_arabic_uses_all_slots() {
        let ar = Language::from_code("ar");
        assert_eq!(ar.nplurals(), 6);
        assert_eq!(ar.rules, PluralRule::ALL.to_vec());
    }

    #[test]
    fn test_region_subtag_ignored() {
        let br = Language::from_code("pt_BR");
        assert_eq!(br.code, "pt_BR");
        assert_eq!(br.rules, vec![One, Other]);
    }

    #[test]
    fn test_unknown_language_falls_back() {
        let x = Language::from_code("tlh");
        assert_eq!(x.rules, vec![One, Other]);
        assert_eq!(x.plural_equation, "(n != 1)");
    }
}
