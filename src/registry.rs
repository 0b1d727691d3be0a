//! Registry of the supported i18n methods and their capabilities.
//!
//! Every format the engine knows about has exactly one [`Method`] value and
//! one row in the static methods table. The table is ordered; extension and
//! mimetype guessing walk it in registration order and the first match wins.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::types::Resource;

/// A supported localization file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Po,
    Pot,
    Properties,
    MozillaProperties,
    Joomla,
    Strings,
    Qt,
}

impl Method {
    /// All methods, in registration order.
    pub const ALL: [Method; 7] = [
        Method::Po,
        Method::Pot,
        Method::Properties,
        Method::MozillaProperties,
        Method::Joomla,
        Method::Strings,
        Method::Qt,
    ];

    /// Whether compiled output of this method carries plural blocks.
    pub fn is_pluralized(self) -> bool {
        matches!(self, Method::Po | Method::Pot | Method::Qt)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Po => "PO",
            Method::Pot => "POT",
            Method::Properties => "PROPERTIES",
            Method::MozillaProperties => "MOZILLAPROPERTIES",
            Method::Joomla => "INI",
            Method::Strings => "STRINGS",
            Method::Qt => "QT",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PO" => Ok(Method::Po),
            "POT" => Ok(Method::Pot),
            "PROPERTIES" => Ok(Method::Properties),
            "MOZILLAPROPERTIES" => Ok(Method::MozillaProperties),
            "INI" => Ok(Method::Joomla),
            "STRINGS" => Ok(Method::Strings),
            "QT" => Ok(Method::Qt),
            other => Err(Error::UnknownMethod(other.to_string())),
        }
    }
}

/// One row of the methods table.
#[derive(Debug, Clone, Copy)]
pub struct MethodInfo {
    pub method: Method,
    pub description: &'static str,
    pub file_extensions: &'static [&'static str],
    pub mimetypes: &'static [&'static str],
}

/// The methods table, in registration order.
pub static METHODS: [MethodInfo; 7] = [
    MethodInfo {
        method: Method::Po,
        description: "Gettext catalog",
        file_extensions: &[".po"],
        mimetypes: &["text/x-po", "application/x-gettext"],
    },
    MethodInfo {
        method: Method::Pot,
        description: "Gettext catalog template",
        file_extensions: &[".pot"],
        mimetypes: &["text/x-pot"],
    },
    MethodInfo {
        method: Method::Properties,
        description: "Java properties",
        file_extensions: &[".properties"],
        mimetypes: &["text/x-java-properties"],
    },
    MethodInfo {
        method: Method::MozillaProperties,
        description: "Mozilla properties",
        file_extensions: &[".properties"],
        mimetypes: &["text/x-mozilla-properties"],
    },
    MethodInfo {
        method: Method::Joomla,
        description: "Joomla language file",
        file_extensions: &[".ini"],
        mimetypes: &["text/x-joomla-ini"],
    },
    MethodInfo {
        method: Method::Strings,
        description: "Apple strings",
        file_extensions: &[".strings"],
        mimetypes: &["text/x-strings"],
    },
    MethodInfo {
        method: Method::Qt,
        description: "Qt Linguist file",
        file_extensions: &[".ts"],
        mimetypes: &["application/x-linguist"],
    },
];

/// Looks up the table row for a method.
pub fn info_for(method: Method) -> &'static MethodInfo {
    // The table covers every Method variant.
    METHODS
        .iter()
        .find(|info| info.method == method)
        .unwrap_or(&METHODS[0])
}

/// Registered file extensions for a method, in table order.
pub fn extensions_for(method: Method) -> &'static [&'static str] {
    info_for(method).file_extensions
}

/// Guesses the i18n method of a file.
///
/// The filename extension is checked first against the table in registration
/// order; the mimetype is a fallback when no filename is given or nothing
/// matched.
pub fn guess_method(filename: Option<&str>, mimetype: Option<&str>) -> Option<Method> {
    if let Some(name) = filename {
        for info in &METHODS {
            if info.file_extensions.iter().any(|ext| name.ends_with(ext)) {
                return Some(info.method);
            }
        }
    }
    if let Some(mime) = mimetype {
        for info in &METHODS {
            if info.mimetypes.contains(&mime) {
                return Some(info.method);
            }
        }
    }
    None
}

/// Picks the method to serve a resource with.
///
/// Everything except the PO family maps straight to the resource's method.
/// PO resources disambiguate between PO and POT: an explicit POT request
/// wins, then the filename extension, then the presence of a language.
pub fn appropriate_method(
    resource: &Resource,
    language: Option<&str>,
    filename: Option<&str>,
    wants_pot: bool,
) -> Method {
    let method = resource.i18n_method;
    if method != Method::Po {
        return method;
    }
    if wants_pot {
        return Method::Pot;
    }
    if let Some(name) = filename {
        if name.ends_with("po") {
            return Method::Po;
        }
        return Method::Pot;
    }
    if language.is_none() {
        return Method::Pot;
    }
    Method::Po
}

/// Returns the filename extension for a resource-language pair.
///
/// PO resources asked for without a language get the POT extension. An empty
/// extension row is a configuration bug and surfaces as an error.
pub fn file_extension_for(resource: &Resource, language: Option<&str>) -> Result<&'static str, Error> {
    let method = resource.i18n_method;
    let lookup = if method == Method::Po && language.is_none() {
        Method::Pot
    } else {
        method
    };
    extensions_for(lookup)
        .first()
        .copied()
        .ok_or(Error::NoExtension(lookup))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn po_resource() -> Resource {
        Resource::new("proj.app", "app", Method::Po, "en")
    }

    #[test]
    fn test_guess_method_by_extension() {
        assert_eq!(guess_method(Some("app/messages.po"), None), Some(Method::Po));
        assert_eq!(guess_method(Some("messages.pot"), None), Some(Method::Pot));
        assert_eq!(
            guess_method(Some("chrome/app.properties"), None),
            Some(Method::Properties)
        );
        assert_eq!(guess_method(Some("el-GR.ini"), None), Some(Method::Joomla));
        assert_eq!(
            guess_method(Some("Localizable.strings"), None),
            Some(Method::Strings)
        );
        assert_eq!(guess_method(Some("app_de.ts"), None), Some(Method::Qt));
        assert_eq!(guess_method(Some("notes.txt"), None), None);
    }

    #[test]
    fn test_guess_method_by_mimetype() {
        assert_eq!(
            guess_method(None, Some("application/x-gettext")),
            Some(Method::Po)
        );
        assert_eq!(
            guess_method(Some("readme.txt"), Some("application/x-linguist")),
            Some(Method::Qt)
        );
        assert_eq!(guess_method(None, Some("text/plain")), None);
    }

    #[test]
    fn test_appropriate_method_non_po() {
        let mut resource = po_resource();
        resource.i18n_method = Method::Qt;
        assert_eq!(
            appropriate_method(&resource, None, None, false),
            Method::Qt
        );
    }

    #[test]
    fn test_appropriate_method_po_family() {
        let resource = po_resource();
        assert_eq!(
            appropriate_method(&resource, Some("el"), None, true),
            Method::Pot
        );
        assert_eq!(
            appropriate_method(&resource, None, Some("messages.po"), false),
            Method::Po
        );
        assert_eq!(
            appropriate_method(&resource, Some("el"), Some("messages.pot"), false),
            Method::Pot
        );
        assert_eq!(appropriate_method(&resource, None, None, false), Method::Pot);
        assert_eq!(
            appropriate_method(&resource, Some("el"), None, false),
            Method::Po
        );
    }

    #[test]
    fn test_file_extension_for() {
        let resource = po_resource();
        assert_eq!(file_extension_for(&resource, Some("el")).unwrap(), ".po");
        assert_eq!(file_extension_for(&resource, None).unwrap(), ".pot");

        let mut qt = po_resource();
        qt.i18n_method = Method::Qt;
        assert_eq!(file_extension_for(&qt, None).unwrap(), ".ts");
    }

    #[test]
    fn test_method_round_trip() {
        for method in Method::ALL {
            let parsed: Method = method.to_string().parse().unwrap();
            assert_eq!(parsed, method);
        }
        assert!("DESKTOP".parse::<Method>().is_err());
    }
}
