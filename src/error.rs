//! All error types for the txfmt crate.
//!
//! These are returned from all fallible operations (binding, parsing,
//! storing, compiling).

use thiserror::Error;

use crate::registry::Method;

/// Error raised by a single validator against a single string.
///
/// A failing error-level validator blocks that string only; a failing
/// warning-level validator is recorded on the handler and the string is
/// stored anyway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

#[derive(Error, Debug)]
pub enum Error {
    #[error("{method} parse error: {detail}")]
    Parse { method: Method, detail: String },

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Backend(String),

    #[error("unknown i18n method `{0}`")]
    UnknownMethod(String),

    #[error("no file extension registered for method {0}")]
    NoExtension(Method),

    #[error("no language bound to the handler")]
    MissingLanguage,

    #[error("no resource bound to the handler")]
    MissingResource,

    #[error("no content bound to the handler")]
    MissingContent,

    #[error("no template stored for resource `{0}`")]
    NoTemplate(String),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a parse error for the given method with positional detail.
    pub fn parse_error(method: Method, detail: impl Into<String>) -> Self {
        Error::Parse {
            method,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let error = Error::parse_error(Method::Po, "line 3: missing msgid");
        assert_eq!(error.to_string(), "PO parse error: line 3: missing msgid");
    }

    #[test]
    fn test_validation_error_conversion() {
        let error: Error = ValidationError("numbers differ".into()).into();
        assert!(error.to_string().contains("numbers differ"));
    }

    #[test]
    fn test_no_extension_display() {
        let error = Error::NoExtension(Method::Qt);
        assert!(error.to_string().contains("QT"));
    }

    #[test]
    fn test_backend_error_display() {
        let error = Error::Backend("resource vanished mid-save".into());
        assert!(error.to_string().starts_with("storage error"));
    }
}
