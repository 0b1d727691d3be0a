#![forbid(unsafe_code)]
//! Localization format engine.
//!
//! Imports translation files into a normalized in-memory store and compiles
//! them back out through hash-keyed templates. Every supported format goes
//! through the same pipeline, so storage, validation, suggestions and
//! pseudo-localization never care which file format a string came from.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use txfmt::{Handler, Language, Method, Mode, Resource, Store, ValidatorConfig};
//!
//! let mut store = Store::new();
//! store.add_resource(Resource::new("proj.app", "app", Method::Po, "en"));
//!
//! let mut handler = Handler::new(Method::Po);
//! handler.bind_resource("proj.app");
//! handler.bind_file("locale/en/app.po".as_ref())?;
//! handler.set_language(Some(Language::from_code("en")))?;
//! handler.parse_file(true)?;
//! handler.save2db(&mut store, true, &ValidatorConfig::default())?;
//!
//! // Compile the stored template for another language.
//! handler.set_language(Some(Language::from_code("el")))?;
//! let bytes = handler.compile(&store, Mode::DEFAULT, None)?;
//! # let _ = bytes;
//! # Ok::<(), txfmt::Error>(())
//! ```
//!
//! # Supported Formats
//!
//! - **GNU gettext** `.po` and `.pot` files
//! - **Java `.properties`** and the Mozilla dialect
//! - **Joomla `.ini`** language files, old and new quoting styles
//! - **Apple `.strings`** files
//! - **Qt Linguist `.ts`** XML files
//!
//! # Pipeline
//!
//! A [`Handler`] parses bound content into a [`StringSet`], saves it into a
//! [`Store`] transactionally and keeps the source file as a template where
//! every translatable slot is replaced by an md5 marker. Compilation picks a
//! [`Mode`]-dependent translation set, decorates every string (escaping,
//! optional pseudo-localization) and substitutes the markers back.

pub mod collections;
pub mod compilation;
pub mod error;
pub mod formats;
pub mod handler;
pub mod hash_tag;
pub mod plural_rules;
pub mod pseudo;
pub mod registry;
pub mod store;
pub mod suggestions;
pub mod types;
pub mod validators;

pub use crate::{
    collections::{GenericTranslation, StringSet},
    compilation::Mode,
    error::Error,
    handler::{Handler, SaveEvent},
    plural_rules::Language,
    pseudo::PseudoType,
    registry::Method,
    store::Store,
    suggestions::SuggestionPolicy,
    types::{PluralRule, Resource},
    validators::ValidatorConfig,
};
