//! The compile pipeline: pick a builder, decorate every string, substitute
//! the hash markers of the stored template.

pub mod builders;
pub mod compilers;
pub mod decorators;
pub mod mode;

pub use builders::{MARKED_SOURCE_SUFFIX, TranslationMap, TranslationsBuilder};
pub use compilers::{CompileContext, compile_plural, compile_single};
pub use decorators::{Decorator, EscapeFn};
pub use mode::Mode;
