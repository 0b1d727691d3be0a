//! Decorators applied to every translation string during compilation.

use crate::pseudo::PseudoType;

/// Escape function of the format being compiled.
pub type EscapeFn = fn(&str) -> String;

/// What happens to a translation string on its way into the compiled file.
#[derive(Clone, Copy)]
pub enum Decorator {
    /// Escape for the target format.
    Normal { escape: EscapeFn },
    /// Escape, then pseudo-localize.
    Pseudo { escape: EscapeFn, pseudo: PseudoType },
    /// Always emit the empty string (templates).
    Empty,
}

impl Decorator {
    pub fn apply(&self, translation: &str) -> String {
        match self {
            Decorator::Normal { escape } => {
                if translation.is_empty() {
                    String::new()
                } else {
                    escape(translation)
                }
            }
            Decorator::Pseudo { escape, pseudo } => pseudo.compile(&escape(translation)),
            Decorator::Empty => String::new(),
        }
    }
}
