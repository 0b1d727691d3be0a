//! Compilation modes.
//!
//! A mode says what a file is compiled for. Modes combine with `|`; the
//! zero value is the plain "for use" download.

use std::ops::BitOr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mode(u8);

impl Mode {
    /// Plain download for use.
    pub const DEFAULT: Mode = Mode(0);
    /// Download intended for offline translation.
    pub const TRANSLATED: Mode = Mode(1);
    /// Only reviewed strings count as translated.
    pub const REVIEWED: Mode = Mode(2);

    /// Whether every feature of `other` is requested by this mode.
    pub fn contains(self, other: Mode) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl BitOr for Mode {
    type Output = Mode;

    fn bitor(self, rhs: Mode) -> Mode {
        Mode(self.0 | rhs.0)
    }
}
