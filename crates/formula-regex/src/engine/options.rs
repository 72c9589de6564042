use std::fmt;
use std::ops::BitOr;

use crate::error::EngineError;

/// Regex option flags as passed by worksheet callers (the values are summed in the `options`
/// argument).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RegexOptions(u32);

impl RegexOptions {
    pub const NONE: RegexOptions = RegexOptions(0);
    pub const IGNORE_CASE: RegexOptions = RegexOptions(1);
    pub const MULTILINE: RegexOptions = RegexOptions(2);
    pub const EXPLICIT_CAPTURE: RegexOptions = RegexOptions(4);
    pub const COMPILED: RegexOptions = RegexOptions(8);
    pub const SINGLELINE: RegexOptions = RegexOptions(16);
    pub const IGNORE_PATTERN_WHITESPACE: RegexOptions = RegexOptions(32);
    pub const RIGHT_TO_LEFT: RegexOptions = RegexOptions(64);
    pub const ECMA_SCRIPT: RegexOptions = RegexOptions(256);
    pub const CULTURE_INVARIANT: RegexOptions = RegexOptions(512);

    // Bit 128 is reserved (debug) and accepted without effect.
    const VALID_BITS: u32 = 0x3FF;
    const ECMA_COMPATIBLE: u32 = 256 | 1 | 2 | 8;

    /// Validates a raw option mask.
    pub fn from_bits(bits: i64) -> Result<Self, EngineError> {
        if bits < 0 || bits > i64::from(Self::VALID_BITS) {
            return Err(EngineError::InvalidOptions(bits));
        }
        let options = RegexOptions(bits as u32);
        if options.contains(Self::ECMA_SCRIPT) && options.0 & !Self::ECMA_COMPATIBLE != 0 {
            return Err(EngineError::InvalidOptions(bits));
        }
        if options.contains(Self::RIGHT_TO_LEFT) {
            return Err(EngineError::UnsupportedOption("RightToLeft"));
        }
        Ok(options)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: RegexOptions) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for RegexOptions {
    type Output = RegexOptions;

    fn bitor(self, rhs: RegexOptions) -> RegexOptions {
        RegexOptions(self.0 | rhs.0)
    }
}

impl fmt::Debug for RegexOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: &[(RegexOptions, &str)] = &[
            (RegexOptions::IGNORE_CASE, "IgnoreCase"),
            (RegexOptions::MULTILINE, "Multiline"),
            (RegexOptions::EXPLICIT_CAPTURE, "ExplicitCapture"),
            (RegexOptions::COMPILED, "Compiled"),
            (RegexOptions::SINGLELINE, "Singleline"),
            (RegexOptions::IGNORE_PATTERN_WHITESPACE, "IgnorePatternWhitespace"),
            (RegexOptions::RIGHT_TO_LEFT, "RightToLeft"),
            (RegexOptions::ECMA_SCRIPT, "ECMAScript"),
            (RegexOptions::CULTURE_INVARIANT, "CultureInvariant"),
        ];
        let active: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if active.is_empty() {
            f.write_str("None")
        } else {
            f.write_str(&active.join(" | "))
        }
    }
}
