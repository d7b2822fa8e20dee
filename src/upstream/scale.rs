//! Upscale factor.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Supported upscale factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scale {
    X2,
    #[default]
    X4,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Scale must be 2 or 4")]
pub struct InvalidScale;

impl Scale {
    pub fn factor(self) -> u32 {
        match self {
            Scale::X2 => 2,
            Scale::X4 => 4,
        }
    }

    /// Parse an optional form value. Absent or empty means the default;
    /// otherwise the leading digits after any whitespace are read, so `"4x"`
    /// is accepted and whitespace alone is not.
    pub fn from_field(value: Option<&str>) -> Result<Self, InvalidScale> {
        match value {
            None | Some("") => Ok(Scale::default()),
            Some(text) => text.parse(),
        }
    }
}

impl TryFrom<u32> for Scale {
    type Error = InvalidScale;

    fn try_from(factor: u32) -> Result<Self, Self::Error> {
        match factor {
            2 => Ok(Scale::X2),
            4 => Ok(Scale::X4),
            _ => Err(InvalidScale),
        }
    }
}

impl FromStr for Scale {
    type Err = InvalidScale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let factor: u32 = s[..digits].parse().map_err(|_| InvalidScale)?;
        Scale::try_from(factor)
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.factor())
    }
}
