//! Color value object shared by the catalog palette and media tags.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// A case-normalized color label (usually a hex string like `#1a2b3c`).
///
/// Comparison is case-insensitive exact-string: normalization lowercases and
/// trims at construction, so `Eq`/`Hash` on the stored form give the
/// case-insensitive semantics everywhere the color is used as a key.
/// Shorthand hex is **not** folded: `#fff` and `#ffffff` are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    /// Normalize and wrap a color label. Rejects blank input.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DomainError::empty("color"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Color {}

impl core::fmt::Display for Color {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Color {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}
