//! Source type for representing feed/exchange labels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Source type - a short opaque label naming the feed a trade came from.
///
/// Typical values are exchange names such as `"coinbase"` or `"binance"`.
/// The label is opaque to the index; the only constraint is that it is
/// non-empty.
///
/// # Examples
///
/// ```
/// use sirocco_core::types::Source;
///
/// let source = Source::new("coinbase").unwrap();
/// assert_eq!(source.as_str(), "coinbase");
/// assert!(Source::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Source(String);

impl Source {
    /// Creates a new `Source` from a string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptySource` if the string is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptySource);
        }
        Ok(Self(s))
    }

    /// Creates a new `Source` without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure the value is non-empty.
    #[must_use]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the source as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Source {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Source {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Source {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Source> for String {
    fn from(source: Source) -> Self {
        source.0
    }
}
