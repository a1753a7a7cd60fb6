//! Keyspace name type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// Maximum keyspace name length accepted by the store.
const MAX_LEN: usize = 48;

/// A validated keyspace name.
///
/// Keyspace names are unquoted identifiers: an ASCII letter followed by up
/// to 47 ASCII letters, digits or underscores.
///
/// # Example
///
/// ```
/// use userbase_core::Keyspace;
///
/// let ks = Keyspace::new("test_keyspace").unwrap();
/// assert_eq!(ks.as_str(), "test_keyspace");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Keyspace(String);

impl Keyspace {
    /// Create a new keyspace name, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, too long, or contains
    /// characters outside `[A-Za-z0-9_]`.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Returns the keyspace name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        let reject = |reason: &str| -> Error {
            InvalidInputError::Keyspace {
                value: s.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        let Some(first) = s.chars().next() else {
            return Err(reject("cannot be empty"));
        };

        if s.len() > MAX_LEN {
            return Err(reject("exceeds maximum length of 48 characters"));
        }

        if !first.is_ascii_alphabetic() {
            return Err(reject("must start with a letter"));
        }

        if let Some(c) = s.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
            return Err(reject(&format!("contains invalid character '{}'", c)));
        }

        Ok(())
    }
}

impl fmt::Display for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Keyspace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Keyspace {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Keyspace> for String {
    fn from(ks: Keyspace) -> Self {
        ks.0
    }
}

impl AsRef<str> for Keyspace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
