//! The ledger's native fixed-alphabet encoding.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// The 27 characters a tryte string may contain.
pub const TRYTE_ALPHABET: &str = "9ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A validated tryte-encoded payload, as produced by the encryption
/// helper and consumed by the node's attach/broadcast commands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TryteString(String);

impl TryteString {
    /// Validates and wraps a tryte string.
    pub fn new(value: impl Into<String>) -> LedgerResult<Self> {
        let value = value.into();
        match value.chars().find(|c| !TRYTE_ALPHABET.contains(*c)) {
            None => Ok(Self(value)),
            Some(bad) => Err(LedgerError::InvalidTrytes(format!(
                "character {bad:?} is not in the tryte alphabet"
            ))),
        }
    }

    /// The raw tryte text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in trytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the empty tryte string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TryteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TryteString {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TryteString> for String {
    fn from(value: TryteString) -> Self {
        value.0
    }
}
