//! Object id type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A normalized workspace object id.
///
/// The remote service identifies every object (database, page, block,
/// user) by an opaque id, usually a dashed UUID. Operators tend to paste
/// whatever is at hand: a raw id, an undashed 32-hex id, or a full
/// workspace URL whose last path segment ends in the id. This type
/// accepts all of those and normalizes to the canonical form.
///
/// # Example
///
/// ```
/// use tome_core::ObjectId;
///
/// let id = ObjectId::new("0123456789abcdef0123456789abcdef").unwrap();
/// assert_eq!(id.as_str(), "01234567-89ab-cdef-0123-456789abcdef");
///
/// let from_url =
///     ObjectId::new("https://example.io/My-Page-0123456789abcdef0123456789abcdef?v=1").unwrap();
/// assert_eq!(from_url, id);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(String);

impl ObjectId {
    /// Create a new object id from a string, normalizing the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty after normalization.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref().trim();
        if s.is_empty() {
            return Err(InvalidInputError::ObjectId {
                value: s.to_string(),
                reason: "empty id".to_string(),
            }
            .into());
        }

        let normalized = Self::normalize(s);
        if normalized.is_empty() {
            return Err(InvalidInputError::ObjectId {
                value: s.to_string(),
                reason: "no id found in input".to_string(),
            }
            .into());
        }

        Ok(Self(normalized))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn normalize(s: &str) -> String {
        let mut value = s.to_string();

        // URLs: strip the query string, keep the last path segment,
        // then keep whatever follows the last slug separator.
        if value.contains("://") || value.contains('/') {
            if let Some(idx) = value.find('?') {
                value.truncate(idx);
            }
            if let Some(idx) = value.rfind('/') {
                value = value[idx + 1..].to_string();
            }
            if let Some(idx) = value.rfind('-') {
                // Only treat the suffix as the id when it looks like one;
                // a dashed UUID segment is shorter than 32 hex chars.
                let suffix = &value[idx + 1..];
                if suffix.len() == 32 {
                    value = suffix.to_string();
                }
            }
        }

        // Bare 32-hex ids are re-dashed into canonical UUID form.
        if value.len() == 32 && value.chars().all(|c| c.is_ascii_hexdigit()) {
            let v = value.to_ascii_lowercase();
            value = format!(
                "{}-{}-{}-{}-{}",
                &v[0..8],
                &v[8..12],
                &v[12..16],
                &v[16..20],
                &v[20..32]
            );
        }

        value
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ObjectId::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashed_uuid_passes_through() {
        let id = ObjectId::new("01234567-89ab-cdef-0123-456789abcdef").unwrap();
        assert_eq!(id.as_str(), "01234567-89ab-cdef-0123-456789abcdef");
    }

    #[test]
    fn bare_hex_is_dashed() {
        let id = ObjectId::new("0123456789ABCDEF0123456789abcdef").unwrap();
        assert_eq!(id.as_str(), "01234567-89ab-cdef-0123-456789abcdef");
    }

    #[test]
    fn url_with_slug_and_query() {
        let id = ObjectId::new(
            "https://example.io/ws/My-Page-0123456789abcdef0123456789abcdef?v=abc&p=1",
        )
        .unwrap();
        assert_eq!(id.as_str(), "01234567-89ab-cdef-0123-456789abcdef");
    }

    #[test]
    fn url_without_slug() {
        let id =
            ObjectId::new("https://example.io/0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(id.as_str(), "01234567-89ab-cdef-0123-456789abcdef");
    }

    #[test]
    fn opaque_ids_are_kept() {
        let id = ObjectId::new("some-opaque-id").unwrap();
        assert_eq!(id.as_str(), "some-opaque-id");
    }

    #[test]
    fn empty_is_rejected() {
        assert!(ObjectId::new("").is_err());
        assert!(ObjectId::new("   ").is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let id = ObjectId::new("0123456789abcdef0123456789abcdef").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"01234567-89ab-cdef-0123-456789abcdef\"");
        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
