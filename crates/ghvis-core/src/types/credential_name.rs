//! Credential name type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ValidationError};

/// Maximum length of a credential name, in characters.
pub const MAX_CREDENTIAL_NAME_LEN: usize = 64;

/// A validated, case-sensitive credential name.
///
/// Names are unique within a tenant and act as the record key together with
/// the tenant id.
///
/// # Example
///
/// ```
/// use ghvis_core::CredentialName;
///
/// let name = CredentialName::new("work").unwrap();
/// assert_eq!(name.as_str(), "work");
/// assert!(CredentialName::new("has space").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CredentialName(String);

impl CredentialName {
    /// Create a new credential name, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, too long, or contains
    /// whitespace or control characters.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();

        if s.is_empty() {
            return Err(Self::invalid(s, "must not be empty"));
        }

        if s.chars().count() > MAX_CREDENTIAL_NAME_LEN {
            return Err(Self::invalid(
                s,
                &format!("must be at most {} characters", MAX_CREDENTIAL_NAME_LEN),
            ));
        }

        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(Self::invalid(
                s,
                "must not contain whitespace or control characters",
            ));
        }

        Ok(Self(s.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn invalid(value: &str, reason: &str) -> Error {
        ValidationError::CredentialName {
            value: value.to_string(),
            reason: reason.to_string(),
        }
        .into()
    }
}

impl fmt::Display for CredentialName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CredentialName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for CredentialName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for CredentialName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CredentialName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CredentialName::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_names() {
        assert!(CredentialName::new("work").is_ok());
        assert!(CredentialName::new("personal-2").is_ok());
        assert!(CredentialName::new("Org.Bot_01").is_ok());
    }

    #[test]
    fn names_are_case_sensitive() {
        let lower = CredentialName::new("work").unwrap();
        let upper = CredentialName::new("Work").unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn rejects_empty() {
        assert!(CredentialName::new("").is_err());
    }

    #[test]
    fn rejects_whitespace() {
        assert!(CredentialName::new("my token").is_err());
        assert!(CredentialName::new("tab\tname").is_err());
    }

    #[test]
    fn rejects_overlong() {
        let long = "a".repeat(MAX_CREDENTIAL_NAME_LEN + 1);
        assert!(CredentialName::new(long).is_err());
        let exact = "a".repeat(MAX_CREDENTIAL_NAME_LEN);
        assert!(CredentialName::new(exact).is_ok());
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<CredentialName>("\"ok\"").is_ok());
        assert!(serde_json::from_str::<CredentialName>("\"not ok\"").is_err());
    }
}
