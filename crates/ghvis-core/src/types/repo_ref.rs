//! Repository reference type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ValidationError};

/// Maximum length of a GitHub owner (user or organization) login.
const MAX_OWNER_LEN: usize = 39;

/// Maximum length of a GitHub repository name.
const MAX_NAME_LEN: usize = 100;

/// A validated `(owner, name)` repository identifier.
///
/// Format: `<owner>/<name>`
///
/// # Example
///
/// ```
/// use ghvis_core::RepoRef;
///
/// let repo = RepoRef::new("octocat/hello-world").unwrap();
/// assert_eq!(repo.owner(), "octocat");
/// assert_eq!(repo.name(), "hello-world");
/// assert_eq!(repo.to_string(), "octocat/hello-world");
/// ```
///
/// Equality is exact. GitHub resolves names case-insensitively, so batches
/// collapse entries that differ only in ASCII case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoRef {
    owner: String,
    name: String,
}

impl RepoRef {
    /// Parse a repository reference from `owner/name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid `owner/name` pair.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let (owner, name) = s.split_once('/').ok_or_else(|| ValidationError::Repository {
            value: s.to_string(),
            reason: "must have format '<owner>/<name>'".to_string(),
        })?;

        Self::from_parts(owner, name).map_err(|e| match e {
            Error::Validation(ValidationError::Repository { reason, .. }) => {
                ValidationError::Repository {
                    value: s.to_string(),
                    reason,
                }
                .into()
            }
            other => other,
        })
    }

    /// Create a repository reference from its components.
    pub fn from_parts(owner: impl AsRef<str>, name: impl AsRef<str>) -> Result<Self, Error> {
        let owner = owner.as_ref().trim();
        let name = name.as_ref().trim();
        let display = format!("{}/{}", owner, name);

        validate_owner(owner).map_err(|reason| ValidationError::Repository {
            value: display.clone(),
            reason,
        })?;
        validate_name(name).map_err(|reason| ValidationError::Repository {
            value: display.clone(),
            reason,
        })?;

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Returns the owner login.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn validate_owner(owner: &str) -> Result<(), String> {
    if owner.is_empty() {
        return Err("owner must not be empty".to_string());
    }
    if owner.len() > MAX_OWNER_LEN {
        return Err(format!("owner must be at most {} characters", MAX_OWNER_LEN));
    }
    if !owner
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err("owner may only contain letters, digits and '-'".to_string());
    }
    if owner.starts_with('-') || owner.ends_with('-') {
        return Err("owner must not start or end with '-'".to_string());
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".to_string());
    }
    if name.len() > MAX_NAME_LEN {
        return Err(format!("name must be at most {} characters", MAX_NAME_LEN));
    }
    if name == "." || name == ".." {
        return Err("name must not be '.' or '..'".to_string());
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err("name may only contain letters, digits, '-', '_' and '.'".to_string());
    }
    Ok(())
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for RepoRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RepoRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RepoRef::new(&s).map_err(serde::de::Error::custom)
    }
}
