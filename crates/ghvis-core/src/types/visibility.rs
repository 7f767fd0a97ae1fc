//! Visibility and batch mode types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ValidationError};

/// Repository visibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    /// Visibility corresponding to the remote `private` flag.
    pub fn from_private(private: bool) -> Self {
        if private {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    /// Returns true for [`Visibility::Private`].
    pub fn is_private(self) -> bool {
        matches!(self, Visibility::Private)
    }

    /// The opposite visibility.
    pub fn flipped(self) -> Self {
        match self {
            Visibility::Public => Visibility::Private,
            Visibility::Private => Visibility::Public,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intent of a batch operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchMode {
    /// Make every repository private.
    MakePrivate,
    /// Make every repository public.
    MakePublic,
    /// Flip each repository's current visibility independently.
    AutoToggle,
}

impl BatchMode {
    /// The fixed target visibility, or `None` for auto-toggle.
    pub fn target(self) -> Option<Visibility> {
        match self {
            BatchMode::MakePrivate => Some(Visibility::Private),
            BatchMode::MakePublic => Some(Visibility::Public),
            BatchMode::AutoToggle => None,
        }
    }

    /// Short label used in audit actions (`batch_<label>`).
    pub fn label(self) -> &'static str {
        match self {
            BatchMode::MakePrivate => "private",
            BatchMode::MakePublic => "public",
            BatchMode::AutoToggle => "toggle",
        }
    }

    /// Audit action recorded for each repository of a batch.
    pub fn audit_action(self) -> String {
        format!("batch_{}", self.label())
    }
}

impl fmt::Display for BatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BatchMode::MakePrivate => "make-private",
            BatchMode::MakePublic => "make-public",
            BatchMode::AutoToggle => "auto-toggle",
        })
    }
}

impl FromStr for BatchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "private" | "make-private" => Ok(BatchMode::MakePrivate),
            "public" | "make-public" => Ok(BatchMode::MakePublic),
            "toggle" | "auto-toggle" => Ok(BatchMode::AutoToggle),
            _ => Err(ValidationError::Other {
                message: format!("unknown batch mode '{}'", s),
            }
            .into()),
        }
    }
}
