//! Tenant identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ValidationError};

/// Identifier of the operator on whose behalf credentials and repository
/// operations are scoped.
///
/// The value is opaque to ghvis; it is supplied by the caller (originally a
/// chat user id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i64);

impl TenantId {
    /// Create a tenant id from its raw value.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for TenantId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| {
                ValidationError::Tenant {
                    value: s.to_string(),
                }
                .into()
            })
    }
}
