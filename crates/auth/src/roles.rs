use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for gating administrative operations.
///
/// Roles are intentionally opaque strings at this layer; what a role may do
/// is decided where it is checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

/// The role allowed to trigger batch operations (renewals, overdue sweep).
pub const ADMIN: Role = Role(Cow::Borrowed("admin"));

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
