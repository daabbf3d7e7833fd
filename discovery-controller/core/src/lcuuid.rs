use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt, num::ParseIntError, str::FromStr};
use uuid::Uuid;

/// Identifies the tenant that owns a synchronization pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(u32);

/// A deterministic, tenant-scoped resource identity.
///
/// Identities are a pure function of the owning org and a key so that repeated passes over the
/// same snapshot (even across restarts) produce the same identities. Identities contributed by
/// upstream indices are opaque strings and may be wrapped with `From`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lcuuid(String);

// === impl OrgId ===

impl OrgId {
    pub const DEFAULT: Self = Self(1);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for OrgId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for OrgId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// === impl Lcuuid ===

impl Lcuuid {
    /// Generates the identity of `key` within `org`.
    ///
    /// The default org hashes the key alone; every other org prefixes the key with its id.
    pub fn generate(org: OrgId, key: impl AsRef<str>) -> Self {
        let key = key.as_ref();
        let uuid = if org == OrgId::DEFAULT {
            Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
        } else {
            Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{org}{key}").as_bytes())
        };
        Self(uuid.to_string())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Lcuuid {
    #[inline]
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Lcuuid {
    #[inline]
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Lcuuid {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Lcuuid {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Lcuuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
