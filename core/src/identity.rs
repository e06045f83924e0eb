//! 32-byte account identities (owners, escrow addresses, program ids).

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::error::IdentityError;
#[cfg(feature = "json")]
use crate::serde::bs58_serde;

/// A ledger account identity, rendered as base58.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(transparent))]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identity(#[cfg_attr(feature = "json", serde(with = "bs58_serde"))] pub [u8; 32]);

impl Identity {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl AsRef<[u8]> for Identity {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Identity {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self)
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    /// Parses a base58-encoded 32-byte identity.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::EmptyIdentity` on empty input,
    /// `IdentityError::Base58` on malformed input and
    /// `IdentityError::InvalidLength` if the decoded bytes are not 32 long.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdentityError::EmptyIdentity);
        }
        let bytes = bs58::decode(s).into_vec()?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| IdentityError::InvalidLength(v.len()))?;
        Ok(Self(bytes))
    }
}
