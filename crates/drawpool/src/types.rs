use core::{fmt, str::FromStr};

use ed25519_dalek::VerifyingKey;

/// An opaque 32-byte caller or beneficiary identity.
///
/// Identities are usually derived from an ed25519 verifying key, but any
/// 32-byte handle works. They render as lowercase hex.
///
/// # Example
/// ```
/// use drawpool::Identity;
///
/// let id: Identity = "11".repeat(32).parse().unwrap();
/// assert_eq!(id.as_bytes(), &[0x11; 32]);
/// assert_eq!(id.to_string(), "11".repeat(32));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identity([u8; 32]);

impl Identity {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Identity {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<&VerifyingKey> for Identity {
    fn from(key: &VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

/// Failure to parse an [`Identity`] or [`Domain`] deployment from hex.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ParseIdentityError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("expected 32 bytes, got {0}")]
    Length(usize),
}

/// Decodes exactly 32 bytes of hex.
pub fn decode_hex32(s: &str) -> Result<[u8; 32], ParseIdentityError> {
    let bytes = hex::decode(s.trim())?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| ParseIdentityError::Length(len))
}

impl FromStr for Identity {
    type Err = ParseIdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_hex32(s).map(Self)
    }
}

/// The handle an oracle issues for one randomness request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A 1-based identifier drawn from a pool of `capacity` identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenId(pub u64);

impl TokenId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Domain separator bound into every authorization.
///
/// A signature made for one deployment (or one network) never verifies on
/// another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Domain {
    /// Identity of the deployed minter instance.
    pub deployment: [u8; 32],
    /// Identity of the network the instance runs on.
    pub network_id: u64,
}

impl Domain {
    pub const fn new(deployment: [u8; 32], network_id: u64) -> Self {
        Self {
            deployment,
            network_id,
        }
    }
}
