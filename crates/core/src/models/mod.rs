//! Domain models for cross-chain messages and transfer requests.
//!
//! These models are storage-agnostic and represent the canonical form of
//! facilitator state within the domain layer. All status transitions go
//! through the methods on [`Message`], which encode the monotonic lifecycle
//! lattice and make backward transitions unrepresentable.

use serde::{Deserialize, Serialize};

mod message;
mod transfer_request;

pub use message::Message;
pub use transfer_request::MessageTransferRequest;

// =============================================================================
// Fixed-size byte newtypes
// =============================================================================

/// Macro to generate fixed-length byte newtypes with common functionality.
///
/// Generates:
/// - `from_hex()` - Parse from hex string (with or without 0x prefix)
/// - `to_hex()` - Convert to 0x-prefixed hex string
/// - `Display` trait implementation
/// - `From<[u8; N]>` implementation
/// - serde as 0x-prefixed hex string (the form every upstream record uses)
macro_rules! bytes_newtype {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Parse from hex string (with or without 0x prefix).
            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(s)?;
                let arr: [u8; $len] = bytes
                    .try_into()
                    .map_err(|_| hex::FromHexError::InvalidStringLength)?;
                Ok(Self(arr))
            }

            /// Convert to 0x-prefixed hex string.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }

            /// Get the inner bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

bytes_newtype!(
    /// 32-byte hash identifying one cross-chain message (keccak of the
    /// message intent parameters, computed on-chain).
    MessageHash,
    32
);

bytes_newtype!(
    /// 32-byte hash identifying one logical transfer request. Not unique
    /// across occurrences: a resubmitted request reuses the same hash at a
    /// later block.
    RequestHash,
    32
);

bytes_newtype!(
    /// 32-byte hashed-timelock unlock secret revealed by progress events.
    Secret,
    32
);

bytes_newtype!(
    /// 32-byte hashed-timelock lock (hash of the unlock secret).
    HashLock,
    32
);

bytes_newtype!(
    /// 20-byte account or contract address.
    Address,
    20
);

// =============================================================================
// Enumerations
// =============================================================================

/// Protocol operation a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Stake,
    Redeem,
}

impl MessageType {
    /// Stable text form used by the storage layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stake => "stake",
            Self::Redeem => "redeem",
        }
    }

    /// Parse the stable text form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stake" => Some(Self::Stake),
            "redeem" => Some(Self::Redeem),
            _ => None,
        }
    }
}

/// Which chain a message originates on. Stake messages flow o2a, redeem
/// messages a2o.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageDirection {
    #[serde(rename = "o2a")]
    OriginToAuxiliary,
    #[serde(rename = "a2o")]
    AuxiliaryToOrigin,
}

impl MessageDirection {
    /// Stable text form used by the storage layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OriginToAuxiliary => "o2a",
            Self::AuxiliaryToOrigin => "a2o",
        }
    }

    /// Parse the stable text form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "o2a" => Some(Self::OriginToAuxiliary),
            "a2o" => Some(Self::AuxiliaryToOrigin),
            _ => None,
        }
    }
}

/// Per-side lifecycle checkpoint of a message.
///
/// The covered transitions form a one-way lattice
/// `Undeclared < Declared < Progressed`; revocation states exist in the
/// protocol but no handler here produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Undeclared,
    Declared,
    Progressed,
    RevocationDeclared,
    Revoked,
}

impl MessageStatus {
    /// Stable text form used by the storage layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undeclared => "undeclared",
            Self::Declared => "declared",
            Self::Progressed => "progressed",
            Self::RevocationDeclared => "revocation_declared",
            Self::Revoked => "revoked",
        }
    }

    /// Parse the stable text form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "undeclared" => Some(Self::Undeclared),
            "declared" => Some(Self::Declared),
            "progressed" => Some(Self::Progressed),
            "revocation_declared" => Some(Self::RevocationDeclared),
            "revoked" => Some(Self::Revoked),
            _ => None,
        }
    }
}

/// Kind of a transfer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Stake,
    Redeem,
}

impl RequestType {
    /// Stable text form used by the storage layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stake => "stake",
            Self::Redeem => "redeem",
        }
    }

    /// Parse the stable text form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stake" => Some(Self::Stake),
            "redeem" => Some(Self::Redeem),
            _ => None,
        }
    }
}

// =============================================================================
// Persisted-entity sum
// =============================================================================

/// Any entity a handler can persist; returned by `persist` so callers can
/// report on the batch without knowing the concrete handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entity {
    Message(Box<Message>),
    TransferRequest(Box<MessageTransferRequest>),
}

impl From<Message> for Entity {
    fn from(message: Message) -> Self {
        Self::Message(Box::new(message))
    }
}

impl From<MessageTransferRequest> for Entity {
    fn from(request: MessageTransferRequest) -> Self {
        Self::TransferRequest(Box::new(request))
    }
}

// =============================================================================
// Tests
// =============================================================================
