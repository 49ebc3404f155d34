//! Domain records and their canonical encoding.
//!
//! Records are stored as JSON objects whose field order follows the struct
//! declaration, so the encoding of a given value is stable byte-for-byte.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A value that can be stored as a single object.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Object key (before the configured prefix is applied).
    fn key(&self) -> &str;

    /// Encode into the canonical byte representation.
    ///
    /// # Errors
    ///
    /// Returns the codec error if the value cannot be represented as JSON.
    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode from the canonical byte representation.
    ///
    /// # Errors
    ///
    /// Returns the codec error if `bytes` is not a valid encoding of `Self`.
    fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// A wedding guest's RSVP.
///
/// Wire field names are `Name`, `Attending`, `Cocktail`, `Address`, `Message`.
/// All of them are required when decoding; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Guest {
    /// Guest name, used as the object key.
    pub name: String,
    /// Whether the guest will attend.
    pub attending: bool,
    /// Cocktail choice.
    pub cocktail: String,
    /// Postal address.
    pub address: String,
    /// Free-form note to the hosts.
    pub message: String,
}

impl Guest {
    /// Create a guest record.
    pub fn new(
        name: impl Into<String>,
        attending: bool,
        cocktail: impl Into<String>,
        address: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            attending,
            cocktail: cocktail.into(),
            address: address.into(),
            message: message.into(),
        }
    }
}

impl Record for Guest {
    fn key(&self) -> &str {
        &self.name
    }
}
