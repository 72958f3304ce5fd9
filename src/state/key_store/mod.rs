//! Read access to the persisted keys.
//!
//! The request layer only ever looks keys up; creating, encrypting and
//! deleting keys belongs to the owner of the store.

mod memory_key_store;

use async_trait::async_trait;
pub use memory_key_store::MemoryKeyStore;
use serde::Deserialize;
use serde::Serialize;
use strum::EnumIter;

use crate::recovery_words::MnemonicType;

/// The kind of secret a stored key was created from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    strum::Display,
    strum::EnumIs,
)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum KeyType {
    /// A single-account key imported from a legacy recovery phrase or file.
    #[strum(to_string = "legacy")]
    Legacy,

    /// A hierarchical-deterministic key backed by a BIP39 phrase.
    #[strum(to_string = "bip39")]
    Bip39,
}

impl KeyType {
    /// Whether child addresses can be derived from keys of this type.
    pub fn supports_address_derivation(&self) -> bool {
        match self {
            Self::Legacy => false,
            Self::Bip39 => true,
        }
    }
}

impl From<MnemonicType> for KeyType {
    fn from(mnemonic_type: MnemonicType) -> Self {
        match mnemonic_type {
            MnemonicType::Bip39 => Self::Bip39,
            MnemonicType::Legacy => Self::Legacy,
        }
    }
}

/// What the key store knows about a key, without its secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    pub id: String,

    #[serde(rename = "type")]
    pub key_type: KeyType,

    /// Whether the stored secret is encrypted with a password.
    #[serde(default)]
    pub encrypted: bool,

    /// Whether the password is a short numeric PIN.
    #[serde(default)]
    pub has_pin: bool,
}

impl KeyInfo {
    pub fn new(id: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            id: id.into(),
            key_type,
            encrypted: true,
            has_pin: false,
        }
    }
}

/// Read-only lookup of key metadata.
///
/// Implementations report a missing key as `None`; they never fail.
#[async_trait]
pub trait KeyStore: Send + Sync + std::fmt::Debug {
    async fn get_info(&self, key_id: &str) -> Option<KeyInfo>;
}
