//! Collecting a recovery phrase from a human.
//!
//! [`RecoveryWords`] holds the words typed so far, tells the surrounding form
//! whether the phrase is complete, incomplete or invalid, and hands out the
//! phrase once it is submitted.

mod collector;
mod events;
mod mnemonic_type;
pub mod wordlist;

pub use collector::RecoveryWords;
pub use collector::RecoveryWordsStatus;
pub use collector::WordStatus;
pub use events::RecoveryWordsEvent;
pub use events::SubmittedPhrase;
pub use events::Subscription;
pub use events::SubscriptionId;
pub use mnemonic_type::normalize_word;
pub use mnemonic_type::MnemonicError;
pub use mnemonic_type::MnemonicType;
pub use mnemonic_type::ENTROPY_BYTES;

/// Number of words in a supported recovery phrase.
pub const PHRASE_LENGTH: usize = 24;
