use std::fmt;

use tokio::sync::mpsc;
use zeroize::Zeroize;

use super::MnemonicType;

/// What a [`RecoveryWords`](super::RecoveryWords) collector tells its
/// subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryWordsEvent {
    /// Not every word is filled in.
    Incomplete,

    /// Every word is filled in and the phrase is valid.
    Complete { mnemonic_type: MnemonicType },

    /// Every word is filled in but the phrase is not valid.
    Invalid,

    /// The phrase was submitted. Always the last event.
    Submitted(SubmittedPhrase),
}

/// The final phrase handed out on submission: normalized words and the
/// detected type. The words are wiped when this is dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct SubmittedPhrase {
    words: Vec<String>,
    mnemonic_type: MnemonicType,
}

impl SubmittedPhrase {
    pub(super) fn new(words: Vec<String>, mnemonic_type: MnemonicType) -> Self {
        Self {
            words,
            mnemonic_type,
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn mnemonic_type(&self) -> MnemonicType {
        self.mnemonic_type
    }
}

impl fmt::Debug for SubmittedPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmittedPhrase")
            .field("words", &"<redacted>")
            .field("mnemonic_type", &self.mnemonic_type)
            .finish()
    }
}

impl Drop for SubmittedPhrase {
    fn drop(&mut self) {
        self.words.zeroize();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(super) u64);

/// A registered listener. Events arrive on `events` in the order they were
/// fired; the channel closes when the listener is unsubscribed or the
/// collector goes away.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub events: mpsc::UnboundedReceiver<RecoveryWordsEvent>,
}
