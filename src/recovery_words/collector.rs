use std::fmt;

use itertools::Itertools;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::error;
use tracing::warn;
use zeroize::Zeroize;
use zeroize::Zeroizing;

use super::events::SubscriptionId;
use super::mnemonic_type::normalize_word;
use super::wordlist;
use super::MnemonicError;
use super::MnemonicType;
use super::RecoveryWordsEvent;
use super::SubmittedPhrase;
use super::Subscription;
use super::PHRASE_LENGTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIs)]
pub enum RecoveryWordsStatus {
    /// At least one word is missing.
    Incomplete,

    /// All words are filled in and exactly one mnemonic type validates them.
    Complete,

    /// All words are filled in but the phrase does not validate.
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIs)]
pub enum WordStatus {
    Empty,
    Known,
    Unknown,
}

/// One input field. `draft` holds what is being typed and is not seen by the
/// validity check until the field is blurred.
#[derive(Debug, Default, Clone)]
struct WordSlot {
    committed: String,
    draft: Option<String>,
}

impl Zeroize for WordSlot {
    fn zeroize(&mut self) {
        self.committed.zeroize();
        self.draft.zeroize();
    }
}

/// Collects a [`PHRASE_LENGTH`]-word recovery phrase.
///
/// Every change to the committed words re-evaluates the phrase and fires the
/// resulting status to all subscribers: [`RecoveryWordsEvent::Incomplete`],
/// [`RecoveryWordsEvent::Complete`] or [`RecoveryWordsEvent::Invalid`].
/// Committing a word that is already there is not a change and fires nothing.
///
/// Invalid input never fails; it only shows up as status. [`Self::submit`]
/// is accepted only while the status is `Complete` and consumes the
/// collector.
pub struct RecoveryWords {
    slots: Vec<WordSlot>,
    status: RecoveryWordsStatus,
    mnemonic_type: Option<MnemonicType>,
    focused: Option<usize>,
    subscribers: Vec<(SubscriptionId, mpsc::UnboundedSender<RecoveryWordsEvent>)>,
    next_subscription_id: u64,
}

impl Default for RecoveryWords {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RecoveryWords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryWords")
            .field("filled", &self.filled_count())
            .field("status", &self.status)
            .field("mnemonic_type", &self.mnemonic_type)
            .field("focused", &self.focused)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl Drop for RecoveryWords {
    fn drop(&mut self) {
        self.slots.iter_mut().for_each(Zeroize::zeroize);
    }
}

impl RecoveryWords {
    pub fn new() -> Self {
        Self {
            slots: vec![WordSlot::default(); PHRASE_LENGTH],
            status: RecoveryWordsStatus::Incomplete,
            mnemonic_type: None,
            focused: None,
            subscribers: vec![],
            next_subscription_id: 0,
        }
    }

    pub fn subscribe(&mut self) -> Subscription {
        let id = SubscriptionId(self.next_subscription_id);
        self.next_subscription_id += 1;
        let (sender, events) = mpsc::unbounded_channel();
        self.subscribers.push((id, sender));
        Subscription { id, events }
    }

    /// Returns whether `id` was subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(subscriber, _)| *subscriber != id);
        self.subscribers.len() != before
    }

    pub fn status(&self) -> RecoveryWordsStatus {
        self.status
    }

    /// The detected type, present while the status is `Complete`.
    pub fn mnemonic_type(&self) -> Option<MnemonicType> {
        self.mnemonic_type
    }

    /// The committed words, empty strings for missing ones.
    pub fn words(&self) -> Vec<&str> {
        self.slots
            .iter()
            .map(|slot| slot.committed.as_str())
            .collect_vec()
    }

    /// The phrase, present while the status is `Complete`.
    pub fn mnemonic(&self) -> Option<Vec<String>> {
        self.status.is_complete().then(|| {
            self.slots
                .iter()
                .map(|slot| slot.committed.clone())
                .collect_vec()
        })
    }

    pub fn can_submit(&self) -> bool {
        self.status.is_complete()
    }

    pub fn word_status(&self, slot: usize) -> Option<WordStatus> {
        self.slots.get(slot).map(|slot| {
            if slot.committed.is_empty() {
                WordStatus::Empty
            } else if wordlist::is_word_known(&slot.committed) {
                WordStatus::Known
            } else {
                WordStatus::Unknown
            }
        })
    }

    pub fn focused_slot(&self) -> Option<usize> {
        self.focused
    }

    /// Move focus to the first empty slot or the first slot holding an
    /// unknown word, whichever comes first, and return it. Focus does not move
    /// if every slot holds a known word.
    pub fn focus(&mut self) -> Option<usize> {
        let target =
            (0..PHRASE_LENGTH).find(|slot| self.word_status(*slot) != Some(WordStatus::Known));
        if let Some(slot) = target {
            self.focus_slot(slot);
        }
        target
    }

    /// Move focus to `slot`, committing the draft of the slot that loses it.
    pub fn focus_slot(&mut self, slot: usize) {
        if slot >= PHRASE_LENGTH {
            warn!("cannot focus slot {slot}: phrase has {PHRASE_LENGTH} words");
            return;
        }
        if let Some(previous) = self.focused.filter(|previous| *previous != slot) {
            self.blur(previous);
        }
        self.focused = Some(slot);
    }

    pub fn focus_next(&mut self) -> Option<usize> {
        let next = self.focused.map_or(0, |slot| (slot + 1).min(PHRASE_LENGTH - 1));
        self.focus_slot(next);
        self.focused
    }

    pub fn focus_previous(&mut self) -> Option<usize> {
        let previous = self.focused.map_or(0, |slot| slot.saturating_sub(1));
        self.focus_slot(previous);
        self.focused
    }

    /// Record a keystroke: `text` becomes the draft of `slot`, which gets
    /// focus. Drafts do not affect the status.
    pub fn input(&mut self, slot: usize, text: &str) {
        self.focus_slot(slot);
        if let Some(word_slot) = self.slots.get_mut(slot) {
            word_slot.draft.zeroize();
            word_slot.draft = Some(text.to_string());
        }
    }

    /// Commit the draft of `slot`. A draft holding several words spreads over
    /// the following slots as if pasted.
    pub fn blur(&mut self, slot: usize) {
        if self.focused == Some(slot) {
            self.focused = None;
        }
        let Some(draft) = self
            .slots
            .get_mut(slot)
            .and_then(|s| s.draft.take())
            .map(Zeroizing::new)
        else {
            return;
        };
        if draft.split_whitespace().nth(1).is_some() {
            self.paste(slot, &draft);
        } else {
            self.commit(slot, &draft);
        }
    }

    /// Type `word` into `slot` and commit it.
    pub fn set_word(&mut self, slot: usize, word: &str) {
        if slot >= PHRASE_LENGTH {
            warn!("cannot set word {slot}: phrase has {PHRASE_LENGTH} words");
            return;
        }
        if let Some(word_slot) = self.slots.get_mut(slot) {
            word_slot.draft.zeroize();
        }
        self.commit(slot, word);
    }

    pub fn clear_word(&mut self, slot: usize) {
        self.set_word(slot, "");
    }

    pub fn clear(&mut self) {
        let mut changed = false;
        for slot in &mut self.slots {
            slot.draft.zeroize();
            if !slot.committed.is_empty() {
                slot.committed.zeroize();
                changed = true;
            }
        }
        if changed {
            self.evaluate();
        }
    }

    /// Split `text` on whitespace and fill the words into consecutive slots
    /// starting at `slot`. Words beyond the last slot are dropped. Returns the
    /// number of slots filled. The phrase is evaluated once for the whole
    /// paste.
    pub fn paste(&mut self, slot: usize, text: &str) -> usize {
        let mut filled = 0;
        let mut changed = false;
        for (target, word) in (slot..PHRASE_LENGTH).zip(text.split_whitespace()) {
            let word_slot = &mut self.slots[target];
            word_slot.draft.zeroize();
            changed |= Self::replace_committed(word_slot, word);
            filled += 1;
        }

        let overflow = text.split_whitespace().count().saturating_sub(filled);
        if overflow > 0 {
            debug!("dropped {overflow} pasted words beyond the last slot");
        }
        if changed {
            self.evaluate();
        }
        filled
    }

    /// Hand out the phrase if it is complete. On success the collector is
    /// consumed and subscribers receive [`RecoveryWordsEvent::Submitted`];
    /// otherwise the collector is returned unchanged.
    pub fn submit(mut self) -> Result<SubmittedPhrase, Self> {
        let (Some(mnemonic_type), Some(words)) = (self.mnemonic_type, self.mnemonic()) else {
            debug!("ignoring submit while recovery words are {}", self.status);
            return Err(self);
        };

        let submitted = SubmittedPhrase::new(words, mnemonic_type);
        self.emit(RecoveryWordsEvent::Submitted(submitted.clone()));
        Ok(submitted)
    }

    fn commit(&mut self, slot: usize, word: &str) {
        let Some(word_slot) = self.slots.get_mut(slot) else {
            return;
        };
        if Self::replace_committed(word_slot, word) {
            self.evaluate();
        }
    }

    /// Returns whether the committed word changed.
    fn replace_committed(word_slot: &mut WordSlot, word: &str) -> bool {
        let normalized = normalize_word(word);
        if word_slot.committed == normalized {
            return false;
        }
        word_slot.committed.zeroize();
        word_slot.committed = normalized;
        true
    }

    fn filled_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| !slot.committed.is_empty())
            .count()
    }

    fn evaluate(&mut self) {
        let (status, mnemonic_type) = if self.filled_count() < PHRASE_LENGTH {
            (RecoveryWordsStatus::Incomplete, None)
        } else {
            match MnemonicType::detect(&self.words()) {
                Ok(mnemonic_type) => (RecoveryWordsStatus::Complete, Some(mnemonic_type)),
                Err(MnemonicError::Ambiguous) => {
                    error!("recovery words are valid as more than one mnemonic type");
                    (RecoveryWordsStatus::Invalid, None)
                }
                Err(e) => {
                    debug!("recovery words are invalid: {e}");
                    (RecoveryWordsStatus::Invalid, None)
                }
            }
        };
        self.status = status;
        self.mnemonic_type = mnemonic_type;

        let event = match (status, mnemonic_type) {
            (RecoveryWordsStatus::Complete, Some(mnemonic_type)) => {
                RecoveryWordsEvent::Complete { mnemonic_type }
            }
            (RecoveryWordsStatus::Invalid, _) => RecoveryWordsEvent::Invalid,
            _ => RecoveryWordsEvent::Incomplete,
        };
        self.emit(event);
    }

    fn emit(&mut self, event: RecoveryWordsEvent) {
        self.subscribers
            .retain(|(_, sender)| sender.send(event.clone()).is_ok());
    }
}
