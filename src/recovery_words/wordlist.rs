//! The BIP39 English wordlist, shared by every supported mnemonic type.

use bip39::Language;

pub const WORDLIST_SIZE: usize = 2048;

/// Number of bits a single word encodes.
pub const BITS_PER_WORD: usize = 11;

/// The position of `word` in the wordlist. Expects a normalized
/// (trimmed, lower-case) word.
pub fn word_index(word: &str) -> Option<u16> {
    Language::English
        .wordmap()
        .get_bits(word)
        .ok()
        .map(u16::from)
}

pub fn is_word_known(word: &str) -> bool {
    word_index(word).is_some()
}

pub fn word_at(index: u16) -> Option<&'static str> {
    (usize::from(index) < WORDLIST_SIZE)
        .then(|| Language::English.wordlist().get_word(index.into()))
}

/// All known words starting with `prefix`, in wordlist order.
pub fn words_with_prefix(prefix: &str) -> Vec<&'static str> {
    if prefix.is_empty() {
        return vec![];
    }
    Language::English
        .wordlist()
        .get_words_by_prefix(prefix)
        .to_vec()
}
