use bip39::Language;
use bip39::Mnemonic;
use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;
use strum::EnumIter;
use zeroize::Zeroize;
use zeroize::Zeroizing;

use super::wordlist;
use super::wordlist::BITS_PER_WORD;
use super::PHRASE_LENGTH;
use crate::state::key_store::KeyType;

/// Bytes of entropy encoded by a full phrase.
pub const ENTROPY_BYTES: usize = 32;

const CRC8_POLYNOMIAL: u8 = 0x97;
const CRC8_TABLE: [u8; 256] = crc8_table();

/// The checksum schemes a recovery phrase can follow. Both use the BIP39
/// English wordlist and 8 checksum bits after 256 bits of entropy.
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
pub enum MnemonicType {
    /// Checksum is the first byte of SHA-256 over the entropy.
    #[strum(to_string = "bip39")]
    Bip39,

    /// Checksum is the CRC-8 of the entropy.
    #[strum(to_string = "legacy")]
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MnemonicError {
    #[error("expected {expected} words, got {0}", expected = PHRASE_LENGTH)]
    WrongLength(usize),

    #[error("word at position {position} is not in the wordlist")]
    UnknownWord { position: usize },

    #[error("Invalid checksum")]
    InvalidChecksum,

    /// Both schemes accept the phrase, so its type cannot be told.
    #[error("phrase is valid as more than one mnemonic type")]
    Ambiguous,
}

/// Entropy and checksum bits read from a full phrase.
struct DecodedPhrase {
    entropy: [u8; ENTROPY_BYTES],
    checksum: u8,
}

impl Drop for DecodedPhrase {
    fn drop(&mut self) {
        self.entropy.zeroize();
        self.checksum.zeroize();
    }
}

impl MnemonicType {
    /// Which scheme validates `words`.
    ///
    /// Words are normalized before lookup. Fails with
    /// [`MnemonicError::Ambiguous`] instead of picking one when both schemes
    /// validate the phrase.
    pub fn detect<S: AsRef<str>>(words: &[S]) -> Result<Self, MnemonicError> {
        let normalized = normalize_words(words);
        let decoded = decode(&normalized)?;

        match (
            Self::Bip39.checksum_matches(&normalized, &decoded),
            Self::Legacy.checksum_matches(&normalized, &decoded),
        ) {
            (true, true) => Err(MnemonicError::Ambiguous),
            (true, false) => Ok(Self::Bip39),
            (false, true) => Ok(Self::Legacy),
            (false, false) => Err(MnemonicError::InvalidChecksum),
        }
    }

    /// Whether `words` form a valid phrase of this type.
    pub fn validates<S: AsRef<str>>(&self, words: &[S]) -> bool {
        let normalized = normalize_words(words);
        decode(&normalized).is_ok_and(|decoded| self.checksum_matches(&normalized, &decoded))
    }

    fn checksum_matches(&self, normalized: &[String], decoded: &DecodedPhrase) -> bool {
        match self {
            Self::Bip39 => {
                let phrase = Zeroizing::new(normalized.join(" "));
                Mnemonic::from_phrase(&phrase, Language::English).is_ok()
            }
            Self::Legacy => crc8(&decoded.entropy) == decoded.checksum,
        }
    }

    /// The kind of key a phrase of this type imports as.
    pub fn to_key_type(self) -> KeyType {
        KeyType::from(self)
    }

    /// Encode `entropy` as a phrase of this type.
    pub fn phrase_from_entropy(&self, entropy: &[u8; ENTROPY_BYTES]) -> Vec<String> {
        match self {
            Self::Bip39 => {
                let mnemonic = Mnemonic::from_entropy(entropy, Language::English)
                    .expect("32 bytes is a valid entropy length");
                mnemonic.phrase().split(' ').map(str::to_string).collect_vec()
            }
            Self::Legacy => encode(entropy, crc8(entropy)),
        }
    }
}

/// Trim and lower-case a word the way it is stored in a phrase.
pub fn normalize_word(word: &str) -> String {
    word.trim().to_lowercase()
}

fn normalize_words<S: AsRef<str>>(words: &[S]) -> Zeroizing<Vec<String>> {
    Zeroizing::new(
        words
            .iter()
            .map(|word| normalize_word(word.as_ref()))
            .collect_vec(),
    )
}

fn decode(words: &[String]) -> Result<DecodedPhrase, MnemonicError> {
    if words.len() != PHRASE_LENGTH {
        return Err(MnemonicError::WrongLength(words.len()));
    }

    let mut bytes = Zeroizing::new([0u8; ENTROPY_BYTES + 1]);
    let mut bit_position = 0;
    for (position, word) in words.iter().enumerate() {
        let index = wordlist::word_index(word).ok_or(MnemonicError::UnknownWord { position })?;
        for shift in (0..BITS_PER_WORD).rev() {
            if (index >> shift) & 1 == 1 {
                bytes[bit_position / 8] |= 0x80 >> (bit_position % 8);
            }
            bit_position += 1;
        }
    }

    let mut entropy = [0u8; ENTROPY_BYTES];
    entropy.copy_from_slice(&bytes[..ENTROPY_BYTES]);
    Ok(DecodedPhrase {
        entropy,
        checksum: bytes[ENTROPY_BYTES],
    })
}

fn encode(entropy: &[u8; ENTROPY_BYTES], checksum: u8) -> Vec<String> {
    let mut bytes = Zeroizing::new([0u8; ENTROPY_BYTES + 1]);
    bytes[..ENTROPY_BYTES].copy_from_slice(entropy);
    bytes[ENTROPY_BYTES] = checksum;

    (0..PHRASE_LENGTH)
        .map(|word_number| {
            let index = (0..BITS_PER_WORD).fold(0u16, |index, bit| {
                let bit_position = word_number * BITS_PER_WORD + bit;
                let bit_value = (bytes[bit_position / 8] >> (7 - bit_position % 8)) & 1;
                (index << 1) | u16::from(bit_value)
            });
            wordlist::word_at(index)
                .expect("11-bit index is within the wordlist")
                .to_string()
        })
        .collect_vec()
}

const fn crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut current = i as u8;
        let mut bit = 0;
        while bit < 8 {
            current = if current & 0x80 != 0 {
                (current << 1) ^ CRC8_POLYNOMIAL
            } else {
                current << 1
            };
            bit += 1;
        }
        table[i] = current;
        i += 1;
    }
    table
}

fn crc8(data: &[u8]) -> u8 {
    data.iter()
        .fold(0u8, |crc, byte| CRC8_TABLE[usize::from(crc ^ byte)])
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use proptest::prop_assert_eq;
    use proptest::prop_assume;
    use strum::IntoEnumIterator;
    use test_strategy::proptest;

    use super::*;
    use crate::tests::shared::bip39_test_phrase;
    use crate::tests::shared::invalid_checksum_phrase;
    use crate::tests::shared::legacy_test_phrase;

    #[test]
    fn crc8_of_zero_is_zero() {
        assert_eq!(0, crc8(&[0u8; ENTROPY_BYTES]));
        assert_eq!(CRC8_POLYNOMIAL, crc8(&[1]));
        assert_eq!(CRC8_TABLE[1], CRC8_POLYNOMIAL);
    }

    #[test]
    fn canonical_phrases_are_detected() {
        assert_eq!(Ok(MnemonicType::Bip39), MnemonicType::detect(&bip39_test_phrase()));
        assert_eq!(Ok(MnemonicType::Legacy), MnemonicType::detect(&legacy_test_phrase()));
        assert_eq!(
            Err(MnemonicError::InvalidChecksum),
            MnemonicType::detect(&invalid_checksum_phrase())
        );
    }

    #[test]
    fn detection_normalizes_words() {
        let shouty = bip39_test_phrase()
            .into_iter()
            .map(|w| format!("  {}\t", w.to_uppercase()))
            .collect_vec();
        assert_eq!(Ok(MnemonicType::Bip39), MnemonicType::detect(&shouty));
    }

    #[test]
    fn wrong_length_and_unknown_words() {
        let phrase = bip39_test_phrase();
        assert_eq!(
            Err(MnemonicError::WrongLength(23)),
            MnemonicType::detect(&phrase[..23])
        );

        let mut with_typo = phrase.clone();
        with_typo[5] = "abandn".to_string();
        assert_eq!(
            Err(MnemonicError::UnknownWord { position: 5 }),
            MnemonicType::detect(&with_typo)
        );
        assert!(!MnemonicType::Bip39.validates(&with_typo));
    }

    #[test]
    fn only_bip39_phrases_import_as_hd_keys() {
        assert!(MnemonicType::Bip39.to_key_type().supports_address_derivation());
        assert_eq!(KeyType::Legacy, MnemonicType::Legacy.to_key_type());
    }

    #[test]
    fn zero_entropy_encodes_to_known_phrases() {
        let zero = [0u8; ENTROPY_BYTES];
        assert_eq!(bip39_test_phrase(), MnemonicType::Bip39.phrase_from_entropy(&zero));
        assert_eq!(legacy_test_phrase(), MnemonicType::Legacy.phrase_from_entropy(&zero));
    }

    #[proptest(cases = 64)]
    fn generated_phrases_validate_as_their_type(
        #[strategy(proptest::array::uniform32(proptest::num::u8::ANY))] entropy: [u8; 32],
    ) {
        for mnemonic_type in MnemonicType::iter() {
            let phrase = mnemonic_type.phrase_from_entropy(&entropy);
            prop_assert_eq!(PHRASE_LENGTH, phrase.len());
            prop_assert_eq!(true, mnemonic_type.validates(&phrase));
        }
    }

    #[proptest(cases = 64)]
    fn detection_agrees_with_validation(
        #[strategy(proptest::array::uniform32(proptest::num::u8::ANY))] entropy: [u8; 32],
    ) {
        let phrase = MnemonicType::Legacy.phrase_from_entropy(&entropy);
        let also_bip39 = MnemonicType::Bip39.validates(&phrase);
        prop_assume!(!also_bip39);
        prop_assert_eq!(Ok(MnemonicType::Legacy), MnemonicType::detect(&phrase));
    }

    #[test]
    fn ambiguous_phrase_is_reported() {
        // about one in 256 phrases satisfies both checksums
        let ambiguous = (0u8..=255)
            .flat_map(|a| (0u8..=255).map(move |b| (a, b)))
            .map(|(a, b)| {
                let mut entropy = [0u8; ENTROPY_BYTES];
                entropy[0] = a;
                entropy[1] = b;
                MnemonicType::Legacy.phrase_from_entropy(&entropy)
            })
            .find(|phrase| MnemonicType::Bip39.validates(phrase))
            .expect("some phrase among 65536 is valid under both schemes");

        assert_eq!(Err(MnemonicError::Ambiguous), MnemonicType::detect(&ambiguous));
    }
}
