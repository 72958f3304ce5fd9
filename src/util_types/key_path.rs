//! Hierarchical-deterministic derivation paths.
//!
//! Only hardened segments are accepted, e.g. `m/44'/242'/0'`, since keys are
//! derived with SLIP-0010 for ed25519 where non-hardened derivation does not
//! exist.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use itertools::Itertools;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyPathError {
    #[error("invalid derivation path: {0}")]
    Invalid(String),
}

/// A syntactically valid derivation path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyPath(String);

fn path_regex() -> &'static Regex {
    static PATH_REGEX: OnceLock<Regex> = OnceLock::new();
    PATH_REGEX.get_or_init(|| Regex::new(r"^m(/[0-9]+')*$").expect("path regex is valid"))
}

impl KeyPath {
    /// The master key path `m`.
    pub fn master() -> Self {
        Self("m".to_string())
    }

    /// Checks path syntax and that every segment fits a `u32`.
    pub fn is_valid(path: &str) -> bool {
        path_regex().is_match(path) && Self::parse_segments(path).is_some()
    }

    fn parse_segments(path: &str) -> Option<Vec<u32>> {
        path.split('/')
            .skip(1)
            .map(|segment| segment.trim_end_matches('\'').parse::<u32>().ok())
            .collect()
    }

    /// The hardened indices of this path, without the hardening offset.
    pub fn segments(&self) -> Vec<u32> {
        // validated on construction
        Self::parse_segments(&self.0).unwrap_or_default()
    }

    /// The path of the hardened child at `index`.
    pub fn child(&self, index: u32) -> Self {
        Self(format!("{}/{}'", self.0, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for KeyPath {
    type Err = KeyPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl TryFrom<String> for KeyPath {
    type Error = KeyPathError;

    fn try_from(path: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&path) {
            Ok(Self(path))
        } else {
            Err(KeyPathError::Invalid(path))
        }
    }
}

impl From<KeyPath> for String {
    fn from(path: KeyPath) -> Self {
        path.0
    }
}

impl From<&[u32]> for KeyPath {
    fn from(segments: &[u32]) -> Self {
        let suffix = segments.iter().map(|s| format!("/{s}'")).join("");
        Self(format!("m{suffix}"))
    }
}
