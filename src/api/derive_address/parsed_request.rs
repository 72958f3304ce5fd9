use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;

use crate::state::key_store::KeyInfo;
use crate::util_types::key_path::KeyPath;

/// A derive-address request that passed validation.
///
/// Every field is well-typed and cross-checked against the key store: the key
/// exists, it supports address derivation and the base path is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDeriveAddressRequest {
    pub app_name: String,
    pub key_info: KeyInfo,
    pub key_label: Option<String>,
    pub base_key_path: KeyPath,
    pub indices_to_derive: Vec<u32>,
}

impl ParsedDeriveAddressRequest {
    /// The full path of every requested address, in request order.
    pub fn paths_to_derive(&self) -> Vec<KeyPath> {
        self.indices_to_derive
            .iter()
            .map(|index| self.base_key_path.child(*index))
            .collect_vec()
    }
}
