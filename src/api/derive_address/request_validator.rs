use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use tracing::warn;

use super::ParsedDeriveAddressRequest;
use crate::api::error::InvalidRequest;
use crate::state::key_store::KeyStore;
use crate::util_types::key_path::KeyPath;

/// A request as it arrives from the calling application: any JSON value.
pub type UntrustedRequest = Value;

/// Turns an [`UntrustedRequest`] into a [`ParsedDeriveAddressRequest`].
///
/// Checks run in a fixed order and stop at the first failure, so a request
/// with several problems always reports the earliest one. The validator only
/// reads from the key store and holds no other state, so concurrent
/// validations are independent.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    key_store: Arc<dyn KeyStore>,
}

impl RequestValidator {
    pub fn new(key_store: Arc<dyn KeyStore>) -> Self {
        Self { key_store }
    }

    pub async fn validate(
        &self,
        request: &UntrustedRequest,
    ) -> Result<ParsedDeriveAddressRequest, InvalidRequest> {
        if is_empty_request(request) {
            return Err(InvalidRequest::EmptyRequest);
        }

        let app_name =
            non_empty_string(request, "appName").ok_or(InvalidRequest::AppNameRequired)?;
        let key_id = non_empty_string(request, "keyId").ok_or(InvalidRequest::KeyIdRequired)?;

        let Some(key_info) = self.key_store.get_info(key_id).await else {
            debug!("derive-address request for unknown key {key_id}");
            return Err(InvalidRequest::UnknownKeyId);
        };

        if !key_info.key_type.supports_address_derivation() {
            return Err(InvalidRequest::SingleAccountWallet);
        }

        let base_key_path = request
            .get("baseKeyPath")
            .and_then(Value::as_str)
            .and_then(|path| KeyPath::try_from(path.to_string()).ok())
            .ok_or(InvalidRequest::InvalidBaseKeyPath)?;

        let indices_to_derive: Vec<u32> = request
            .get("indicesToDerive")
            .and_then(Value::as_array)
            .and_then(|indices| indices.iter().map(derivation_index).collect())
            .ok_or(InvalidRequest::InvalidIndicesToDerive)?;

        let key_label = match request.get("keyLabel") {
            None | Some(Value::Null) => None,
            Some(Value::String(label)) => Some(label.clone()),
            Some(other) => {
                warn!("ignoring keyLabel that is not a string: {other}");
                None
            }
        };

        debug!("derive-address request from {app_name} for key {key_id} is valid");

        Ok(ParsedDeriveAddressRequest {
            app_name: app_name.to_string(),
            key_info,
            key_label,
            base_key_path,
            indices_to_derive,
        })
    }
}

/// `null`, `false`, zero and the empty string carry no request at all.
fn is_empty_request(request: &Value) -> bool {
    match request {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn non_empty_string<'a>(request: &'a Value, field: &str) -> Option<&'a str> {
    request
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn derivation_index(index: &Value) -> Option<u32> {
    index.as_u64().and_then(|i| u32::try_from(i).ok())
}
