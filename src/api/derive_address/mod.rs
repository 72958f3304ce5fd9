//! The derive-address request: the caller names a stored key and asks for the
//! addresses at a list of child indices below a base derivation path.

mod derive_address_api;
mod parsed_request;
mod request_validator;

pub use derive_address_api::DeriveAddressApi;
pub use derive_address_api::DeriveAddressProcessor;
pub use derive_address_api::ListDerivationPaths;
pub use parsed_request::ParsedDeriveAddressRequest;
pub use request_validator::RequestValidator;
pub use request_validator::UntrustedRequest;
