//! The request-facing side of the keyguard: validating what a caller sends
//! and handing the result back to it.

pub mod completion;
pub mod derive_address;
pub mod error;
