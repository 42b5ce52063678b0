//! Credential model, cache-key derivation, and redacted secret wrappers.

pub mod credentials;
pub mod key;
pub mod secret;

pub use credentials::*;
pub use key::*;
pub use secret::*;
