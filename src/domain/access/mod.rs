//! Access control domain module.
//!
//! API-key principals, credential generation and hashing, and the errors
//! produced while authenticating and authorizing a caller.

mod credential;
mod errors;
mod principal;

pub use credential::{hash_key, key_prefix, GeneratedKey, Validity, KEY_PREFIX_LEN};
pub use errors::{ApiKeyError, AuthError, AuthzError};
pub use principal::{NewPrincipal, Principal, PrincipalKind, PrincipalUpdate};

#[cfg(test)]
pub(crate) use principal::test_support;
