//! PostgreSQL adapters.
//!
//! - `PostgresApiKeyRepository` - API-key principals
//! - `PostgresInstanceRepository` - instance registrations with cascade delete
//! - `PostgresMirrorReader` - read-only mirrored contacts, groups and messages

mod api_key_repository;
mod instance_repository;
mod mirror_reader;

pub use api_key_repository::PostgresApiKeyRepository;
pub use instance_repository::PostgresInstanceRepository;
pub use mirror_reader::PostgresMirrorReader;
