//! In-memory storage adapters.
//!
//! Thread-safe via internal `Mutex`. Used by tests and by local runs without
//! a database; nothing survives a restart.

mod api_key_repository;
mod instance_repository;
mod mirror_reader;

pub use api_key_repository::InMemoryApiKeyRepository;
pub use instance_repository::InMemoryInstanceRepository;
pub use mirror_reader::InMemoryMirrorReader;
