//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Event Ports
//!
//! - `EventPublisher` - fire-and-forget publishing of gateway events
//! - `EventSubscriber` - subscription handles for listeners
//! - `EventListener` - asynchronous consumer of events
//!
//! ## Engine Port
//!
//! - `ProtocolEngine` - device linking, pairing and message relay
//!
//! ## Storage Ports
//!
//! - `ApiKeyRepository` - principals by key hash
//! - `InstanceRepository` - durable instance registrations
//! - `MirrorReader` - mirrored contacts, groups and messages

mod api_key_repository;
mod event_publisher;
mod event_subscriber;
mod instance_repository;
mod mirror_reader;
mod protocol_engine;

pub use api_key_repository::ApiKeyRepository;
pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventBus, EventListener, EventSubscriber, Subscription, SubscriptionId};
pub use instance_repository::{InstanceRecord, InstanceRepository};
pub use mirror_reader::{MirrorReader, MirrorStats, MirroredChat, MirroredMessage};
pub use protocol_engine::{EngineError, EngineSession, EngineSignal, ProtocolEngine};
