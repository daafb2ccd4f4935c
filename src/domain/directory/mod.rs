//! Directory domain module.
//!
//! Group administration requests and the contact list as the protocol
//! engine reports it.

mod contact;
mod group;

pub use contact::{Contact, SyncStatus};
pub use group::{normalize_participants, GroupAction, NewGroup};
