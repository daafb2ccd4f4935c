//! Instance registration and mirrored-data queries.

mod delete_instance;
mod list_instances;
mod mirror_queries;
mod register_instance;

pub use delete_instance::{DeleteInstanceCommand, DeleteInstanceHandler};
pub use list_instances::{InstanceSummary, ListInstancesHandler};
pub use mirror_queries::{MirrorQueries, MESSAGE_HISTORY_LIMIT};
pub use register_instance::{RegisterInstanceCommand, RegisterInstanceHandler};
