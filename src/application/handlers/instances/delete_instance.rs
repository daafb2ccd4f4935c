//! DeleteInstanceHandler - logs an instance out and removes everything stored
//! for it.

use std::sync::Arc;

use tracing::info;

use crate::application::SessionRegistry;
use crate::domain::foundation::{DomainError, InstanceKey};
use crate::ports::InstanceRepository;

#[derive(Debug, Clone)]
pub struct DeleteInstanceCommand {
    pub name: InstanceKey,
}

pub struct DeleteInstanceHandler {
    registry: SessionRegistry,
    instances: Arc<dyn InstanceRepository>,
}

impl DeleteInstanceHandler {
    pub fn new(registry: SessionRegistry, instances: Arc<dyn InstanceRepository>) -> Self {
        Self { registry, instances }
    }

    /// Returns false when the instance was neither live nor registered.
    pub async fn handle(&self, cmd: DeleteInstanceCommand) -> Result<bool, DomainError> {
        let was_live = self.registry.logout(&cmd.name).await;
        let was_stored = self.instances.delete_cascade(&cmd.name).await?;
        info!(instance = %cmd.name, was_live, was_stored, "Deleted instance");
        Ok(was_live || was_stored)
    }
}
