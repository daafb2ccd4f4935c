//! RegisterInstanceHandler - Command handler for durable instance registration.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::{DomainError, InstanceKey, PrincipalId};
use crate::ports::{InstanceRecord, InstanceRepository};

#[derive(Debug, Clone)]
pub struct RegisterInstanceCommand {
    pub name: String,
    pub owner: Option<PrincipalId>,
}

pub struct RegisterInstanceHandler {
    instances: Arc<dyn InstanceRepository>,
}

impl RegisterInstanceHandler {
    pub fn new(instances: Arc<dyn InstanceRepository>) -> Self {
        Self { instances }
    }

    /// Upserts the registration; re-registering keeps the original creation time.
    pub async fn handle(&self, cmd: RegisterInstanceCommand) -> Result<InstanceRecord, DomainError> {
        let name = InstanceKey::new(&cmd.name)?;
        let record = self.instances.upsert(&name, cmd.owner).await?;
        info!(instance = %record.name, "Registered instance");
        Ok(record)
    }
}
