//! Shared application state for the gateway router.

use std::sync::Arc;

use crate::application::handlers::{
    AccessGate, DeleteInstanceHandler, IssueApiKeyHandler, ListApiKeysHandler,
    ListInstancesHandler, MessageDispatcher, MirrorQueries, RegisterInstanceHandler,
    RevokeApiKeyHandler, UpdateApiKeyHandler,
};
use crate::application::SessionRegistry;
use crate::ports::{ApiKeyRepository, InstanceRepository, MirrorReader};

/// State cloned into every request.
///
/// Holds the long-lived services and the storage ports; command handlers
/// are built on demand from the ports.
#[derive(Clone)]
pub struct AppState {
    pub gate: AccessGate,
    pub registry: SessionRegistry,
    pub dispatcher: MessageDispatcher,
    pub api_keys: Arc<dyn ApiKeyRepository>,
    pub instances: Arc<dyn InstanceRepository>,
    pub mirror: Arc<dyn MirrorReader>,
}

impl AppState {
    pub fn new(
        registry: SessionRegistry,
        dispatcher: MessageDispatcher,
        api_keys: Arc<dyn ApiKeyRepository>,
        instances: Arc<dyn InstanceRepository>,
        mirror: Arc<dyn MirrorReader>,
    ) -> Self {
        Self {
            gate: AccessGate::new(api_keys.clone()),
            registry,
            dispatcher,
            api_keys,
            instances,
            mirror,
        }
    }

    pub fn issue_api_key_handler(&self) -> IssueApiKeyHandler {
        IssueApiKeyHandler::new(self.api_keys.clone())
    }

    pub fn list_api_keys_handler(&self) -> ListApiKeysHandler {
        ListApiKeysHandler::new(self.api_keys.clone())
    }

    pub fn update_api_key_handler(&self) -> UpdateApiKeyHandler {
        UpdateApiKeyHandler::new(self.api_keys.clone())
    }

    pub fn revoke_api_key_handler(&self) -> RevokeApiKeyHandler {
        RevokeApiKeyHandler::new(self.api_keys.clone())
    }

    pub fn register_instance_handler(&self) -> RegisterInstanceHandler {
        RegisterInstanceHandler::new(self.instances.clone())
    }

    pub fn delete_instance_handler(&self) -> DeleteInstanceHandler {
        DeleteInstanceHandler::new(self.registry.clone(), self.instances.clone())
    }

    pub fn list_instances_handler(&self) -> ListInstancesHandler {
        ListInstancesHandler::new(
            self.registry.clone(),
            self.instances.clone(),
            self.mirror.clone(),
        )
    }

    pub fn mirror_queries(&self) -> MirrorQueries {
        MirrorQueries::new(self.mirror.clone())
    }
}
