//! Integration service: one connection per (user, service type).

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::integration::{Integration, IntegrationChanges, IntegrationDraft, SyncStatus};
use super::ports::IntegrationStore;
use super::user::UserId;
use super::{Error, Result};

/// CRUD for external service connections.
#[derive(Clone)]
pub struct IntegrationsService {
    integrations: Arc<dyn IntegrationStore>,
}

impl IntegrationsService {
    /// Create a service backed by the given store.
    pub fn new(integrations: Arc<dyn IntegrationStore>) -> Self {
        Self { integrations }
    }

    /// Fetch the user's integration for a service type.
    pub async fn get_by_service(
        &self,
        user_id: &UserId,
        service_type: &str,
    ) -> Result<Integration> {
        self.integrations
            .find_by_service(user_id, service_type)
            .await?
            .ok_or_else(|| Error::not_found("integration not found"))
    }

    /// Connect a service for the user; a second connection to the same
    /// service type is a conflict.
    pub async fn create(&self, user_id: &UserId, draft: IntegrationDraft) -> Result<Integration> {
        if draft.service_type.trim().is_empty() {
            return Err(Error::invalid_request("service type must not be empty")
                .with_details(json!({ "field": "serviceType", "code": "missing" })));
        }
        if self
            .integrations
            .find_by_service(user_id, &draft.service_type)
            .await?
            .is_some()
        {
            return Err(Error::conflict("service is already connected"));
        }

        let now = Utc::now();
        let integration = Integration {
            id: Uuid::new_v4(),
            user_id: *user_id,
            service_type: draft.service_type,
            credentials: draft.credentials,
            sync_status: SyncStatus::Inactive,
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        };
        self.integrations.insert(&integration).await?;
        Ok(integration)
    }

    /// Patch an integration, gated by ownership. The service type is
    /// immutable.
    pub async fn update(
        &self,
        user_id: &UserId,
        id: Uuid,
        changes: IntegrationChanges,
    ) -> Result<Integration> {
        if changes.is_empty() {
            return Err(Error::invalid_request("no fields to update"));
        }
        self.owned_integration(user_id, id).await?;
        self.integrations
            .update(id, &changes)
            .await?
            .ok_or_else(|| Error::not_found("integration not found"))
    }

    /// Disconnect a service, gated by ownership.
    pub async fn delete(&self, user_id: &UserId, id: Uuid) -> Result<()> {
        self.owned_integration(user_id, id).await?;
        if !self.integrations.delete(id).await? {
            return Err(Error::not_found("integration not found"));
        }
        Ok(())
    }

    async fn owned_integration(&self, user_id: &UserId, id: Uuid) -> Result<Integration> {
        let integration = self
            .integrations
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("integration not found"))?;
        if integration.user_id != *user_id {
            return Err(Error::forbidden("integration belongs to another user"));
        }
        Ok(integration)
    }
}
