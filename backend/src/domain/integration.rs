//! External service integration records.
//!
//! Placeholder entity: credentials and sync status are stored so a future
//! sync worker can pick them up, but the core performs no synchronisation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// State of the (future) sync pipeline for one integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Inactive,
    Active,
    Error,
}

impl SyncStatus {
    /// Wire representation, matching the serde form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inactive" => Ok(Self::Inactive),
            "active" => Ok(Self::Active),
            "error" => Ok(Self::Error),
            _ => Err(()),
        }
    }
}

/// Connection to one external service, unique per (user, service type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    #[schema(value_type = String, example = "7c9e6679-7425-40de-944b-e07fc1f90ae7")]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub user_id: UserId,
    /// External service identifier, e.g. `google-calendar`.
    pub service_type: String,
    /// Opaque credential blob; stored verbatim, never interpreted.
    pub credentials: Value,
    pub sync_status: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating an [`Integration`].
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationDraft {
    pub service_type: String,
    pub credentials: Value,
}

/// Shallow-merge patch for an integration. The service type is immutable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegrationChanges {
    pub credentials: Option<Value>,
    pub sync_status: Option<SyncStatus>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl IntegrationChanges {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the patch to an integration record, refreshing `updated_at`.
    pub fn apply(&self, integration: &mut Integration, now: DateTime<Utc>) {
        if let Some(credentials) = &self.credentials {
            integration.credentials = credentials.clone();
        }
        if let Some(status) = self.sync_status {
            integration.sync_status = status;
        }
        if let Some(synced) = self.last_synced_at {
            integration.last_synced_at = Some(synced);
        }
        integration.updated_at = now;
    }
}
