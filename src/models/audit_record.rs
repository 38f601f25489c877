use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Before/after snapshot of one mutation. `past_value` is null on create;
/// on delete `new_value` holds the soft-deleted row, not an empty value.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub user_id: Option<Uuid>,
    pub resource_type: String,
    pub resource_id: Uuid,
    pub past_value: Option<serde_json::Value>,
    pub new_value: serde_json::Value,
    pub source: String,
    pub created_at: DateTime<Utc>,
}
