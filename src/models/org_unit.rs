use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Node in the organizational hierarchy. `path` is the materialized path:
/// ancestor ids joined by '/', the row's own id last.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct OrgUnit {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub org_unit_type_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub path: String,
    pub created_at: DateTime<Utc>,
}
