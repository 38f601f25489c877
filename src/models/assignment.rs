use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Database row. Exactly one of `user_id`/`team_id` is set.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub planning_id: Uuid,
    pub user_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub org_unit_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentResponse {
    pub id: Uuid,
    pub planning: Uuid,
    pub user: Option<Uuid>,
    pub team: Option<Uuid>,
    pub org_unit: Uuid,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<Assignment> for AssignmentResponse {
    fn from(a: Assignment) -> Self {
        Self {
            id: a.id,
            planning: a.planning_id,
            user: a.user_id,
            team: a.team_id,
            org_unit: a.org_unit_id,
            deleted_at: a.deleted_at,
        }
    }
}
