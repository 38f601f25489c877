use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::team::NestedTeam;

/// Database row. A null `published_at` means the planning is a draft.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Planning {
    pub id: Uuid,
    pub project_id: Uuid,
    pub team_id: Uuid,
    pub org_unit_id: Uuid,
    pub name: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub started_at: Option<NaiveDate>,
    pub ended_at: Option<NaiveDate>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanningResponse {
    pub id: Uuid,
    pub name: String,
    pub team_details: NestedTeam,
    pub team: Uuid,
    pub org_unit: Uuid,
    pub forms: Vec<Uuid>,
    pub project: Uuid,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub started_at: Option<NaiveDate>,
    pub ended_at: Option<NaiveDate>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl PlanningResponse {
    pub fn new(planning: Planning, team_details: NestedTeam, forms: Vec<Uuid>) -> Self {
        Self {
            id: planning.id,
            name: planning.name,
            team: planning.team_id,
            team_details,
            org_unit: planning.org_unit_id,
            forms,
            project: planning.project_id,
            description: planning.description,
            published_at: planning.published_at,
            started_at: planning.started_at,
            ended_at: planning.ended_at,
            deleted_at: planning.deleted_at,
        }
    }
}

/// One entry of the mobile listing: the requesting user's assignment
/// plus every form of the planning (forms are not scoped per assignment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobileAssignment {
    pub org_unit: Uuid,
    pub form_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MobilePlanningResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub assignments: Vec<MobileAssignment>,
}
