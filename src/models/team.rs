use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A team either groups users directly or groups other teams, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamType {
    #[serde(rename = "TEAM_OF_USERS")]
    TeamOfUsers,
    #[serde(rename = "TEAM_OF_TEAMS")]
    TeamOfTeams,
}

impl TeamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamType::TeamOfUsers => "TEAM_OF_USERS",
            TeamType::TeamOfTeams => "TEAM_OF_TEAMS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TEAM_OF_USERS" => Some(TeamType::TeamOfUsers),
            "TEAM_OF_TEAMS" => Some(TeamType::TeamOfTeams),
            _ => None,
        }
    }
}

/// Database row. `parent_id` and `path` are derived from sub-team
/// assignments and never writable from the wire.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
    pub team_type: Option<String>,
    pub manager_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub path: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Team {
    pub fn team_type(&self) -> Option<TeamType> {
        self.team_type.as_deref().and_then(TeamType::parse)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedUser {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct NestedTeam {
    pub id: Uuid,
    pub name: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub project: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub team_type: Option<TeamType>,
    pub users: Vec<Uuid>,
    pub users_details: Vec<NestedUser>,
    pub manager: Uuid,
    pub parent: Option<Uuid>,
    pub sub_teams: Vec<Uuid>,
    pub sub_teams_details: Vec<NestedTeam>,
}

impl TeamResponse {
    pub fn new(team: Team, users: Vec<NestedUser>, sub_teams: Vec<NestedTeam>) -> Self {
        Self {
            id: team.id,
            project: team.project_id,
            name: team.name.clone(),
            description: team.description.clone(),
            created_at: team.created_at,
            updated_at: team.updated_at,
            deleted_at: team.deleted_at,
            team_type: team.team_type(),
            users: users.iter().map(|u| u.id).collect(),
            users_details: users,
            manager: team.manager_id,
            parent: team.parent_id,
            sub_teams: sub_teams.iter().map(|t| t.id).collect(),
            sub_teams_details: sub_teams,
        }
    }
}
