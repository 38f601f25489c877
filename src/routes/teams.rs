use axum::extract::{Path, Query, State};
use axum::http::{Method, Uri};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::PERM_TEAMS;
use crate::db;
use crate::db::{DeletionStatus, Ordering};
use crate::error::{AppError, ValidationErrors};
use crate::models::{Team, TeamResponse};
use crate::state::SharedState;
use crate::validate::team::{self as team_rules, TeamBase, TeamCandidate, TeamPatch};

const ORDERING_FIELDS: &[&str] = &["id", "name", "created_at", "updated_at", "type"];

#[derive(Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub ancestor: Option<String>,
    pub project: Option<Uuid>,
    #[serde(rename = "name__icontains")]
    pub name_icontains: Option<String>,
    pub deletion_status: Option<String>,
    pub ordering: Option<String>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TeamResponse>>, AppError> {
    let ancestor_path = match &query.ancestor {
        Some(raw) => Some(resolve_ancestor(&state.pool, raw, auth.account_id).await?),
        None => None,
    };

    let ordering = Ordering::parse(query.ordering.as_deref(), ORDERING_FIELDS, "id")?;
    // "type" is the wire name of the team_type column
    let ordering = if ordering.column == "type" {
        Ordering {
            column: "team_type",
            ..ordering
        }
    } else {
        ordering
    };

    let params = db::teams::ListParams {
        account_id: auth.account_id,
        search: query.search,
        name_icontains: query.name_icontains,
        project: query.project,
        ancestor_path,
        deletion: DeletionStatus::parse(query.deletion_status.as_deref())?,
        ordering,
    };

    let teams = db::teams::list(&state.pool, &params).await?;
    let mut responses = Vec::with_capacity(teams.len());
    for team in teams {
        responses.push(team_response(&state.pool, team).await?);
    }
    Ok(Json(responses))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamResponse>, AppError> {
    let team = db::teams::find_by_id_scoped(&state.pool, id, auth.account_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;
    Ok(Json(team_response(&state.pool, team).await?))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    Json(patch): Json<TeamPatch>,
) -> Result<Json<TeamResponse>, AppError> {
    auth.require_permission(PERM_TEAMS)?;

    let candidate = team_rules::resolve(patch, None)?;
    let sub_team_projects = scope_checks(&state.pool, &auth, &candidate).await?;
    let candidate = team_rules::check(candidate, &sub_team_projects)?;

    let mut tx = state.pool.begin().await?;
    let team = db::teams::create(
        &mut tx,
        candidate.project,
        &candidate.name,
        &candidate.description,
        candidate.team_type.map(|t| t.as_str()),
        candidate.manager,
        auth.user_id,
    )
    .await?;
    db::teams::set_users(&mut tx, team.id, &candidate.users).await?;
    db::teams::set_sub_teams(&mut tx, &team, &candidate.sub_teams).await?;

    let new_value = snapshot(&mut tx, &team).await?;
    db::audit::record(
        &mut *tx,
        auth.account_id,
        auth.user_id,
        "team",
        team.id,
        None,
        new_value,
        &super::audit_source(&method, &uri),
    )
    .await?;
    tx.commit().await?;

    Ok(Json(team_response(&state.pool, team).await?))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    method: Method,
    uri: Uri,
    Json(patch): Json<TeamPatch>,
) -> Result<Json<TeamResponse>, AppError> {
    auth.require_permission(PERM_TEAMS)?;

    let existing = db::teams::find_by_id_scoped(&state.pool, id, auth.account_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

    let base = TeamBase {
        users: db::teams::user_ids_of(&state.pool, existing.id).await?,
        sub_teams: db::teams::sub_team_ids_of(&state.pool, existing.id).await?,
        team: existing,
    };

    let candidate = team_rules::resolve(patch, Some(&base))?;

    let candidate_paths =
        db::teams::paths_of(&state.pool, &candidate.sub_teams, auth.account_id).await?;
    team_rules::check_sub_team_loop(&base.team.path, &candidate_paths)?;

    let sub_team_projects = scope_checks(&state.pool, &auth, &candidate).await?;
    let candidate = team_rules::check(candidate, &sub_team_projects)?;

    let mut tx = state.pool.begin().await?;
    let past_value = snapshot(&mut tx, &base.team).await?;

    let team = db::teams::update(
        &mut tx,
        base.team.id,
        candidate.project,
        &candidate.name,
        &candidate.description,
        candidate.team_type.map(|t| t.as_str()),
        candidate.manager,
    )
    .await?;
    db::teams::set_users(&mut tx, team.id, &candidate.users).await?;
    db::teams::set_sub_teams(&mut tx, &team, &candidate.sub_teams).await?;

    let new_value = snapshot(&mut tx, &team).await?;
    db::audit::record(
        &mut *tx,
        auth.account_id,
        auth.user_id,
        "team",
        team.id,
        Some(past_value),
        new_value,
        &super::audit_source(&method, &uri),
    )
    .await?;
    tx.commit().await?;

    Ok(Json(team_response(&state.pool, team).await?))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    method: Method,
    uri: Uri,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_permission(PERM_TEAMS)?;

    let existing = db::teams::find_by_id_scoped(&state.pool, id, auth.account_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

    let mut tx = state.pool.begin().await?;
    let past_value = snapshot(&mut tx, &existing).await?;
    let deleted = db::teams::soft_delete(&mut tx, existing.id).await?;
    // deletion is soft, so the "new" snapshot is the soft-deleted row
    let new_value = snapshot(&mut tx, &deleted).await?;
    db::audit::record(
        &mut *tx,
        auth.account_id,
        auth.user_id,
        "team",
        deleted.id,
        Some(past_value),
        new_value,
        &super::audit_source(&method, &uri),
    )
    .await?;
    tx.commit().await?;

    Ok(Json(json!({ "message": "Deleted" })))
}

/// Resolve the `ancestor` query parameter into the team's materialized
/// path, or fail with a field error when the id is unknown in this account.
async fn resolve_ancestor(
    pool: &PgPool,
    raw: &str,
    account_id: Uuid,
) -> Result<String, AppError> {
    let invalid = || {
        AppError::Validation(ValidationErrors::field(
            "ancestor",
            "Select a valid choice. That choice is not one of the available choices.",
        ))
    };
    let id: Uuid = raw.parse().map_err(|_| invalid())?;
    let team = db::teams::find_by_id_scoped(pool, id, account_id)
        .await?
        .ok_or_else(invalid)?;
    Ok(team.path)
}

/// Reference fields must resolve inside the acting account; anything else
/// behaves as nonexistent. Returns the candidate sub-teams' projects for
/// the same-project check.
async fn scope_checks(
    pool: &PgPool,
    auth: &AuthUser,
    candidate: &TeamCandidate,
) -> Result<Vec<(Uuid, Uuid)>, AppError> {
    let mut errors = ValidationErrors::new();

    if db::projects::find_by_id_scoped(pool, candidate.project, auth.account_id)
        .await?
        .is_none()
    {
        errors.add("project", "doesNotExist");
    }

    if !db::users::all_in_account(pool, &[candidate.manager], auth.account_id).await? {
        errors.add("manager", "doesNotExist");
    }

    if !db::users::all_in_account(pool, &candidate.users, auth.account_id).await? {
        errors.add("users", "doesNotExist");
    }

    let paths = db::teams::paths_of(pool, &candidate.sub_teams, auth.account_id).await?;
    if paths.len() != candidate.sub_teams.len() {
        errors.add("sub_teams", "doesNotExist");
    }

    errors.into_result()?;

    Ok(db::teams::project_ids_of(pool, &candidate.sub_teams).await?)
}

/// Audit snapshot: the row plus its relation id sets.
async fn snapshot(conn: &mut PgConnection, team: &Team) -> Result<serde_json::Value, AppError> {
    let users = db::teams::user_ids_of(&mut *conn, team.id).await?;
    let sub_teams = db::teams::sub_team_ids_of(&mut *conn, team.id).await?;
    let mut value = serde_json::to_value(team)
        .map_err(|e| AppError::Internal(format!("Failed to serialize team: {e}")))?;
    value["users"] = json!(users);
    value["sub_teams"] = json!(sub_teams);
    Ok(value)
}

async fn team_response(pool: &PgPool, team: Team) -> Result<TeamResponse, AppError> {
    let user_ids = db::teams::user_ids_of(pool, team.id).await?;
    let users = db::users::details_for(pool, &user_ids).await?;
    let sub_teams = db::teams::sub_teams_details(pool, team.id).await?;
    Ok(TeamResponse::new(team, users, sub_teams))
}
