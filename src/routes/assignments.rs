use axum::extract::{Path, Query, State};
use axum::http::{Method, Uri};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::PERM_PLANNINGS;
use crate::db;
use crate::db::{DeletionStatus, Ordering};
use crate::error::{AppError, ValidationErrors};
use crate::models::{Assignment, AssignmentResponse};
use crate::state::SharedState;
use crate::validate::assignment::{self as assignment_rules, AssignmentCandidate, AssignmentPatch};

const ORDERING_FIELDS: &[&str] = &["id", "created_at"];

#[derive(Deserialize)]
pub struct ListQuery {
    pub planning: Option<Uuid>,
    pub team: Option<Uuid>,
    pub deletion_status: Option<String>,
    pub ordering: Option<String>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AssignmentResponse>>, AppError> {
    let params = db::assignments::ListParams {
        account_id: auth.account_id,
        planning: query.planning,
        team: query.team,
        deletion: DeletionStatus::parse(query.deletion_status.as_deref())?,
        ordering: Ordering::parse(query.ordering.as_deref(), ORDERING_FIELDS, "id")?,
    };

    let assignments = db::assignments::list(&state.pool, &params).await?;
    Ok(Json(
        assignments.into_iter().map(AssignmentResponse::from).collect(),
    ))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let assignment = db::assignments::find_by_id_scoped(&state.pool, id, auth.account_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;
    Ok(Json(assignment.into()))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    Json(patch): Json<AssignmentPatch>,
) -> Result<Json<AssignmentResponse>, AppError> {
    auth.require_permission(PERM_PLANNINGS)?;

    let candidate = assignment_rules::resolve(patch, None)?;
    assignment_rules::check_assignee(&candidate)?;
    scope_checks(&state.pool, &auth, &candidate).await?;

    let mut tx = state.pool.begin().await?;
    let assignment = db::assignments::create(
        &mut tx,
        candidate.planning,
        candidate.user,
        candidate.team,
        candidate.org_unit,
        auth.user_id,
    )
    .await?;

    let new_value = snapshot(&assignment)?;
    db::audit::record(
        &mut *tx,
        auth.account_id,
        auth.user_id,
        "assignment",
        assignment.id,
        None,
        new_value,
        &super::audit_source(&method, &uri),
    )
    .await?;
    tx.commit().await?;

    Ok(Json(assignment.into()))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    method: Method,
    uri: Uri,
    Json(patch): Json<AssignmentPatch>,
) -> Result<Json<AssignmentResponse>, AppError> {
    auth.require_permission(PERM_PLANNINGS)?;

    let existing = db::assignments::find_by_id_scoped(&state.pool, id, auth.account_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;

    let candidate = assignment_rules::resolve(patch, Some(&existing))?;
    assignment_rules::check_assignee(&candidate)?;
    scope_checks(&state.pool, &auth, &candidate).await?;

    let mut tx = state.pool.begin().await?;
    let past_value = snapshot(&existing)?;
    let assignment = db::assignments::update(
        &mut tx,
        existing.id,
        candidate.planning,
        candidate.user,
        candidate.team,
        candidate.org_unit,
    )
    .await?;
    let new_value = snapshot(&assignment)?;
    db::audit::record(
        &mut *tx,
        auth.account_id,
        auth.user_id,
        "assignment",
        assignment.id,
        Some(past_value),
        new_value,
        &super::audit_source(&method, &uri),
    )
    .await?;
    tx.commit().await?;

    Ok(Json(assignment.into()))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    method: Method,
    uri: Uri,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_permission(PERM_PLANNINGS)?;

    let existing = db::assignments::find_by_id_scoped(&state.pool, id, auth.account_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;

    let mut tx = state.pool.begin().await?;
    let past_value = snapshot(&existing)?;
    let deleted = db::assignments::soft_delete(&mut tx, existing.id).await?;
    // soft delete: the "new" snapshot is the row carrying its deleted_at
    let new_value = snapshot(&deleted)?;
    db::audit::record(
        &mut *tx,
        auth.account_id,
        auth.user_id,
        "assignment",
        deleted.id,
        Some(past_value),
        new_value,
        &super::audit_source(&method, &uri),
    )
    .await?;
    tx.commit().await?;

    Ok(Json(json!({ "message": "Deleted" })))
}

/// Resolve reference fields inside the acting account and check the
/// org unit against the planning's subtree.
async fn scope_checks(
    pool: &PgPool,
    auth: &AuthUser,
    candidate: &AssignmentCandidate,
) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();

    let planning =
        db::plannings::find_by_id_scoped(pool, candidate.planning, auth.account_id).await?;
    if planning.is_none() {
        errors.add("planning", "doesNotExist");
    }

    if let Some(user) = candidate.user {
        if !db::users::all_in_account(pool, &[user], auth.account_id).await? {
            errors.add("user", "doesNotExist");
        }
    }

    if let Some(team) = candidate.team {
        if db::teams::find_by_id_scoped(pool, team, auth.account_id)
            .await?
            .is_none()
        {
            errors.add("team", "doesNotExist");
        }
    }

    errors.into_result()?;

    let planning = planning.unwrap();
    let root = db::org_units::find_by_id_scoped(pool, planning.org_unit_id, auth.account_id)
        .await?
        .ok_or_else(|| AppError::Internal("Planning org unit not found".to_string()))?;

    let in_scope =
        db::org_units::is_in_subtree(pool, candidate.org_unit, &root.path, auth.account_id)
            .await?;
    assignment_rules::check_org_unit_scope(in_scope)?;

    Ok(())
}

fn snapshot(assignment: &Assignment) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(assignment)
        .map_err(|e| AppError::Internal(format!("Failed to serialize assignment: {e}")))
}
