use axum::extract::{Path, Query, State};
use axum::http::{Method, Uri};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::PERM_PLANNINGS;
use crate::db;
use crate::db::plannings::PublishingStatus;
use crate::db::{DeletionStatus, Ordering};
use crate::error::{AppError, ValidationErrors};
use crate::models::team::NestedTeam;
use crate::models::{Planning, PlanningResponse};
use crate::state::SharedState;
use crate::validate::planning::{self as planning_rules, PlanningCandidate, PlanningFacts, PlanningPatch};

const ORDERING_FIELDS: &[&str] = &["id", "name", "started_at", "ended_at"];

#[derive(Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub publishing_status: Option<String>,
    #[serde(rename = "name__icontains")]
    pub name_icontains: Option<String>,
    #[serde(rename = "started_at__gte")]
    pub started_at_gte: Option<NaiveDate>,
    #[serde(rename = "started_at__lte")]
    pub started_at_lte: Option<NaiveDate>,
    #[serde(rename = "ended_at__gte")]
    pub ended_at_gte: Option<NaiveDate>,
    #[serde(rename = "ended_at__lte")]
    pub ended_at_lte: Option<NaiveDate>,
    pub deletion_status: Option<String>,
    pub ordering: Option<String>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PlanningResponse>>, AppError> {
    let params = db::plannings::ListParams {
        account_id: auth.account_id,
        search: query.search,
        name_icontains: query.name_icontains,
        publishing: PublishingStatus::parse(query.publishing_status.as_deref()),
        started_at_gte: query.started_at_gte,
        started_at_lte: query.started_at_lte,
        ended_at_gte: query.ended_at_gte,
        ended_at_lte: query.ended_at_lte,
        deletion: DeletionStatus::parse(query.deletion_status.as_deref())?,
        ordering: Ordering::parse(query.ordering.as_deref(), ORDERING_FIELDS, "id")?,
    };

    let plannings = db::plannings::list(&state.pool, &params).await?;
    let mut responses = Vec::with_capacity(plannings.len());
    for planning in plannings {
        responses.push(planning_response(&state.pool, auth.account_id, planning).await?);
    }
    Ok(Json(responses))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlanningResponse>, AppError> {
    let planning = db::plannings::find_by_id_scoped(&state.pool, id, auth.account_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Planning not found".to_string()))?;
    Ok(Json(planning_response(&state.pool, auth.account_id, planning).await?))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    Json(patch): Json<PlanningPatch>,
) -> Result<Json<PlanningResponse>, AppError> {
    auth.require_permission(PERM_PLANNINGS)?;

    let candidate = planning_rules::resolve(patch, None)?;
    let facts = scope_checks(&state.pool, &auth, &candidate).await?;
    planning_rules::check(&candidate, &facts)?;

    let mut tx = state.pool.begin().await?;
    let planning = db::plannings::create(
        &mut tx,
        candidate.project,
        candidate.team,
        candidate.org_unit,
        &candidate.name,
        &candidate.description,
        candidate.published_at,
        candidate.started_at,
        candidate.ended_at,
        auth.user_id,
    )
    .await?;
    db::plannings::set_forms(&mut tx, planning.id, &candidate.forms).await?;

    let new_value = snapshot(&mut tx, &planning).await?;
    db::audit::record(
        &mut *tx,
        auth.account_id,
        auth.user_id,
        "planning",
        planning.id,
        None,
        new_value,
        &super::audit_source(&method, &uri),
    )
    .await?;
    tx.commit().await?;

    Ok(Json(planning_response(&state.pool, auth.account_id, planning).await?))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    method: Method,
    uri: Uri,
    Json(patch): Json<PlanningPatch>,
) -> Result<Json<PlanningResponse>, AppError> {
    auth.require_permission(PERM_PLANNINGS)?;

    let existing = db::plannings::find_by_id_scoped(&state.pool, id, auth.account_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Planning not found".to_string()))?;
    let existing_forms = db::plannings::form_ids_of(&state.pool, existing.id).await?;
    let base = (existing, existing_forms);

    let candidate = planning_rules::resolve(patch, Some(&base))?;
    let facts = scope_checks(&state.pool, &auth, &candidate).await?;
    planning_rules::check(&candidate, &facts)?;

    let mut tx = state.pool.begin().await?;
    let past_value = snapshot(&mut tx, &base.0).await?;

    let planning = db::plannings::update(
        &mut tx,
        base.0.id,
        candidate.project,
        candidate.team,
        candidate.org_unit,
        &candidate.name,
        &candidate.description,
        candidate.published_at,
        candidate.started_at,
        candidate.ended_at,
    )
    .await?;
    db::plannings::set_forms(&mut tx, planning.id, &candidate.forms).await?;

    let new_value = snapshot(&mut tx, &planning).await?;
    db::audit::record(
        &mut *tx,
        auth.account_id,
        auth.user_id,
        "planning",
        planning.id,
        Some(past_value),
        new_value,
        &super::audit_source(&method, &uri),
    )
    .await?;
    tx.commit().await?;

    Ok(Json(planning_response(&state.pool, auth.account_id, planning).await?))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    method: Method,
    uri: Uri,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_permission(PERM_PLANNINGS)?;

    let existing = db::plannings::find_by_id_scoped(&state.pool, id, auth.account_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Planning not found".to_string()))?;

    let mut tx = state.pool.begin().await?;
    let past_value = snapshot(&mut tx, &existing).await?;
    let deleted = db::plannings::soft_delete(&mut tx, existing.id).await?;
    let new_value = snapshot(&mut tx, &deleted).await?;
    db::audit::record(
        &mut *tx,
        auth.account_id,
        auth.user_id,
        "planning",
        deleted.id,
        Some(past_value),
        new_value,
        &super::audit_source(&method, &uri),
    )
    .await?;
    tx.commit().await?;

    Ok(Json(json!({ "message": "Deleted" })))
}

/// Resolve reference fields inside the acting account and gather the facts
/// the cross-field checks need.
async fn scope_checks(
    pool: &PgPool,
    auth: &AuthUser,
    candidate: &PlanningCandidate,
) -> Result<PlanningFacts, AppError> {
    let mut errors = ValidationErrors::new();

    if db::projects::find_by_id_scoped(pool, candidate.project, auth.account_id)
        .await?
        .is_none()
    {
        errors.add("project", "doesNotExist");
    }

    let team = db::teams::find_by_id_scoped(pool, candidate.team, auth.account_id).await?;
    if team.is_none() {
        errors.add("team", "doesNotExist");
    }

    let org_unit = db::org_units::find_by_id_scoped(pool, candidate.org_unit, auth.account_id).await?;
    if org_unit.is_none() {
        errors.add("org_unit", "doesNotExist");
    }

    if !db::forms::all_in_account(pool, &candidate.forms, auth.account_id).await? {
        errors.add("forms", "doesNotExist");
    }

    errors.into_result()?;

    let team = team.unwrap();
    let org_unit = org_unit.unwrap();

    let in_project = db::forms::ids_in_project(pool, &candidate.forms, candidate.project).await?;
    let foreign_forms = candidate.forms.len() - in_project.len();

    let org_unit_type_allows_project = match org_unit.org_unit_type_id {
        Some(type_id) => {
            db::org_units::type_allows_project(pool, type_id, candidate.project).await?
        }
        None => true,
    };

    Ok(PlanningFacts {
        team_project: team.project_id,
        foreign_forms,
        org_unit_type_allows_project,
    })
}

async fn snapshot(
    conn: &mut PgConnection,
    planning: &Planning,
) -> Result<serde_json::Value, AppError> {
    let forms = db::plannings::form_ids_of(&mut *conn, planning.id).await?;
    let mut value = serde_json::to_value(planning)
        .map_err(|e| AppError::Internal(format!("Failed to serialize planning: {e}")))?;
    value["forms"] = json!(forms);
    Ok(value)
}

async fn planning_response(
    pool: &PgPool,
    account_id: Uuid,
    planning: Planning,
) -> Result<PlanningResponse, AppError> {
    let team = db::teams::find_by_id_scoped(pool, planning.team_id, account_id)
        .await?
        .ok_or_else(|| AppError::Internal("Planning team not found".to_string()))?;
    let team_details = NestedTeam {
        id: team.id,
        name: team.name,
        deleted_at: team.deleted_at,
    };
    let forms = db::plannings::form_ids_of(pool, planning.id).await?;
    Ok(PlanningResponse::new(planning, team_details, forms))
}
