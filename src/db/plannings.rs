use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::{DeletionStatus, Ordering};
use crate::models::Planning;

/// Publishing state filter; a null `published_at` marks a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishingStatus {
    All,
    Draft,
    Published,
}

impl PublishingStatus {
    /// Unknown values fall back to `All`, matching the permissive
    /// publishing filter semantics.
    pub fn parse(param: Option<&str>) -> Self {
        match param {
            Some("draft") => PublishingStatus::Draft,
            Some("published") => PublishingStatus::Published,
            _ => PublishingStatus::All,
        }
    }

    pub fn predicate(&self) -> &'static str {
        match self {
            PublishingStatus::All => "TRUE",
            PublishingStatus::Draft => "published_at IS NULL",
            PublishingStatus::Published => "published_at IS NOT NULL",
        }
    }
}

pub async fn find_by_id_scoped<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    account_id: Uuid,
) -> Result<Option<Planning>, sqlx::Error> {
    sqlx::query_as::<_, Planning>(
        "SELECT pl.* FROM plannings pl
         JOIN projects p ON pl.project_id = p.id
         WHERE pl.id = $1 AND p.account_id = $2",
    )
    .bind(id)
    .bind(account_id)
    .fetch_optional(executor)
    .await
}

pub struct ListParams {
    pub account_id: Uuid,
    pub search: Option<String>,
    pub name_icontains: Option<String>,
    pub publishing: PublishingStatus,
    pub started_at_gte: Option<NaiveDate>,
    pub started_at_lte: Option<NaiveDate>,
    pub ended_at_gte: Option<NaiveDate>,
    pub ended_at_lte: Option<NaiveDate>,
    pub deletion: DeletionStatus,
    pub ordering: Ordering,
}

pub async fn list(pool: &PgPool, params: &ListParams) -> Result<Vec<Planning>, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT pl.* FROM plannings pl JOIN projects p ON pl.project_id = p.id
         WHERE p.account_id = ",
    );
    qb.push_bind(params.account_id);

    if let Some(search) = &params.search {
        qb.push(" AND pl.name ILIKE ")
            .push_bind(format!("%{search}%"));
    }
    if let Some(name) = &params.name_icontains {
        qb.push(" AND pl.name ILIKE ")
            .push_bind(format!("%{name}%"));
    }
    if let Some(date) = params.started_at_gte {
        qb.push(" AND pl.started_at >= ").push_bind(date);
    }
    if let Some(date) = params.started_at_lte {
        qb.push(" AND pl.started_at <= ").push_bind(date);
    }
    if let Some(date) = params.ended_at_gte {
        qb.push(" AND pl.ended_at >= ").push_bind(date);
    }
    if let Some(date) = params.ended_at_lte {
        qb.push(" AND pl.ended_at <= ").push_bind(date);
    }

    qb.push(" AND pl.");
    qb.push(params.publishing.predicate());
    qb.push(" AND pl.");
    qb.push(params.deletion.predicate());

    qb.push(format!(
        " ORDER BY pl.{} {}",
        params.ordering.column,
        params.ordering.direction()
    ));

    qb.build_query_as::<Planning>().fetch_all(pool).await
}

#[allow(clippy::too_many_arguments)]
pub async fn create(
    conn: &mut PgConnection,
    project_id: Uuid,
    team_id: Uuid,
    org_unit_id: Uuid,
    name: &str,
    description: &str,
    published_at: Option<chrono::DateTime<chrono::Utc>>,
    started_at: Option<NaiveDate>,
    ended_at: Option<NaiveDate>,
    created_by: Uuid,
) -> Result<Planning, sqlx::Error> {
    sqlx::query_as::<_, Planning>(
        "INSERT INTO plannings
            (project_id, team_id, org_unit_id, name, description, published_at, started_at, ended_at, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
    )
    .bind(project_id)
    .bind(team_id)
    .bind(org_unit_id)
    .bind(name)
    .bind(description)
    .bind(published_at)
    .bind(started_at)
    .bind(ended_at)
    .bind(created_by)
    .fetch_one(conn)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    project_id: Uuid,
    team_id: Uuid,
    org_unit_id: Uuid,
    name: &str,
    description: &str,
    published_at: Option<chrono::DateTime<chrono::Utc>>,
    started_at: Option<NaiveDate>,
    ended_at: Option<NaiveDate>,
) -> Result<Planning, sqlx::Error> {
    sqlx::query_as::<_, Planning>(
        "UPDATE plannings
         SET project_id = $2, team_id = $3, org_unit_id = $4, name = $5, description = $6,
             published_at = $7, started_at = $8, ended_at = $9, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(project_id)
    .bind(team_id)
    .bind(org_unit_id)
    .bind(name)
    .bind(description)
    .bind(published_at)
    .bind(started_at)
    .bind(ended_at)
    .fetch_one(conn)
    .await
}

pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<Planning, sqlx::Error> {
    sqlx::query_as::<_, Planning>(
        "UPDATE plannings SET deleted_at = now(), updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_one(conn)
    .await
}

pub async fn form_ids_of<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    planning_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows: Vec<(Uuid,)> =
        sqlx::query_as("SELECT form_id FROM planning_forms WHERE planning_id = $1")
            .bind(planning_id)
            .fetch_all(executor)
            .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn set_forms(
    conn: &mut PgConnection,
    planning_id: Uuid,
    form_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM planning_forms WHERE planning_id = $1")
        .bind(planning_id)
        .execute(&mut *conn)
        .await?;
    if !form_ids.is_empty() {
        sqlx::query(
            "INSERT INTO planning_forms (planning_id, form_id)
             SELECT $1, unnest($2::uuid[])",
        )
        .bind(planning_id)
        .bind(form_ids)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Plannings visible on mobile: published, not soft-deleted, and holding
/// at least one live assignment for the requesting user.
pub async fn list_for_mobile_user(
    pool: &PgPool,
    account_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<Planning>, sqlx::Error> {
    sqlx::query_as::<_, Planning>(
        "SELECT DISTINCT pl.* FROM plannings pl
         JOIN projects p ON pl.project_id = p.id
         JOIN assignments a ON a.planning_id = pl.id
         WHERE p.account_id = $1
           AND a.user_id = $2 AND a.deleted_at IS NULL
           AND pl.published_at IS NOT NULL
           AND pl.deleted_at IS NULL
         ORDER BY pl.id",
    )
    .bind(account_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
}
