use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::{DeletionStatus, Ordering};
use crate::models::Assignment;

/// Assignments are account-scoped through their planning's project.
pub async fn find_by_id_scoped<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    account_id: Uuid,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(
        "SELECT a.* FROM assignments a
         JOIN plannings pl ON a.planning_id = pl.id
         JOIN projects p ON pl.project_id = p.id
         WHERE a.id = $1 AND p.account_id = $2",
    )
    .bind(id)
    .bind(account_id)
    .fetch_optional(executor)
    .await
}

pub struct ListParams {
    pub account_id: Uuid,
    pub planning: Option<Uuid>,
    pub team: Option<Uuid>,
    pub deletion: DeletionStatus,
    pub ordering: Ordering,
}

pub async fn list(pool: &PgPool, params: &ListParams) -> Result<Vec<Assignment>, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT a.* FROM assignments a
         JOIN plannings pl ON a.planning_id = pl.id
         JOIN projects p ON pl.project_id = p.id
         WHERE p.account_id = ",
    );
    qb.push_bind(params.account_id);

    if let Some(planning) = params.planning {
        qb.push(" AND a.planning_id = ").push_bind(planning);
    }
    if let Some(team) = params.team {
        qb.push(" AND a.team_id = ").push_bind(team);
    }

    qb.push(" AND a.");
    qb.push(params.deletion.predicate());

    qb.push(format!(
        " ORDER BY a.{} {}",
        params.ordering.column,
        params.ordering.direction()
    ));

    qb.build_query_as::<Assignment>().fetch_all(pool).await
}

pub async fn create(
    conn: &mut PgConnection,
    planning_id: Uuid,
    user_id: Option<Uuid>,
    team_id: Option<Uuid>,
    org_unit_id: Uuid,
    created_by: Uuid,
) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(
        "INSERT INTO assignments (planning_id, user_id, team_id, org_unit_id, created_by)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(planning_id)
    .bind(user_id)
    .bind(team_id)
    .bind(org_unit_id)
    .bind(created_by)
    .fetch_one(conn)
    .await
}

pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    planning_id: Uuid,
    user_id: Option<Uuid>,
    team_id: Option<Uuid>,
    org_unit_id: Uuid,
) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(
        "UPDATE assignments
         SET planning_id = $2, user_id = $3, team_id = $4, org_unit_id = $5, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(planning_id)
    .bind(user_id)
    .bind(team_id)
    .bind(org_unit_id)
    .fetch_one(conn)
    .await
}

pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(
        "UPDATE assignments SET deleted_at = now(), updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_one(conn)
    .await
}

/// The requesting user's live assignments on one planning (mobile view).
pub async fn for_user_on_planning<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    planning_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(
        "SELECT * FROM assignments
         WHERE planning_id = $1 AND user_id = $2 AND deleted_at IS NULL
         ORDER BY id",
    )
    .bind(planning_id)
    .bind(user_id)
    .fetch_all(executor)
    .await
}
