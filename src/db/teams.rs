use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::{DeletionStatus, Ordering};
use crate::models::team::NestedTeam;
use crate::models::Team;

/// Teams are account-scoped through their project.
pub async fn find_by_id_scoped<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    account_id: Uuid,
) -> Result<Option<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>(
        "SELECT t.* FROM teams t
         JOIN projects p ON t.project_id = p.id
         WHERE t.id = $1 AND p.account_id = $2",
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
    pub project: Option<Uuid>,
    /// Materialized path of the ancestor team; restricts to strict
    /// descendants (the ancestor itself is excluded by the '/%' suffix).
    pub ancestor_path: Option<String>,
    pub deletion: DeletionStatus,
    pub ordering: Ordering,
}

pub async fn list(pool: &PgPool, params: &ListParams) -> Result<Vec<Team>, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT t.* FROM teams t JOIN projects p ON t.project_id = p.id WHERE p.account_id = ",
    );
    qb.push_bind(params.account_id);

    if let Some(search) = &params.search {
        qb.push(" AND t.name ILIKE ")
            .push_bind(format!("%{search}%"));
    }
    if let Some(name) = &params.name_icontains {
        qb.push(" AND t.name ILIKE ").push_bind(format!("%{name}%"));
    }
    if let Some(project) = params.project {
        qb.push(" AND t.project_id = ").push_bind(project);
    }
    if let Some(ancestor_path) = &params.ancestor_path {
        qb.push(" AND t.path LIKE ")
            .push_bind(format!("{ancestor_path}/%"));
    }

    qb.push(" AND t.");
    qb.push(params.deletion.predicate());

    qb.push(format!(
        " ORDER BY t.{} {}",
        params.ordering.column,
        params.ordering.direction()
    ));

    qb.build_query_as::<Team>().fetch_all(pool).await
}

pub async fn create(
    conn: &mut PgConnection,
    project_id: Uuid,
    name: &str,
    description: &str,
    team_type: Option<&str>,
    manager_id: Uuid,
    created_by: Uuid,
) -> Result<Team, sqlx::Error> {
    let id = Uuid::now_v7();
    sqlx::query_as::<_, Team>(
        "INSERT INTO teams (id, project_id, name, description, team_type, manager_id, path, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(id)
    .bind(project_id)
    .bind(name)
    .bind(description)
    .bind(team_type)
    .bind(manager_id)
    .bind(id.to_string())
    .bind(created_by)
    .fetch_one(conn)
    .await
}

pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    project_id: Uuid,
    name: &str,
    description: &str,
    team_type: Option<&str>,
    manager_id: Uuid,
) -> Result<Team, sqlx::Error> {
    sqlx::query_as::<_, Team>(
        "UPDATE teams SET project_id = $2, name = $3, description = $4, team_type = $5,
                          manager_id = $6, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(project_id)
    .bind(name)
    .bind(description)
    .bind(team_type)
    .bind(manager_id)
    .fetch_one(conn)
    .await
}

pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<Team, sqlx::Error> {
    sqlx::query_as::<_, Team>(
        "UPDATE teams SET deleted_at = now(), updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_one(conn)
    .await
}

pub async fn user_ids_of<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    team_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT user_id FROM team_users WHERE team_id = $1")
        .bind(team_id)
        .fetch_all(executor)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn set_users(
    conn: &mut PgConnection,
    team_id: Uuid,
    user_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM team_users WHERE team_id = $1")
        .bind(team_id)
        .execute(&mut *conn)
        .await?;
    if !user_ids.is_empty() {
        sqlx::query(
            "INSERT INTO team_users (team_id, user_id)
             SELECT $1, unnest($2::uuid[])",
        )
        .bind(team_id)
        .bind(user_ids)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn sub_team_ids_of<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    team_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM teams WHERE parent_id = $1")
        .bind(team_id)
        .fetch_all(executor)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn sub_teams_details<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    team_id: Uuid,
) -> Result<Vec<NestedTeam>, sqlx::Error> {
    sqlx::query_as::<_, NestedTeam>(
        "SELECT id, name, deleted_at FROM teams WHERE parent_id = $1 ORDER BY name",
    )
    .bind(team_id)
    .fetch_all(executor)
    .await
}

/// Materialized paths of the given teams, account-scoped. Input order is
/// not preserved.
pub async fn paths_of<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    ids: &[Uuid],
    account_id: Uuid,
) -> Result<Vec<(Uuid, String)>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    sqlx::query_as(
        "SELECT t.id, t.path FROM teams t
         JOIN projects p ON t.project_id = p.id
         WHERE t.id = ANY($1) AND p.account_id = $2",
    )
    .bind(ids)
    .bind(account_id)
    .fetch_all(executor)
    .await
}

/// Projects of the given teams, for the same-project sub-team check.
pub async fn project_ids_of<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    ids: &[Uuid],
) -> Result<Vec<(Uuid, Uuid)>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    sqlx::query_as("SELECT id, project_id FROM teams WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(executor)
        .await
}

/// Reassign a team's children. Detached children become roots of their own
/// subtree; attached children are rerooted under the parent. Every path in
/// the moved subtree is rewritten by prefix substitution.
pub async fn set_sub_teams(
    conn: &mut PgConnection,
    parent: &Team,
    sub_team_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    let current = sub_team_ids_of(&mut *conn, parent.id).await?;

    for child_id in &current {
        if !sub_team_ids.contains(child_id) {
            reroot(conn, *child_id, None).await?;
        }
    }
    for child_id in sub_team_ids {
        if !current.contains(child_id) {
            reroot(conn, *child_id, Some(parent)).await?;
        }
    }
    Ok(())
}

async fn reroot(
    conn: &mut PgConnection,
    child_id: Uuid,
    new_parent: Option<&Team>,
) -> Result<(), sqlx::Error> {
    let old_path: (String,) = sqlx::query_as("SELECT path FROM teams WHERE id = $1")
        .bind(child_id)
        .fetch_one(&mut *conn)
        .await?;
    let old_path = old_path.0;

    let new_path = match new_parent {
        Some(parent) => format!("{}/{}", parent.path, child_id),
        None => child_id.to_string(),
    };

    sqlx::query("UPDATE teams SET parent_id = $2, updated_at = now() WHERE id = $1")
        .bind(child_id)
        .bind(new_parent.map(|p| p.id))
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        "UPDATE teams
         SET path = $2 || substr(path, char_length($1) + 1)
         WHERE path = $1 OR path LIKE $1 || '/%'",
    )
    .bind(&old_path)
    .bind(&new_path)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
