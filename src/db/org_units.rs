use uuid::Uuid;

use crate::models::OrgUnit;

pub async fn find_by_id_scoped<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    account_id: Uuid,
) -> Result<Option<OrgUnit>, sqlx::Error> {
    sqlx::query_as::<_, OrgUnit>("SELECT * FROM org_units WHERE id = $1 AND account_id = $2")
        .bind(id)
        .bind(account_id)
        .fetch_optional(executor)
        .await
}

/// Membership test over the materialized path: is `org_unit_id` inside the
/// subtree rooted at `root_path` (root included), among org units visible
/// to the account?
pub async fn is_in_subtree<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    org_unit_id: Uuid,
    root_path: &str,
    account_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (
            SELECT 1 FROM org_units
            WHERE id = $1 AND account_id = $2
              AND (path = $3 OR path LIKE $3 || '/%')
         )",
    )
    .bind(org_unit_id)
    .bind(account_id)
    .bind(root_path)
    .fetch_one(executor)
    .await?;
    Ok(row.0)
}

/// True when the org unit type's allowed-projects set contains the project.
pub async fn type_allows_project<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    org_unit_type_id: Uuid,
    project_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (
            SELECT 1 FROM org_unit_type_projects
            WHERE org_unit_type_id = $1 AND project_id = $2
         )",
    )
    .bind(org_unit_type_id)
    .bind(project_id)
    .fetch_one(executor)
    .await?;
    Ok(row.0)
}
