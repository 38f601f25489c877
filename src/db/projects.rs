use uuid::Uuid;

use crate::models::Project;

pub async fn find_by_id_scoped<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    account_id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1 AND account_id = $2")
        .bind(id)
        .bind(account_id)
        .fetch_optional(executor)
        .await
}
