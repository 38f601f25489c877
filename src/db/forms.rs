use uuid::Uuid;

/// True when every given form id is visible to the account.
pub async fn all_in_account<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    form_ids: &[Uuid],
    account_id: Uuid,
) -> Result<bool, sqlx::Error> {
    if form_ids.is_empty() {
        return Ok(true);
    }
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM forms f
         JOIN projects p ON f.project_id = p.id
         WHERE f.id = ANY($1) AND p.account_id = $2",
    )
    .bind(form_ids)
    .bind(account_id)
    .fetch_one(executor)
    .await?;
    Ok(row.0 == form_ids.len() as i64)
}

/// Ids among `form_ids` that actually belong to the project. Forms from
/// other projects (or other accounts) simply don't show up.
pub async fn ids_in_project<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    form_ids: &[Uuid],
    project_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    if form_ids.is_empty() {
        return Ok(vec![]);
    }
    let rows: Vec<(Uuid,)> =
        sqlx::query_as("SELECT id FROM forms WHERE id = ANY($1) AND project_id = $2")
            .bind(form_ids)
            .bind(project_id)
            .fetch_all(executor)
            .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}
