use uuid::Uuid;

/// Persist one before/after snapshot pair. Runs on the caller's executor so
/// the record commits (or rolls back) with the entity write it describes.
#[allow(clippy::too_many_arguments)]
pub async fn record<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    account_id: Uuid,
    user_id: Uuid,
    resource_type: &str,
    resource_id: Uuid,
    past_value: Option<serde_json::Value>,
    new_value: serde_json::Value,
    source: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO audit_records
            (account_id, user_id, resource_type, resource_id, past_value, new_value, source)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(account_id)
    .bind(user_id)
    .bind(resource_type)
    .bind(resource_id)
    .bind(past_value)
    .bind(new_value)
    .bind(source)
    .execute(executor)
    .await?;
    Ok(())
}
