use crate::models::Account;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    name: &str,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>("INSERT INTO accounts (name) VALUES ($1) RETURNING *")
        .bind(name)
        .fetch_one(executor)
        .await
}
