use sqlx::PgPool;
use uuid::Uuid;

use crate::models::team::NestedUser;
use crate::models::User;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    account_id: Uuid,
    email: &str,
    password_hash: &str,
    username: &str,
    permissions: &[String],
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (account_id, email, password_hash, username, permissions)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(account_id)
    .bind(email)
    .bind(password_hash)
    .bind(username)
    .bind(permissions)
    .fetch_one(executor)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// True when every given user id exists inside the account. Used to scope
/// `manager`, `users` and `user` reference fields to the acting account.
pub async fn all_in_account<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    ids: &[Uuid],
    account_id: Uuid,
) -> Result<bool, sqlx::Error> {
    if ids.is_empty() {
        return Ok(true);
    }
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE id = ANY($1) AND account_id = $2")
            .bind(ids)
            .bind(account_id)
            .fetch_one(executor)
            .await?;
    Ok(row.0 == ids.len() as i64)
}

pub async fn details_for<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    ids: &[Uuid],
) -> Result<Vec<NestedUser>, sqlx::Error> {
    let rows: Vec<(Uuid, String)> =
        sqlx::query_as("SELECT id, username FROM users WHERE id = ANY($1) ORDER BY username")
            .bind(ids)
            .fetch_all(executor)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(id, username)| NestedUser { id, username })
        .collect())
}
