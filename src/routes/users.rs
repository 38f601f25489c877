use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::auth::extractor::AuthUser;
use crate::auth::{password, PERM_USERS};
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub username: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Add a user to the caller's account with the given permission grants.
pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateUser>,
) -> Result<Json<User>, AppError> {
    auth.require_permission(PERM_USERS)?;

    if req.email.is_empty() || req.password.is_empty() || req.username.is_empty() {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let user = db::users::create(
        &state.pool,
        auth.account_id,
        &req.email,
        &pw_hash,
        &req.username,
        &req.permissions,
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::BadRequest("A user with this email already exists".to_string())
        }
        _ => AppError::Database(e),
    })?;

    Ok(Json(user))
}
