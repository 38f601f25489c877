use axum::extract::State;
use axum::Json;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::{MobileAssignment, MobilePlanningResponse};
use crate::state::SharedState;

/// Read-only planning listing for mobile clients: only plannings that are
/// published, not soft-deleted, and carry at least one assignment for the
/// requesting user. Each entry serializes that user's own assignments with
/// the full form set of the planning.
pub async fn list_plannings(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<MobilePlanningResponse>>, AppError> {
    let plannings =
        db::plannings::list_for_mobile_user(&state.pool, auth.account_id, auth.user_id).await?;

    let mut responses = Vec::with_capacity(plannings.len());
    for planning in plannings {
        let form_ids = db::plannings::form_ids_of(&state.pool, planning.id).await?;
        let assignments =
            db::assignments::for_user_on_planning(&state.pool, planning.id, auth.user_id).await?;

        responses.push(MobilePlanningResponse {
            id: planning.id,
            name: planning.name,
            description: planning.description,
            created_at: planning.created_at,
            assignments: assignments
                .into_iter()
                .map(|a| MobileAssignment {
                    org_unit: a.org_unit_id,
                    form_ids: form_ids.clone(),
                })
                .collect(),
        });
    }

    Ok(Json(responses))
}
