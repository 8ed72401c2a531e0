use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use missionfit_core::plan::WorkoutPlan;
use missionfit_core::profile::UserProfile;

use super::json_body;
use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanBody {
    pub meal_plan: String,
}

/// An upstream failure still carries a usable body, but the status says so.
fn status_for(failed: bool) -> StatusCode {
    if failed {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

/// POST /api/motivate: workout plan for a profile.
pub async fn motivate(
    State(app): State<AppState>,
    body: Result<Json<UserProfile>, JsonRejection>,
) -> Result<(StatusCode, Json<WorkoutPlan>), AppError> {
    let profile = json_body(body)?;
    let generated = app.planner.workout(&profile).await;
    Ok((status_for(generated.is_failure()), Json(generated.value)))
}

/// POST /api/mealprep: free-text meal plan for a profile.
pub async fn mealprep(
    State(app): State<AppState>,
    body: Result<Json<UserProfile>, JsonRejection>,
) -> Result<(StatusCode, Json<MealPlanBody>), AppError> {
    let profile = json_body(body)?;
    let generated = app.planner.meal_plan(&profile).await;
    Ok((
        status_for(generated.is_failure()),
        Json(MealPlanBody {
            meal_plan: generated.value,
        }),
    ))
}
