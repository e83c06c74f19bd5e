use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::tracking::TrackingResponse,
    error::AppResult,
    middleware::auth::AuthUser,
    models::PublicOrder,
    response::ApiResponse,
    services::{order_service, tracking_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{tracking_number}", get(get_tracking))
        .route("/{tracking_number}/summary", get(get_summary))
}

#[utoipa::path(
    get,
    path = "/api/tracking/{tracking_number}",
    params(("tracking_number" = String, Path, description = "Public tracking number")),
    responses(
        (status = 200, description = "Tracking history, oldest first", body = ApiResponse<TrackingResponse>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Tracking"
)]
pub async fn get_tracking(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(tracking_number): Path<String>,
) -> AppResult<Json<ApiResponse<TrackingResponse>>> {
    let resp = tracking_service::get_tracking(&state, viewer.as_ref(), &tracking_number).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/tracking/{tracking_number}/summary",
    params(("tracking_number" = String, Path, description = "Public tracking number")),
    responses(
        (status = 200, description = "Order summary", body = ApiResponse<PublicOrder>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Tracking"
)]
pub async fn get_summary(
    State(state): State<AppState>,
    Path(tracking_number): Path<String>,
) -> AppResult<Json<ApiResponse<PublicOrder>>> {
    let resp = order_service::get_by_tracking_number(&state, &tracking_number).await?;
    Ok(Json(resp))
}
