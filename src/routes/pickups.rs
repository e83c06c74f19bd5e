use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::pickups::{AssignPickupRequest, CreatePickupRequest, PickupRequestList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::PickupRequest,
    response::ApiResponse,
    routes::params::{Pagination, PendingPickupQuery},
    services::pickup_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_pickup).get(list_my_pickups))
        .route("/pending", get(list_pending))
        .route("/{id}/assign", post(assign_pickup))
        .route("/{id}/complete", post(complete_pickup))
}

#[utoipa::path(
    post,
    path = "/api/pickups",
    request_body = CreatePickupRequest,
    responses(
        (status = 200, description = "Create pickup request", body = ApiResponse<PickupRequest>),
        (status = 400, description = "Preferred date not in the future"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Order already has an active pickup request"),
    ),
    security(("bearer_auth" = [])),
    tag = "Pickups"
)]
pub async fn create_pickup(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePickupRequest>,
) -> AppResult<Json<ApiResponse<PickupRequest>>> {
    let resp = pickup_service::create_pickup_request(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/pickups",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List own pickup requests", body = ApiResponse<PickupRequestList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Pickups"
)]
pub async fn list_my_pickups(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<PickupRequestList>>> {
    let resp = pickup_service::list_my_requests(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/pickups/pending",
    params(("ward_code" = String, Query, description = "Ward to list pending pickups for")),
    responses(
        (status = 200, description = "Pending pickups in ward", body = ApiResponse<PickupRequestList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Pickups"
)]
pub async fn list_pending(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PendingPickupQuery>,
) -> AppResult<Json<ApiResponse<PickupRequestList>>> {
    let resp = pickup_service::list_pending(&state, &user, &query.ward_code).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/pickups/{id}/assign",
    params(("id" = Uuid, Path, description = "Pickup request ID")),
    request_body = AssignPickupRequest,
    responses(
        (status = 200, description = "Assign shipper", body = ApiResponse<PickupRequest>),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Request is not pending"),
    ),
    security(("bearer_auth" = [])),
    tag = "Pickups"
)]
pub async fn assign_pickup(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignPickupRequest>,
) -> AppResult<Json<ApiResponse<PickupRequest>>> {
    let resp = pickup_service::assign(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/pickups/{id}/complete",
    params(("id" = Uuid, Path, description = "Pickup request ID")),
    responses(
        (status = 200, description = "Complete pickup", body = ApiResponse<PickupRequest>),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "Request is not assigned"),
    ),
    security(("bearer_auth" = [])),
    tag = "Pickups"
)]
pub async fn complete_pickup(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PickupRequest>>> {
    let resp = pickup_service::complete(&state, &user, id).await?;
    Ok(Json(resp))
}
