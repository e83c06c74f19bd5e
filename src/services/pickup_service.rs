use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    authz::{self, Action, Role},
    domain::{OrderStatus, PickupStatus, TimeSlot},
    dto::pickups::{AssignPickupRequest, CreatePickupRequest, PickupRequestList},
    entity::{
        accounts::Entity as Accounts,
        orders::Entity as Orders,
        pickup_requests::{
            ActiveModel as PickupActive, Column as PickupCol, Entity as PickupRequests,
            Model as PickupModel,
        },
    },
    error::{AppError, AppResult},
    geography,
    middleware::auth::AuthUser,
    models::PickupRequest,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::tracking_service,
    state::AppState,
};

/// Create a pickup request for an owned order. Appends the
/// PICKUP_SCHEDULED event in the same transaction, so an order that is
/// past CREATED (or already cancelled) is rejected by the transition
/// table rather than by an ad-hoc status check.
pub async fn create_pickup_request(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePickupRequest,
) -> AppResult<ApiResponse<PickupRequest>> {
    for (field, value) in [
        ("pickup_address", &payload.pickup_address),
        ("pickup_ward_code", &payload.pickup_ward_code),
        ("contact_name", &payload.contact_name),
        ("contact_phone", &payload.contact_phone),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} must not be empty")));
        }
    }
    // Validated against the server clock at creation time, not at pickup.
    if payload.preferred_date <= Utc::now().date_naive() {
        return Err(AppError::Validation(
            "preferred_date must be strictly in the future".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(payload.order_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let is_owner = order.customer_id == user.account_id;
    authz::ensure(user.role, Action::CreatePickup, is_owner, false)?;

    geography::resolve_ward(&txn, &payload.pickup_ward_code).await?;

    let active_exists = PickupRequests::find()
        .filter(PickupCol::OrderId.eq(order.id))
        .filter(PickupCol::Status.is_in([
            PickupStatus::Pending.as_str(),
            PickupStatus::Assigned.as_str(),
        ]))
        .one(&txn)
        .await?;
    if active_exists.is_some() {
        return Err(AppError::Conflict(
            "Order already has an active pickup request".into(),
        ));
    }

    tracking_service::append_event_in_txn(
        &txn,
        &order,
        OrderStatus::PickupScheduled,
        Some("Pickup requested".into()),
        None,
        user.account_id,
    )
    .await?;

    let now = Utc::now();
    let request = PickupActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        customer_id: Set(user.account_id),
        pickup_address: Set(payload.pickup_address),
        pickup_ward_code: Set(payload.pickup_ward_code),
        contact_name: Set(payload.contact_name),
        contact_phone: Set(payload.contact_phone),
        preferred_date: Set(payload.preferred_date),
        preferred_time_slot: Set(payload.preferred_time_slot.map(|s| s.as_str().to_string())),
        status: Set(PickupStatus::Pending.as_str().to_string()),
        assigned_shipper_id: Set(None),
        assigned_at: Set(None),
        completed_at: Set(None),
        created_at: Set(now.fixed_offset()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.account_id),
        "pickup_request_create",
        Some("pickup_requests"),
        Some(serde_json::json!({ "request_id": request.id, "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let data = pickup_from_entity(request, Some(order.tracking_number));
    Ok(ApiResponse::success(
        "Pickup request created",
        data,
        Some(Meta::empty()),
    ))
}

pub async fn list_my_requests(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<PickupRequestList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = PickupRequests::find()
        .filter(PickupCol::CustomerId.eq(user.account_id))
        .order_by_desc(PickupCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|r| pickup_from_entity(r, None))
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", PickupRequestList { items }, Some(meta)))
}

/// Pending requests for a ward, for the staff that covers it.
pub async fn list_pending(
    state: &AppState,
    user: &AuthUser,
    ward_code: &str,
) -> AppResult<ApiResponse<PickupRequestList>> {
    let scope_match = staff_covers_ward(state, user, ward_code).await?;
    authz::ensure(user.role, Action::ListPendingPickups, false, scope_match)?;

    let items = PickupRequests::find()
        .filter(PickupCol::PickupWardCode.eq(ward_code))
        .filter(PickupCol::Status.eq(PickupStatus::Pending.as_str()))
        .order_by_asc(PickupCol::PreferredDate)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|r| pickup_from_entity(r, None))
        .collect();

    Ok(ApiResponse::success(
        "Pending pickups",
        PickupRequestList { items },
        Some(Meta::empty()),
    ))
}

pub async fn assign(
    state: &AppState,
    user: &AuthUser,
    request_id: Uuid,
    payload: AssignPickupRequest,
) -> AppResult<ApiResponse<PickupRequest>> {
    let txn = state.orm.begin().await?;

    let request = PickupRequests::find_by_id(request_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let scope_match = staff_covers_ward(state, user, &request.pickup_ward_code).await?;
    authz::ensure(user.role, Action::AssignPickup, false, scope_match)?;

    let status = PickupStatus::parse(&request.status)?;
    if status != PickupStatus::Pending {
        return Err(AppError::Conflict(format!(
            "Pickup request is {} and cannot be assigned",
            status.as_str()
        )));
    }

    let shipper = Accounts::find_by_id(payload.shipper_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if Role::parse(&shipper.role)? != Role::Shipper {
        return Err(AppError::Validation("Assignee is not a shipper".into()));
    }

    let mut active: PickupActive = request.into();
    active.status = Set(PickupStatus::Assigned.as_str().to_string());
    active.assigned_shipper_id = Set(Some(shipper.id));
    active.assigned_at = Set(Some(Utc::now().fixed_offset()));
    let request = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(request_id = %request.id, shipper_id = %shipper.id, "pickup assigned");

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.account_id),
        "pickup_assign",
        Some("pickup_requests"),
        Some(serde_json::json!({ "request_id": request.id, "shipper_id": shipper.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Pickup assigned",
        pickup_from_entity(request, None),
        Some(Meta::empty()),
    ))
}

/// Complete a pickup. The PICKED_UP tracking event and the request's
/// COMPLETED flip happen in one transaction; neither is observable
/// without the other.
pub async fn complete(
    state: &AppState,
    user: &AuthUser,
    request_id: Uuid,
) -> AppResult<ApiResponse<PickupRequest>> {
    let txn = state.orm.begin().await?;

    let request = PickupRequests::find_by_id(request_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let scope_match = request.assigned_shipper_id == Some(user.account_id);
    authz::ensure(user.role, Action::CompletePickup, false, scope_match)?;

    let status = PickupStatus::parse(&request.status)?;
    if status != PickupStatus::Assigned {
        return Err(AppError::BusinessRule(format!(
            "Pickup request is {} and cannot be completed",
            status.as_str()
        )));
    }

    let order = Orders::find_by_id(request.order_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    tracking_service::append_event_in_txn(
        &txn,
        &order,
        OrderStatus::PickedUp,
        Some("Parcel collected from sender".into()),
        Some(request.pickup_ward_code.clone()),
        user.account_id,
    )
    .await?;

    let mut active: PickupActive = request.into();
    active.status = Set(PickupStatus::Completed.as_str().to_string());
    active.completed_at = Set(Some(Utc::now().fixed_offset()));
    let request = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.account_id),
        "pickup_complete",
        Some("pickup_requests"),
        Some(serde_json::json!({ "request_id": request.id, "order_id": request.order_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Pickup completed",
        pickup_from_entity(request, Some(order.tracking_number)),
        Some(Meta::empty()),
    ))
}

/// Ward managers cover exactly their ward; province admins cover every
/// ward of their province.
pub(crate) async fn staff_covers_ward(
    state: &AppState,
    user: &AuthUser,
    ward_code: &str,
) -> AppResult<bool> {
    if !user.role.is_staff() {
        return Ok(false);
    }
    let account = Accounts::find_by_id(user.account_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Forbidden)?;
    match user.role {
        Role::PoWardManager => Ok(account.ward_code.as_deref() == Some(ward_code)),
        Role::PoProvinceAdmin => match account.province_code.as_deref() {
            Some(province) => geography::ward_in_province(&state.orm, ward_code, province).await,
            None => Ok(false),
        },
        _ => Ok(false),
    }
}

fn pickup_from_entity(model: PickupModel, tracking_number: Option<String>) -> PickupRequest {
    PickupRequest {
        id: model.id,
        order_id: model.order_id,
        order_tracking_number: tracking_number,
        pickup_address: model.pickup_address,
        pickup_ward_code: model.pickup_ward_code,
        contact_name: model.contact_name,
        contact_phone: model.contact_phone,
        preferred_date: model.preferred_date,
        preferred_time_slot: model
            .preferred_time_slot
            .as_deref()
            .and_then(|s| TimeSlot::parse(s).ok()),
        status: PickupStatus::parse(&model.status).unwrap_or(PickupStatus::Pending),
        assigned_shipper_id: model.assigned_shipper_id,
        assigned_at: model.assigned_at.map(|dt| dt.with_timezone(&Utc)),
        completed_at: model.completed_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
