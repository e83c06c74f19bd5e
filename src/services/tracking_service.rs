use chrono::{Duration, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    authz::{self, Action},
    domain::{OrderStatus, derive_status},
    dto::tracking::{AppendEventRequest, TrackingResponse},
    entity::{
        orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
        pickup_requests::{Column as PickupCol, Entity as PickupRequests},
        tracking_events::{
            ActiveModel as EventActive, Column as EventCol, Entity as TrackingEvents,
            Model as EventModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{PublicOrder, TrackingEvent},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Append one tracking event inside an open transaction.
///
/// The order row carries an optimistic version counter; the status/version
/// update is conditioned on the version the caller read, so of two racing
/// appends against the same prior state exactly one wins and the other
/// observes zero affected rows and gets `Conflict`. The denormalized
/// status column is only ever written here, together with the event row.
pub(crate) async fn append_event_in_txn<C: ConnectionTrait>(
    txn: &C,
    order: &OrderModel,
    new_status: OrderStatus,
    description: Option<String>,
    location_name: Option<String>,
    actor_id: Uuid,
) -> AppResult<EventModel> {
    let current = OrderStatus::parse(&order.status)?;
    if !current.can_transition_to(new_status) {
        return Err(AppError::InvalidTransition {
            from: current.to_string(),
            to: new_status.to_string(),
        });
    }

    let now = Utc::now();
    let guarded = Orders::update_many()
        .col_expr(OrderCol::Version, Expr::col(OrderCol::Version).add(1))
        .col_expr(OrderCol::Status, Expr::value(new_status.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now))
        .filter(OrderCol::Id.eq(order.id))
        .filter(OrderCol::Version.eq(order.version))
        .exec(txn)
        .await?;
    if guarded.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Order was modified concurrently, retry the request".into(),
        ));
    }

    // Per-order event times are strictly increasing; if the clock has not
    // moved past the previous event, stamp just after it.
    let last = TrackingEvents::find()
        .filter(EventCol::OrderId.eq(order.id))
        .order_by_desc(EventCol::EventTime)
        .one(txn)
        .await?;
    let mut event_time = now.fixed_offset();
    if let Some(prev) = &last {
        if event_time <= prev.event_time {
            event_time = prev.event_time + Duration::microseconds(1);
        }
    }

    let event = EventActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        status: Set(new_status.as_str().to_string()),
        description: Set(description),
        location_name: Set(location_name),
        actor_id: Set(actor_id),
        event_time: Set(event_time),
        created_at: Set(now.fixed_offset()),
    }
    .insert(txn)
    .await?;

    tracing::info!(
        order_id = %order.id,
        from = %current,
        to = %new_status,
        actor_id = %actor_id,
        "tracking event appended"
    );

    Ok(event)
}

/// Role-gated status advance over the ledger.
pub async fn append_event(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: AppendEventRequest,
) -> AppResult<ApiResponse<TrackingEvent>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_owner = order.customer_id == user.account_id;
    // Shippers reach orders through their pickup assignment; staff reach
    // them through the sender ward, same as cancellation.
    let scope_match = if user.role.is_staff() {
        crate::services::order_service::staff_ward_scope(state, user, &order).await?
    } else {
        shipper_assigned_to(&txn, user, order.id).await?
    };
    authz::ensure(user.role, Action::AdvanceStatus, is_owner, scope_match)?;
    if !authz::role_may_set_status(user.role, payload.status) {
        return Err(AppError::Forbidden);
    }

    let event = append_event_in_txn(
        &txn,
        &order,
        payload.status,
        payload.description,
        payload.location_name,
        user.account_id,
    )
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.account_id),
        "tracking_event_append",
        Some("tracking_events"),
        Some(serde_json::json!({ "order_id": order_id, "status": payload.status.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Event appended",
        event_from_entity(event, true),
        Some(Meta::empty()),
    ))
}

/// Public tracking view by tracking number. The displayed status is the
/// fold over the event history, so it can never disagree with the audit
/// trail. Actor identities are only revealed to staff viewers.
pub async fn get_tracking(
    state: &AppState,
    viewer: Option<&AuthUser>,
    tracking_number: &str,
) -> AppResult<ApiResponse<TrackingResponse>> {
    let order = Orders::find()
        .filter(OrderCol::TrackingNumber.eq(tracking_number))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let events = TrackingEvents::find()
        .filter(EventCol::OrderId.eq(order.id))
        .order_by_asc(EventCol::EventTime)
        .all(&state.orm)
        .await?;

    let statuses = events
        .iter()
        .map(|e| OrderStatus::parse(&e.status))
        .collect::<Result<Vec<_>, _>>()?;
    let derived = derive_status(statuses);

    let staff_view = viewer.map(|u| u.role.is_staff()).unwrap_or(false);
    let events = events
        .into_iter()
        .map(|e| event_from_entity(e, staff_view))
        .collect();

    let data = TrackingResponse {
        order: PublicOrder {
            tracking_number: order.tracking_number,
            status: derived,
            sender_name: order.sender_name,
            receiver_name: order.receiver_name,
            created_at: order.created_at.with_timezone(&Utc),
            updated_at: order.updated_at.with_timezone(&Utc),
        },
        events,
    };

    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

/// Shipper scope: the order's pickup was assigned to this shipper.
pub(crate) async fn shipper_assigned_to<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<bool> {
    if user.role != crate::authz::Role::Shipper {
        return Ok(false);
    }
    let assigned = PickupRequests::find()
        .filter(PickupCol::OrderId.eq(order_id))
        .filter(PickupCol::AssignedShipperId.eq(user.account_id))
        .one(conn)
        .await?;
    Ok(assigned.is_some())
}

pub(crate) fn event_from_entity(model: EventModel, staff_view: bool) -> TrackingEvent {
    TrackingEvent {
        id: model.id,
        order_id: model.order_id,
        status: OrderStatus::parse(&model.status).unwrap_or(OrderStatus::Created),
        description: model.description,
        location_name: model.location_name,
        actor_id: staff_view.then_some(model.actor_id),
        event_time: model.event_time.with_timezone(&Utc),
    }
}
