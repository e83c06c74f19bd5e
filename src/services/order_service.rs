use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    authz::{self, Action, Role},
    domain::{OrderStatus, tracking_number},
    dto::orders::{CreateOrderRequest, OrderList},
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        pickup_requests::{Column as PickupCol, Entity as PickupRequests},
    },
    error::{AppError, AppResult},
    geography,
    middleware::auth::AuthUser,
    models::{Order, PublicOrder},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::tracking_service,
    state::AppState,
};

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    authz::ensure(user.role, Action::CreateOrder, true, true)?;
    validate_create(&payload)?;

    // Both endpoints of the shipment must sit in known wards.
    geography::resolve_ward(&state.orm, &payload.sender_ward_code).await?;
    geography::resolve_ward(&state.orm, &payload.receiver_ward_code).await?;

    let order_id = Uuid::new_v4();
    let tracking_number = tracking_number::generate();
    let now = Utc::now();

    let order = OrderActive {
        id: Set(order_id),
        tracking_number: Set(tracking_number.clone()),
        customer_id: Set(user.account_id),
        sender_name: Set(payload.sender_name),
        sender_phone: Set(payload.sender_phone),
        sender_address: Set(payload.sender_address),
        sender_ward_code: Set(payload.sender_ward_code),
        receiver_name: Set(payload.receiver_name),
        receiver_phone: Set(payload.receiver_phone),
        receiver_address: Set(payload.receiver_address),
        receiver_ward_code: Set(payload.receiver_ward_code),
        weight_grams: Set(payload.weight_grams),
        length_cm: Set(payload.length_cm),
        width_cm: Set(payload.width_cm),
        height_cm: Set(payload.height_cm),
        description: Set(payload.description),
        shipping_fee_cents: Set(payload.shipping_fee_cents),
        cod_amount_cents: Set(payload.cod_amount_cents.unwrap_or(0)),
        status: Set(OrderStatus::Created.as_str().to_string()),
        version: Set(0),
        created_at: Set(now.fixed_offset()),
        updated_at: Set(now.fixed_offset()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(order_id = %order.id, tracking_number = %tracking_number, "order created");

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.account_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "tracking_number": tracking_number })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn get_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_owner = order.customer_id == user.account_id;
    let scope_match = tracking_service::shipper_assigned_to(&state.orm, user, order.id).await?;
    authz::ensure(user.role, Action::ReadOrder, is_owner, scope_match)?;

    Ok(ApiResponse::success(
        "OK",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Public, unauthenticated summary by tracking number.
pub async fn get_by_tracking_number(
    state: &AppState,
    tracking_number: &str,
) -> AppResult<ApiResponse<PublicOrder>> {
    let order = Orders::find()
        .filter(OrderCol::TrackingNumber.eq(tracking_number))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = PublicOrder {
        tracking_number: order.tracking_number,
        status: OrderStatus::parse(&order.status)?,
        sender_name: order.sender_name,
        receiver_name: order.receiver_name,
        created_at: order.created_at.with_timezone(&Utc),
        updated_at: order.updated_at.with_timezone(&Utc),
    };

    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    authz::ensure(user.role, Action::ListOwnOrders, true, true)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all().add(OrderCol::CustomerId.eq(user.account_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(OrderStatus::parse(status)?.as_str()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items: orders }, Some(meta)))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    authz::ensure(user.role, Action::ListAllOrders, false, true)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(OrderStatus::parse(status)?.as_str()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items: orders }, Some(meta)))
}

/// Soft cancel: appends a CANCELLED event through the ledger, so the
/// transition table decides whether the order can still be cancelled.
/// Any active pickup request is withdrawn in the same transaction.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_owner = order.customer_id == user.account_id;
    let scope_match = staff_ward_scope(state, user, &order).await?;
    authz::ensure(user.role, Action::CancelOrder, is_owner, scope_match)?;
    if !authz::role_may_set_status(user.role, OrderStatus::Cancelled) {
        return Err(AppError::Forbidden);
    }

    tracking_service::append_event_in_txn(
        &txn,
        &order,
        OrderStatus::Cancelled,
        Some("Order cancelled".into()),
        None,
        user.account_id,
    )
    .await?;

    PickupRequests::update_many()
        .col_expr(
            PickupCol::Status,
            sea_orm::sea_query::Expr::value(crate::domain::PickupStatus::Cancelled.as_str()),
        )
        .filter(PickupCol::OrderId.eq(order.id))
        .filter(PickupCol::Status.is_in([
            crate::domain::PickupStatus::Pending.as_str(),
            crate::domain::PickupStatus::Assigned.as_str(),
        ]))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.account_id),
        "order_cancel",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order cancelled",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Ward managers act on orders sent from their ward; province admins on
/// any ward of their province.
pub(crate) async fn staff_ward_scope(
    state: &AppState,
    user: &AuthUser,
    order: &OrderModel,
) -> AppResult<bool> {
    if !user.role.is_staff() {
        return Ok(false);
    }
    let account = crate::entity::Accounts::find_by_id(user.account_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Forbidden)?;
    match user.role {
        Role::PoWardManager => Ok(account.ward_code.as_deref() == Some(&order.sender_ward_code)),
        Role::PoProvinceAdmin => match account.province_code.as_deref() {
            Some(province) => {
                geography::ward_in_province(&state.orm, &order.sender_ward_code, province).await
            }
            None => Ok(false),
        },
        _ => Ok(false),
    }
}

fn validate_create(payload: &CreateOrderRequest) -> AppResult<()> {
    let required = [
        ("sender_name", &payload.sender_name),
        ("sender_phone", &payload.sender_phone),
        ("sender_address", &payload.sender_address),
        ("sender_ward_code", &payload.sender_ward_code),
        ("receiver_name", &payload.receiver_name),
        ("receiver_phone", &payload.receiver_phone),
        ("receiver_address", &payload.receiver_address),
        ("receiver_ward_code", &payload.receiver_ward_code),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} must not be empty")));
        }
    }
    if payload.weight_grams <= 0 {
        return Err(AppError::Validation("weight_grams must be positive".into()));
    }
    for (field, value) in [
        ("length_cm", payload.length_cm),
        ("width_cm", payload.width_cm),
        ("height_cm", payload.height_cm),
    ] {
        if let Some(v) = value {
            if v <= 0 {
                return Err(AppError::Validation(format!("{field} must be positive")));
            }
        }
    }
    if payload.shipping_fee_cents < 0 {
        return Err(AppError::Validation("shipping_fee_cents must not be negative".into()));
    }
    if payload.cod_amount_cents.is_some_and(|v| v < 0) {
        return Err(AppError::Validation("cod_amount_cents must not be negative".into()));
    }
    Ok(())
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        tracking_number: model.tracking_number,
        customer_id: model.customer_id,
        sender_name: model.sender_name,
        sender_phone: model.sender_phone,
        sender_address: model.sender_address,
        sender_ward_code: model.sender_ward_code,
        receiver_name: model.receiver_name,
        receiver_phone: model.receiver_phone,
        receiver_address: model.receiver_address,
        receiver_ward_code: model.receiver_ward_code,
        weight_grams: model.weight_grams,
        length_cm: model.length_cm,
        width_cm: model.width_cm,
        height_cm: model.height_cm,
        description: model.description,
        shipping_fee_cents: model.shipping_fee_cents,
        cod_amount_cents: model.cod_amount_cents,
        status: OrderStatus::parse(&model.status).unwrap_or(OrderStatus::Created),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> CreateOrderRequest {
        CreateOrderRequest {
            sender_name: "Alice".into(),
            sender_phone: "0900000001".into(),
            sender_address: "1 Elm St".into(),
            sender_ward_code: "W001".into(),
            receiver_name: "Bob".into(),
            receiver_phone: "0900000002".into(),
            receiver_address: "2 Oak St".into(),
            receiver_ward_code: "W002".into(),
            weight_grams: 1500,
            length_cm: Some(30),
            width_cm: Some(20),
            height_cm: Some(10),
            description: None,
            shipping_fee_cents: 2500,
            cod_amount_cents: None,
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(validate_create(&payload()).is_ok());
    }

    #[test]
    fn blank_required_field_rejected() {
        let mut p = payload();
        p.receiver_name = "  ".into();
        assert!(matches!(validate_create(&p), Err(AppError::Validation(_))));
    }

    #[test]
    fn non_positive_weight_rejected() {
        let mut p = payload();
        p.weight_grams = 0;
        assert!(matches!(validate_create(&p), Err(AppError::Validation(_))));
    }

    #[test]
    fn negative_dimension_rejected() {
        let mut p = payload();
        p.width_cm = Some(-1);
        assert!(matches!(validate_create(&p), Err(AppError::Validation(_))));
    }

    #[test]
    fn negative_money_rejected() {
        let mut p = payload();
        p.cod_amount_cents = Some(-500);
        assert!(matches!(validate_create(&p), Err(AppError::Validation(_))));
    }
}
