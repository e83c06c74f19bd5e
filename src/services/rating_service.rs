use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    authz::{self, Action},
    domain::OrderStatus,
    dto::ratings::CreateRatingRequest,
    entity::{
        orders::Entity as Orders,
        service_ratings::{
            ActiveModel as RatingActive, Column as RatingCol, Entity as ServiceRatings,
            Model as RatingModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Rating,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// One rating per order, only once the order has actually been delivered.
pub async fn submit_rating(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: CreateRatingRequest,
) -> AppResult<ApiResponse<Rating>> {
    if !(1..=5).contains(&payload.overall_rating) {
        return Err(AppError::Validation(
            "overall_rating must be between 1 and 5".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_owner = order.customer_id == user.account_id;
    authz::ensure(user.role, Action::SubmitRating, is_owner, false)?;

    if OrderStatus::parse(&order.status)? != OrderStatus::Delivered {
        return Err(AppError::BusinessRule(
            "Cannot rate an order that is not DELIVERED".into(),
        ));
    }

    let existing = ServiceRatings::find()
        .filter(RatingCol::OrderId.eq(order.id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Order has already been rated".into()));
    }

    let rating = RatingActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        customer_id: Set(user.account_id),
        overall_rating: Set(payload.overall_rating),
        comment: Set(payload.comment),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.account_id),
        "rating_submit",
        Some("service_ratings"),
        Some(serde_json::json!({ "order_id": order.id, "rating": payload.overall_rating })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Rating submitted",
        rating_from_entity(rating),
        Some(Meta::empty()),
    ))
}

pub async fn get_rating(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<Rating>> {
    let rating = ServiceRatings::find()
        .filter(RatingCol::OrderId.eq(order_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_owner = rating.customer_id == user.account_id;
    authz::ensure(user.role, Action::ReadRating, is_owner, false)?;

    Ok(ApiResponse::success(
        "OK",
        rating_from_entity(rating),
        Some(Meta::empty()),
    ))
}

fn rating_from_entity(model: RatingModel) -> Rating {
    Rating {
        id: model.id,
        order_id: model.order_id,
        overall_rating: model.overall_rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
