use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::Role;
use crate::domain::{OrderStatus, PickupStatus, TimeSlot};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub ward_code: Option<String>,
    pub province_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub tracking_number: String,
    pub customer_id: Uuid,
    pub sender_name: String,
    pub sender_phone: String,
    pub sender_address: String,
    pub sender_ward_code: String,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    pub receiver_ward_code: String,
    pub weight_grams: i32,
    pub length_cm: Option<i32>,
    pub width_cm: Option<i32>,
    pub height_cm: Option<i32>,
    pub description: Option<String>,
    pub shipping_fee_cents: i64,
    pub cod_amount_cents: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the unauthenticated tracking page shows: no phone numbers,
/// no street addresses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicOrder {
    pub tracking_number: String,
    pub status: OrderStatus,
    pub sender_name: String,
    pub receiver_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PickupRequest {
    pub id: Uuid,
    pub order_id: Uuid,
    pub order_tracking_number: Option<String>,
    pub pickup_address: String,
    pub pickup_ward_code: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub preferred_date: NaiveDate,
    pub preferred_time_slot: Option<TimeSlot>,
    pub status: PickupStatus,
    pub assigned_shipper_id: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// `actor_id` is stripped for non-staff readers.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrackingEvent {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub description: Option<String>,
    pub location_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<Uuid>,
    pub event_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Rating {
    pub id: Uuid,
    pub order_id: Uuid,
    pub overall_rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WardInfo {
    pub code: String,
    pub name: String,
    pub province_code: String,
    pub province_name: String,
}
