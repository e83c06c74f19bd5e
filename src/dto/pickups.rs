use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::TimeSlot;
use crate::models::PickupRequest;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePickupRequest {
    pub order_id: Uuid,
    pub pickup_address: String,
    pub pickup_ward_code: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub preferred_date: NaiveDate,
    pub preferred_time_slot: Option<TimeSlot>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignPickupRequest {
    pub shipper_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PickupRequestList {
    pub items: Vec<PickupRequest>,
}
