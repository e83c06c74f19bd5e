use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::OrderStatus;
use crate::models::{PublicOrder, TrackingEvent};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AppendEventRequest {
    pub status: OrderStatus,
    pub description: Option<String>,
    pub location_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackingResponse {
    pub order: PublicOrder,
    pub events: Vec<TrackingEvent>,
}
