use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRatingRequest {
    pub overall_rating: i32,
    pub comment: Option<String>,
}
