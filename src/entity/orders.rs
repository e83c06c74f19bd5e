use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
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
    /// Denormalized mirror of the last accepted tracking event; written
    /// only inside the same transaction that appends the event.
    pub status: String,
    /// Optimistic-concurrency counter bumped on every accepted append.
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::CustomerId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
    #[sea_orm(has_many = "super::tracking_events::Entity")]
    TrackingEvents,
    #[sea_orm(has_many = "super::pickup_requests::Entity")]
    PickupRequests,
    #[sea_orm(has_many = "super::service_ratings::Entity")]
    ServiceRatings,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::tracking_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrackingEvents.def()
    }
}

impl Related<super::pickup_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PickupRequests.def()
    }
}

impl Related<super::service_ratings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceRatings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
