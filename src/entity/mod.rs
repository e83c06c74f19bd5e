pub mod accounts;
pub mod audit_logs;
pub mod orders;
pub mod pickup_requests;
pub mod service_ratings;
pub mod tracking_events;
pub mod wards;

pub use accounts::Entity as Accounts;
pub use audit_logs::Entity as AuditLogs;
pub use orders::Entity as Orders;
pub use pickup_requests::Entity as PickupRequests;
pub use service_ratings::Entity as ServiceRatings;
pub use tracking_events::Entity as TrackingEvents;
pub use wards::Entity as Wards;
