pub mod auth_service;
pub mod order_service;
pub mod pickup_service;
pub mod rating_service;
pub mod staff_service;
pub mod tracking_service;
