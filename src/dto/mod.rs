pub mod auth;
pub mod orders;
pub mod pickups;
pub mod ratings;
pub mod staff;
pub mod tracking;
