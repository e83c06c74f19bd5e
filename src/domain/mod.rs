pub mod pickup;
pub mod status;
pub mod tracking_number;

pub use pickup::{PickupStatus, TimeSlot};
pub use status::{OrderStatus, derive_status};
