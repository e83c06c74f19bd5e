use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickupStatus {
    Pending,
    Assigned,
    Completed,
    Cancelled,
}

impl PickupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickupStatus::Pending => "PENDING",
            PickupStatus::Assigned => "ASSIGNED",
            PickupStatus::Completed => "COMPLETED",
            PickupStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "PENDING" => Ok(PickupStatus::Pending),
            "ASSIGNED" => Ok(PickupStatus::Assigned),
            "COMPLETED" => Ok(PickupStatus::Completed),
            "CANCELLED" => Ok(PickupStatus::Cancelled),
            other => Err(AppError::Validation(format!("Unknown pickup status: {other}"))),
        }
    }

    /// An order may hold at most one request in a non-terminal state.
    pub fn is_active(&self) -> bool {
        matches!(self, PickupStatus::Pending | PickupStatus::Assigned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl TimeSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "MORNING",
            TimeSlot::Afternoon => "AFTERNOON",
            TimeSlot::Evening => "EVENING",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "MORNING" => Ok(TimeSlot::Morning),
            "AFTERNOON" => Ok(TimeSlot::Afternoon),
            "EVENING" => Ok(TimeSlot::Evening),
            other => Err(AppError::Validation(format!("Unknown time slot: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_and_assigned_are_active() {
        assert!(PickupStatus::Pending.is_active());
        assert!(PickupStatus::Assigned.is_active());
        assert!(!PickupStatus::Completed.is_active());
        assert!(!PickupStatus::Cancelled.is_active());
    }
}
