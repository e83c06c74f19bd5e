use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Lifecycle states of an order. The current state is never stored
/// authoritatively on its own; it is the status of the last accepted
/// tracking event (`CREATED` while the ledger is empty).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    PickupScheduled,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    FailedDelivery,
    Returned,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::PickupScheduled => "PICKUP_SCHEDULED",
            OrderStatus::PickedUp => "PICKED_UP",
            OrderStatus::InTransit => "IN_TRANSIT",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::FailedDelivery => "FAILED_DELIVERY",
            OrderStatus::Returned => "RETURNED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "CREATED" => Ok(OrderStatus::Created),
            "PICKUP_SCHEDULED" => Ok(OrderStatus::PickupScheduled),
            "PICKED_UP" => Ok(OrderStatus::PickedUp),
            "IN_TRANSIT" => Ok(OrderStatus::InTransit),
            "OUT_FOR_DELIVERY" => Ok(OrderStatus::OutForDelivery),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "FAILED_DELIVERY" => Ok(OrderStatus::FailedDelivery),
            "RETURNED" => Ok(OrderStatus::Returned),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(AppError::Validation(format!("Unknown order status: {other}"))),
        }
    }

    /// No transition is defined out of a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Returned | OrderStatus::Cancelled
        )
    }

    /// The transition table. Anything not listed here is rejected.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Created => &[PickupScheduled, Cancelled],
            PickupScheduled => &[PickedUp, Cancelled],
            PickedUp => &[InTransit, Cancelled],
            InTransit => &[OutForDelivery, FailedDelivery],
            OutForDelivery => &[Delivered, FailedDelivery],
            FailedDelivery => &[OutForDelivery, Returned],
            Delivered | Returned | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fold an ordered event-status history (oldest first) into the current
/// derived status.
pub fn derive_status<I>(history: I) -> OrderStatus
where
    I: IntoIterator<Item = OrderStatus>,
{
    history
        .into_iter()
        .last()
        .unwrap_or(OrderStatus::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn happy_path_is_a_valid_walk() {
        let walk = [PickupScheduled, PickedUp, InTransit, OutForDelivery, Delivered];
        let mut current = Created;
        for next in walk {
            assert!(current.can_transition_to(next), "{current} -> {next}");
            current = next;
        }
        assert!(current.is_terminal());
    }

    #[test]
    fn failed_delivery_can_be_retried_or_returned() {
        assert!(OutForDelivery.can_transition_to(FailedDelivery));
        assert!(FailedDelivery.can_transition_to(OutForDelivery));
        assert!(FailedDelivery.can_transition_to(Returned));
        assert!(!FailedDelivery.can_transition_to(Delivered));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for status in [Delivered, Returned, Cancelled] {
            assert!(status.is_terminal());
            assert!(status.allowed_next().is_empty());
        }
    }

    #[test]
    fn cancellation_only_before_handoff_to_transit() {
        assert!(Created.can_transition_to(Cancelled));
        assert!(PickupScheduled.can_transition_to(Cancelled));
        assert!(PickedUp.can_transition_to(Cancelled));
        assert!(!InTransit.can_transition_to(Cancelled));
        assert!(!OutForDelivery.can_transition_to(Cancelled));
    }

    #[test]
    fn no_regressions_or_skips() {
        assert!(!InTransit.can_transition_to(PickedUp));
        assert!(!Created.can_transition_to(PickedUp));
        assert!(!PickupScheduled.can_transition_to(Delivered));
    }

    #[test]
    fn derive_status_folds_history() {
        assert_eq!(derive_status([]), Created);
        assert_eq!(derive_status([PickupScheduled, PickedUp]), PickedUp);
        assert_eq!(
            derive_status([PickupScheduled, PickedUp, InTransit, OutForDelivery, Delivered]),
            Delivered
        );
    }

    #[test]
    fn parse_round_trips() {
        for status in [
            Created,
            PickupScheduled,
            PickedUp,
            InTransit,
            OutForDelivery,
            Delivered,
            FailedDelivery,
            Returned,
            Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(OrderStatus::parse("SHIPPED").is_err());
    }
}
