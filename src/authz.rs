//! Table-driven authorization. Every mutating operation asks this module
//! before touching state; denials surface as `Forbidden`, never as silent
//! no-ops. Scope (ownership, ward, province) is resolved by the caller and
//! passed in as plain booleans so the decision itself stays a pure function.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::OrderStatus;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Shipper,
    PoWardManager,
    PoProvinceAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Shipper => "SHIPPER",
            Role::PoWardManager => "PO_WARD_MANAGER",
            Role::PoProvinceAdmin => "PO_PROVINCE_ADMIN",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "CUSTOMER" => Ok(Role::Customer),
            "SHIPPER" => Ok(Role::Shipper),
            "PO_WARD_MANAGER" => Ok(Role::PoWardManager),
            "PO_PROVINCE_ADMIN" => Ok(Role::PoProvinceAdmin),
            other => Err(AppError::Validation(format!("Unknown role: {other}"))),
        }
    }

    /// Office staff: may read restricted tracking fields and manage pickups.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::PoWardManager | Role::PoProvinceAdmin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateOrder,
    ReadOrder,
    ListOwnOrders,
    ListAllOrders,
    CancelOrder,
    CreatePickup,
    ListPendingPickups,
    AssignPickup,
    CompletePickup,
    AdvanceStatus,
    SubmitRating,
    ReadRating,
    ManageStaff,
}

/// The policy table. `is_owner` means the target order/pickup belongs to the
/// actor; `scope_match` means the actor's ward/province covers the target
/// (for shippers: the task is assigned to them). The province admin rows
/// deliberately repeat the ward-manager rows rather than delegating, so the
/// whole policy reads as one flat table.
pub fn allow(role: Role, action: Action, is_owner: bool, scope_match: bool) -> bool {
    use Action::*;
    match (role, action) {
        (Role::Customer, CreateOrder) => true,
        (Role::Customer, ListOwnOrders) => true,
        (Role::Customer, ReadOrder) => is_owner,
        (Role::Customer, CancelOrder) => is_owner,
        (Role::Customer, CreatePickup) => is_owner,
        (Role::Customer, SubmitRating) => is_owner,
        (Role::Customer, ReadRating) => is_owner,
        (Role::Customer, _) => false,

        (Role::Shipper, ReadOrder) => scope_match,
        (Role::Shipper, CompletePickup) => scope_match,
        (Role::Shipper, AdvanceStatus) => scope_match,
        (Role::Shipper, _) => false,

        (Role::PoWardManager, ReadOrder) => true,
        (Role::PoWardManager, ListAllOrders) => true,
        (Role::PoWardManager, CancelOrder) => scope_match,
        (Role::PoWardManager, ListPendingPickups) => scope_match,
        (Role::PoWardManager, AssignPickup) => scope_match,
        (Role::PoWardManager, AdvanceStatus) => scope_match,
        (Role::PoWardManager, ReadRating) => true,
        (Role::PoWardManager, ManageStaff) => scope_match,
        (Role::PoWardManager, _) => false,

        (Role::PoProvinceAdmin, ReadOrder) => true,
        (Role::PoProvinceAdmin, ListAllOrders) => true,
        (Role::PoProvinceAdmin, CancelOrder) => scope_match,
        (Role::PoProvinceAdmin, ListPendingPickups) => scope_match,
        (Role::PoProvinceAdmin, AssignPickup) => scope_match,
        (Role::PoProvinceAdmin, AdvanceStatus) => scope_match,
        (Role::PoProvinceAdmin, ReadRating) => true,
        (Role::PoProvinceAdmin, ManageStaff) => scope_match,
        (Role::PoProvinceAdmin, _) => false,
    }
}

/// Which statuses an actor may write into the ledger. `PICKUP_SCHEDULED`
/// is only ever emitted internally by pickup-request creation, and
/// `PICKED_UP` by pickup completion, so neither is grantable here except
/// to staff correcting a record. Order cancellation consults the same
/// table, which is why customers appear here even though they cannot
/// use the event-append endpoint.
pub fn role_may_set_status(role: Role, status: OrderStatus) -> bool {
    use OrderStatus::*;
    match role {
        Role::Customer => matches!(status, Cancelled),
        Role::Shipper => matches!(
            status,
            InTransit | OutForDelivery | Delivered | FailedDelivery
        ),
        Role::PoWardManager | Role::PoProvinceAdmin => !matches!(status, Created),
    }
}

pub fn ensure(role: Role, action: Action, is_owner: bool, scope_match: bool) -> Result<(), AppError> {
    if allow(role, action, is_owner, scope_match) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderStatus;

    #[test]
    fn customers_only_touch_their_own_orders() {
        assert!(allow(Role::Customer, Action::ReadOrder, true, false));
        assert!(!allow(Role::Customer, Action::ReadOrder, false, false));
        assert!(allow(Role::Customer, Action::SubmitRating, true, false));
        assert!(!allow(Role::Customer, Action::SubmitRating, false, true));
    }

    #[test]
    fn customers_never_advance_status() {
        assert!(!allow(Role::Customer, Action::AdvanceStatus, true, true));
    }

    #[test]
    fn shippers_act_only_on_assigned_tasks() {
        assert!(allow(Role::Shipper, Action::CompletePickup, false, true));
        assert!(!allow(Role::Shipper, Action::CompletePickup, false, false));
        assert!(allow(Role::Shipper, Action::AdvanceStatus, false, true));
        assert!(!allow(Role::Shipper, Action::AdvanceStatus, false, false));
        assert!(!allow(Role::Shipper, Action::AssignPickup, false, true));
    }

    #[test]
    fn staff_status_advances_are_ward_scoped() {
        assert!(allow(Role::PoWardManager, Action::AdvanceStatus, false, true));
        assert!(!allow(Role::PoWardManager, Action::AdvanceStatus, false, false));
        assert!(allow(Role::PoProvinceAdmin, Action::AdvanceStatus, false, true));
        assert!(!allow(Role::PoProvinceAdmin, Action::AdvanceStatus, false, false));
    }

    #[test]
    fn staff_scope_gates_pickup_management() {
        assert!(allow(Role::PoWardManager, Action::AssignPickup, false, true));
        assert!(!allow(Role::PoWardManager, Action::AssignPickup, false, false));
        assert!(allow(Role::PoProvinceAdmin, Action::ListPendingPickups, false, true));
        assert!(!allow(Role::PoProvinceAdmin, Action::ListPendingPickups, false, false));
    }

    #[test]
    fn province_admin_covers_ward_manager_capabilities() {
        for action in [
            Action::ReadOrder,
            Action::ListAllOrders,
            Action::AdvanceStatus,
            Action::ReadRating,
        ] {
            assert!(
                allow(Role::PoProvinceAdmin, action, false, true)
                    >= allow(Role::PoWardManager, action, false, true)
            );
        }
    }

    #[test]
    fn status_grants_per_role() {
        assert!(role_may_set_status(Role::Customer, OrderStatus::Cancelled));
        assert!(!role_may_set_status(Role::Customer, OrderStatus::Delivered));
        assert!(role_may_set_status(Role::Shipper, OrderStatus::Delivered));
        assert!(!role_may_set_status(Role::Shipper, OrderStatus::Returned));
        assert!(!role_may_set_status(Role::Shipper, OrderStatus::Cancelled));
        assert!(role_may_set_status(Role::PoWardManager, OrderStatus::Returned));
        assert!(!role_may_set_status(Role::PoProvinceAdmin, OrderStatus::Created));
    }
}
