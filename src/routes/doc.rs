use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        orders::{CreateOrderRequest, OrderList},
        pickups::{AssignPickupRequest, CreatePickupRequest, PickupRequestList},
        ratings::CreateRatingRequest,
        staff::{AccountList, CreateEmployeeRequest},
        tracking::{AppendEventRequest, TrackingResponse},
    },
    models::{Account, Order, PickupRequest, PublicOrder, Rating, TrackingEvent, WardInfo},
    response::{ApiResponse, Meta},
    routes::{auth, health, orders, params, pickups, staff, tracking},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        orders::create_order,
        orders::list_my_orders,
        orders::get_order,
        orders::cancel_order,
        orders::append_event,
        orders::submit_rating,
        orders::get_rating,
        pickups::create_pickup,
        pickups::list_my_pickups,
        pickups::list_pending,
        pickups::assign_pickup,
        pickups::complete_pickup,
        tracking::get_tracking,
        tracking::get_summary,
        staff::create_employee,
        staff::list_employees,
        staff::list_all_orders
    ),
    components(
        schemas(
            Account,
            Order,
            PublicOrder,
            PickupRequest,
            TrackingEvent,
            Rating,
            WardInfo,
            CreateOrderRequest,
            OrderList,
            CreatePickupRequest,
            AssignPickupRequest,
            PickupRequestList,
            AppendEventRequest,
            TrackingResponse,
            CreateRatingRequest,
            CreateEmployeeRequest,
            AccountList,
            params::Pagination,
            params::OrderListQuery,
            params::PendingPickupQuery,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<PickupRequestList>,
            ApiResponse<TrackingResponse>,
            ApiResponse<Rating>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Orders", description = "Order lifecycle endpoints"),
        (name = "Pickups", description = "Pickup scheduling endpoints"),
        (name = "Tracking", description = "Public tracking endpoints"),
        (name = "Ratings", description = "Delivery rating endpoints"),
        (name = "Staff", description = "Staff management endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
