use chrono::{Duration, Utc};
use postal_workflow_api::{
    authz::Role,
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    domain::{OrderStatus, PickupStatus, TimeSlot},
    dto::{
        orders::CreateOrderRequest,
        pickups::{AssignPickupRequest, CreatePickupRequest},
        ratings::CreateRatingRequest,
        tracking::AppendEventRequest,
    },
    entity::{accounts::ActiveModel as AccountActive, wards::ActiveModel as WardActive},
    error::AppError,
    middleware::auth::AuthUser,
    services::{order_service, pickup_service, rating_service, tracking_service},
    state::AppState,
};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Statement};
use uuid::Uuid;

// Integration flow: customer creates an order and schedules a pickup, the
// ward manager assigns a shipper, the shipper carries the parcel through to
// delivery, and the customer rates the service at the end.
#[tokio::test]
async fn order_pickup_delivery_and_rating_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    seed_ward(&state, "TW-01", "Test Ward One", "TP", "Test Province").await?;
    seed_ward(&state, "TW-02", "Test Ward Two", "TP", "Test Province").await?;

    let customer_id = create_account(&state, "CUSTOMER", "alice@example.com", None, None).await?;
    let other_customer_id =
        create_account(&state, "CUSTOMER", "mallory@example.com", None, None).await?;
    let manager_id = create_account(
        &state,
        "PO_WARD_MANAGER",
        "manager@example.com",
        Some("TW-01"),
        Some("TP"),
    )
    .await?;
    let outside_manager_id = create_account(
        &state,
        "PO_WARD_MANAGER",
        "manager.tw2@example.com",
        Some("TW-02"),
        Some("TP"),
    )
    .await?;
    let shipper_id = create_account(
        &state,
        "SHIPPER",
        "shipper@example.com",
        Some("TW-01"),
        Some("TP"),
    )
    .await?;

    let customer = AuthUser {
        account_id: customer_id,
        role: Role::Customer,
    };
    let other_customer = AuthUser {
        account_id: other_customer_id,
        role: Role::Customer,
    };
    let manager = AuthUser {
        account_id: manager_id,
        role: Role::PoWardManager,
    };
    let outside_manager = AuthUser {
        account_id: outside_manager_id,
        role: Role::PoWardManager,
    };
    let shipper = AuthUser {
        account_id: shipper_id,
        role: Role::Shipper,
    };

    // An unresolvable ward code is refused before anything is written
    let mut bad_ward = order_payload();
    bad_ward.sender_ward_code = "ZZ-99".into();
    let unresolved = order_service::create_order(&state, &customer, bad_ward).await;
    assert!(matches!(unresolved, Err(AppError::Geography(_))));

    // Create the order
    let created = order_service::create_order(&state, &customer, order_payload()).await?;
    let order = created.data.unwrap();
    assert_eq!(order.status, OrderStatus::Created);
    assert!(order.tracking_number.starts_with("VN"));

    // Pickup ward codes are resolved the same way
    let unresolved_pickup = pickup_service::create_pickup_request(
        &state,
        &customer,
        CreatePickupRequest {
            order_id: order.id,
            pickup_address: "1 Elm St".into(),
            pickup_ward_code: "ZZ-99".into(),
            contact_name: "Alice".into(),
            contact_phone: "0900000001".into(),
            preferred_date: (Utc::now() + Duration::days(7)).date_naive(),
            preferred_time_slot: None,
        },
    )
    .await;
    assert!(matches!(unresolved_pickup, Err(AppError::Geography(_))));

    // Schedule a pickup one week out
    let pickup_resp = pickup_service::create_pickup_request(
        &state,
        &customer,
        CreatePickupRequest {
            order_id: order.id,
            pickup_address: "1 Elm St".into(),
            pickup_ward_code: "TW-01".into(),
            contact_name: "Alice".into(),
            contact_phone: "0900000001".into(),
            preferred_date: (Utc::now() + Duration::days(7)).date_naive(),
            preferred_time_slot: Some(TimeSlot::Morning),
        },
    )
    .await?;
    let request = pickup_resp.data.unwrap();
    assert_eq!(request.status, PickupStatus::Pending);

    // A second active request for the same order is refused
    let duplicate = pickup_service::create_pickup_request(
        &state,
        &customer,
        CreatePickupRequest {
            order_id: order.id,
            pickup_address: "1 Elm St".into(),
            pickup_ward_code: "TW-01".into(),
            contact_name: "Alice".into(),
            contact_phone: "0900000001".into(),
            preferred_date: (Utc::now() + Duration::days(8)).date_naive(),
            preferred_time_slot: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    // Ward manager sees it and assigns the shipper
    let pending = pickup_service::list_pending(&state, &manager, "TW-01").await?;
    assert!(
        pending
            .data
            .unwrap()
            .items
            .iter()
            .any(|r| r.id == request.id),
        "expected the new request in the ward's pending list"
    );

    let assigned = pickup_service::assign(
        &state,
        &manager,
        request.id,
        AssignPickupRequest {
            shipper_id,
        },
    )
    .await?;
    assert_eq!(assigned.data.unwrap().status, PickupStatus::Assigned);

    // Shipper collects the parcel
    let completed = pickup_service::complete(&state, &shipper, request.id).await?;
    assert_eq!(completed.data.unwrap().status, PickupStatus::Completed);

    let order = order_service::get_order(&state, &customer, order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(order.status, OrderStatus::PickedUp);

    // Shipper moves it along
    tracking_service::append_event(
        &state,
        &shipper,
        order.id,
        append_payload(OrderStatus::InTransit),
    )
    .await?;

    // Going back to PICKED_UP is not a legal move
    let backwards = tracking_service::append_event(
        &state,
        &shipper,
        order.id,
        append_payload(OrderStatus::PickedUp),
    )
    .await;
    assert!(matches!(
        backwards,
        Err(AppError::InvalidTransition { .. })
    ));

    // Staff appends are scoped to the sender's ward
    let out_of_ward = tracking_service::append_event(
        &state,
        &outside_manager,
        order.id,
        append_payload(OrderStatus::OutForDelivery),
    )
    .await;
    assert!(matches!(out_of_ward, Err(AppError::Forbidden)));

    // No rating before delivery
    let premature = rating_service::submit_rating(
        &state,
        &customer,
        order.id,
        CreateRatingRequest {
            overall_rating: 5,
            comment: None,
        },
    )
    .await;
    assert!(matches!(premature, Err(AppError::BusinessRule(_))));

    // A stranger cannot touch the ledger
    let foreign = tracking_service::append_event(
        &state,
        &other_customer,
        order.id,
        append_payload(OrderStatus::Cancelled),
    )
    .await;
    assert!(matches!(foreign, Err(AppError::Forbidden)));

    tracking_service::append_event(
        &state,
        &shipper,
        order.id,
        append_payload(OrderStatus::OutForDelivery),
    )
    .await?;
    tracking_service::append_event(
        &state,
        &shipper,
        order.id,
        append_payload(OrderStatus::Delivered),
    )
    .await?;

    // Anonymous tracking shows the derived status and hides actor identities
    let tracking = tracking_service::get_tracking(&state, None, &order.tracking_number)
        .await?
        .data
        .unwrap();
    assert_eq!(tracking.order.status, OrderStatus::Delivered);
    assert!(tracking.events.len() >= 5);
    assert!(tracking.events.iter().all(|e| e.actor_id.is_none()));
    assert!(
        tracking
            .events
            .windows(2)
            .all(|w| w[0].event_time < w[1].event_time),
        "event times must be strictly increasing"
    );

    // Staff viewers see who did what
    let staff_tracking = tracking_service::get_tracking(&state, Some(&manager), &order.tracking_number)
        .await?
        .data
        .unwrap();
    assert!(staff_tracking.events.iter().all(|e| e.actor_id.is_some()));

    // Rate it, once: two racing submissions, and only one may land
    // whether the loser trips the pre-check or the unique index.
    let (first_rating, second_rating) = tokio::join!(
        rating_service::submit_rating(
            &state,
            &customer,
            order.id,
            CreateRatingRequest {
                overall_rating: 5,
                comment: Some("Great!".into()),
            },
        ),
        rating_service::submit_rating(
            &state,
            &customer,
            order.id,
            CreateRatingRequest {
                overall_rating: 5,
                comment: Some("Great!".into()),
            },
        ),
    );
    let rating_successes = [&first_rating, &second_rating]
        .iter()
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(rating_successes, 1, "exactly one rating may land");
    let rating_loser = if first_rating.is_ok() {
        second_rating
    } else {
        first_rating
    };
    assert!(matches!(rating_loser, Err(AppError::Conflict(_))));

    let stored = rating_service::get_rating(&state, &customer, order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(stored.overall_rating, 5);

    let again = rating_service::submit_rating(
        &state,
        &customer,
        order.id,
        CreateRatingRequest {
            overall_rating: 4,
            comment: None,
        },
    )
    .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    // Terminal orders reject further cancellation
    let cancel_after_delivery = order_service::cancel_order(&state, &customer, order.id).await;
    assert!(matches!(
        cancel_after_delivery,
        Err(AppError::InvalidTransition { .. })
    ));

    // Two racing cancellations of a fresh order: exactly one wins
    let order_b = order_service::create_order(&state, &customer, order_payload())
        .await?
        .data
        .unwrap();
    let (first, second) = tokio::join!(
        order_service::cancel_order(&state, &customer, order_b.id),
        order_service::cancel_order(&state, &customer, order_b.id),
    );
    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one cancellation may win");
    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(
        loser,
        Err(AppError::Conflict(_) | AppError::InvalidTransition { .. })
    ));

    let order_b = order_service::get_order(&state, &customer, order_b.id)
        .await?
        .data
        .unwrap();
    assert_eq!(order_b.status, OrderStatus::Cancelled);

    Ok(())
}

fn order_payload() -> CreateOrderRequest {
    CreateOrderRequest {
        sender_name: "Alice".into(),
        sender_phone: "0900000001".into(),
        sender_address: "1 Elm St".into(),
        sender_ward_code: "TW-01".into(),
        receiver_name: "Bob".into(),
        receiver_phone: "0900000002".into(),
        receiver_address: "2 Oak St".into(),
        receiver_ward_code: "TW-02".into(),
        weight_grams: 1500,
        length_cm: Some(30),
        width_cm: Some(20),
        height_cm: Some(10),
        description: Some("Books".into()),
        shipping_fee_cents: 2500,
        cod_amount_cents: None,
    }
}

fn append_payload(status: OrderStatus) -> AppendEventRequest {
    AppendEventRequest {
        status,
        description: None,
        location_name: None,
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE tracking_events, service_ratings, pickup_requests, audit_logs, orders, accounts, wards CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
    };

    Ok(AppState { pool, orm, config })
}

async fn seed_ward(
    state: &AppState,
    code: &str,
    name: &str,
    province_code: &str,
    province_name: &str,
) -> anyhow::Result<()> {
    WardActive {
        code: Set(code.to_string()),
        name: Set(name.to_string()),
        province_code: Set(province_code.to_string()),
        province_name: Set(province_name.to_string()),
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

async fn create_account(
    state: &AppState,
    role: &str,
    email: &str,
    ward_code: Option<&str>,
    province_code: Option<&str>,
) -> anyhow::Result<Uuid> {
    let account = AccountActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        full_name: Set(email.to_string()),
        phone: Set(None),
        role: Set(role.to_string()),
        ward_code: Set(ward_code.map(str::to_string)),
        province_code: Set(province_code.map(str::to_string)),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(&state.orm)
    .await?;

    Ok(account.id)
}
