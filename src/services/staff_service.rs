use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    authz::{self, Action, Role},
    dto::staff::{AccountList, CreateEmployeeRequest},
    entity::accounts::{ActiveModel as AccountActive, Column as AccountCol, Entity as Accounts},
    error::{AppError, AppResult},
    geography,
    middleware::auth::AuthUser,
    models::Account,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::auth_service,
    state::AppState,
};

/// Create a staff account. Ward managers hire shippers for their own
/// ward; province admins additionally create ward managers for any ward
/// in their province.
pub async fn create_employee(
    state: &AppState,
    user: &AuthUser,
    payload: CreateEmployeeRequest,
) -> AppResult<ApiResponse<Account>> {
    if !matches!(payload.role, Role::Shipper | Role::PoWardManager) {
        return Err(AppError::Validation(
            "Only SHIPPER and PO_WARD_MANAGER accounts can be created here".into(),
        ));
    }
    if payload.email.trim().is_empty() || payload.full_name.trim().is_empty() {
        return Err(AppError::Validation("email and full_name are required".into()));
    }
    if payload.password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    let ward = geography::resolve_ward(&state.orm, &payload.ward_code).await?;

    let actor = Accounts::find_by_id(user.account_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Forbidden)?;
    let scope_match = match user.role {
        Role::PoWardManager => {
            payload.role == Role::Shipper && actor.ward_code.as_deref() == Some(&payload.ward_code)
        }
        Role::PoProvinceAdmin => actor.province_code.as_deref() == Some(&ward.province_code),
        _ => false,
    };
    authz::ensure(user.role, Action::ManageStaff, false, scope_match)?;

    let exists = Accounts::find()
        .filter(AccountCol::Email.eq(payload.email.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict("Email is already taken".into()));
    }

    let password_hash = auth_service::hash_password(&payload.password)?;

    let account = AccountActive {
        id: Set(Uuid::new_v4()),
        email: Set(payload.email),
        password_hash: Set(password_hash),
        full_name: Set(payload.full_name),
        phone: Set(payload.phone),
        role: Set(payload.role.as_str().to_string()),
        ward_code: Set(Some(ward.code.clone())),
        province_code: Set(Some(ward.province_code.clone())),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(
        account_id = %account.id,
        role = %payload.role.as_str(),
        ward_code = %ward.code,
        "employee account created"
    );

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.account_id),
        "employee_create",
        Some("accounts"),
        Some(serde_json::json!({ "account_id": account.id, "role": payload.role.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Employee created",
        auth_service::account_from_entity(account)?,
        Some(Meta::empty()),
    ))
}

/// Staff roster visible to the caller: a ward manager sees their ward's
/// shippers, a province admin sees all staff in the province.
pub async fn list_employees(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<AccountList>> {
    let actor = Accounts::find_by_id(user.account_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Forbidden)?;

    let condition = match user.role {
        Role::PoWardManager => {
            let ward = actor.ward_code.ok_or(AppError::Forbidden)?;
            Condition::all()
                .add(AccountCol::WardCode.eq(ward))
                .add(AccountCol::Role.eq(Role::Shipper.as_str()))
        }
        Role::PoProvinceAdmin => {
            let province = actor.province_code.ok_or(AppError::Forbidden)?;
            Condition::all()
                .add(AccountCol::ProvinceCode.eq(province))
                .add(AccountCol::Role.is_in([
                    Role::Shipper.as_str(),
                    Role::PoWardManager.as_str(),
                ]))
        }
        _ => return Err(AppError::Forbidden),
    };

    let (page, limit, offset) = pagination.normalize();
    let finder = Accounts::find()
        .filter(condition)
        .order_by_desc(AccountCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(auth_service::account_from_entity)
        .collect::<Result<Vec<_>, _>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Employees", AccountList { items }, Some(meta)))
}
