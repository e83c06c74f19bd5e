//! Administrative-geography lookups. Ward codes arriving in payloads are
//! resolved here before any mutation; an unknown code is a `Geography`
//! error, distinct from plain validation.

use sea_orm::{ConnectionTrait, EntityTrait};

use crate::{
    entity::wards::{Entity as Wards, Model as WardModel},
    error::{AppError, AppResult},
    models::WardInfo,
};

pub async fn resolve_ward<C: ConnectionTrait>(conn: &C, code: &str) -> AppResult<WardInfo> {
    let ward = Wards::find_by_id(code.to_string()).one(conn).await?;
    match ward {
        Some(w) => Ok(ward_info(w)),
        None => Err(AppError::Geography(code.to_string())),
    }
}

/// Whether `ward_code` lies inside the caller's province.
pub async fn ward_in_province<C: ConnectionTrait>(
    conn: &C,
    ward_code: &str,
    province_code: &str,
) -> AppResult<bool> {
    let ward = resolve_ward(conn, ward_code).await?;
    Ok(ward.province_code == province_code)
}

fn ward_info(model: WardModel) -> WardInfo {
    WardInfo {
        code: model.code,
        name: model.name,
        province_code: model.province_code,
        province_name: model.province_name,
    }
}
