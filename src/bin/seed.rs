use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use postal_workflow_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    seed_wards(&pool).await?;

    let admin_id = ensure_account(
        &pool,
        "admin@postal.example",
        "admin123",
        "PO_PROVINCE_ADMIN",
        "Province Admin",
        Some("79-01"),
        Some("79"),
    )
    .await?;
    let manager_id = ensure_account(
        &pool,
        "manager.d1@postal.example",
        "manager123",
        "PO_WARD_MANAGER",
        "District 1 Manager",
        Some("79-01"),
        Some("79"),
    )
    .await?;
    let shipper_id = ensure_account(
        &pool,
        "shipper.d1@postal.example",
        "shipper123",
        "SHIPPER",
        "District 1 Shipper",
        Some("79-01"),
        Some("79"),
    )
    .await?;

    println!(
        "Seed completed. Admin: {admin_id}, Manager: {manager_id}, Shipper: {shipper_id}"
    );
    Ok(())
}

async fn seed_wards(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let wards = vec![
        ("79-01", "Ben Nghe Ward", "79", "Ho Chi Minh City"),
        ("79-02", "Ben Thanh Ward", "79", "Ho Chi Minh City"),
        ("79-03", "Da Kao Ward", "79", "Ho Chi Minh City"),
        ("01-01", "Phuc Xa Ward", "01", "Ha Noi"),
        ("01-02", "Truc Bach Ward", "01", "Ha Noi"),
        ("48-01", "Hai Chau 1 Ward", "48", "Da Nang"),
    ];

    for (code, name, province_code, province_name) in wards {
        sqlx::query(
            r#"
            INSERT INTO wards (code, name, province_code, province_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(code)
        .bind(name)
        .bind(province_code)
        .bind(province_name)
        .execute(pool)
        .await?;
    }

    println!("Seeded wards");
    Ok(())
}

async fn ensure_account(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
    full_name: &str,
    ward_code: Option<&str>,
    province_code: Option<&str>,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO accounts (id, email, password_hash, full_name, role, ward_code, province_code)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(full_name)
    .bind(role)
    .bind(ward_code)
    .bind(province_code)
    .fetch_optional(pool)
    .await?;

    let account_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM accounts WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured account {email} (role={role})");
    Ok(account_id)
}
