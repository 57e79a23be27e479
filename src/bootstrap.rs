use sqlx::PgPool;

use crate::auth::password;
use crate::config::AdminSeed;
use crate::db;
use crate::models::Role;
use crate::validation;

/// Create the configured admin account if its username is not taken yet.
/// An existing account is left alone, whatever its role.
pub async fn ensure_admin(pool: &PgPool, seed: &AdminSeed) -> Result<(), String> {
    let username = validation::username(&seed.username)
        .map_err(|e| format!("Invalid TASKBOARD_ADMIN_USERNAME: {e}"))?;
    validation::password(&seed.password)
        .map_err(|e| format!("Invalid TASKBOARD_ADMIN_PASSWORD: {e}"))?;
    let email = validation::email(seed.email.as_deref())
        .map_err(|e| format!("Invalid TASKBOARD_ADMIN_EMAIL: {e}"))?;

    if db::users::find_by_username(pool, &username)
        .await
        .map_err(|e| format!("Failed to look up admin user: {e}"))?
        .is_some()
    {
        tracing::info!(%username, "Admin user already exists");
        return Ok(());
    }

    let pw_hash = password::hash(&seed.password)?;
    let user = db::users::create(
        pool,
        &username,
        email.as_deref(),
        &pw_hash,
        Some("System Administrator"),
        Role::Admin,
    )
    .await
    .map_err(|e| format!("Failed to create admin user: {e}"))?;

    tracing::info!(user_id = user.id, %username, "Created admin user");
    Ok(())
}
