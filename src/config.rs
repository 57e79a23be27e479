use std::net::IpAddr;

use axum::http::HeaderValue;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub token_expire_minutes: i64,
    pub cors_origins: Vec<HeaderValue>,
    pub max_body_size: usize,
    pub max_page_size: i64,
    pub log_level: String,
    pub admin: Option<AdminSeed>,
}

/// Credentials for the admin account created at startup.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

/// One year.
pub const MAX_TOKEN_EXPIRE_MINUTES: i64 = 525_600;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("TASKBOARD_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid TASKBOARD_HOST: {e}"))?;

        let port: u16 = env_or("TASKBOARD_PORT", "8000")
            .parse()
            .map_err(|e| format!("Invalid TASKBOARD_PORT: {e}"))?;

        let token_expire_minutes =
            parse_token_expire_minutes(&env_or("TASKBOARD_TOKEN_EXPIRE_MINUTES", "30"))?;

        let cors_origins = parse_origins(&env_or("TASKBOARD_CORS_ORIGINS", DEFAULT_CORS_ORIGINS))?;

        let max_body_size: usize = env_or("TASKBOARD_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid TASKBOARD_MAX_BODY_SIZE: {e}"))?;

        let max_page_size: i64 = env_or("TASKBOARD_MAX_PAGE_SIZE", "100")
            .parse()
            .map_err(|e| format!("Invalid TASKBOARD_MAX_PAGE_SIZE: {e}"))?;
        if max_page_size < 1 {
            return Err("TASKBOARD_MAX_PAGE_SIZE must be at least 1".to_string());
        }

        let log_level = env_or("TASKBOARD_LOG_LEVEL", "info");

        let admin = match (
            std::env::var("TASKBOARD_ADMIN_USERNAME").ok(),
            std::env::var("TASKBOARD_ADMIN_PASSWORD").ok(),
        ) {
            (Some(username), Some(password)) => Some(AdminSeed {
                username,
                password,
                email: std::env::var("TASKBOARD_ADMIN_EMAIL").ok(),
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            token_expire_minutes,
            cors_origins,
            max_body_size,
            max_page_size,
            log_level,
            admin,
        })
    }
}

/// Parse a comma-separated origin list, skipping blank entries.
pub fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            HeaderValue::from_str(s)
                .map_err(|e| format!("Invalid TASKBOARD_CORS_ORIGINS entry '{s}': {e}"))
        })
        .collect()
}

/// Access token lifetime, between 1 minute and [`MAX_TOKEN_EXPIRE_MINUTES`].
pub fn parse_token_expire_minutes(raw: &str) -> Result<i64, String> {
    let minutes: i64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("Invalid TASKBOARD_TOKEN_EXPIRE_MINUTES: {e}"))?;
    if !(1..=MAX_TOKEN_EXPIRE_MINUTES).contains(&minutes) {
        return Err(format!(
            "TASKBOARD_TOKEN_EXPIRE_MINUTES must be between 1 and {MAX_TOKEN_EXPIRE_MINUTES}"
        ));
    }
    Ok(minutes)
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
