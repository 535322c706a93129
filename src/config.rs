use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Principal recorded in the `CreatedBy` / `ModifiedBy` procedure parameters.
    pub audit_user: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        Ok(Self {
            database_url,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10),
            db_acquire_timeout_secs: parse_or("DB_ACQUIRE_TIMEOUT_SECS", 30),
            audit_user: std::env::var("AUDIT_USER").unwrap_or_else(|_| "System".into()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or("APP_PORT", 8080),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_on_missing_or_garbage() {
        std::env::set_var("HOTEL_BOOKING_TEST_GARBAGE", "not-a-number");
        assert_eq!(parse_or("HOTEL_BOOKING_TEST_GARBAGE", 7u32), 7);
        assert_eq!(parse_or("HOTEL_BOOKING_TEST_UNSET_KEY", 30u64), 30);
        std::env::set_var("HOTEL_BOOKING_TEST_PORT", "9090");
        assert_eq!(parse_or("HOTEL_BOOKING_TEST_PORT", 8080u16), 9090);
    }
}
