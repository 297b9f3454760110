use crate::config::DbConfig;
use sqlx::{PgPool, postgres::PgPoolOptions};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Opens the pool shared by every request. Connections are checked out per
/// statement and returned when the statement finishes, on success or error.
pub async fn create_pool(config: &DbConfig, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(config.connect_options())
        .await
}
