pub mod client;
pub mod config;
pub mod pool;

mod comments;
mod posts;
mod record;
mod users;

use sqlx::migrate::Migrator;

/// Schema migrations embedded from `migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!();
