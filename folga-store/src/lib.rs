use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::info;

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

use application::leave_service::LeaveService;
use config::StoreConfig;
use error::StoreError;
use infrastructure::leave_repo::LeaveRepository;
use infrastructure::schedule_repo::ScheduleRepository;

// Container holding every repository
pub struct AppServices {
    pub schedule: ScheduleRepository,
    pub leave: LeaveRepository,
    default_max_working_days: u32,
}

impl AppServices {
    pub fn new(pool: SqlitePool, config: &StoreConfig) -> Self {
        Self {
            // the pool is reference counted, cloning is cheap
            schedule: ScheduleRepository::new(pool.clone()),
            leave: LeaveRepository::new(pool),
            default_max_working_days: config.default_max_consecutive_working_days,
        }
    }

    pub fn leaves(&self) -> LeaveService<'_> {
        LeaveService::new(&self.schedule, &self.leave, self.default_max_working_days)
    }

    /// Opens the database, creating the file if needed, and runs migrations.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = open_pool(config).await?;
        Ok(Self::new(pool, config))
    }
}

pub async fn open_pool(config: &StoreConfig) -> Result<SqlitePool, StoreError> {
    // --- connection settings ---
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // --- connect ---
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    // --- tables ---
    sqlx::migrate!("./migrations").run(&pool).await?;

    info!(database_url = %config.database_url, "store ready");
    Ok(pool)
}
