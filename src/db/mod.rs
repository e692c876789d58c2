//! Database layer
//!
//! Database abstraction for the Pariksha platform. Supports:
//! - SQLite (default, for single-binary deployment)
//! - MySQL (for larger deployments)
//!
//! The driver is selected from configuration; repositories work against the
//! `DatabasePool` trait and dispatch per driver internally.
//!
//! # Usage
//!
//! ```ignore
//! use pariksha::config::DatabaseConfig;
//! use pariksha::db::{create_pool, migrations};
//!
//! let config = DatabaseConfig::default();
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
