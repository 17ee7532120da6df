//! Database layer
//!
//! SQLite (default, single-file deployment) and MySQL are both supported. The
//! driver is selected from configuration and hidden behind [`DatabasePool`];
//! repositories pick the concrete pool through [`DatabasePool::backend`].

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, Backend, DatabasePool, DynDatabasePool, MysqlDatabase,
    SqliteDatabase,
};

/// Whether an error is a unique-constraint violation reported by the database
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
