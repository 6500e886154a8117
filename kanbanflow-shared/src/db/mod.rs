/// Database layer
///
/// - `pool`: PostgreSQL connection pool with health check
/// - `migrations`: embedded schema migrations
///
/// Models live in the crate-level `models` module.

pub mod migrations;
pub mod pool;
