//! # KanbanFlow Shared Library
//!
//! Data layer and authentication primitives used by the KanbanFlow API
//! server.
//!
//! ## Module Organization
//!
//! - `models`: users, projects and tasks with their database operations
//! - `db`: connection pool and embedded migrations
//! - `auth`: password hashing, JWT, bearer authentication, caller identity

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the KanbanFlow shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
