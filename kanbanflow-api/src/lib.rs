//! # KanbanFlow API Server Library
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `cache`: Fixed-TTL list response cache
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request body extraction
//! - `middleware`: Bearer authentication and caller identity
//! - `routes`: API route handlers

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
