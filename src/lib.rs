//! Quill API - blog backend with token authentication and role/ownership
//! authorization.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Entities, the password value object and the authorization guard
//! - **services**: Token service, admin bootstrap policy and use cases
//! - **infra**: Database, migrations and repositories
//! - **api**: HTTP handlers, authentication extractors and routes
//! - **types**: Shared types (pagination, responses)
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Identity, Password, User, UserRole};
pub use errors::{AppError, AppResult};
