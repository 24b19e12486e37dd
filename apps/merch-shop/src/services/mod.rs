//! Application services layered over merch-core.

pub mod auth_service;

pub use auth_service::AuthService;
