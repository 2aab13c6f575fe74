pub mod auth;
pub mod business;
pub mod context;
pub mod maybe_auth;
