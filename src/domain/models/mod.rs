pub mod auth;
pub mod business;
pub mod client;
pub mod companion;
pub mod event;
pub mod user;
pub mod visit;
