pub mod auth;
pub mod business;
pub mod companion;
pub mod event;
pub mod health;
pub mod member;
pub mod visit;
