pub mod auth_service;
pub mod calendar;
pub mod capacity;
pub mod datetime;
pub mod reservation_service;
pub mod subscription;
