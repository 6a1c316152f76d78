pub mod access_policy;
pub mod auth_service;
pub mod booking_service;
pub mod scheduler;

pub use auth_service::AuthService;
pub use booking_service::BookingService;
