use crate::{
    auth::jwt::JwtConfig,
    config::Config,
    db::{DbPool, event_store::EventStore, user_store::UserStore},
    services::{AuthService, BookingService},
};

/// Shared state handed to every HTTP handler
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub bookings: BookingService,
}

impl AppState {
    pub fn new(pool: DbPool, config: &Config) -> Self {
        let jwt = JwtConfig {
            secret: config.jwt_secret.clone(),
            expiration_hours: config.jwt_expiration_hours,
        };
        let users = UserStore::new(pool.clone(), config.min_password_length);

        Self {
            auth: AuthService::new(users, jwt),
            bookings: BookingService::new(EventStore::new(pool)),
        }
    }
}
