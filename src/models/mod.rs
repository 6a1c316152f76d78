pub mod event;
pub mod user;

pub use event::{CreatedEvent, Event, EventFields, ListQuery};
pub use user::{LoginRequest, LoginResponse, RegisterRequest, Role, User, UserIdentity};
