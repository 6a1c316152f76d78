use crate::models::{event::Event, user::UserIdentity};

/// Which events a requester gets to see in a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    OwnedOnly,
}

/// Admins may modify any event, everybody else only the events they own
pub fn can_modify(event: &Event, requester: &UserIdentity) -> bool {
    requester.is_admin() || event.owner_username == requester.username
}

pub fn visible_scope(requester: &UserIdentity) -> Scope {
    if requester.is_admin() {
        Scope::All
    } else {
        Scope::OwnedOnly
    }
}
