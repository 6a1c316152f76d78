use crate::{
    db::event_store::EventStore,
    error::{AppError, Result},
    models::{
        event::{Event, EventFields},
        user::UserIdentity,
    },
    services::access_policy::{Scope, can_modify, visible_scope},
};

/// Books, changes and lists events on behalf of an authenticated caller
#[derive(Clone)]
pub struct BookingService {
    events: EventStore,
}

impl BookingService {
    pub fn new(events: EventStore) -> Self {
        Self { events }
    }

    /// Book a new event. Only one event may exist per date, whoever owns it.
    #[tracing::instrument(skip(self, fields))]
    pub async fn create_event(&self, fields: EventFields, owner_username: &str) -> Result<i64> {
        validate(&fields)?;

        // The write lock is held from the start, so no other booking can slip
        // in between the check and the insert. UNIQUE(date) backs this up.
        let mut tx = self.events.begin_write().await?;
        if !EventStore::get_by_date_in(&mut tx, fields.date).await?.is_empty() {
            return Err(AppError::DateConflict(fields.date));
        }
        let id = EventStore::insert_in(&mut tx, &fields, owner_username).await?;
        tx.commit().await?;

        Ok(id)
    }

    /// Replace the fields of an event the requester may modify
    #[tracing::instrument(skip(self, fields, requester), fields(requester = %requester.username))]
    pub async fn update_event(
        &self,
        id: i64,
        fields: EventFields,
        requester: &UserIdentity,
    ) -> Result<()> {
        validate(&fields)?;

        let mut tx = self.events.begin_write().await?;
        let event = EventStore::get_by_id_in(&mut tx, id)
            .await?
            .ok_or(AppError::NotFound(id))?;
        if !can_modify(&event, requester) {
            return Err(AppError::Forbidden);
        }
        EventStore::update_in(&mut tx, id, &fields).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Delete an event the requester may modify. Missing events count as deleted.
    #[tracing::instrument(skip(self, requester), fields(requester = %requester.username))]
    pub async fn delete_event(&self, id: i64, requester: &UserIdentity) -> Result<()> {
        let mut tx = self.events.begin_write().await?;
        let Some(event) = EventStore::get_by_id_in(&mut tx, id).await? else {
            return Ok(());
        };
        if !can_modify(&event, requester) {
            return Err(AppError::Forbidden);
        }
        EventStore::delete_in(&mut tx, id).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Admins get every event, everybody else only their own
    pub async fn list_events(&self, requester: &UserIdentity) -> Result<Vec<Event>> {
        match visible_scope(requester) {
            Scope::All => self.events.get_all().await,
            Scope::OwnedOnly => self.events.get_by_owner(&requester.username).await,
        }
    }
}

fn validate(fields: &EventFields) -> Result<()> {
    match fields.first_missing() {
        Some(field) => Err(AppError::Validation(format!("{field} is required"))),
        None => Ok(()),
    }
}
