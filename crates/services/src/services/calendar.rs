use db::{
    ConnectionTrait, DbErr,
    models::{
        calendar_event::{
            CalendarEvent, CalendarEventRecord, CreateCalendarEvent, UpdateCalendarEvent,
        },
        event_type::EventType,
        ids,
        order::Order,
        user::User,
    },
};
use thiserror::Error;
use uuid::Uuid;

use super::linkage::{LinkageError, LinkageOutcome, OrderLinkageService};

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Event not found")]
    EventNotFound,
    #[error("Event type not found")]
    EventTypeNotFound,
    #[error("Linked order not found")]
    LinkedOrderNotFound,
    #[error(transparent)]
    Linkage(#[from] LinkageError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Calendar event CRUD with the linkage rules applied on every write.
#[derive(Clone)]
pub struct CalendarService {
    linkage: OrderLinkageService,
}

impl CalendarService {
    pub fn new(linkage: OrderLinkageService) -> Self {
        Self { linkage }
    }

    /// Resolves the payload's uuids to row ids and returns the event type name.
    async fn resolve_payload<C: ConnectionTrait>(
        &self,
        db: &C,
        payload: &CreateCalendarEvent,
    ) -> Result<(CalendarEventRecord, String), CalendarError> {
        let event_type_id = ids::event_type_id_by_uuid(db, payload.event_type_id)
            .await?
            .ok_or(CalendarError::EventTypeNotFound)?;
        let event_type_name = EventType::name_by_row_id(db, event_type_id)
            .await?
            .ok_or(CalendarError::EventTypeNotFound)?;
        let linked_order_id = match payload.linked_order_id {
            Some(order_id) => Some(
                ids::order_id_by_uuid(db, order_id)
                    .await?
                    .ok_or(CalendarError::LinkedOrderNotFound)?,
            ),
            None => None,
        };
        Ok((
            CalendarEventRecord::from_payload(payload, event_type_id, linked_order_id),
            event_type_name,
        ))
    }

    pub async fn list_events<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        Ok(CalendarEvent::find_all(db).await?)
    }

    pub async fn get_event<C: ConnectionTrait>(
        &self,
        db: &C,
        event_id: Uuid,
    ) -> Result<CalendarEvent, CalendarError> {
        CalendarEvent::find_by_id(db, event_id)
            .await?
            .ok_or(CalendarError::EventNotFound)
    }

    pub async fn create_event<C: ConnectionTrait>(
        &self,
        db: &C,
        created_by: &User,
        payload: &CreateCalendarEvent,
    ) -> Result<(CalendarEvent, LinkageOutcome), CalendarError> {
        let (record, event_type_name) = self.resolve_payload(db, payload).await?;
        let created_by_id = ids::user_id_by_uuid(db, created_by.id).await?;

        let model = CalendarEvent::create(db, &record, created_by_id).await?;
        let outcome = self
            .linkage
            .on_event_created(db, &model, &event_type_name)
            .await?;

        Ok((CalendarEvent::from_model(db, model).await?, outcome))
    }

    /// Replaces an event and reconciles its shadow order and link.
    pub async fn update_event<C: ConnectionTrait>(
        &self,
        db: &C,
        event_id: Uuid,
        payload: &UpdateCalendarEvent,
    ) -> Result<(CalendarEvent, LinkageOutcome), CalendarError> {
        let previous = CalendarEvent::find_model_by_id(db, event_id)
            .await?
            .ok_or(CalendarError::EventNotFound)?;
        let previous_linked_order_id = previous.linked_order_id;

        let (record, event_type_name) = self.resolve_payload(db, payload).await?;
        let model = CalendarEvent::replace(db, previous, &record).await?;
        let outcome = self
            .linkage
            .on_event_updated(db, &model, previous_linked_order_id, &event_type_name)
            .await?;

        Ok((CalendarEvent::from_model(db, model).await?, outcome))
    }

    /// Deletes an event. The store removes its shadow order and every link
    /// touching either; events that pointed at that order are unlinked here.
    pub async fn delete_event<C: ConnectionTrait>(
        &self,
        db: &C,
        event_id: Uuid,
    ) -> Result<(), CalendarError> {
        let event = CalendarEvent::find_model_by_id(db, event_id)
            .await?
            .ok_or(CalendarError::EventNotFound)?;

        if let Some(order) = Order::find_model_by_event(db, event.id).await? {
            let unlinked = CalendarEvent::unlink_order(db, order.id).await?;
            if unlinked > 0 {
                tracing::info!(
                    event_id = event.id,
                    order_id = order.id,
                    unlinked,
                    "Cleared links to the order of a deleted event"
                );
            }
        }

        if CalendarEvent::delete(db, event.id).await? == 0 {
            return Err(CalendarError::EventNotFound);
        }
        Ok(())
    }
}
