//! Event-order linkage rules.
//!
//! Calendar events of an order-source type spawn a shadow order. Linking an
//! event of a completion type to an order completes that order. Completion is
//! never reverted, and an order's `deleted` status is only reached through
//! [`OrderLinkageService::soft_delete_order`].
//!
//! Each operation is a short sequence of store writes. Run it on a
//! transaction to make it atomic; on a bare connection a failure part-way
//! leaves the earlier writes in place.

use std::sync::Arc;

use db::{
    ConnectionTrait, DbErr,
    entities::{calendar_event, event_link},
    models::{
        calendar_event::{CalendarEvent, order_details},
        event_link::EventLink,
        event_type::EventType,
        order::Order,
    },
    rules::EventTypeRules,
    types::OrderStatus,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LinkageError {
    #[error("Order not found")]
    OrderNotFound,
    #[error("Event not found")]
    EventNotFound,
    #[error("Link not found")]
    LinkNotFound,
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Side effects applied by one linkage step, as row ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkageOutcome {
    pub spawned_order: Option<i64>,
    pub refreshed_order: Option<i64>,
    pub removed_links: u64,
    pub created_link: Option<i64>,
    pub completed_order: Option<i64>,
}

impl LinkageOutcome {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// An event linked to an order, with its type name resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LinkedEvent {
    pub id: Uuid,
    pub title: String,
    pub event_type_name: String,
    pub order_number: Option<String>,
}

const UNKNOWN_EVENT_TYPE: &str = "Unknown";

#[derive(Clone)]
pub struct OrderLinkageService {
    rules: Arc<EventTypeRules>,
}

impl OrderLinkageService {
    pub fn new(rules: Arc<EventTypeRules>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &EventTypeRules {
        &self.rules
    }

    /// Links `event_id` to `order_id`, completing the order when the event's
    /// type is a completion type.
    async fn link<C: ConnectionTrait>(
        &self,
        db: &C,
        order_id: i64,
        event_id: i64,
        event_type_name: &str,
        outcome: &mut LinkageOutcome,
    ) -> Result<event_link::Model, LinkageError> {
        let link = EventLink::create(db, order_id, event_id).await?;
        outcome.created_link = Some(link.id);
        tracing::info!(event_id, order_id, link_id = link.id, "Linked event to order");

        if self.rules.completes_order(event_type_name) {
            Order::set_status(db, order_id, OrderStatus::Completed).await?;
            outcome.completed_order = Some(order_id);
            tracing::info!(event_id, order_id, "Order completed by linked event");
        }
        Ok(link)
    }

    /// Applies the creation rules to a freshly stored event.
    pub async fn on_event_created<C: ConnectionTrait>(
        &self,
        db: &C,
        event: &calendar_event::Model,
        event_type_name: &str,
    ) -> Result<LinkageOutcome, LinkageError> {
        let mut outcome = LinkageOutcome::default();

        if self.rules.spawns_order(event_type_name) {
            let order = Order::create(db, event.id, &order_details(event), event.created_by).await?;
            outcome.spawned_order = Some(order.id);
            tracing::info!(event_id = event.id, order_id = order.id, "Spawned order for event");
        }

        if let Some(order_id) = event.linked_order_id {
            self.link(db, order_id, event.id, event_type_name, &mut outcome)
                .await?;
        }

        Ok(outcome)
    }

    /// Applies the update rules. `event` is the row as stored after the update
    /// and `previous_linked_order_id` its link before the update.
    ///
    /// An existing shadow order of an event whose type no longer spawns
    /// orders is left as it is.
    pub async fn on_event_updated<C: ConnectionTrait>(
        &self,
        db: &C,
        event: &calendar_event::Model,
        previous_linked_order_id: Option<i64>,
        event_type_name: &str,
    ) -> Result<LinkageOutcome, LinkageError> {
        let mut outcome = LinkageOutcome::default();

        if self.rules.spawns_order(event_type_name) {
            if let Some(order) = Order::find_model_by_event(db, event.id).await? {
                Order::update_details_for_event(db, event.id, &order_details(event)).await?;
                outcome.refreshed_order = Some(order.id);
            }
        } else if let Some(order) = Order::find_model_by_event(db, event.id).await? {
            tracing::debug!(
                event_id = event.id,
                order_id = order.id,
                event_type_name,
                "Event type no longer spawns orders; leaving its order untouched"
            );
        }

        if event.linked_order_id != previous_linked_order_id {
            if previous_linked_order_id.is_some() {
                outcome.removed_links = EventLink::delete_for_event(db, event.id).await?;
            }
            if let Some(order_id) = event.linked_order_id {
                self.link(db, order_id, event.id, event_type_name, &mut outcome)
                    .await?;
            }
        }

        Ok(outcome)
    }

    /// Explicitly links an event to an order.
    pub async fn create_link<C: ConnectionTrait>(
        &self,
        db: &C,
        order_id: Uuid,
        event_id: Uuid,
    ) -> Result<(EventLink, LinkageOutcome), LinkageError> {
        let order = Order::find_model_by_id(db, order_id)
            .await?
            .ok_or(LinkageError::OrderNotFound)?;
        let event = CalendarEvent::find_model_by_id(db, event_id)
            .await?
            .ok_or(LinkageError::EventNotFound)?;

        let event_type_name = EventType::name_by_row_id(db, event.event_type_id)
            .await?
            .unwrap_or_default();

        let mut outcome = LinkageOutcome::default();
        let link = self
            .link(db, order.id, event.id, &event_type_name, &mut outcome)
            .await?;
        CalendarEvent::set_linked_order(db, event.id, Some(order.id)).await?;

        let link = EventLink::from_model(db, link).await?;
        Ok((link, outcome))
    }

    /// Removes a link and clears the event's `linked_order_id`. The order's
    /// status is kept.
    pub async fn delete_link<C: ConnectionTrait>(
        &self,
        db: &C,
        link_id: Uuid,
    ) -> Result<(), LinkageError> {
        let link = EventLink::find_model_by_id(db, link_id)
            .await?
            .ok_or(LinkageError::LinkNotFound)?;

        EventLink::delete(db, link.id).await?;
        CalendarEvent::set_linked_order(db, link.event_id, None).await?;
        tracing::info!(
            event_id = link.event_id,
            order_id = link.order_id,
            link_id = link.id,
            "Removed event link"
        );
        Ok(())
    }

    /// Events linked to an order, each with its event type name looked up on
    /// its own. An unknown order yields an empty list here; the HTTP layer
    /// answers 404 for it before this is reached, like any other unknown id.
    pub async fn list_linked_events<C: ConnectionTrait>(
        &self,
        db: &C,
        order_id: Uuid,
    ) -> Result<Vec<LinkedEvent>, LinkageError> {
        let order = Order::find_model_by_id(db, order_id)
            .await?
            .ok_or(LinkageError::OrderNotFound)?;

        let event_ids = EventLink::event_ids_for_order(db, order.id).await?;
        let events = CalendarEvent::find_models_by_row_ids(db, event_ids).await?;

        let mut linked = Vec::with_capacity(events.len());
        for event in events {
            let event_type_name = EventType::name_by_row_id(db, event.event_type_id)
                .await?
                .unwrap_or_else(|| UNKNOWN_EVENT_TYPE.to_string());
            linked.push(LinkedEvent {
                id: event.uuid,
                title: event.title,
                event_type_name,
                order_number: event.order_number,
            });
        }
        Ok(linked)
    }

    pub async fn soft_delete_order<C: ConnectionTrait>(
        &self,
        db: &C,
        order_id: Uuid,
    ) -> Result<(), LinkageError> {
        let order = Order::find_model_by_id(db, order_id)
            .await?
            .ok_or(LinkageError::OrderNotFound)?;
        if Order::set_status(db, order.id, OrderStatus::Deleted).await? == 0 {
            return Err(LinkageError::OrderNotFound);
        }
        tracing::info!(order_id = order.id, "Order marked as deleted");
        Ok(())
    }
}
