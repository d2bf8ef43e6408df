//! Name-keyed business rules for event types.
//!
//! Legacy data identifies document kinds only by their display name. Every
//! rule that depends on an event type's name is read from [`EventTypeRules`]
//! so a rename is a configuration change instead of a code change.

use serde::{Deserialize, Serialize};

use crate::types::EventCategory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTypeRules {
    /// Names inferred as `document` when a row has no stored category.
    pub document_types: Vec<String>,
    /// Names whose events spawn a shadow order.
    pub order_source_types: Vec<String>,
    /// Names whose link to an order completes that order.
    pub completion_types: Vec<String>,
}

impl Default for EventTypeRules {
    fn default() -> Self {
        Self {
            document_types: vec![
                "Pedido".to_string(),
                "Albarán".to_string(),
                "Factura Proforma".to_string(),
                "Factura".to_string(),
                "Factura Comisiones IBERFOODS".to_string(),
            ],
            order_source_types: vec!["Pedido".to_string(), "Factura Proforma".to_string()],
            completion_types: vec!["Factura Comisiones IBERFOODS".to_string()],
        }
    }
}

impl EventTypeRules {
    pub fn category_for(&self, name: &str) -> EventCategory {
        if self.document_types.iter().any(|n| n == name) {
            EventCategory::Document
        } else {
            EventCategory::Event
        }
    }

    /// Resolves a possibly missing stored category.
    pub fn resolve_category(&self, stored: Option<EventCategory>, name: &str) -> EventCategory {
        stored.unwrap_or_else(|| self.category_for(name))
    }

    pub fn spawns_order(&self, name: &str) -> bool {
        self.order_source_types.iter().any(|n| n == name)
    }

    pub fn completes_order(&self, name: &str) -> bool {
        self.completion_types.iter().any(|n| n == name)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
