//! Maintenance type templates.
//!
//! # Invariants
//! - `name` and `frequency` are required.
//! - A type owns its checklist: deleting the type deletes its items.
//! - Embedded checklists are ordered by list position, never by caller
//!   supplied order values.

use super::checklist_item::{ChecklistItem, ChecklistItemDraft};
use super::{normalize_optional, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MaintenanceTypeId = Uuid;

/// Reusable maintenance procedure template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceType {
    pub id: MaintenanceTypeId,
    pub name: String,
    pub description: Option<String>,
    /// Recurrence label such as `daily`, `weekly` or `monthly`.
    pub frequency: String,
    pub created_at: String,
}

/// Maintenance type together with its ordered checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceTypeWithChecklist {
    #[serde(flatten)]
    pub maintenance_type: MaintenanceType,
    pub checklist_items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceTypeInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub frequency: String,
    /// `Some` replaces (or, on create, seeds) the whole checklist.
    #[serde(default)]
    pub checklist_items: Option<Vec<ChecklistItemDraft>>,
}

impl MaintenanceTypeInput {
    pub fn new(name: impl Into<String>, frequency: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frequency: frequency.into(),
            ..Self::default()
        }
    }

    pub fn with_checklist(mut self, items: Vec<ChecklistItemDraft>) -> Self {
        self.checklist_items = Some(items);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("frequency", &self.frequency)?;
        for item in self.checklist_items.iter().flatten() {
            item.validate()?;
        }
        Ok(())
    }

    pub(crate) fn description(&self) -> Option<&str> {
        normalize_optional(self.description.as_deref())
    }
}
