//! Equipment records.
//!
//! # Invariants
//! - `name` and `location` are required and non-blank.
//! - Equipment referenced by a service order cannot be deleted.

use super::{normalize_optional, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type EquipmentId = Uuid;

/// One maintained equipment unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EquipmentId,
    pub name: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub location: String,
    /// Opaque date text, as supplied by the caller.
    pub last_maintenance: Option<String>,
    pub next_maintenance: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Mutable equipment fields used by create and full-replace update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentInput {
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    pub location: String,
    #[serde(default)]
    pub last_maintenance: Option<String>,
    #[serde(default)]
    pub next_maintenance: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl EquipmentInput {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("location", &self.location)?;
        Ok(())
    }

    /// Builds the stored record shape, normalizing blank optionals.
    pub(crate) fn into_record(
        self,
        id: EquipmentId,
        created_at: String,
        updated_at: String,
    ) -> Equipment {
        Equipment {
            id,
            model: normalize_optional(self.model.as_deref()).map(str::to_string),
            serial_number: normalize_optional(self.serial_number.as_deref()).map(str::to_string),
            last_maintenance: normalize_optional(self.last_maintenance.as_deref())
                .map(str::to_string),
            next_maintenance: normalize_optional(self.next_maintenance.as_deref())
                .map(str::to_string),
            notes: normalize_optional(self.notes.as_deref()).map(str::to_string),
            name: self.name,
            location: self.location,
            created_at,
            updated_at,
        }
    }
}
