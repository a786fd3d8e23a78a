//! Checklist items and their response kinds.
//!
//! # Responsibility
//! - Model one question/measurement of a maintenance type template.
//! - Define the closed set of answer shapes and validate raw answers
//!   against them.
//!
//! # Invariants
//! - `item_order` is 1-based and unique within one maintenance type.
//! - `MultipleChoice` definitions carry at least one non-blank, unique option.
//! - `unit` only exists for `Numeric`; `options` only for `MultipleChoice`.

use super::maintenance_type::MaintenanceTypeId;
use super::{normalize_optional, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ChecklistItemId = Uuid;

const YES_NO_NA_ANSWERS: &[&str] = &["yes", "no", "na", "n/a"];

/// Storage tag of a response kind (`checklist_items.response_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    YesNoNa,
    Numeric,
    Text,
    MultipleChoice,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::YesNoNa => "yes_no_na",
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::MultipleChoice => "multiple_choice",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "yes_no_na" => Some(Self::YesNoNa),
            "numeric" => Some(Self::Numeric),
            "text" => Some(Self::Text),
            "multiple_choice" => Some(Self::MultipleChoice),
            _ => None,
        }
    }
}

impl Display for ResponseType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected answer shape for one checklist item.
///
/// Serialized with a `response_type` tag so it can be flattened into the
/// item record next to `unit` / `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response_type", rename_all = "snake_case")]
pub enum ResponseKind {
    /// `yes`, `no` or not applicable.
    YesNoNa,
    /// Decimal measurement, optionally with a display unit (`V`, `A`, `PSI`).
    Numeric {
        #[serde(default)]
        unit: Option<String>,
    },
    /// Free text.
    Text,
    /// Exactly one of an ordered list of options.
    MultipleChoice { options: Vec<String> },
}

impl ResponseKind {
    pub fn numeric(unit: impl Into<String>) -> Self {
        Self::Numeric {
            unit: Some(unit.into()),
        }
    }

    pub fn multiple_choice<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MultipleChoice {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn response_type(&self) -> ResponseType {
        match self {
            Self::YesNoNa => ResponseType::YesNoNa,
            Self::Numeric { .. } => ResponseType::Numeric,
            Self::Text => ResponseType::Text,
            Self::MultipleChoice { .. } => ResponseType::MultipleChoice,
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            Self::Numeric { unit } => unit.as_deref(),
            _ => None,
        }
    }

    pub fn options(&self) -> &[String] {
        match self {
            Self::MultipleChoice { options } => options,
            _ => &[],
        }
    }

    /// Checks the definition itself (used on item writes).
    pub fn validate_definition(&self) -> Result<(), ValidationError> {
        let Self::MultipleChoice { options } = self else {
            return Ok(());
        };
        if options.is_empty() {
            return Err(ValidationError::invalid(
                "options",
                "multiple_choice items need at least one option",
            ));
        }
        let mut seen = HashSet::new();
        for option in options {
            if option.trim().is_empty() {
                return Err(ValidationError::invalid("options", "options must not be blank"));
            }
            if !seen.insert(option.as_str()) {
                return Err(ValidationError::invalid(
                    "options",
                    format!("duplicate option `{option}`"),
                ));
            }
        }
        Ok(())
    }

    /// Checks one raw answer against this kind.
    ///
    /// Blank answers are only accepted for items that are not required.
    pub fn validate_value(&self, value: &str, required: bool) -> Result<(), ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return if required {
                Err(ValidationError::MissingField("response_value"))
            } else {
                Ok(())
            };
        }

        match self {
            Self::YesNoNa => {
                let lowered = trimmed.to_ascii_lowercase();
                if YES_NO_NA_ANSWERS.contains(&lowered.as_str()) {
                    Ok(())
                } else {
                    Err(ValidationError::invalid(
                        "response_value",
                        "expected one of yes|no|na",
                    ))
                }
            }
            Self::Numeric { .. } => match trimmed.replace(',', ".").parse::<f64>() {
                Ok(number) if number.is_finite() => Ok(()),
                _ => Err(ValidationError::invalid(
                    "response_value",
                    "expected a decimal number",
                )),
            },
            Self::Text => Ok(()),
            // Unreadable stored options leave nothing to check against.
            Self::MultipleChoice { options } if options.is_empty() => Ok(()),
            Self::MultipleChoice { options } => {
                if options.iter().any(|option| option == trimmed) {
                    Ok(())
                } else {
                    Err(ValidationError::invalid(
                        "response_value",
                        format!("expected one of {}", options.join("|")),
                    ))
                }
            }
        }
    }

    /// Encodes the `options` column (JSON array text).
    pub(crate) fn options_column(&self) -> Result<Option<String>, serde_json::Error> {
        match self {
            Self::MultipleChoice { options } => serde_json::to_string(options).map(Some),
            _ => Ok(None),
        }
    }

    /// Rebuilds a kind from stored columns.
    pub(crate) fn from_columns(
        response_type: ResponseType,
        options: Vec<String>,
        unit: Option<String>,
    ) -> Self {
        match response_type {
            ResponseType::YesNoNa => Self::YesNoNa,
            ResponseType::Numeric => Self::Numeric {
                unit: unit.filter(|value| !value.trim().is_empty()),
            },
            ResponseType::Text => Self::Text,
            ResponseType::MultipleChoice => Self::MultipleChoice { options },
        }
    }

    fn normalized(self) -> Self {
        match self {
            Self::Numeric { unit } => Self::Numeric {
                unit: normalize_optional(unit.as_deref()).map(str::to_string),
            },
            other => other,
        }
    }
}

/// Parses a stored `options` column into an ordered list.
pub(crate) fn parse_options_column(raw: Option<&str>) -> Result<Vec<String>, serde_json::Error> {
    match raw {
        Some(text) if !text.trim().is_empty() => serde_json::from_str(text),
        _ => Ok(Vec::new()),
    }
}

/// Stored checklist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    pub maintenance_type_id: MaintenanceTypeId,
    pub description: String,
    pub item_order: i64,
    #[serde(flatten)]
    pub kind: ResponseKind,
    pub required: bool,
    pub created_at: String,
}

fn default_required() -> bool {
    true
}

/// Checklist item embedded in a maintenance type create/update.
///
/// Position in the supplied list becomes `item_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItemDraft {
    pub description: String,
    #[serde(flatten)]
    pub kind: ResponseKind,
    #[serde(default = "default_required")]
    pub required: bool,
}

impl ChecklistItemDraft {
    pub fn new(description: impl Into<String>, kind: ResponseKind) -> Self {
        Self {
            description: description.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("description", &self.description)?;
        self.kind.validate_definition()
    }

    pub(crate) fn into_record(
        self,
        id: ChecklistItemId,
        maintenance_type_id: MaintenanceTypeId,
        item_order: i64,
        created_at: String,
    ) -> ChecklistItem {
        ChecklistItem {
            id,
            maintenance_type_id,
            description: self.description,
            item_order,
            kind: self.kind.normalized(),
            required: self.required,
            created_at,
        }
    }
}

/// Standalone checklist item create/update input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItemInput {
    pub maintenance_type_id: MaintenanceTypeId,
    pub item_order: i64,
    #[serde(flatten)]
    pub draft: ChecklistItemDraft,
}

impl ChecklistItemInput {
    pub fn new(
        maintenance_type_id: MaintenanceTypeId,
        item_order: i64,
        draft: ChecklistItemDraft,
    ) -> Self {
        Self {
            maintenance_type_id,
            item_order,
            draft,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.item_order < 1 {
            return Err(ValidationError::invalid(
                "item_order",
                "item order is 1-based",
            ));
        }
        self.draft.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_options_column, ChecklistItemDraft, ResponseKind, ResponseType};
    use crate::model::ValidationError;

    #[test]
    fn yes_no_na_accepts_known_answers_case_insensitively() {
        let kind = ResponseKind::YesNoNa;
        for answer in ["yes", "NO", " na ", "N/A"] {
            assert!(kind.validate_value(answer, true).is_ok(), "{answer}");
        }
        assert!(kind.validate_value("maybe", true).is_err());
    }

    #[test]
    fn numeric_accepts_comma_decimals_and_rejects_text() {
        let kind = ResponseKind::numeric("V");
        assert!(kind.validate_value("220", true).is_ok());
        assert!(kind.validate_value("12,5", true).is_ok());
        assert!(kind.validate_value("-3.75", true).is_ok());
        assert!(kind.validate_value("twelve", true).is_err());
        assert!(kind.validate_value("inf", true).is_err());
    }

    #[test]
    fn multiple_choice_requires_listed_option() {
        let kind = ResponseKind::multiple_choice(["OK", "NOK"]);
        assert!(kind.validate_value("NOK", true).is_ok());
        assert!(kind.validate_value("ok", true).is_err());

        let unreadable = ResponseKind::MultipleChoice {
            options: Vec::new(),
        };
        assert!(unreadable.validate_value("anything", true).is_ok());
    }

    #[test]
    fn blank_answer_only_allowed_for_optional_items() {
        let kind = ResponseKind::Text;
        assert_eq!(
            kind.validate_value("  ", true).unwrap_err(),
            ValidationError::MissingField("response_value")
        );
        assert!(kind.validate_value("", false).is_ok());
    }

    #[test]
    fn multiple_choice_definition_needs_unique_options() {
        let empty = ChecklistItemDraft::new("Pump in use", ResponseKind::multiple_choice(Vec::<String>::new()));
        assert!(empty.validate().is_err());

        let duplicated =
            ChecklistItemDraft::new("Pump in use", ResponseKind::multiple_choice(["A", "A"]));
        assert!(duplicated.validate().is_err());

        let valid = ChecklistItemDraft::new("Pump in use", ResponseKind::multiple_choice(["A", "B"]));
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn options_column_parses_json_and_treats_null_as_empty() {
        assert_eq!(
            parse_options_column(Some(r#"["OK","NOK"]"#)).unwrap(),
            vec!["OK".to_string(), "NOK".to_string()]
        );
        assert!(parse_options_column(None).unwrap().is_empty());
        assert!(parse_options_column(Some("not json")).is_err());
    }

    #[test]
    fn kind_serializes_with_response_type_tag() {
        let value = serde_json::to_value(ResponseKind::numeric("A")).unwrap();
        assert_eq!(value["response_type"], "numeric");
        assert_eq!(value["unit"], "A");
        assert_eq!(ResponseType::parse("multiple_choice"), Some(ResponseType::MultipleChoice));
        assert_eq!(ResponseType::parse("boolean"), None);
    }
}
