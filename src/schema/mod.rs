//! Feature schema module
//!
//! The schema is the input contract of a trained pipeline:
//! - Field names in the exact order used at training time
//! - Field kinds (categorical, free text, integer, float, flag)
//! - Legal categorical levels observed during training
//! - Sane physical ranges for numeric fields
//!
//! A schema is versioned and shipped inside the model artifact, so the
//! normalizer and the explainer never hard-code a deployment variant.

mod levels;

pub use levels::{levels_from_csv, levels_from_frame};

use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::warn;

/// Fields that are known proxies of the prediction target
pub const LEAKAGE_PROXIES: &[&str] = &["Resale_Value"];

/// Kind of a schema field and its constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// One of a finite set of training levels
    Categorical { levels: Vec<String> },
    /// Free text, checked only by the encoder
    Text,
    /// Whole number in an inclusive range
    Integer { min: i64, max: i64 },
    /// Real number in an inclusive range
    Float { min: f64, max: f64 },
    /// Boolean encoded as 0/1
    Flag,
}

impl FieldKind {
    /// Human readable type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Categorical { .. } => "category",
            FieldKind::Text => "text",
            FieldKind::Integer { .. } => "integer",
            FieldKind::Float { .. } => "float",
            FieldKind::Flag => "flag (0/1)",
        }
    }

    /// Whether the field is fed to the model as a string column
    pub fn is_categorical(&self) -> bool {
        matches!(self, FieldKind::Categorical { .. } | FieldKind::Text)
    }
}

/// A single named field of the schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn categorical(name: &str, levels: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Categorical {
                levels: levels.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    pub fn text(name: &str) -> Self {
        Self { name: name.to_string(), kind: FieldKind::Text }
    }

    pub fn integer(name: &str, min: i64, max: i64) -> Self {
        Self { name: name.to_string(), kind: FieldKind::Integer { min, max } }
    }

    pub fn float(name: &str, min: f64, max: f64) -> Self {
        Self { name: name.to_string(), kind: FieldKind::Float { min, max } }
    }

    pub fn flag(name: &str) -> Self {
        Self { name: name.to_string(), kind: FieldKind::Flag }
    }
}

fn default_target() -> String {
    "Price".to_string()
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_identity_fields() -> Vec<String> {
    vec!["Brand".to_string(), "Model".to_string()]
}

/// Versioned input contract of a trained pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Schema version, bumped whenever fields or levels change
    pub version: String,
    /// Name of the column the model was trained to predict
    #[serde(default = "default_target")]
    pub target: String,
    /// ISO currency code of the predicted amount
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Fields in training order
    pub fields: Vec<FieldSpec>,
    /// Categorical fields whose one-hot columns form the identity view
    #[serde(default = "default_identity_fields")]
    pub identity_fields: Vec<String>,
}

impl FeatureSchema {
    /// Create a schema from fields in training order
    pub fn new(version: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            version: version.into(),
            target: default_target(),
            currency: default_currency(),
            fields,
            identity_fields: default_identity_fields(),
        }
    }

    /// The form fields and widget ranges of the car price application.
    ///
    /// Engine size is in liters. Resale value is not part of this schema.
    pub fn car_default() -> Self {
        Self::new(
            "car-price/v1",
            vec![
                FieldSpec::categorical(
                    "Brand",
                    &["Audi", "BMW", "Ford", "Honda", "Hyundai", "Mercedes", "Toyota"],
                ),
                FieldSpec::categorical(
                    "Model",
                    &["A4", "Civic", "Corolla", "Creta", "Fiesta", "X5", "C-Class"],
                ),
                FieldSpec::integer("Car_Age", 0, 30),
                FieldSpec::integer("Mileage", 0, 300_000),
                FieldSpec::float("Engine_Size", 0.5, 8.0),
                FieldSpec::categorical("Fuel_Type", &["Diesel", "Petrol"]),
                FieldSpec::categorical("Transmission", &["Automatic", "Manual"]),
                FieldSpec::float("Fuel_Efficiency", 5.0, 35.0),
                FieldSpec::integer("Previous_Owners", 0, 10),
                FieldSpec::integer("Demand_Trend", 1, 5),
                FieldSpec::flag("Accident_History"),
                FieldSpec::float("Car_Condition_Score", 1.0, 10.0),
                FieldSpec::flag("Service_History"),
            ],
        )
    }

    /// Load a schema from a JSON file and validate it
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let schema: Self = serde_json::from_str(&text)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Save the schema as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Check internal consistency of the schema
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(PricingError::ConfigError(format!(
                "schema {} has no fields",
                self.version
            )));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(PricingError::ConfigError(format!(
                    "duplicate field '{}' in schema {}",
                    field.name, self.version
                )));
            }
            if field.name == self.target {
                return Err(PricingError::ConfigError(format!(
                    "field '{}' is the prediction target and cannot be an input",
                    field.name
                )));
            }

            match &field.kind {
                FieldKind::Categorical { levels } => {
                    if levels.is_empty() {
                        return Err(PricingError::ConfigError(format!(
                            "categorical field '{}' has no levels",
                            field.name
                        )));
                    }
                    let unique: HashSet<&String> = levels.iter().collect();
                    if unique.len() != levels.len() {
                        return Err(PricingError::ConfigError(format!(
                            "categorical field '{}' has duplicate levels",
                            field.name
                        )));
                    }
                }
                FieldKind::Integer { min, max } if min > max => {
                    return Err(PricingError::ConfigError(format!(
                        "field '{}' has min {} > max {}",
                        field.name, min, max
                    )));
                }
                FieldKind::Float { min, max } if !(min <= max) => {
                    return Err(PricingError::ConfigError(format!(
                        "field '{}' has invalid range {}..={}",
                        field.name, min, max
                    )));
                }
                _ => {}
            }
        }

        for name in &self.identity_fields {
            match self.field(name) {
                Some(field) if field.kind.is_categorical() => {}
                Some(_) => {
                    return Err(PricingError::ConfigError(format!(
                        "identity field '{}' is not categorical",
                        name
                    )))
                }
                None => {
                    return Err(PricingError::ConfigError(format!(
                        "identity field '{}' is not in the schema",
                        name
                    )))
                }
            }
        }

        for suspect in self.leakage_suspects() {
            warn!(
                field = %suspect,
                target = %self.target,
                schema_version = %self.version,
                "Schema uses a likely proxy of the prediction target as an input"
            );
        }

        Ok(())
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in training order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Fields encoded as strings (categorical or free text), in training order
    pub fn categorical_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.kind.is_categorical())
    }

    /// Numeric and flag fields, in training order
    pub fn numeric_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| !f.kind.is_categorical())
    }

    /// Legal levels of a categorical field
    pub fn levels(&self, name: &str) -> Option<&[String]> {
        match self.field(name).map(|f| &f.kind) {
            Some(FieldKind::Categorical { levels }) => Some(levels),
            _ => None,
        }
    }

    /// Dropdown options: every constrained categorical field and its levels
    pub fn options(&self) -> BTreeMap<String, Vec<String>> {
        self.fields
            .iter()
            .filter_map(|f| match &f.kind {
                FieldKind::Categorical { levels } => Some((f.name.clone(), levels.clone())),
                _ => None,
            })
            .collect()
    }

    /// Replace the levels of a categorical or free-text field
    pub fn set_levels(&mut self, name: &str, levels: Vec<String>) -> Result<()> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| PricingError::ConfigError(format!("unknown field '{}'", name)))?;

        if !field.kind.is_categorical() {
            return Err(PricingError::ConfigError(format!(
                "field '{}' is {}, not categorical",
                name,
                field.kind.type_name()
            )));
        }

        field.kind = FieldKind::Categorical { levels };
        Ok(())
    }

    /// Input fields that leak the prediction target
    pub fn leakage_suspects(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(|f| f.name.as_str())
            .filter(|name| LEAKAGE_PROXIES.contains(name))
            .collect()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::car_default()
    }
}
