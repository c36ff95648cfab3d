//! Feature normalizer
//!
//! Maps raw form input onto the exact feature record a trained pipeline
//! expects:
//! - Coerces numeric strings and numbers to the schema's numeric type
//! - Rejects categorical values that were not seen during training
//! - Enforces physical ranges (no negative mileage, condition 1..=10, ...)
//! - Emits fields in training order
//!
//! Validation failures abort the request before the model is touched.

mod record;

pub use record::{CarFeatureRecord, FeatureValue, RawInput, RawValue};

use crate::error::{PricingError, Result};
use crate::schema::{FeatureSchema, FieldKind, FieldSpec};
use std::sync::Arc;
use tracing::debug;

/// Normalizer bound to one feature schema
#[derive(Debug, Clone)]
pub struct Normalizer {
    schema: Arc<FeatureSchema>,
}

impl Normalizer {
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Validate raw input against the bound schema
    pub fn normalize(&self, raw: &RawInput) -> Result<CarFeatureRecord> {
        normalize(raw, &self.schema)
    }
}

/// Convert raw input into a record in the schema's field order
pub fn normalize(raw: &RawInput, schema: &FeatureSchema) -> Result<CarFeatureRecord> {
    for name in raw.keys() {
        if schema.field(name).is_none() {
            debug!(field = %name, schema_version = %schema.version, "Ignoring field unknown to schema");
        }
    }

    let mut fields = Vec::with_capacity(schema.fields.len());
    for spec in &schema.fields {
        let value = match raw.get(&spec.name) {
            None | Some(RawValue::Null) => {
                return Err(PricingError::MissingField(spec.name.clone()));
            }
            Some(value) => coerce(spec, value)?,
        };
        fields.push((spec.name.clone(), value));
    }

    Ok(CarFeatureRecord::new(schema.version.clone(), fields))
}

fn coerce(spec: &FieldSpec, value: &RawValue) -> Result<FeatureValue> {
    match &spec.kind {
        FieldKind::Categorical { levels } => {
            let text = expect_text(spec, value)?;
            if levels.iter().any(|level| level == text) {
                Ok(FeatureValue::Category(text.to_string()))
            } else {
                Err(PricingError::UnknownCategory {
                    field: spec.name.clone(),
                    value: text.to_string(),
                })
            }
        }
        FieldKind::Text => {
            let text = expect_text(spec, value)?;
            Ok(FeatureValue::Category(text.to_string()))
        }
        FieldKind::Integer { min, max } => {
            let v = coerce_integer(spec, value)?;
            if v < *min || v > *max {
                return Err(out_of_range(spec, v as f64, *min as f64, *max as f64));
            }
            Ok(FeatureValue::Integer(v))
        }
        FieldKind::Float { min, max } => {
            let v = coerce_float(spec, value)?;
            if v < *min || v > *max {
                return Err(out_of_range(spec, v, *min, *max));
            }
            Ok(FeatureValue::Float(v))
        }
        FieldKind::Flag => coerce_flag(spec, value).map(FeatureValue::Flag),
    }
}

fn expect_text<'a>(spec: &FieldSpec, value: &'a RawValue) -> Result<&'a str> {
    match value {
        RawValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Err(PricingError::MissingField(spec.name.clone()))
            } else {
                Ok(trimmed)
            }
        }
        other => Err(type_mismatch(spec, other)),
    }
}

fn coerce_integer(spec: &FieldSpec, value: &RawValue) -> Result<i64> {
    match value {
        RawValue::Int(v) => Ok(*v),
        RawValue::Float(v) => whole_number(*v).ok_or_else(|| type_mismatch(spec, value)),
        RawValue::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
                .ok_or_else(|| type_mismatch(spec, value))
        }
        _ => Err(type_mismatch(spec, value)),
    }
}

fn whole_number(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

fn coerce_float(spec: &FieldSpec, value: &RawValue) -> Result<f64> {
    let v = match value {
        RawValue::Int(v) => *v as f64,
        RawValue::Float(v) => *v,
        RawValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| type_mismatch(spec, value))?,
        _ => return Err(type_mismatch(spec, value)),
    };

    if v.is_finite() {
        Ok(v)
    } else {
        Err(type_mismatch(spec, value))
    }
}

fn coerce_flag(spec: &FieldSpec, value: &RawValue) -> Result<bool> {
    match value {
        RawValue::Bool(v) => Ok(*v),
        RawValue::Int(0) => Ok(false),
        RawValue::Int(1) => Ok(true),
        RawValue::Float(v) if *v == 0.0 => Ok(false),
        RawValue::Float(v) if *v == 1.0 => Ok(true),
        RawValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "0" | "no" | "false" => Ok(false),
            "1" | "yes" | "true" => Ok(true),
            _ => Err(type_mismatch(spec, value)),
        },
        _ => Err(type_mismatch(spec, value)),
    }
}

fn type_mismatch(spec: &FieldSpec, value: &RawValue) -> PricingError {
    PricingError::TypeMismatch {
        field: spec.name.clone(),
        expected: spec.kind.type_name().to_string(),
        actual: format!("{} {}", value.type_name(), value),
    }
}

fn out_of_range(spec: &FieldSpec, value: f64, min: f64, max: f64) -> PricingError {
    PricingError::OutOfRange {
        field: spec.name.clone(),
        value,
        min,
        max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corolla() -> RawInput {
        let mut raw = RawInput::new();
        raw.insert("Brand".into(), "Toyota".into());
        raw.insert("Model".into(), "Corolla".into());
        raw.insert("Fuel_Type".into(), "Petrol".into());
        raw.insert("Transmission".into(), "Automatic".into());
        raw.insert("Car_Age".into(), 5i64.into());
        raw.insert("Mileage".into(), 50_000i64.into());
        raw.insert("Engine_Size".into(), 1.8f64.into());
        raw.insert("Fuel_Efficiency".into(), 15.0f64.into());
        raw.insert("Previous_Owners".into(), 1i64.into());
        raw.insert("Demand_Trend".into(), 3i64.into());
        raw.insert("Accident_History".into(), 0i64.into());
        raw.insert("Car_Condition_Score".into(), 8.5f64.into());
        raw.insert("Service_History".into(), 1i64.into());
        raw
    }

    #[test]
    fn test_normalize_valid_record_in_schema_order() {
        let schema = FeatureSchema::car_default();
        let record = normalize(&corolla(), &schema).unwrap();

        let names: Vec<&str> = record.names().collect();
        assert_eq!(names, schema.field_names());
        assert_eq!(record.schema_version(), "car-price/v1");
        assert_eq!(record.get("Car_Age"), Some(&FeatureValue::Integer(5)));
        assert_eq!(record.get("Engine_Size"), Some(&FeatureValue::Float(1.8)));
        assert_eq!(record.get("Accident_History"), Some(&FeatureValue::Flag(false)));
        assert_eq!(record.get("Service_History"), Some(&FeatureValue::Flag(true)));
    }

    #[test]
    fn test_unknown_brand_rejected() {
        let mut raw = corolla();
        raw.insert("Brand".into(), "Lamborghini".into());
        let err = normalize(&raw, &FeatureSchema::car_default()).unwrap_err();
        assert!(matches!(err, PricingError::UnknownCategory { ref field, .. } if field == "Brand"));
    }

    #[test]
    fn test_missing_and_null_fields() {
        let schema = FeatureSchema::car_default();

        let mut raw = corolla();
        raw.remove("Mileage");
        assert!(matches!(
            normalize(&raw, &schema),
            Err(PricingError::MissingField(ref f)) if f == "Mileage"
        ));

        let mut raw = corolla();
        raw.insert("Mileage".into(), RawValue::Null);
        assert!(matches!(normalize(&raw, &schema), Err(PricingError::MissingField(_))));
    }

    #[test]
    fn test_negative_mileage_out_of_range() {
        let mut raw = corolla();
        raw.insert("Mileage".into(), (-10i64).into());
        let err = normalize(&raw, &FeatureSchema::car_default()).unwrap_err();
        assert!(matches!(err, PricingError::OutOfRange { ref field, .. } if field == "Mileage"));
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let mut raw = corolla();
        raw.insert("Car_Age".into(), " 7 ".into());
        raw.insert("Engine_Size".into(), "2.0".into());
        raw.insert("Mileage".into(), 42_000.0f64.into());
        raw.insert("Service_History".into(), "No".into());

        let record = normalize(&raw, &FeatureSchema::car_default()).unwrap();
        assert_eq!(record.get("Car_Age"), Some(&FeatureValue::Integer(7)));
        assert_eq!(record.get("Engine_Size"), Some(&FeatureValue::Float(2.0)));
        assert_eq!(record.get("Mileage"), Some(&FeatureValue::Integer(42_000)));
        assert_eq!(record.get("Service_History"), Some(&FeatureValue::Flag(false)));
    }

    #[test]
    fn test_mistyped_values_rejected() {
        let schema = FeatureSchema::car_default();

        let mut raw = corolla();
        raw.insert("Car_Age".into(), 5.5f64.into());
        assert!(matches!(normalize(&raw, &schema), Err(PricingError::TypeMismatch { .. })));

        let mut raw = corolla();
        raw.insert("Accident_History".into(), 2i64.into());
        assert!(matches!(normalize(&raw, &schema), Err(PricingError::TypeMismatch { .. })));

        let mut raw = corolla();
        raw.insert("Brand".into(), 7i64.into());
        assert!(matches!(normalize(&raw, &schema), Err(PricingError::TypeMismatch { .. })));

        let mut raw = corolla();
        raw.insert("Fuel_Efficiency".into(), "fast".into());
        assert!(matches!(normalize(&raw, &schema), Err(PricingError::TypeMismatch { .. })));
    }

    #[test]
    fn test_category_whitespace_is_trimmed() {
        let mut raw = corolla();
        raw.insert("Brand".into(), "  Toyota ".into());
        let record = normalize(&raw, &FeatureSchema::car_default()).unwrap();
        assert_eq!(record.get("Brand").unwrap().as_str(), Some("Toyota"));
    }

    #[test]
    fn test_free_text_model_accepts_any_value() {
        let mut schema = FeatureSchema::car_default();
        schema.fields[1] = FieldSpec::text("Model");

        let mut raw = corolla();
        raw.insert("Model".into(), "Land Cruiser".into());
        let record = Normalizer::new(Arc::new(schema)).normalize(&raw).unwrap();
        assert_eq!(record.get("Model").unwrap().as_str(), Some("Land Cruiser"));
    }

    #[test]
    fn test_unknown_extra_fields_ignored() {
        let mut raw = corolla();
        raw.insert("Colour".into(), "Red".into());
        let record = normalize(&raw, &FeatureSchema::car_default()).unwrap();
        assert!(record.get("Colour").is_none());
        assert_eq!(record.len(), 13);
    }
}
