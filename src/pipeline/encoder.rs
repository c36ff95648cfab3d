//! Column encoder: one-hot categorical columns, numeric passthrough

use crate::error::{PricingError, Result};
use crate::normalizer::CarFeatureRecord;
use crate::schema::{FeatureSchema, FieldKind};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A categorical input column and the levels it was fitted on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub levels: Vec<String>,
}

/// A numeric input column, optionally standardized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

impl NumericColumn {
    pub fn passthrough(name: &str) -> Self {
        Self { name: name.to_string(), mean: None, scale: None }
    }

    fn apply(&self, value: f64) -> f64 {
        let centered = value - self.mean.unwrap_or(0.0);
        match self.scale {
            Some(scale) if scale != 0.0 => centered / scale,
            _ => centered,
        }
    }
}

/// Fitted preprocessing step.
///
/// Output layout is every one-hot block in column order followed by the
/// numeric columns, so feature `i` of the model is `feature_names_out()[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    pub categorical: Vec<CategoricalColumn>,
    pub numeric: Vec<NumericColumn>,
}

impl FeatureEncoder {
    /// Encoder whose categories are the schema's levels and whose numeric
    /// columns pass through unscaled
    pub fn from_schema(schema: &FeatureSchema) -> Result<Self> {
        let mut categorical = Vec::new();
        for field in schema.categorical_fields() {
            match &field.kind {
                FieldKind::Categorical { levels } => categorical.push(CategoricalColumn {
                    name: field.name.clone(),
                    levels: levels.clone(),
                }),
                _ => {
                    return Err(PricingError::ConfigError(format!(
                        "free-text field '{}' needs explicit encoder levels",
                        field.name
                    )))
                }
            }
        }

        let numeric = schema
            .numeric_fields()
            .map(|f| NumericColumn::passthrough(&f.name))
            .collect();

        Ok(Self { categorical, numeric })
    }

    /// Width of the transformed feature vector
    pub fn n_features_out(&self) -> usize {
        self.categorical.iter().map(|c| c.levels.len()).sum::<usize>() + self.numeric.len()
    }

    /// Names of the transformed features, `<column>_<level>` for one-hot blocks
    pub fn feature_names_out(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_features_out());
        for column in &self.categorical {
            for level in &column.levels {
                names.push(format!("{}_{}", column.name, level));
            }
        }
        names.extend(self.numeric.iter().map(|c| c.name.clone()));
        names
    }

    /// Output names of the one-hot blocks of `fields`, in output order
    pub fn one_hot_names(&self, fields: &[String]) -> Vec<String> {
        self.categorical
            .iter()
            .filter(|column| fields.contains(&column.name))
            .flat_map(|column| {
                column
                    .levels
                    .iter()
                    .map(move |level| format!("{}_{}", column.name, level))
            })
            .collect()
    }

    /// Encode one record. Unknown categories are an error, never a zero row.
    pub fn transform(&self, record: &CarFeatureRecord) -> Result<Array1<f64>> {
        let mut out = Array1::zeros(self.n_features_out());
        let mut offset = 0;

        for column in &self.categorical {
            let value = record
                .get(&column.name)
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    PricingError::InferenceError(format!(
                        "record has no categorical value for encoder column '{}'",
                        column.name
                    ))
                })?;

            let idx = column
                .levels
                .iter()
                .position(|level| level == value)
                .ok_or_else(|| {
                    PricingError::InferenceError(format!(
                        "encoder found unknown category '{}' in column '{}'",
                        value, column.name
                    ))
                })?;

            out[offset + idx] = 1.0;
            offset += column.levels.len();
        }

        for column in &self.numeric {
            let value = record
                .get(&column.name)
                .and_then(|v| v.as_f64())
                .ok_or_else(|| {
                    PricingError::InferenceError(format!(
                        "record has no numeric value for encoder column '{}'",
                        column.name
                    ))
                })?;
            out[offset] = column.apply(value);
            offset += 1;
        }

        Ok(out)
    }

    /// Check that every record the schema accepts can be encoded
    pub fn check_schema(&self, schema: &FeatureSchema) -> Result<()> {
        for column in &self.categorical {
            let field = schema.field(&column.name).ok_or_else(|| {
                PricingError::ArtifactError(format!(
                    "encoder column '{}' is not in schema {}",
                    column.name, schema.version
                ))
            })?;

            match &field.kind {
                FieldKind::Categorical { levels } => {
                    if let Some(level) = levels.iter().find(|l| !column.levels.contains(l)) {
                        return Err(PricingError::ArtifactError(format!(
                            "schema level '{}' of '{}' was never seen by the encoder",
                            level, column.name
                        )));
                    }
                }
                FieldKind::Text => {}
                other => {
                    return Err(PricingError::ArtifactError(format!(
                        "encoder treats '{}' as categorical but schema declares {}",
                        column.name,
                        other.type_name()
                    )))
                }
            }
        }

        for column in &self.numeric {
            match schema.field(&column.name).map(|f| &f.kind) {
                Some(kind) if !kind.is_categorical() => {}
                Some(kind) => {
                    return Err(PricingError::ArtifactError(format!(
                        "encoder treats '{}' as numeric but schema declares {}",
                        column.name,
                        kind.type_name()
                    )))
                }
                None => {
                    return Err(PricingError::ArtifactError(format!(
                        "encoder column '{}' is not in schema {}",
                        column.name, schema.version
                    )))
                }
            }
        }

        Ok(())
    }
}
