//! Categorical level discovery from training data

use crate::error::{PricingError, Result};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Read a training CSV and collect the sorted distinct levels of each column
pub fn levels_from_csv(
    path: impl AsRef<Path>,
    columns: &[&str],
) -> Result<BTreeMap<String, Vec<String>>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .into_reader_with_file_handle(file)
        .finish()?;

    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "Loaded training data for level discovery"
    );

    levels_from_frame(&df, columns)
}

/// Collect sorted distinct non-null levels of the given columns.
///
/// Values are trimmed; empty strings are dropped.
pub fn levels_from_frame(
    df: &DataFrame,
    columns: &[&str],
) -> Result<BTreeMap<String, Vec<String>>> {
    let mut result = BTreeMap::new();

    for col_name in columns {
        let column = df
            .column(col_name)
            .map_err(|_| PricingError::DataError(format!("column '{}' not found", col_name)))?;
        let as_text = column.cast(&DataType::String)?;
        let ca = as_text.str()?;

        let levels: BTreeSet<String> = ca
            .into_iter()
            .flatten()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();

        if levels.is_empty() {
            return Err(PricingError::DataError(format!(
                "column '{}' has no non-null values",
                col_name
            )));
        }

        result.insert(col_name.to_string(), levels.into_iter().collect());
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_levels_sorted_and_unique() {
        let df = DataFrame::new(vec![
            Series::new("Brand".into(), &["Toyota", "BMW", "Toyota", "Audi"]).into(),
            Series::new("Fuel_Type".into(), &["Petrol", "Diesel", "Petrol", "Petrol"]).into(),
        ])
        .unwrap();

        let levels = levels_from_frame(&df, &["Brand", "Fuel_Type"]).unwrap();
        assert_eq!(levels["Brand"], vec!["Audi", "BMW", "Toyota"]);
        assert_eq!(levels["Fuel_Type"], vec!["Diesel", "Petrol"]);
    }

    #[test]
    fn test_missing_column() {
        let df = DataFrame::new(vec![Series::new("Brand".into(), &["Kia"]).into()]).unwrap();
        let err = levels_from_frame(&df, &["Model"]).unwrap_err();
        assert!(matches!(err, PricingError::DataError(_)));
    }

    #[test]
    fn test_levels_from_csv_skips_nulls() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Brand,Model,Price").unwrap();
        writeln!(file, "Honda,Civic,500000").unwrap();
        writeln!(file, "Ford,,300000").unwrap();
        writeln!(file, "Honda,City,450000").unwrap();
        file.flush().unwrap();

        let levels = levels_from_csv(file.path(), &["Brand", "Model"]).unwrap();
        assert_eq!(levels["Brand"], vec!["Ford", "Honda"]);
        assert_eq!(levels["Model"], vec!["City", "Civic"]);
    }
}
