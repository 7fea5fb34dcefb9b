use tabular::Table;

use crate::error::ApiError;
use crate::types::Summary;

pub const REQUIRED_COLUMNS: [&str; 5] = [
    "Equipment Name",
    "Type",
    "Flowrate",
    "Pressure",
    "Temperature",
];

/// Compute the upload summary. Fails without naming columns when any
/// required column is absent.
pub fn summarize(table: &Table) -> Result<Summary, ApiError> {
    if !table.has_columns(&REQUIRED_COLUMNS) {
        return Err(ApiError::MissingColumns);
    }

    let avg = |name: &str| -> Result<Option<f64>, ApiError> {
        let column = table.column(name).ok_or(ApiError::MissingColumns)?;
        Ok(column.mean()?.map(round2))
    };

    let types = table.column("Type").ok_or(ApiError::MissingColumns)?;
    let mut type_distribution = types.value_counts();
    // rows without a type still count toward the total
    let untyped = types.missing_count();
    if untyped > 0 {
        *type_distribution.entry(String::new()).or_insert(0) += untyped;
    }

    Ok(Summary {
        total_count: table.len() as u64,
        avg_flowrate: avg("Flowrate")?,
        avg_pressure: avg("Pressure")?,
        avg_temperature: avg("Temperature")?,
        type_distribution,
    })
}

/// Round half away from zero to 2 decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
