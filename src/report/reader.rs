//! Reading back a fit-results table.

use crate::error::{McorrError, Result};
use std::io::Read;

use super::record::FitRecord;
use super::writer::NA;

/// Read a table written by [`super::write_fit_results`].
///
/// Columns are matched by header name, so the pair columns are optional;
/// `NA` cells become `None`.
pub fn read_fit_results<R: Read>(reader: R) -> Result<Vec<FitRecord>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    if headers.get(0) != Some("group") {
        return Err(McorrError::InvalidInput(
            "fit results must start with a 'group' column".to_string(),
        ));
    }

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        let mut record = FitRecord {
            group: row.get(0).unwrap_or_default().to_string(),
            ..FitRecord::default()
        };
        for (column, cell) in headers.iter().zip(row.iter()).skip(1) {
            let value = if cell == NA {
                None
            } else {
                Some(cell.parse::<f64>().map_err(|_| {
                    McorrError::InvalidInput(format!(
                        "line {}: {} '{}' is not a number",
                        line, column, cell
                    ))
                })?)
            };
            if !record.set(column, value) {
                return Err(McorrError::InvalidInput(format!(
                    "unknown fit results column '{}'",
                    column
                )));
            }
        }
        records.push(record);
    }

    Ok(records)
}
