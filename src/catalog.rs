//! Product catalog: known product names read from a spreadsheet.
//!
//! The catalog sheet has a header row and the product name in its second
//! column. Names are handed to the remote extractor so the model can map
//! free-form item text onto catalog entries.

use crate::error::RecognizeError;
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::info;

/// Read product names from the first worksheet of `path`.
///
/// Skips the header row and empty cells. Accepts any format calamine opens
/// (`.xlsx`, `.xlsm`, `.xls`, `.ods`).
pub fn load_product_names(path: &Path) -> Result<Vec<String>, RecognizeError> {
    let catalog_err = |detail: String| RecognizeError::Catalog {
        path: path.to_path_buf(),
        detail,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| catalog_err(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| catalog_err("workbook has no worksheets".into()))?
        .map_err(|e| catalog_err(e.to_string()))?;

    let names = names_from_rows(range.rows());
    info!("Loaded {} product names from {}", names.len(), path.display());
    Ok(names)
}

/// Second-column values of every row after the first.
pub fn names_from_rows<'a, I>(rows: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [Data]>,
{
    rows.into_iter()
        .skip(1)
        .filter_map(|row| row.get(1))
        .filter_map(|cell| match cell {
            Data::Empty => None,
            other => {
                let text = other.to_string();
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
        })
        .collect()
}
