//! CSV curve reader with full input validation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use mica_curve::Curve;
use tracing::{debug, info, instrument};

use crate::domain::Dataset;
use crate::IoError;

/// Reads curves from a CSV file.
///
/// Expected CSV format:
/// - Header row required (first column is the curve name, remaining are sample positions)
/// - `name,y0,y1,...,yn`
/// - One row per curve; rows may be shorter than the header, and trailing
///   empty cells are ignored, so curves of different lengths can share a file
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::MissingName`] | Name cell is empty |
/// | [`IoError::MissingValue`] | Empty cell followed by further values |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
/// | [`IoError::TooFewValues`] | Row has fewer than two values |
/// | [`IoError::DuplicateName`] | Same name appears twice |
pub struct CurveReader {
    path: PathBuf,
}

impl CurveReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets rows differ in length; curves need not share a sample count.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.parse_error(e))?;
        debug!(columns = header.len(), "read CSV header");

        let mut curves = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.parse_error(e))?;

            let name = record.get(0).unwrap_or("").to_string();
            if name.is_empty() {
                return Err(IoError::MissingName {
                    path: self.path.clone(),
                    row_index,
                });
            }
            if let Some(&first_row) = seen.get(&name) {
                return Err(IoError::DuplicateName {
                    path: self.path.clone(),
                    name,
                    first_row,
                    second_row: row_index,
                });
            }
            seen.insert(name.clone(), row_index);

            let cells: Vec<&str> = record.iter().skip(1).collect();
            let used = cells.iter().rposition(|c| !c.is_empty()).map_or(0, |p| p + 1);
            let mut values = Vec::with_capacity(used);
            for (col_index, &raw) in cells[..used].iter().enumerate() {
                if raw.is_empty() {
                    return Err(IoError::MissingValue {
                        path: self.path.clone(),
                        row_index,
                        col_index,
                    });
                }
                let value: f64 = raw
                    .parse()
                    .ok()
                    .filter(|v: &f64| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        col_index,
                        raw: raw.to_string(),
                    })?;
                values.push(value);
            }

            if values.len() < 2 {
                return Err(IoError::TooFewValues {
                    path: self.path.clone(),
                    name,
                    got: values.len(),
                });
            }
            let curve = Curve::new(name.clone(), values).map_err(|e| IoError::InvalidCurve {
                path: self.path.clone(),
                name,
                source: e,
            })?;
            curves.push(curve);
        }

        if curves.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_curves = curves.len(),
            max_len = curves.iter().map(Curve::len).max().unwrap_or(0),
            "dataset loaded"
        );

        Ok(Dataset { curves })
    }

    fn parse_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
