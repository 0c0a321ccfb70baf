//! Survey CSV reader with header-driven column selection.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::domain::{FeatureOrder, LABEL_COLUMN, SurveyDataset};
use crate::IoError;

/// Reads a labelled health survey from CSV.
///
/// Expected CSV format:
/// - Header row required; columns are located by name, so extra columns and
///   any column order are accepted
/// - Every feature in the [`FeatureOrder`] plus `Diagnosis` must be present
/// - Feature cells are finite numbers, `Diagnosis` is `0` or `1`
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::DataAccess`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record (including ragged rows) |
/// | [`IoError::MissingColumn`] | A selected feature or the label is absent from the header |
/// | [`IoError::InvalidValue`] | Feature cell is NaN, Inf, or unparseable |
/// | [`IoError::InvalidLabel`] | Label cell is not 0 or 1 |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
pub struct SurveyReader {
    path: PathBuf,
    feature_order: FeatureOrder,
}

impl SurveyReader {
    /// Create a reader selecting the default seven survey features.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            feature_order: FeatureOrder::selected(),
        }
    }

    #[must_use]
    pub fn with_feature_order(mut self, feature_order: FeatureOrder) -> Self {
        self.feature_order = feature_order;
        self
    }

    /// Read and validate the CSV file, returning a [`SurveyDataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<SurveyDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::DataAccess {
            path: self.path.clone(),
            source: e,
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let locate = |column: &str| {
            header
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| IoError::MissingColumn {
                    path: self.path.clone(),
                    column: column.to_owned(),
                })
        };
        let feature_cols = self
            .feature_order
            .iter()
            .map(locate)
            .collect::<Result<Vec<_>, _>>()?;
        let label_col = locate(LABEL_COLUMN)?;
        debug!(header_len = header.len(), ?feature_cols, label_col, "columns located");

        let mut features = Vec::new();
        let mut labels = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;

            let mut row = Vec::with_capacity(feature_cols.len());
            for (name, &col) in self.feature_order.iter().zip(&feature_cols) {
                let raw = record.get(col).unwrap_or("");
                match raw.parse::<f64>() {
                    Ok(v) if v.is_finite() => row.push(v),
                    _ => {
                        return Err(IoError::InvalidValue {
                            path: self.path.clone(),
                            row_index,
                            column: name.to_owned(),
                            raw: raw.to_owned(),
                        });
                    }
                }
            }

            let raw = record.get(label_col).unwrap_or("");
            let label = match raw.parse::<f64>() {
                Ok(v) if v == 0.0 => 0,
                Ok(v) if v == 1.0 => 1,
                _ => {
                    return Err(IoError::InvalidLabel {
                        path: self.path.clone(),
                        row_index,
                        raw: raw.to_owned(),
                    });
                }
            };

            features.push(row);
            labels.push(label);
        }

        if labels.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_samples = labels.len(),
            n_features = feature_cols.len(),
            "survey dataset loaded"
        );
        Ok(SurveyDataset::new(self.feature_order.clone(), features, labels))
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "PatientID,Age,Gender,PollutionExposure,PollenExposure,SleepQuality,\
                          PhysicalActivity,DustExposure,DietQuality,Diagnosis";

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn selects_features_in_model_order() {
        let csv = format!("{HEADER}\n5034,63,0,7.3,5.1,6.2,3.0,1.5,8.9,1\n5035,26,1,2.1,0.4,9.0,7.7,4.4,5.0,0\n");
        let f = write_csv(&csv);
        let ds = SurveyReader::new(f.path()).read().unwrap();
        assert_eq!(ds.n_samples(), 2);
        assert_eq!(ds.n_features(), 7);
        assert_eq!(ds.features()[0], vec![63.0, 7.3, 5.1, 6.2, 3.0, 1.5, 8.9]);
        assert_eq!(ds.labels(), &[1, 0]);
    }

    #[test]
    fn column_order_in_file_does_not_matter() {
        let csv = "Diagnosis,DietQuality,DustExposure,PhysicalActivity,SleepQuality,PollenExposure,PollutionExposure,Age\n\
                   0,8,4,5,7,6,6,25\n";
        let f = write_csv(csv);
        let ds = SurveyReader::new(f.path()).read().unwrap();
        assert_eq!(ds.features()[0], vec![25.0, 6.0, 6.0, 7.0, 5.0, 4.0, 8.0]);
    }

    #[test]
    fn custom_feature_order() {
        let csv = "a,b,Diagnosis\n1,2,1\n";
        let f = write_csv(csv);
        let order = FeatureOrder::new(vec!["b".into(), "a".into()]).unwrap();
        let ds = SurveyReader::new(f.path()).with_feature_order(order).read().unwrap();
        assert_eq!(ds.features()[0], vec![2.0, 1.0]);
    }

    #[test]
    fn error_file_not_found() {
        let result = SurveyReader::new(Path::new("/nonexistent/asthma.csv")).read();
        assert!(matches!(result, Err(IoError::DataAccess { .. })));
    }

    #[test]
    fn error_missing_column() {
        let csv = "Age,PollutionExposure,Diagnosis\n25,6,0\n";
        let f = write_csv(csv);
        let result = SurveyReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(IoError::MissingColumn { column, .. }) if column == "PollenExposure"
        ));
    }

    #[test]
    fn error_missing_label_column() {
        let csv = "a\n1\n";
        let f = write_csv(csv);
        let order = FeatureOrder::new(vec!["a".into()]).unwrap();
        let result = SurveyReader::new(f.path()).with_feature_order(order).read();
        assert!(matches!(
            result,
            Err(IoError::MissingColumn { column, .. }) if column == "Diagnosis"
        ));
    }

    #[test]
    fn error_empty_dataset() {
        let f = write_csv(&format!("{HEADER}\n"));
        let result = SurveyReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::EmptyDataset { .. })));
    }

    #[test]
    fn error_invalid_value() {
        let csv = format!("{HEADER}\n1,25,0,6,NaN,7,5,4,8,0\n");
        let f = write_csv(&csv);
        let result = SurveyReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(IoError::InvalidValue { row_index: 0, column, .. }) if column == "PollenExposure"
        ));
    }

    #[test]
    fn error_invalid_label() {
        let csv = format!("{HEADER}\n1,25,0,6,6,7,5,4,8,0\n2,25,0,6,6,7,5,4,8,2\n");
        let f = write_csv(&csv);
        let result = SurveyReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::InvalidLabel { row_index: 1, .. })));
    }

    #[test]
    fn error_ragged_row() {
        let csv = format!("{HEADER}\n1,25,0,6,6,7\n");
        let f = write_csv(&csv);
        let result = SurveyReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::CsvParse { .. })));
    }
}
