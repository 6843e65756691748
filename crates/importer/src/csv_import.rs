use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storage::{
    dto::athlete::{AthletePayload, FieldErrors, PointsError, parse_whole_number},
    error::StorageError,
    repository::AthleteStore,
};
use thiserror::Error;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::{ImporterError, Result};

const FULL_NAME: &str = "full_name";
const BIRTH_DATE: &str = "birth_date";
const PHONE_NUMBER: &str = "phone_number";
const RANKING_POINTS: &str = "ranking_points";
const CLUB: &str = "club";

/// Row 1 is the header, so the first data row is reported as row 2.
const FIRST_DATA_ROW: usize = 2;

/// An uploaded file as received from a client.
#[derive(Debug, Clone)]
pub struct CsvUpload {
    pub filename: String,
    pub content: Vec<u8>,
}

impl CsvUpload {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Checks the extension and decodes the body as UTF-8.
    pub fn decode(&self) -> Result<&str> {
        if !self.filename.ends_with(".csv") {
            return Err(ImporterError::NotCsv);
        }

        Ok(std::str::from_utf8(&self.content)?)
    }
}

/// Outcome of a batch import. Returned even when every row failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImportSummary {
    pub message: String,
    /// Names of the created athletes, in row order
    pub created_athletes: Vec<String>,
    /// One message per failed row, prefixed with `Row N:`
    pub errors: Vec<String>,
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
}

impl ImportSummary {
    fn new(created_athletes: Vec<String>, errors: Vec<String>, total_processed: usize) -> Self {
        Self {
            message: format!("Successfully imported {} athletes", created_athletes.len()),
            successful: created_athletes.len(),
            failed: errors.len(),
            created_athletes,
            errors,
            total_processed,
        }
    }
}

#[derive(Debug, Error)]
enum RowError {
    #[error("Invalid data - ranking_points must be an integer, got '{0}'")]
    InvalidPoints(String),

    #[error("{0} is required")]
    Required(&'static str),

    #[error("{0}")]
    Validation(FieldErrors),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Malformed(#[from] csv::Error),
}

/// Column positions resolved from the header row. When a name repeats, the
/// last column wins.
struct Columns {
    full_name: Option<usize>,
    birth_date: Option<usize>,
    phone_number: Option<usize>,
    ranking_points: Option<usize>,
    club: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Self {
        let position = |name: &str| {
            headers
                .iter()
                .enumerate()
                .filter(|(_, header)| *header == name)
                .map(|(index, _)| index)
                .last()
        };

        Self {
            full_name: position(FULL_NAME),
            birth_date: position(BIRTH_DATE),
            phone_number: position(PHONE_NUMBER),
            ranking_points: position(RANKING_POINTS),
            club: position(CLUB),
        }
    }
}

fn cell(record: &StringRecord, column: Option<usize>) -> &str {
    column.and_then(|index| record.get(index)).unwrap_or("")
}

/// Validates and stores athletes from a CSV upload, one row at a time.
///
/// Rows are independent: a failing row is reported and skipped, and rows
/// already stored stay stored.
pub struct CsvImporter<'a> {
    store: &'a dyn AthleteStore,
}

impl<'a> CsvImporter<'a> {
    pub fn new(store: &'a dyn AthleteStore) -> Self {
        Self { store }
    }

    /// Runs the file-level checks, then imports every row.
    pub async fn import(&self, upload: Option<CsvUpload>) -> Result<ImportSummary> {
        let upload = upload.ok_or(ImporterError::MissingFile)?;
        let text = upload.decode()?;

        info!(
            "Importing athletes from {} ({} bytes)",
            upload.filename,
            upload.content.len()
        );

        self.import_str(text).await
    }

    /// Imports already decoded CSV text.
    pub async fn import_str(&self, text: &str) -> Result<ImportSummary> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let columns = Columns::locate(reader.headers()?);

        let mut created = Vec::new();
        let mut errors = Vec::new();
        let mut total = 0;

        for (index, record) in reader.records().enumerate() {
            let row = index + FIRST_DATA_ROW;
            total += 1;

            let outcome = match record {
                Ok(record) => self.import_row(&columns, &record).await,
                Err(e) => Err(RowError::from(e)),
            };

            match outcome {
                Ok(full_name) => created.push(full_name),
                Err(e) => {
                    debug!("Row {} rejected: {}", row, e);
                    errors.push(format!("Row {}: {}", row, e));
                }
            }
        }

        let summary = ImportSummary::new(created, errors, total);
        info!(
            "Import finished: {} processed, {} created, {} failed",
            summary.total_processed, summary.successful, summary.failed
        );

        Ok(summary)
    }

    async fn import_row(
        &self,
        columns: &Columns,
        record: &StringRecord,
    ) -> std::result::Result<String, RowError> {
        let ranking_points = parse_points(cell(record, columns.ranking_points))?;

        let full_name = cell(record, columns.full_name).trim();
        let birth_date = cell(record, columns.birth_date).trim();
        let phone_number = cell(record, columns.phone_number).trim();
        let club = cell(record, columns.club).trim();

        // Only the first missing field is reported.
        for (field, value) in [
            (FULL_NAME, full_name),
            (BIRTH_DATE, birth_date),
            (PHONE_NUMBER, phone_number),
        ] {
            if value.is_empty() {
                return Err(RowError::Required(field));
            }
        }

        let payload = AthletePayload {
            full_name: Some(Value::from(full_name)),
            birth_date: Some(Value::from(birth_date)),
            phone_number: Some(Value::from(phone_number)),
            ranking_points: Some(ranking_points),
            club: Some(Value::from(club)),
        };

        let athlete = payload.validate_new().map_err(RowError::Validation)?;
        let created = self.store.create(&athlete).await?;

        Ok(created.full_name)
    }
}

/// Blank means 0. Integers outside the stored range are passed through so the
/// validator reports them as out of range.
fn parse_points(raw: &str) -> std::result::Result<Value, RowError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Value::from(0));
    }

    match parse_whole_number(raw) {
        Err(PointsError::Invalid) => Err(RowError::InvalidPoints(raw.to_string())),
        _ => Ok(Value::from(raw)),
    }
}
