pub mod csv_export;
pub mod csv_import;
pub mod error;

pub use csv_export::{CsvExport, EXPORT_HEADERS, export_filename};
pub use csv_import::{CsvImporter, CsvUpload, ImportSummary};
pub use error::{ImporterError, Result};
