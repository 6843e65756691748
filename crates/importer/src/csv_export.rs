use std::io::Write;

use csv::{Terminator, WriterBuilder};
use storage::models::Athlete;

use crate::Result;

pub const EXPORT_HEADERS: [&str; 6] = [
    "full_name",
    "birth_date",
    "phone_number",
    "ranking_points",
    "club",
    "created_at",
];

pub fn export_filename(resource: &str) -> String {
    format!("{}_export.csv", resource)
}

fn export_row(athlete: &Athlete) -> [String; 6] {
    [
        athlete.full_name.clone(),
        athlete.birth_date.format("%Y-%m-%d").to_string(),
        athlete.phone_number.clone(),
        athlete.ranking_points.to_string(),
        athlete.club.clone().unwrap_or_default(),
        athlete.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]
}

/// Encodes athletes as CSV one chunk per record.
///
/// The header is emitted together with the first record, so an empty input
/// produces no output at all.
pub struct CsvExport<I> {
    athletes: I,
    builder: WriterBuilder,
    header_written: bool,
}

impl<I> CsvExport<I>
where
    I: Iterator<Item = Athlete>,
{
    pub fn new(athletes: impl IntoIterator<Item = Athlete, IntoIter = I>) -> Self {
        Self {
            athletes: athletes.into_iter(),
            builder: crlf_builder(),
            header_written: false,
        }
    }

    /// Writes every chunk to `out`, returning the number of records written.
    pub fn write_to<W: Write>(self, mut out: W) -> Result<usize> {
        let mut records = 0;
        for chunk in self {
            out.write_all(&chunk?)?;
            records += 1;
        }
        out.flush()?;
        Ok(records)
    }

    fn encode(&mut self, athlete: &Athlete) -> Result<Vec<u8>> {
        let mut writer = self.builder.from_writer(Vec::new());
        if !self.header_written {
            writer.write_record(EXPORT_HEADERS)?;
            self.header_written = true;
        }
        writer.write_record(export_row(athlete))?;

        let chunk = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(chunk)
    }
}

fn crlf_builder() -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder.terminator(Terminator::CRLF);
    builder
}

impl<I> Iterator for CsvExport<I>
where
    I: Iterator<Item = Athlete>,
{
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let athlete = self.athletes.next()?;
        Some(self.encode(&athlete))
    }
}
