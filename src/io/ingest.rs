//! Tabular ingest.
//!
//! This module turns an uploaded two-column table into a clean `Dataset`:
//!
//! - the first row holds the column names
//! - the first two columns are x and y, whatever they are called
//! - rows with a missing x or y are dropped silently
//! - rows with a value that is not a finite number are dropped and reported as
//!   `RowError`s
//!
//! Columns after the second are never read, so a gap there does not drop the row.
//! Only the x and y cells decide whether a row is kept.
//!
//! The decoder is chosen from the declared content type (file extension). The one
//! exception is `.txt`, whose delimiter (tab or comma) is taken from the header line.
//! No fitting logic lives here.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use crate::domain::{ColumnLabels, Dataset, RowError, SampleSet};
use crate::error::AppError;

/// Declared format of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Csv,
    Tsv,
    /// `.txt`: comma or tab separated, decided by the header line.
    Text,
    /// `.xls` / `.xlsx` (and `.xlsm`, `.ods`): first worksheet.
    Spreadsheet,
}

impl ContentType {
    /// Resolve the content type from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(ContentType::Csv),
            "tsv" | "tab" => Some(ContentType::Tsv),
            "txt" => Some(ContentType::Text),
            "xls" | "xlsx" | "xlsm" | "ods" => Some(ContentType::Spreadsheet),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ContentType::Csv => "CSV",
            ContentType::Tsv => "TSV",
            ContentType::Text => "text",
            ContentType::Spreadsheet => "spreadsheet",
        }
    }
}

/// Decodes one content type into a `Dataset`.
pub trait TableDecoder {
    fn content_type(&self) -> ContentType;

    fn decode(&self, input: &mut dyn Read) -> Result<Dataset, AppError>;
}

/// Delimiter-separated text (CSV, TSV, or sniffed `.txt`).
#[derive(Debug, Clone, Copy)]
pub struct DelimitedDecoder {
    content_type: ContentType,
    /// `None`: pick tab or comma from the header line.
    delimiter: Option<u8>,
}

impl DelimitedDecoder {
    pub fn csv() -> Self {
        Self {
            content_type: ContentType::Csv,
            delimiter: Some(b','),
        }
    }

    pub fn tsv() -> Self {
        Self {
            content_type: ContentType::Tsv,
            delimiter: Some(b'\t'),
        }
    }

    pub fn sniffed() -> Self {
        Self {
            content_type: ContentType::Text,
            delimiter: None,
        }
    }
}

impl TableDecoder for DelimitedDecoder {
    fn content_type(&self) -> ContentType {
        self.content_type
    }

    fn decode(&self, input: &mut dyn Read) -> Result<Dataset, AppError> {
        let mut bytes = Vec::new();
        input
            .read_to_end(&mut bytes)
            .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;
        let delimiter = self.delimiter.unwrap_or_else(|| sniff_delimiter(&bytes));

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes.as_slice());

        let headers = reader
            .headers()
            .map_err(|e| AppError::new(2, format!("Failed to read header row: {e}")))?
            .clone();

        let (Some(x_name), Some(y_name)) = (headers.get(0), headers.get(1)) else {
            return Err(too_few_columns(headers.len()));
        };
        let labels = ColumnLabels::new(x_name, y_name);
        let mut columns = Columns::default();

        for (idx, result) in reader.records().enumerate() {
            // +2 because:
            // - records() starts at line 1 after headers
            // - line numbers are 1-based
            let line = idx + 2;

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    columns.reject(line, format!("parse error: {e}"));
                    continue;
                }
            };

            let x = text_value(record.get(0).unwrap_or(""), &labels.x);
            let y = text_value(record.get(1).unwrap_or(""), &labels.y);
            columns.push(line, x, y);
        }

        Ok(columns.into_dataset(labels))
    }
}

/// First worksheet of an Excel or OpenDocument workbook.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetDecoder;

impl TableDecoder for SpreadsheetDecoder {
    fn content_type(&self) -> ContentType {
        ContentType::Spreadsheet
    }

    fn decode(&self, input: &mut dyn Read) -> Result<Dataset, AppError> {
        let mut bytes = Vec::new();
        input
            .read_to_end(&mut bytes)
            .map_err(|e| AppError::new(2, format!("Failed to read workbook: {e}")))?;

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| AppError::new(2, format!("Failed to open workbook: {e}")))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::new(2, "Workbook has no worksheets."))?
            .map_err(|e| AppError::new(2, format!("Failed to read the first worksheet: {e}")))?;

        // Sheet row of the header, so line numbers match what a spreadsheet shows.
        let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
        let mut rows = range.rows();

        let header = rows.next().unwrap_or(&[]);
        let (Some(x_name), Some(y_name)) = (header.first(), header.get(1)) else {
            return Err(too_few_columns(header.len()));
        };
        let labels = ColumnLabels::new(x_name.to_string().trim(), y_name.to_string().trim());
        let mut columns = Columns::default();

        for (idx, row) in rows.enumerate() {
            let line = first_row + idx + 2;
            let x = cell_value(row.first().unwrap_or(&Data::Empty), &labels.x);
            let y = cell_value(row.get(1).unwrap_or(&Data::Empty), &labels.y);
            columns.push(line, x, y);
        }

        Ok(columns.into_dataset(labels))
    }
}

/// Pick a decoder for a declared content type.
pub fn decoder_for(content_type: ContentType) -> Box<dyn TableDecoder> {
    match content_type {
        ContentType::Csv => Box::new(DelimitedDecoder::csv()),
        ContentType::Tsv => Box::new(DelimitedDecoder::tsv()),
        ContentType::Text => Box::new(DelimitedDecoder::sniffed()),
        ContentType::Spreadsheet => Box::new(SpreadsheetDecoder),
    }
}

/// Open, decode and return the dataset at `path`.
pub fn load_dataset(path: &Path) -> Result<Dataset, AppError> {
    let content_type = ContentType::from_path(path).ok_or_else(|| {
        AppError::new(
            2,
            format!(
                "Unrecognised file type for '{}' (expected .csv, .tsv, .txt, .xls or .xlsx).",
                path.display()
            ),
        )
    })?;
    let decoder = decoder_for(content_type);

    let mut file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open '{}': {e}", path.display())))?;

    decoder.decode(&mut file).map_err(|e| {
        AppError::new(
            e.exit_code(),
            format!("'{}' ({}): {e}", path.display(), content_type.display_name()),
        )
    })
}

/// Accepted samples plus the bookkeeping shared by every decoder.
#[derive(Debug, Default)]
struct Columns {
    x: Vec<f64>,
    y: Vec<f64>,
    rows_read: usize,
    row_errors: Vec<RowError>,
}

impl Columns {
    /// Record one data row. `Ok(None)` marks a missing cell.
    fn push(&mut self, line: usize, x: Result<Option<f64>, String>, y: Result<Option<f64>, String>) {
        self.rows_read += 1;
        match (x, y) {
            (Ok(None), _) | (_, Ok(None)) => {}
            (Ok(Some(vx)), Ok(Some(vy))) => {
                self.x.push(vx);
                self.y.push(vy);
            }
            (Err(message), _) | (_, Err(message)) => {
                self.row_errors.push(RowError { line, message });
            }
        }
    }

    fn reject(&mut self, line: usize, message: String) {
        self.rows_read += 1;
        self.row_errors.push(RowError { line, message });
    }

    fn into_dataset(self, labels: ColumnLabels) -> Dataset {
        Dataset {
            labels,
            samples: SampleSet::new(self.x, self.y),
            rows_read: self.rows_read,
            row_errors: self.row_errors,
        }
    }
}

fn too_few_columns(found: usize) -> AppError {
    AppError::new(
        2,
        format!("Expected at least two columns in the header row, found {found}."),
    )
}

/// Tab if the header line has one, comma otherwise.
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes.split(|&b| b == b'\n').next().unwrap_or(&[]);
    if header.contains(&b'\t') { b'\t' } else { b',' }
}

/// Cells treated as missing values rather than malformed numbers.
fn is_missing(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "" | "na" | "n/a" | "#n/a" | "nan" | "null" | "none"
    )
}

fn text_value(raw: &str, column: &str) -> Result<Option<f64>, String> {
    if is_missing(raw) {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Err(format!("{column} value '{raw}' is not finite")),
        Err(_) => Err(format!("{column} value '{raw}' is not a number")),
    }
}

fn cell_value(cell: &Data, column: &str) -> Result<Option<f64>, String> {
    match cell {
        Data::Empty => Ok(None),
        Data::Float(v) if v.is_finite() => Ok(Some(*v)),
        Data::Float(v) => Err(format!("{column} value '{v}' is not finite")),
        Data::Int(v) => Ok(Some(*v as f64)),
        Data::String(s) => text_value(s.trim(), column),
        other => Err(format!("{column} value '{other}' is not a number")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn decode_csv(text: &str) -> Dataset {
        DelimitedDecoder::csv().decode(&mut text.as_bytes()).unwrap()
    }

    #[test]
    fn decodes_first_two_columns_with_names() {
        let ds = decode_csv("Time (s),Power (W),note\n1,10,a\n2,20,b\n3.5,-4e1,c\n");
        assert_eq!(ds.labels, ColumnLabels::new("Time (s)", "Power (W)"));
        assert_eq!(ds.samples.x, vec![1.0, 2.0, 3.5]);
        assert_eq!(ds.samples.y, vec![10.0, 20.0, -40.0]);
        assert_eq!(ds.rows_read, 3);
        assert!(ds.row_errors.is_empty());
    }

    #[test]
    fn drops_missing_rows_silently() {
        let ds = decode_csv("x,y\n1,2\n,3\n4,\n5,NaN\n6\n7,8\n");
        assert_eq!(ds.samples.x, vec![1.0, 7.0]);
        assert_eq!(ds.samples.y, vec![2.0, 8.0]);
        assert_eq!(ds.rows_read, 6);
        assert!(ds.row_errors.is_empty());
    }

    #[test]
    fn reports_non_numeric_rows() {
        let ds = decode_csv("x,y\n1,2\nabc,3\n4,inf\n5,6\n");
        assert_eq!(ds.samples.len(), 2);
        assert_eq!(ds.row_errors.len(), 2);
        assert_eq!(ds.row_errors[0].line, 3);
        assert!(ds.row_errors[0].message.contains("'abc' is not a number"));
        assert_eq!(ds.row_errors[1].line, 4);
        assert!(ds.row_errors[1].message.contains("not finite"));
    }

    #[test]
    fn tsv_uses_tabs() {
        let ds = DelimitedDecoder::tsv()
            .decode(&mut "a\tb\n1\t2\n3\t4\n".as_bytes())
            .unwrap();
        assert_eq!(ds.labels, ColumnLabels::new("a", "b"));
        assert_eq!(ds.samples.y, vec![2.0, 4.0]);
    }

    #[test]
    fn single_column_header_is_rejected() {
        let err = DelimitedDecoder::csv()
            .decode(&mut "only\n1\n2\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn gaps_in_extra_columns_keep_the_row() {
        let ds = decode_csv("x,y,note\n1,2,\n3,4,warm-up\n5,6\n");
        assert_eq!(ds.samples.x, vec![1.0, 3.0, 5.0]);
        assert!(ds.row_errors.is_empty());
    }

    #[test]
    fn txt_delimiter_comes_from_the_header() {
        let comma = DelimitedDecoder::sniffed()
            .decode(&mut "x,y\n1,1\n2,4\n".as_bytes())
            .unwrap();
        assert_eq!(comma.labels, ColumnLabels::new("x", "y"));
        assert_eq!(comma.samples.y, vec![1.0, 4.0]);

        let tab = DelimitedDecoder::sniffed()
            .decode(&mut "t\tsignal, mV\n1\t2\n".as_bytes())
            .unwrap();
        assert_eq!(tab.labels, ColumnLabels::new("t", "signal, mV"));
        assert_eq!(tab.samples.x, vec![1.0]);
    }

    #[test]
    fn content_type_from_extension() {
        let ct = |p: &str| ContentType::from_path(&PathBuf::from(p));
        assert_eq!(ct("data.CSV"), Some(ContentType::Csv));
        assert_eq!(ct("data.tsv"), Some(ContentType::Tsv));
        assert_eq!(ct("data.txt"), Some(ContentType::Text));
        assert_eq!(ct("book.xlsx"), Some(ContentType::Spreadsheet));
        assert_eq!(ct("book.xls"), Some(ContentType::Spreadsheet));
        assert_eq!(ct("notes.md"), None);
        assert_eq!(ct("noext"), None);
    }

    #[test]
    fn every_content_type_has_a_decoder() {
        for ct in [
            ContentType::Csv,
            ContentType::Tsv,
            ContentType::Text,
            ContentType::Spreadsheet,
        ] {
            assert_eq!(decoder_for(ct).content_type(), ct);
        }
    }

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
    }

    #[test]
    fn decodes_first_worksheet_of_a_workbook() {
        // Header, ten numeric rows, a row with an empty y, a text x, and a row of
        // numbers stored as text.
        let ds = load_dataset(&fixture("ramp.xlsx")).unwrap();
        assert_eq!(ds.labels, ColumnLabels::new("load (W)", "lactate"));
        assert_eq!(ds.rows_read, 13);
        assert_eq!(ds.samples.len(), 11);
        assert_eq!(&ds.samples.x[..3], &[1.0, 2.0, 3.0]);
        assert_eq!(ds.samples.x[10], 12.0);
        assert_eq!(ds.samples.y[10], 40.0);

        assert_eq!(ds.row_errors.len(), 1);
        assert_eq!(ds.row_errors[0].line, 13);
        assert!(ds.row_errors[0].message.contains("'abc' is not a number"));
    }

    #[test]
    fn corrupt_workbook_is_a_decode_error() {
        let err = SpreadsheetDecoder
            .decode(&mut "not a workbook".as_bytes())
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
