//! Report sinks: where assembled rows end up
//!
//! Every sink is append-only and order-preserving. The assembler only sees the
//! [`RowSink`] trait; turning a sink into bytes or text is up to the caller.

use std::io::Write;

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::{Deserialize, Serialize};

use crate::error::FigrepError;
use crate::types::OutputRow;

/// UTF-8 byte-order mark, lets spreadsheet apps detect the encoding
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Field separator for delimited output; ';' avoids clashing with decimal commas
pub const DEFAULT_DELIMITER: char = ';';

/// Sheet name used for workbook output
pub const DEFAULT_SHEET_NAME: &str = "Comments";

/// Append-only destination for report rows
pub trait RowSink {
    fn write_header(&mut self, labels: &[String]) -> Result<(), FigrepError>;
    fn write_row(&mut self, row: &[String]) -> Result<(), FigrepError>;
}

/// Artifact format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Xlsx => "xlsx",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "text/csv; charset=utf-8",
            ReportFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

/// Rows kept in memory
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RowBuffer {
    pub header: Option<Vec<String>>,
    pub rows: Vec<OutputRow>,
}

impl RowSink for RowBuffer {
    fn write_header(&mut self, labels: &[String]) -> Result<(), FigrepError> {
        if self.header.is_some() {
            return Err(FigrepError::Internal("header written twice".to_string()));
        }
        self.header = Some(labels.to_vec());
        Ok(())
    }

    fn write_row(&mut self, row: &[String]) -> Result<(), FigrepError> {
        self.rows.push(row.to_vec());
        Ok(())
    }
}

/// Delimited text streamed to any writer, BOM first
pub struct DelimitedWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> DelimitedWriter<W> {
    /// Write the BOM and prepare a writer using `delimiter` as field separator
    pub fn new(mut writer: W, delimiter: char) -> Result<Self, FigrepError> {
        if !delimiter.is_ascii() {
            return Err(FigrepError::InvalidArgs(format!(
                "delimiter must be a single ASCII character, got {:?}",
                delimiter
            )));
        }
        writer.write_all(UTF8_BOM)?;
        let inner = csv::WriterBuilder::new()
            .delimiter(delimiter as u8)
            .flexible(false)
            .from_writer(writer);
        Ok(Self { inner })
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W, FigrepError> {
        self.inner
            .into_inner()
            .map_err(|e| FigrepError::Io(e.into_error()))
    }
}

impl<W: Write> RowSink for DelimitedWriter<W> {
    fn write_header(&mut self, labels: &[String]) -> Result<(), FigrepError> {
        self.inner.write_record(labels)?;
        Ok(())
    }

    fn write_row(&mut self, row: &[String]) -> Result<(), FigrepError> {
        self.inner.write_record(row)?;
        Ok(())
    }
}

/// Single-sheet XLSX workbook built in memory
pub struct WorkbookWriter {
    worksheet: Worksheet,
    header_format: Format,
    next_row: u32,
}

impl WorkbookWriter {
    pub fn new(sheet_name: &str) -> Result<Self, FigrepError> {
        let mut worksheet = Worksheet::new();
        worksheet.set_name(sheet_name)?;
        Ok(Self {
            worksheet,
            header_format: Format::new().set_bold(),
            next_row: 0,
        })
    }

    fn write_cells(&mut self, values: &[String], bold: bool) -> Result<(), FigrepError> {
        for (col, value) in values.iter().enumerate() {
            let col = u16::try_from(col)
                .map_err(|_| FigrepError::Export(format!("too many columns: {}", values.len())))?;
            if bold {
                self.worksheet
                    .write_string_with_format(self.next_row, col, value, &self.header_format)?;
            } else {
                self.worksheet.write_string(self.next_row, col, value)?;
            }
        }
        self.next_row += 1;
        Ok(())
    }

    /// Serialize the workbook to XLSX bytes
    pub fn finish(self) -> Result<Vec<u8>, FigrepError> {
        let mut workbook = Workbook::new();
        workbook.push_worksheet(self.worksheet);
        Ok(workbook.save_to_buffer()?)
    }
}

impl RowSink for WorkbookWriter {
    fn write_header(&mut self, labels: &[String]) -> Result<(), FigrepError> {
        self.write_cells(labels, true)
    }

    fn write_row(&mut self, row: &[String]) -> Result<(), FigrepError> {
        self.write_cells(row, false)
    }
}

/// Terminal preview rendered with comfy-table
pub struct TableWriter {
    table: Table,
}

impl TableWriter {
    pub fn new() -> Self {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        Self { table }
    }

    pub fn render(&self) -> String {
        self.table.to_string()
    }
}

impl Default for TableWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl RowSink for TableWriter {
    fn write_header(&mut self, labels: &[String]) -> Result<(), FigrepError> {
        self.table.set_header(labels);
        Ok(())
    }

    fn write_row(&mut self, row: &[String]) -> Result<(), FigrepError> {
        self.table.add_row(row);
        Ok(())
    }
}

/// Sink producing a finished artifact in the configured format
pub enum ArtifactWriter {
    Delimited(DelimitedWriter<Vec<u8>>),
    Workbook(WorkbookWriter),
}

impl ArtifactWriter {
    pub fn new(format: ReportFormat, delimiter: char, sheet_name: &str) -> Result<Self, FigrepError> {
        match format {
            ReportFormat::Csv => Ok(ArtifactWriter::Delimited(DelimitedWriter::new(Vec::new(), delimiter)?)),
            ReportFormat::Xlsx => Ok(ArtifactWriter::Workbook(WorkbookWriter::new(sheet_name)?)),
        }
    }

    /// Artifact bytes, ready to write to disk or attach to a mail
    pub fn finish(self) -> Result<Vec<u8>, FigrepError> {
        match self {
            ArtifactWriter::Delimited(writer) => writer.into_inner(),
            ArtifactWriter::Workbook(writer) => writer.finish(),
        }
    }
}

impl RowSink for ArtifactWriter {
    fn write_header(&mut self, labels: &[String]) -> Result<(), FigrepError> {
        match self {
            ArtifactWriter::Delimited(w) => w.write_header(labels),
            ArtifactWriter::Workbook(w) => w.write_header(labels),
        }
    }

    fn write_row(&mut self, row: &[String]) -> Result<(), FigrepError> {
        match self {
            ArtifactWriter::Delimited(w) => w.write_row(row),
            ArtifactWriter::Workbook(w) => w.write_row(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_delimited_output_has_bom_and_semicolons() {
        let mut writer = DelimitedWriter::new(Vec::new(), DEFAULT_DELIMITER).unwrap();
        writer.write_header(&strings(&["File", "Comment"])).unwrap();
        writer.write_row(&strings(&["App", "1,5 px off; fix"])).unwrap();
        let bytes = writer.into_inner().unwrap();

        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text, "File;Comment\nApp;\"1,5 px off; fix\"\n");
    }

    #[test]
    fn test_delimited_rejects_non_ascii_delimiter() {
        assert!(DelimitedWriter::new(Vec::new(), '→').is_err());
    }

    #[test]
    fn test_header_only_artifact() {
        let mut writer = ArtifactWriter::new(ReportFormat::Csv, ',', DEFAULT_SHEET_NAME).unwrap();
        writer.write_header(&strings(&["A", "B"])).unwrap();
        let bytes = writer.finish().unwrap();
        assert_eq!(&bytes[UTF8_BOM.len()..], b"A,B\n");
    }

    #[test]
    fn test_workbook_serializes_zip() {
        let mut writer = ArtifactWriter::new(ReportFormat::Xlsx, ';', "Report").unwrap();
        writer.write_header(&strings(&["A"])).unwrap();
        writer.write_row(&strings(&["value"])).unwrap();
        let bytes = writer.finish().unwrap();
        // XLSX is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_workbook_rejects_bad_sheet_name() {
        assert!(WorkbookWriter::new("bad/name").is_err());
    }

    #[test]
    fn test_row_buffer_single_header() {
        let mut buffer = RowBuffer::default();
        buffer.write_header(&strings(&["A"])).unwrap();
        assert!(buffer.write_header(&strings(&["A"])).is_err());
        buffer.write_row(&strings(&["1"])).unwrap();
        assert_eq!(buffer.rows, vec![strings(&["1"])]);
    }

    #[test]
    fn test_table_preview_contains_cells() {
        let mut table = TableWriter::new();
        table.write_header(&strings(&["Author", "Status"])).unwrap();
        table.write_row(&strings(&["ann", "open"])).unwrap();
        let rendered = table.render();
        assert!(rendered.contains("Author"));
        assert!(rendered.contains("open"));
    }
}
