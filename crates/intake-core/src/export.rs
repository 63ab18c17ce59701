//! Spreadsheet Exporter: field set -> single-sheet XLSX report

use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;

pub const REPORT_FILE_NAME: &str = "Contract_Report.xlsx";
pub const REPORT_MIME: &str = "application/octet-stream";
pub const SHEET_NAME: &str = "Contract Data";

/// Generated report ready to be offered for download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportBlob {
    pub file_name: String,
    pub mime: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SpreadsheetExporter {
    file_name: String,
}

impl SpreadsheetExporter {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// Write one header row of names and one row of values
    pub fn export(&self, rows: &[(String, String)]) -> Result<ExportBlob> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col, (name, value)) in rows.iter().enumerate() {
            let col = u16::try_from(col).map_err(|_| {
                rust_xlsxwriter::XlsxError::ParameterError(format!(
                    "too many fields for one sheet: {}",
                    rows.len()
                ))
            })?;
            worksheet.write_string_with_format(0, col, name, &header)?;
            worksheet.write_string(1, col, value)?;
        }

        let bytes = workbook.save_to_buffer()?;
        debug!(fields = rows.len(), bytes = bytes.len(), "report generated");

        Ok(ExportBlob {
            file_name: self.file_name.clone(),
            mime: REPORT_MIME,
            bytes,
        })
    }
}

impl Default for SpreadsheetExporter {
    fn default() -> Self {
        Self::new(REPORT_FILE_NAME)
    }
}
