use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown document type: {0} (expected NDA, SOW or MSA)")]
    UnknownDocumentType(String),

    #[error("Only PDF files are allowed: {0}")]
    NotPdf(String),

    #[error("Failed to parse PDF: {0}")]
    PdfParse(String),

    #[error("Report is not ready for download")]
    DownloadNotReady,

    #[error("Failed to generate report: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, IntakeError>;
