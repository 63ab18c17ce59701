//! Upload Controller
//!
//! Tracks uploads to the extraction backend without doing any I/O itself: the browser app
//! sends the request with `fetch`, the CLI with `reqwest`, and both hand the response back
//! here. Every upload gets a generation number so a slow response from an earlier file can
//! never overwrite the fields of a later one.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{IntakeError, Result};
use crate::fields::{FieldStore, MergeReport};
use crate::records::{ErrorBody, UploadResponse};
use crate::schema::DocumentType;

/// Multipart field carrying the PDF bytes
pub const FILE_FIELD: &str = "file";
/// Multipart field carrying the document type tag
pub const TYPE_FIELD: &str = "pdfType";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// No response at all (connection refused, DNS, CORS, ...)
    #[error("Network error: {0}")]
    Network(String),

    #[error("Upload failed ({status}): {detail}")]
    Server { status: u16, detail: String },

    #[error("Unexpected response from extraction service: {0}")]
    MalformedResponse(String),
}

/// Handle for one upload, returned by [`UploadController::begin`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTicket {
    generation: u64,
    pub file_name: String,
    pub document_type: DocumentType,
}

impl UploadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Records were merged into the store
    Applied(MergeReport),
    /// The backend or the network failed; the store is untouched
    Failed(UploadError),
    /// A newer upload superseded this one; the response was discarded
    Stale,
}

/// True when `file_name` carries a `.pdf` extension (any case)
pub fn is_pdf_name(file_name: &str) -> bool {
    file_name.to_ascii_lowercase().ends_with(".pdf")
}

#[derive(Debug, Default)]
pub struct UploadController {
    generation: u64,
    in_flight: Option<u64>,
    download_ready: bool,
    last_report: Option<MergeReport>,
}

impl UploadController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an upload; any upload still in flight becomes stale and the previous report
    /// is no longer offered until this one succeeds
    pub fn begin(&mut self, file_name: &str, document_type: DocumentType) -> Result<UploadTicket> {
        if !is_pdf_name(file_name) {
            return Err(IntakeError::NotPdf(file_name.to_string()));
        }

        if let Some(previous) = self.in_flight {
            warn!(previous, "starting a new upload while another is in flight");
        }

        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.download_ready = false;
        info!(file_name, %document_type, generation = self.generation, "upload started");

        Ok(UploadTicket {
            generation: self.generation,
            file_name: file_name.to_string(),
            document_type,
        })
    }

    /// Turn a raw HTTP status and body into records or an [`UploadError`]
    pub fn interpret(status: u16, body: &str) -> std::result::Result<UploadResponse, UploadError> {
        if (200..300).contains(&status) {
            return serde_json::from_str(body)
                .map_err(|e| UploadError::MalformedResponse(e.to_string()));
        }

        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.text())
            .unwrap_or_else(|| format!("server responded with status {}", status));

        Err(UploadError::Server { status, detail })
    }

    /// Apply the result of the upload identified by `ticket`
    pub fn complete(
        &mut self,
        ticket: &UploadTicket,
        result: std::result::Result<UploadResponse, UploadError>,
        store: &mut FieldStore,
    ) -> UploadOutcome {
        if ticket.generation != self.generation {
            warn!(
                stale = ticket.generation,
                current = self.generation,
                file_name = %ticket.file_name,
                "discarding response from superseded upload"
            );
            return UploadOutcome::Stale;
        }

        self.in_flight = None;

        match result {
            Ok(response) => {
                let report = store.merge(&response.extracted_data);
                info!(
                    file_name = %ticket.file_name,
                    applied = report.applied.len(),
                    missing = report.missing.len(),
                    "upload processed"
                );
                self.download_ready = true;
                self.last_report = Some(report.clone());
                UploadOutcome::Applied(report)
            }
            Err(err) => {
                warn!(file_name = %ticket.file_name, error = %err, "upload failed");
                UploadOutcome::Failed(err)
            }
        }
    }

    /// Forget any upload in flight and clear the download flag
    pub fn reset(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.download_ready = false;
        self.last_report = None;
    }

    pub fn is_uploading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn download_ready(&self) -> bool {
        self.download_ready
    }

    pub fn last_report(&self) -> Option<&MergeReport> {
        self.last_report.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::ExtractedRecord;

    fn response(records: Vec<ExtractedRecord>) -> UploadResponse {
        UploadResponse {
            extracted_data: records,
        }
    }

    #[test]
    fn test_begin_rejects_non_pdf() {
        let mut controller = UploadController::new();
        assert!(matches!(
            controller.begin("contract.docx", DocumentType::Sow),
            Err(IntakeError::NotPdf(_))
        ));
        assert!(!controller.is_uploading());
        assert!(controller.begin("CONTRACT.PDF", DocumentType::Sow).is_ok());
    }

    #[test]
    fn test_complete_success_marks_download_ready() {
        let mut controller = UploadController::new();
        let mut store = FieldStore::for_document(DocumentType::Sow);
        let ticket = controller.begin("sow.pdf", DocumentType::Sow).unwrap();
        assert!(controller.is_uploading());

        let outcome = controller.complete(
            &ticket,
            Ok(response(vec![ExtractedRecord::new("sow_no", "123", 3)])),
            &mut store,
        );

        assert!(matches!(outcome, UploadOutcome::Applied(_)));
        assert!(controller.download_ready());
        assert!(!controller.is_uploading());
        assert_eq!(store.get("sow_no").unwrap().page, 3);
    }

    #[test]
    fn test_complete_failure_keeps_state() {
        let mut controller = UploadController::new();
        let mut store = FieldStore::for_document(DocumentType::Sow);
        let ticket = controller.begin("sow.pdf", DocumentType::Sow).unwrap();

        let outcome = controller.complete(
            &ticket,
            Err(UploadError::Network("connection refused".into())),
            &mut store,
        );

        assert!(matches!(outcome, UploadOutcome::Failed(UploadError::Network(_))));
        assert!(!controller.download_ready());
        assert_eq!(store, FieldStore::for_document(DocumentType::Sow));
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut controller = UploadController::new();
        let mut store = FieldStore::for_document(DocumentType::Sow);
        let first = controller.begin("first.pdf", DocumentType::Sow).unwrap();
        let second = controller.begin("second.pdf", DocumentType::Sow).unwrap();

        let outcome = controller.complete(
            &first,
            Ok(response(vec![ExtractedRecord::new("sow_no", "old", 1)])),
            &mut store,
        );
        assert_eq!(outcome, UploadOutcome::Stale);
        assert_eq!(store.get("sow_no").unwrap().value, "");
        assert!(controller.is_uploading());

        controller.complete(
            &second,
            Ok(response(vec![ExtractedRecord::new("sow_no", "new", 2)])),
            &mut store,
        );
        assert_eq!(store.get("sow_no").unwrap().value, "new");
    }

    #[test]
    fn test_reset_invalidates_in_flight_upload() {
        let mut controller = UploadController::new();
        let mut store = FieldStore::for_document(DocumentType::Sow);
        let ticket = controller.begin("sow.pdf", DocumentType::Sow).unwrap();
        controller.reset();
        let outcome = controller.complete(&ticket, Ok(response(vec![])), &mut store);
        assert_eq!(outcome, UploadOutcome::Stale);
        assert!(!controller.download_ready());
    }

    #[test]
    fn test_interpret_success() {
        let body = r#"{"extracted_data":[{"field":"sow_no","value":"123","page_num":"3"}]}"#;
        let parsed = UploadController::interpret(200, body).unwrap();
        assert_eq!(parsed.extracted_data[0].page_num, 3);
    }

    #[test]
    fn test_interpret_server_error_detail() {
        let err = UploadController::interpret(400, r#"{"detail":"Only PDF files are allowed."}"#)
            .unwrap_err();
        assert_eq!(
            err,
            UploadError::Server {
                status: 400,
                detail: "Only PDF files are allowed.".into()
            }
        );
    }

    #[test]
    fn test_interpret_server_error_without_body() {
        let err = UploadController::interpret(502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, UploadError::Server { status: 502, ref detail } if detail.contains("502")));
    }

    #[test]
    fn test_interpret_malformed_success_body() {
        let err = UploadController::interpret(200, r#"{"result":[]}"#).unwrap_err();
        assert!(matches!(err, UploadError::MalformedResponse(_)));
    }
}
