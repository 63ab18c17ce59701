//! Page Composer
//!
//! `IntakeSession` is the single owned state container for one intake page: it wires upload
//! results into the Field Store, row clicks into the PDF Viewer, and the Field Store into the
//! exported report. Front-ends hold one session and call into it from their event handlers.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::IntakeConfig;
use crate::editor::{EditDraft, EditError, FieldEditor, FieldRow, FieldTable};
use crate::error::{IntakeError, Result};
use crate::export::{ExportBlob, SpreadsheetExporter};
use crate::fields::FieldStore;
use crate::records::UploadResponse;
use crate::schema::DocumentType;
use crate::upload::{UploadController, UploadError, UploadOutcome, UploadTicket};
use crate::viewer::{LoadResult, LoadTicket, PdfViewer, RenderRequest, ViewerPhase};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded and processed successfully!";
pub const NETWORK_ERROR_MESSAGE: &str =
    "An error occurred while uploading the file. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Transient message for the user (toast / alert)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Tickets for the two asynchronous operations started by selecting a file
#[derive(Debug, Clone)]
pub struct FileSelection {
    pub upload: UploadTicket,
    pub load: LoadTicket,
}

pub struct IntakeSession {
    config: IntakeConfig,
    store: FieldStore,
    uploads: UploadController,
    viewer: PdfViewer,
    editor: FieldEditor,
    exporter: SpreadsheetExporter,
    notifications: Vec<Notification>,
    file_name: Option<String>,
}

impl IntakeSession {
    pub fn new(config: IntakeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: FieldStore::default(),
            uploads: UploadController::new(),
            viewer: PdfViewer::new(config.zoom()),
            editor: FieldEditor::new(),
            exporter: SpreadsheetExporter::new(config.report_file_name.clone()),
            notifications: Vec::new(),
            file_name: None,
            config,
        })
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    pub fn viewer(&self) -> &PdfViewer {
        &self.viewer
    }

    pub fn editor(&self) -> &FieldEditor {
        &self.editor
    }

    pub fn document_type(&self) -> DocumentType {
        self.store.document_type()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Switch schema; any upload in flight is abandoned
    pub fn select_document_type(&mut self, document_type: DocumentType) {
        if document_type == self.store.document_type() {
            return;
        }
        info!(%document_type, "document type changed");
        self.uploads.reset();
        self.editor.cancel();
        self.store = self.store.reseeded(document_type);
    }

    /// Start uploading and loading `file_name`; both results come back through
    /// [`upload_finished`](Self::upload_finished) and [`load_finished`](Self::load_finished)
    pub fn select_file(&mut self, file_name: &str) -> Result<FileSelection> {
        let upload = match self.uploads.begin(file_name, self.store.document_type()) {
            Ok(ticket) => ticket,
            Err(err) => {
                self.notify(Notification::error(err.to_string()));
                return Err(err);
            }
        };

        self.editor.cancel();
        self.store = self.store.reseeded(self.store.document_type());
        self.file_name = Some(file_name.to_string());
        let load = self.viewer.begin_load();

        Ok(FileSelection { upload, load })
    }

    pub fn upload_finished(
        &mut self,
        ticket: &UploadTicket,
        result: std::result::Result<UploadResponse, UploadError>,
    ) -> UploadOutcome {
        let outcome = self.uploads.complete(ticket, result, &mut self.store);

        match &outcome {
            UploadOutcome::Applied(report) => {
                self.notify(Notification::info(UPLOAD_SUCCESS_MESSAGE));
                if report.is_partial() {
                    self.notify(Notification::info(format!(
                        "{} of {} fields were not found in the document",
                        report.missing.len(),
                        report.applied.len()
                    )));
                }
                self.check_page_references();
            }
            UploadOutcome::Failed(UploadError::Network(_)) => {
                self.notify(Notification::error(NETWORK_ERROR_MESSAGE));
            }
            UploadOutcome::Failed(UploadError::Server { detail, .. }) => {
                self.notify(Notification::error(format!("File upload failed: {}", detail)));
            }
            UploadOutcome::Failed(err @ UploadError::MalformedResponse(_)) => {
                self.notify(Notification::error(format!("File upload failed: {}", err)));
            }
            UploadOutcome::Stale => {}
        }

        outcome
    }

    /// Record the page count (or error) of the document load for `ticket`
    pub fn load_finished(
        &mut self,
        ticket: LoadTicket,
        result: std::result::Result<u32, String>,
    ) -> Option<RenderRequest> {
        match self.viewer.finish_load(ticket, result) {
            LoadResult::Ready { render, .. } => {
                self.check_page_references();
                render
            }
            LoadResult::Failed(err) => {
                self.notify(Notification::error(err.to_string()));
                None
            }
            LoadResult::Stale => None,
        }
    }

    pub fn render_finished(
        &mut self,
        request: &RenderRequest,
        result: std::result::Result<(), String>,
    ) -> Option<RenderRequest> {
        let finish = self.viewer.finish_render(request, result);
        if let Some(err) = finish.error {
            self.notify(Notification::error(err.to_string()));
        }
        finish.next
    }

    pub fn rows(&self) -> Vec<FieldRow> {
        FieldTable::rows(&self.store)
    }

    /// Jump the viewer to the source page of the clicked field
    pub fn row_clicked(&mut self, name: &str) -> Option<RenderRequest> {
        let page = self.store.get(name)?.page;
        FieldTable::click(page, &mut self.viewer)
    }

    pub fn go_to_page(&mut self, page: u32) -> Option<RenderRequest> {
        self.viewer.go_to_page(page)
    }

    pub fn next_page(&mut self) -> Option<RenderRequest> {
        self.viewer.next_page()
    }

    pub fn prev_page(&mut self) -> Option<RenderRequest> {
        self.viewer.prev_page()
    }

    pub fn zoom_in(&mut self) -> Option<RenderRequest> {
        self.viewer.zoom_in()
    }

    pub fn zoom_out(&mut self) -> Option<RenderRequest> {
        self.viewer.zoom_out()
    }

    pub fn open_editor(&mut self, name: &str) -> std::result::Result<EditDraft, EditError> {
        self.editor.open(&self.store, name).cloned()
    }

    pub fn set_editor_value(&mut self, value: &str) {
        self.editor.set_value(value);
    }

    pub fn set_editor_page(&mut self, page: &str) {
        self.editor.set_page(page);
    }

    /// Validation failures stay inside the modal: no notification is raised
    pub fn submit_editor(&mut self) -> std::result::Result<(), EditError> {
        self.editor.submit(&mut self.store)
    }

    pub fn cancel_editor(&mut self) {
        self.editor.cancel();
    }

    /// Set a free-text form field such as the reviewer's name
    pub fn set_field_value(&mut self, name: &str, value: &str) -> Result<()> {
        self.store.set_value(name, value)
    }

    pub fn download_ready(&self) -> bool {
        self.uploads.download_ready()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploads.is_uploading()
    }

    /// Build the report from the fields as they are right now
    pub fn download(&self) -> Result<ExportBlob> {
        if !self.uploads.download_ready() {
            return Err(IntakeError::DownloadNotReady);
        }
        self.exporter.export(&self.store.as_rows())
    }

    /// Names of fields whose page lies beyond the loaded document
    pub fn out_of_range_fields(&self) -> Vec<String> {
        if self.viewer.phase() != ViewerPhase::Ready {
            return Vec::new();
        }
        self.store
            .out_of_range(self.viewer.total_pages())
            .into_iter()
            .map(|f| f.name.clone())
            .collect()
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    fn check_page_references(&self) {
        let out_of_range = self.out_of_range_fields();
        if !out_of_range.is_empty() {
            warn!(
                fields = ?out_of_range,
                total_pages = self.viewer.total_pages(),
                "fields reference pages beyond the document"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::ExtractedRecord;

    fn session() -> IntakeSession {
        IntakeSession::new(IntakeConfig::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = IntakeConfig {
            min_scale: -1.0,
            ..Default::default()
        };
        assert!(IntakeSession::new(config).is_err());
    }

    #[test]
    fn test_select_non_pdf_notifies() {
        let mut session = session();
        assert!(session.select_file("notes.txt").is_err());
        let notes = session.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert!(session.take_notifications().is_empty());
    }

    #[test]
    fn test_server_error_uses_detail() {
        let mut session = session();
        let selection = session.select_file("sow.pdf").unwrap();
        session.upload_finished(
            &selection.upload,
            Err(UploadError::Server {
                status: 500,
                detail: "Error loading documents".into(),
            }),
        );
        let notes = session.take_notifications();
        assert_eq!(
            notes,
            vec![Notification::error("File upload failed: Error loading documents")]
        );
        assert!(!session.download_ready());
    }

    #[test]
    fn test_network_error_is_generic() {
        let mut session = session();
        let selection = session.select_file("sow.pdf").unwrap();
        session.upload_finished(&selection.upload, Err(UploadError::Network("refused".into())));
        assert_eq!(
            session.take_notifications(),
            vec![Notification::error(NETWORK_ERROR_MESSAGE)]
        );
    }

    #[test]
    fn test_partial_extraction_still_ready() {
        let mut session = session();
        let selection = session.select_file("sow.pdf").unwrap();
        session.upload_finished(
            &selection.upload,
            Ok(UploadResponse {
                extracted_data: vec![
                    ExtractedRecord::new("sow_no", "123", 3),
                    ExtractedRecord::new("currency", "NA", 0),
                ],
            }),
        );
        assert!(session.download_ready());
        let notes = session.take_notifications();
        assert_eq!(notes.len(), 2);
        assert!(notes[1].message.contains("1 of 2"));
    }

    #[test]
    fn test_download_requires_upload() {
        let session = session();
        assert!(matches!(
            session.download(),
            Err(IntakeError::DownloadNotReady)
        ));
    }

    #[test]
    fn test_document_type_switch_reseeds() {
        let mut session = session();
        session.select_document_type(DocumentType::Msa);
        assert_eq!(session.document_type(), DocumentType::Msa);
        assert!(session.store().contains("msa_start_date"));
        assert!(!session.store().contains("sow_no"));
    }

    #[test]
    fn test_load_failure_notifies() {
        let mut session = session();
        let selection = session.select_file("sow.pdf").unwrap();
        assert_eq!(
            session.load_finished(selection.load, Err("Invalid PDF structure".into())),
            None
        );
        let notes = session.take_notifications();
        assert_eq!(notes[0].message, "Error loading PDF: Invalid PDF structure");
        assert_eq!(session.viewer().phase(), ViewerPhase::Empty);
    }
}
