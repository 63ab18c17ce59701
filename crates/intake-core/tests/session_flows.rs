//! End-to-end flows through IntakeSession, driven the way a front-end drives it.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use intake_core::export::SHEET_NAME;
use intake_core::session::UPLOAD_SUCCESS_MESSAGE;
use intake_core::{
    DocumentType, EditError, ExtractedRecord, IntakeConfig, IntakeError, IntakeSession,
    NotificationLevel, RenderRequest, UploadController, UploadOutcome, UploadResponse,
};
use pretty_assertions::assert_eq;

fn session() -> IntakeSession {
    IntakeSession::new(IntakeConfig::default()).unwrap()
}

fn sow_response() -> UploadResponse {
    UploadResponse {
        extracted_data: vec![
            ExtractedRecord::new("client_company_name", "Acme Corp", 1),
            ExtractedRecord::new("sow_no", "SOW-2024-17", 2),
            ExtractedRecord::new("currency", "USD", 4),
            ExtractedRecord::new("sow_value", "NA", 0),
        ],
    }
}

/// Select `file`, finish the upload and the load, and settle the first render
fn uploaded(session: &mut IntakeSession, file: &str, pages: u32) {
    let selection = session.select_file(file).unwrap();
    let first = session.load_finished(selection.load, Ok(pages)).unwrap();
    assert_eq!(session.render_finished(&first, Ok(())), None);
    let outcome = session.upload_finished(&selection.upload, Ok(sow_response()));
    assert!(matches!(outcome, UploadOutcome::Applied(_)));
}

fn sheet(bytes: Vec<u8>) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(bytes)).unwrap();
    workbook
        .worksheet_range(SHEET_NAME)
        .unwrap()
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::String(s) => s.clone(),
                    Data::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}

fn column(sheet: &[Vec<String>], name: &str) -> String {
    let col = sheet[0].iter().position(|h| h == name).unwrap();
    sheet[1].get(col).cloned().unwrap_or_default()
}

#[test]
fn upload_fills_table_and_enables_download() {
    let mut session = session();
    assert!(!session.download_ready());

    uploaded(&mut session, "statement.pdf", 5);

    assert!(session.download_ready());
    assert!(!session.is_uploading());

    let rows = session.rows();
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    let expected: Vec<&str> = DocumentType::Sow.schema().collect();
    assert_eq!(names, expected);

    let sow_no = rows.iter().find(|r| r.name == "sow_no").unwrap();
    assert_eq!(sow_no.value, "SOW-2024-17");
    assert_eq!(sow_no.page_label, "2");

    let notes = session.take_notifications();
    assert_eq!(notes[0].message, UPLOAD_SUCCESS_MESSAGE);
    assert!(notes.iter().all(|n| n.level == NotificationLevel::Info));
}

#[test]
fn row_click_jumps_to_source_page() {
    let mut session = session();
    uploaded(&mut session, "statement.pdf", 5);

    let request = session.row_clicked("currency").unwrap();
    assert_eq!(request.page, 4);
    assert_eq!(session.viewer().current_page(), 4);
    session.render_finished(&request, Ok(()));

    // no page recorded
    assert_eq!(session.row_clicked("sow_value"), None);
    assert_eq!(session.row_clicked("reviewer_name"), None);
    assert_eq!(session.viewer().current_page(), 4);
}

#[test]
fn download_reflects_edits_made_after_upload() {
    let mut session = session();
    uploaded(&mut session, "statement.pdf", 5);

    let before = sheet(session.download().unwrap().bytes);
    assert_eq!(column(&before, "sow_no"), "SOW-2024-17");

    session.open_editor("sow_no").unwrap();
    session.set_editor_value("SOW-2024-18");
    session.set_editor_page("3");
    session.submit_editor().unwrap();
    session.set_field_value("reviewer_name", "J. Doe").unwrap();

    let blob = session.download().unwrap();
    assert_eq!(blob.file_name, "Contract_Report.xlsx");
    let after = sheet(blob.bytes);
    assert_eq!(column(&after, "sow_no"), "SOW-2024-18");
    assert_eq!(column(&after, "reviewer_name"), "J. Doe");
    assert_eq!(after[0].len(), DocumentType::Sow.schema().count());
}

#[test]
fn reviewer_fields_survive_new_selection() {
    let mut session = session();
    session.set_field_value("reviewer_name", "Ann").unwrap();
    session.set_field_value("review_notes", "renewal due").unwrap();

    session.select_document_type(DocumentType::Nda);
    session.select_document_type(DocumentType::Sow);
    uploaded(&mut session, "statement.pdf", 5);

    assert_eq!(session.store().get("reviewer_name").unwrap().value, "Ann");
    let report = sheet(session.download().unwrap().bytes);
    assert_eq!(column(&report, "reviewer_name"), "Ann");
    assert_eq!(column(&report, "review_notes"), "renewal due");
    assert_eq!(column(&report, "sow_no"), "SOW-2024-17");
}

#[test]
fn invalid_edit_keeps_modal_open_without_notification() {
    let mut session = session();
    uploaded(&mut session, "statement.pdf", 5);
    session.take_notifications();

    session.open_editor("currency").unwrap();
    session.set_editor_page("0");
    assert!(matches!(
        session.submit_editor(),
        Err(EditError::InvalidPage(_))
    ));
    assert!(session.editor().is_open());
    assert!(session.take_notifications().is_empty());
    assert_eq!(session.store().get("currency").unwrap().page, 4);

    session.cancel_editor();
    assert!(!session.editor().is_open());
}

#[test]
fn stale_upload_does_not_overwrite_newer_file() {
    let mut session = session();
    let first = session.select_file("first.pdf").unwrap();
    let second = session.select_file("second.pdf").unwrap();

    let newer = UploadResponse {
        extracted_data: vec![ExtractedRecord::new("sow_no", "NEW", 1)],
    };
    assert!(matches!(
        session.upload_finished(&second.upload, Ok(newer)),
        UploadOutcome::Applied(_)
    ));
    assert_eq!(
        session.upload_finished(&first.upload, Ok(sow_response())),
        UploadOutcome::Stale
    );

    assert_eq!(session.store().get("sow_no").unwrap().value, "NEW");
    assert_eq!(session.store().get("client_company_name").unwrap().value, "");
    assert_eq!(session.file_name(), Some("second.pdf"));
}

#[test]
fn stale_load_does_not_replace_newer_document() {
    let mut session = session();
    let first = session.select_file("first.pdf").unwrap();
    let second = session.select_file("second.pdf").unwrap();

    assert_eq!(session.load_finished(first.load, Ok(9)), None);
    let render = session.load_finished(second.load, Ok(2)).unwrap();
    assert_eq!(render.page, 1);
    assert_eq!(session.viewer().total_pages(), 2);
}

#[test]
fn switching_document_type_abandons_upload() {
    let mut session = session();
    let selection = session.select_file("contract.pdf").unwrap();
    session.select_document_type(DocumentType::Nda);

    assert_eq!(
        session.upload_finished(&selection.upload, Ok(sow_response())),
        UploadOutcome::Stale
    );
    assert!(!session.download_ready());
    assert!(matches!(
        session.download(),
        Err(IntakeError::DownloadNotReady)
    ));
    assert!(session.store().fields().iter().all(|f| f.value.is_empty()));
    assert!(session.store().contains("disclosing_party"));
}

#[test]
fn new_selection_withdraws_previous_report() {
    let mut session = session();
    uploaded(&mut session, "first.pdf", 3);
    assert!(session.download_ready());

    let selection = session.select_file("second.pdf").unwrap();
    assert!(!session.download_ready());
    assert!(session.is_uploading());
    assert_eq!(selection.upload.document_type, DocumentType::Sow);
    assert_eq!(session.store().get("sow_no").unwrap().value, "");
}

#[test]
fn server_error_body_reaches_notification() {
    let mut session = session();
    let selection = session.select_file("contract.pdf").unwrap();
    let result = UploadController::interpret(500, r#"{"detail":"Error loading documents"}"#);

    session.upload_finished(&selection.upload, result);

    let notes = session.take_notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
    assert_eq!(notes[0].message, "File upload failed: Error loading documents");
}

#[test]
fn fields_beyond_document_are_reported() {
    let mut session = session();
    uploaded(&mut session, "short.pdf", 3);
    assert_eq!(session.out_of_range_fields(), vec!["currency".to_string()]);
    assert_eq!(session.row_clicked("currency"), None);
}

#[test]
fn navigation_while_rendering_keeps_latest_request() {
    let mut session = session();
    let selection = session.select_file("long.pdf").unwrap();
    let first = session.load_finished(selection.load, Ok(20)).unwrap();

    assert_eq!(session.go_to_page(5), None);
    assert_eq!(session.next_page(), None);
    assert_eq!(session.zoom_in(), None);

    let next: RenderRequest = session.render_finished(&first, Ok(())).unwrap();
    assert_eq!(next.page, 6);
    assert!((next.scale - 1.75).abs() < 1e-9);
    assert_eq!(session.render_finished(&next, Ok(())), None);
    assert_eq!(session.viewer().page_label(), "Page 6 of 20");
}
