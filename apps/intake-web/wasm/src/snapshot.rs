//! Plain-data view of the session for the page script to render

use intake_core::{FieldRow, IntakeSession, ViewerPhase};
use serde::Serialize;

/// Everything the toolbar, table and download button need after a state change
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub document_type: String,
    pub file_name: Option<String>,
    pub viewer_ready: bool,
    pub loading: bool,
    pub page_label: String,
    pub current_page: u32,
    pub total_pages: u32,
    pub scale: f64,
    pub can_prev: bool,
    pub can_next: bool,
    pub can_zoom_out: bool,
    pub uploading: bool,
    pub download_ready: bool,
    pub editing: bool,
    pub rows: Vec<FieldRow>,
}

impl PageSnapshot {
    pub fn capture(session: &IntakeSession) -> Self {
        let viewer = session.viewer();
        let ready = viewer.phase() == ViewerPhase::Ready;
        Self {
            document_type: session.document_type().to_string(),
            file_name: session.file_name().map(str::to_string),
            viewer_ready: ready,
            loading: viewer.phase() == ViewerPhase::Loading,
            page_label: if ready {
                viewer.page_label()
            } else {
                String::new()
            },
            current_page: viewer.current_page(),
            total_pages: viewer.total_pages(),
            scale: viewer.scale(),
            can_prev: viewer.can_prev(),
            can_next: viewer.can_next(),
            can_zoom_out: ready && viewer.can_zoom_out(),
            uploading: session.is_uploading(),
            download_ready: session.download_ready(),
            editing: session.editor().is_open(),
            rows: session.rows(),
        }
    }
}
