//! Field table rows and the modal field editor

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::fields::FieldStore;
use crate::viewer::{PdfViewer, RenderRequest};

/// Label shown in the page column when a field has no known source page
pub const NO_PAGE_LABEL: &str = "N/A";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Value cannot be empty")]
    EmptyValue,

    #[error("Page must be a positive whole number, got {0:?}")]
    InvalidPage(String),

    #[error("No field is being edited")]
    NotOpen,

    #[error("Unknown field: {0}")]
    UnknownField(String),
}

/// One rendered row of the field table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRow {
    pub name: String,
    pub value: String,
    pub page: u32,
    pub page_label: String,
}

pub struct FieldTable;

impl FieldTable {
    pub fn rows(store: &FieldStore) -> Vec<FieldRow> {
        store
            .fields()
            .iter()
            .map(|field| FieldRow {
                name: field.name.clone(),
                value: field.value.clone(),
                page: field.page,
                page_label: if field.has_page() {
                    field.page.to_string()
                } else {
                    NO_PAGE_LABEL.to_string()
                },
            })
            .collect()
    }

    /// Row click: jump the viewer to the field's page when it has one
    pub fn click(page: u32, viewer: &mut PdfViewer) -> Option<RenderRequest> {
        if page == 0 {
            return None;
        }
        viewer.jump_to_field(page)
    }
}

/// Draft held by the modal while the user types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditDraft {
    pub name: String,
    pub value: String,
    /// Raw page input, validated on submit
    pub page: String,
}

#[derive(Debug, Clone, Default)]
pub struct FieldEditor {
    draft: Option<EditDraft>,
    inline_error: Option<EditError>,
}

impl FieldEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the modal pre-filled with the field's current value and page
    pub fn open(&mut self, store: &FieldStore, name: &str) -> Result<&EditDraft, EditError> {
        let field = store
            .get(name)
            .ok_or_else(|| EditError::UnknownField(name.to_string()))?;

        self.inline_error = None;
        let draft = self.draft.insert(EditDraft {
            name: field.name.clone(),
            value: field.value.clone(),
            page: if field.has_page() {
                field.page.to_string()
            } else {
                String::new()
            },
        });
        Ok(draft)
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        if let Some(draft) = self.draft.as_mut() {
            draft.value = value.into();
        }
    }

    pub fn set_page(&mut self, page: impl Into<String>) {
        if let Some(draft) = self.draft.as_mut() {
            draft.page = page.into();
        }
    }

    /// Validate the draft and write it back; the modal stays open on failure
    pub fn submit(&mut self, store: &mut FieldStore) -> Result<(), EditError> {
        let draft = self.draft.as_ref().ok_or(EditError::NotOpen)?;

        match Self::validate(draft) {
            Ok(page) => {
                let name = draft.name.clone();
                let value = draft.value.clone();
                store
                    .set_value(&name, value)
                    .and_then(|_| store.set_page(&name, page))
                    .map_err(|_| EditError::UnknownField(name.clone()))?;
                debug!(field = %name, page, "field edited");
                self.close();
                Ok(())
            }
            Err(err) => {
                self.inline_error = Some(err.clone());
                Err(err)
            }
        }
    }

    fn validate(draft: &EditDraft) -> Result<u32, EditError> {
        if draft.value.trim().is_empty() {
            return Err(EditError::EmptyValue);
        }

        match draft.page.trim().parse::<u32>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(EditError::InvalidPage(draft.page.clone())),
        }
    }

    pub fn cancel(&mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.draft = None;
        self.inline_error = None;
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        self.draft.as_ref()
    }

    pub fn inline_error(&self) -> Option<&EditError> {
        self.inline_error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::ExtractedRecord;
    use crate::schema::DocumentType;
    use crate::viewer::LoadResult;

    fn store() -> FieldStore {
        let mut store = FieldStore::for_document(DocumentType::Sow);
        store.merge(&[ExtractedRecord::new("sow_no", "123", 3)]);
        store
    }

    #[test]
    fn test_rows_label_missing_pages() {
        let rows = FieldTable::rows(&store());
        let sow_no = rows.iter().find(|r| r.name == "sow_no").unwrap();
        assert_eq!(sow_no.page_label, "3");
        let currency = rows.iter().find(|r| r.name == "currency").unwrap();
        assert_eq!(currency.page_label, NO_PAGE_LABEL);
    }

    #[test]
    fn test_click_navigates_only_with_page() {
        let mut viewer = PdfViewer::default();
        let ticket = viewer.begin_load();
        if let LoadResult::Ready {
            render: Some(first),
            ..
        } = viewer.finish_load(ticket, Ok(6))
        {
            viewer.finish_render(&first, Ok(()));
        }

        assert_eq!(FieldTable::click(0, &mut viewer), None);
        assert_eq!(viewer.current_page(), 1);
        assert!(FieldTable::click(4, &mut viewer).is_some());
        assert_eq!(viewer.current_page(), 4);
    }

    #[test]
    fn test_open_prefills_draft() {
        let store = store();
        let mut editor = FieldEditor::new();
        let draft = editor.open(&store, "sow_no").unwrap();
        assert_eq!(draft.value, "123");
        assert_eq!(draft.page, "3");

        let draft = editor.open(&store, "currency").unwrap();
        assert_eq!(draft.page, "");
        assert!(matches!(
            editor.open(&store, "nope"),
            Err(EditError::UnknownField(_))
        ));
    }

    #[test]
    fn test_submit_empty_value_is_rejected() {
        let mut store = store();
        let before = store.clone();
        let mut editor = FieldEditor::new();
        editor.open(&store, "sow_no").unwrap();
        editor.set_value("   ");

        assert_eq!(editor.submit(&mut store), Err(EditError::EmptyValue));
        assert!(editor.is_open());
        assert_eq!(editor.inline_error(), Some(&EditError::EmptyValue));
        assert_eq!(store, before);
    }

    #[test]
    fn test_submit_invalid_page_is_rejected() {
        let mut store = store();
        let mut editor = FieldEditor::new();
        editor.open(&store, "sow_no").unwrap();
        for bad in ["0", "-1", "two", "", "1.5"] {
            editor.set_page(bad);
            assert!(matches!(
                editor.submit(&mut store),
                Err(EditError::InvalidPage(_))
            ));
        }
        assert!(editor.is_open());
        assert_eq!(store.get("sow_no").unwrap().page, 3);
    }

    #[test]
    fn test_submit_writes_value_and_page() {
        let mut store = store();
        let mut editor = FieldEditor::new();
        editor.open(&store, "sow_no").unwrap();
        editor.set_value("42");
        editor.set_page("5");

        assert_eq!(editor.submit(&mut store), Ok(()));
        assert!(!editor.is_open());
        let field = store.get("sow_no").unwrap();
        assert_eq!(field.value, "42");
        assert_eq!(field.page, 5);
    }

    #[test]
    fn test_submit_without_open_modal() {
        let mut editor = FieldEditor::new();
        let mut store = store();
        assert_eq!(editor.submit(&mut store), Err(EditError::NotOpen));
    }

    #[test]
    fn test_cancel_discards_draft() {
        let mut store = store();
        let mut editor = FieldEditor::new();
        editor.open(&store, "sow_no").unwrap();
        editor.set_value("changed");
        editor.cancel();
        assert!(!editor.is_open());
        assert_eq!(editor.submit(&mut store), Err(EditError::NotOpen));
        assert_eq!(store.get("sow_no").unwrap().value, "123");
    }
}
