//! Field Store: the named, editable values extracted from a contract

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{IntakeError, Result};
use crate::records::{is_placeholder, ExtractedRecord};
use crate::schema::{is_user_field, DocumentType};

/// A named piece of contract data and the page it was found on (0 = unknown)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub page: u32,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            page: 0,
        }
    }

    pub fn has_page(&self) -> bool {
        self.page > 0
    }
}

/// Result of merging one backend response into the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Names whose value and page were overwritten
    pub applied: Vec<String>,
    /// Record names outside the extracted schema, ignored
    pub dropped: Vec<String>,
    /// Applied names whose value is a "not found" placeholder
    pub missing: Vec<String>,
}

impl MergeReport {
    pub fn is_partial(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// Fixed-schema collection of fields, ordered as the schema lists them
///
/// Names are never added or removed after construction; only values and pages change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStore {
    document_type: DocumentType,
    fields: Vec<Field>,
}

impl FieldStore {
    /// Seed an empty store with the schema of `document_type`
    pub fn for_document(document_type: DocumentType) -> Self {
        Self {
            document_type,
            fields: document_type.schema().map(Field::new).collect(),
        }
    }

    /// Fresh store for `document_type` that keeps the reviewer's own fields
    pub fn reseeded(&self, document_type: DocumentType) -> Self {
        let mut next = Self::for_document(document_type);
        for field in self.fields.iter().filter(|f| is_user_field(&f.name)) {
            if let Some(slot) = next.fields.iter_mut().find(|f| f.name == field.name) {
                slot.value = field.value.clone();
            }
        }
        next
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    /// All fields in schema order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Field> {
        self.fields
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| IntakeError::UnknownField(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        self.get_mut(name)?.value = value.into();
        Ok(())
    }

    pub fn set_page(&mut self, name: &str, page: u32) -> Result<()> {
        self.get_mut(name)?.page = page;
        Ok(())
    }

    /// Overwrite value and page for every record naming an extracted field
    ///
    /// Unknown names and user fields are dropped; the name set never changes.
    pub fn merge<'a, I>(&mut self, records: I) -> MergeReport
    where
        I: IntoIterator<Item = &'a ExtractedRecord>,
    {
        let mut report = MergeReport::default();

        for record in records {
            if is_user_field(&record.field) {
                report.dropped.push(record.field.clone());
                continue;
            }

            match self.fields.iter_mut().find(|f| f.name == record.field) {
                Some(field) => {
                    field.value = record.value.clone();
                    field.page = record.page_num;
                    if is_placeholder(&field.value) {
                        report.missing.push(field.name.clone());
                    }
                    report.applied.push(field.name.clone());
                }
                None => report.dropped.push(record.field.clone()),
            }
        }

        if !report.dropped.is_empty() {
            warn!(dropped = ?report.dropped, "ignored records outside the {} schema", self.document_type);
        }
        debug!(
            applied = report.applied.len(),
            missing = report.missing.len(),
            "merged extraction results"
        );

        report
    }

    /// Flat name → value pairs in schema order
    pub fn as_rows(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }

    /// Fields pointing past the end of a document with `total_pages` pages
    pub fn out_of_range(&self, total_pages: u32) -> Vec<&Field> {
        self.fields.iter().filter(|f| f.page > total_pages).collect()
    }
}

impl Default for FieldStore {
    fn default() -> Self {
        Self::for_document(DocumentType::default())
    }
}
