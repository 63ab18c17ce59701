//! Contract intake core
//!
//! Platform-independent state for the contract intake page: a user picks a contract type and
//! a PDF, the PDF goes to an extraction backend, the extracted fields land in an editable
//! table next to a page viewer, and the result can be downloaded as an XLSX report.
//!
//! Nothing in this crate performs I/O. Front-ends (the wasm app, the CLI) run the HTTP upload
//! and the page rendering themselves and feed the results back through [`IntakeSession`].
//!
//! ## Modules
//!
//! - [`schema`]: document types and their field lists
//! - [`records`]: backend wire types
//! - [`fields`]: the Field Store
//! - [`upload`]: upload generations and response interpretation
//! - [`viewer`]: page navigation, zoom and render scheduling
//! - [`editor`]: field table rows and the edit modal
//! - [`export`]: XLSX report generation
//! - [`pdf`]: native page counting and sizing
//! - [`session`]: the composed page state

pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod fields;
pub mod pdf;
pub mod records;
pub mod schema;
pub mod session;
pub mod upload;
pub mod viewer;

pub use config::IntakeConfig;
pub use editor::{EditDraft, EditError, FieldEditor, FieldRow, FieldTable};
pub use error::{IntakeError, Result};
pub use export::{ExportBlob, SpreadsheetExporter};
pub use fields::{Field, FieldStore, MergeReport};
pub use pdf::{DocumentInfo, PageSize, PdfDocument};
pub use records::{ErrorBody, ExtractedRecord, UploadResponse};
pub use schema::DocumentType;
pub use session::{FileSelection, IntakeSession, Notification, NotificationLevel};
pub use upload::{UploadController, UploadError, UploadOutcome, UploadTicket};
pub use viewer::{LoadResult, LoadTicket, PdfViewer, RenderRequest, ViewerError, ViewerPhase};
