//! Browser front-end for one intake page
//!
//! `IntakeApp` owns the [`IntakeSession`] and performs the I/O it asks for: the multipart
//! upload, the pdf.js load and the page renders. Async completions re-enter the session by
//! generation-stamped tickets, so results from superseded files are dropped there.

use std::cell::RefCell;
use std::rc::Rc;

use intake_core::{
    DocumentType, IntakeConfig, IntakeSession, LoadTicket, RenderRequest, UploadTicket,
};
use js_sys::Uint8Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{File, HtmlCanvasElement};

use crate::download::save_blob;
use crate::http::upload_file;
use crate::pdf_bridge::{self, js_error_text, BridgeDocument};
use crate::snapshot::PageSnapshot;

/// State shared with the spawned upload, load and render tasks
struct Shared {
    session: RefCell<IntakeSession>,
    /// Document proxy for the viewer generation it was loaded under
    document: RefCell<Option<(u64, Rc<BridgeDocument>)>>,
    canvas: HtmlCanvasElement,
    on_change: RefCell<Option<js_sys::Function>>,
}

impl Shared {
    fn notify_change(&self) {
        // the callback may call back into the app
        let callback = self.on_change.borrow().clone();
        if let Some(callback) = callback {
            let _ = callback.call0(&JsValue::NULL);
        }
    }
}

#[wasm_bindgen]
pub struct IntakeApp {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl IntakeApp {
    /// Create the app around the canvas the viewer draws on
    ///
    /// `config` is an optional partial configuration object; missing keys use defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config: JsValue) -> Result<IntakeApp, JsValue> {
        console_error_panic_hook::set_once();

        let config: IntakeConfig = if config.is_undefined() || config.is_null() {
            IntakeConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };
        let session = IntakeSession::new(config).map_err(to_js)?;

        Ok(Self {
            shared: Rc::new(Shared {
                session: RefCell::new(session),
                document: RefCell::new(None),
                canvas,
                on_change: RefCell::new(None),
            }),
        })
    }

    /// Load the pdf.js worker configured for this app
    #[wasm_bindgen(js_name = initPdfJs)]
    pub async fn init_pdf_js(&self) -> Result<(), JsValue> {
        let worker_src = self.shared.session.borrow().config().pdf_worker_src.clone();
        pdf_bridge::init_pdf_js(&worker_src)
            .await
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Called with no arguments whenever async work changes the page state
    #[wasm_bindgen(js_name = setChangeCallback)]
    pub fn set_change_callback(&self, callback: js_sys::Function) {
        *self.shared.on_change.borrow_mut() = Some(callback);
    }

    #[wasm_bindgen(js_name = selectDocumentType)]
    pub fn select_document_type(&self, tag: &str) -> Result<(), JsValue> {
        let document_type: DocumentType = tag.parse().map_err(to_js)?;
        self.shared
            .session
            .borrow_mut()
            .select_document_type(document_type);
        Ok(())
    }

    /// Start uploading and displaying `file`
    ///
    /// Returns immediately; progress arrives through the change callback.
    #[wasm_bindgen(js_name = selectFile)]
    pub fn select_file(&self, file: File) -> Result<(), JsValue> {
        let (selection, upload_url) = {
            let mut session = self.shared.session.borrow_mut();
            let selection = session.select_file(&file.name());
            (selection, session.config().upload_url())
        };
        let selection = match selection {
            Ok(selection) => selection,
            Err(err) => {
                self.shared.notify_change();
                return Err(to_js(err));
            }
        };

        web_sys::console::log_1(
            &format!(
                "Uploading {} as {}",
                selection.upload.file_name, selection.upload.document_type
            )
            .into(),
        );

        spawn_local(run_upload(
            self.shared.clone(),
            upload_url,
            file.clone(),
            selection.upload,
        ));
        spawn_local(run_load(self.shared.clone(), file, selection.load));
        self.shared.notify_change();
        Ok(())
    }

    #[wasm_bindgen(js_name = rowClicked)]
    pub fn row_clicked(&self, name: &str) {
        let request = self.shared.session.borrow_mut().row_clicked(name);
        self.render(request);
    }

    #[wasm_bindgen(js_name = goToPage)]
    pub fn go_to_page(&self, page: u32) {
        let request = self.shared.session.borrow_mut().go_to_page(page);
        self.render(request);
    }

    #[wasm_bindgen(js_name = nextPage)]
    pub fn next_page(&self) {
        let request = self.shared.session.borrow_mut().next_page();
        self.render(request);
    }

    #[wasm_bindgen(js_name = prevPage)]
    pub fn prev_page(&self) {
        let request = self.shared.session.borrow_mut().prev_page();
        self.render(request);
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&self) {
        let request = self.shared.session.borrow_mut().zoom_in();
        self.render(request);
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&self) {
        let request = self.shared.session.borrow_mut().zoom_out();
        self.render(request);
    }

    /// Open the edit modal; returns the draft `{ name, value, page }`
    #[wasm_bindgen(js_name = openEditor)]
    pub fn open_editor(&self, name: &str) -> Result<JsValue, JsValue> {
        let draft = self
            .shared
            .session
            .borrow_mut()
            .open_editor(name)
            .map_err(to_js)?;
        serde_wasm_bindgen::to_value(&draft).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = setEditorValue)]
    pub fn set_editor_value(&self, value: &str) {
        self.shared.session.borrow_mut().set_editor_value(value);
    }

    #[wasm_bindgen(js_name = setEditorPage)]
    pub fn set_editor_page(&self, page: &str) {
        self.shared.session.borrow_mut().set_editor_page(page);
    }

    /// Save the modal; the error message is meant for display inside the modal
    #[wasm_bindgen(js_name = submitEditor)]
    pub fn submit_editor(&self) -> Result<(), JsValue> {
        self.shared
            .session
            .borrow_mut()
            .submit_editor()
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = cancelEditor)]
    pub fn cancel_editor(&self) {
        self.shared.session.borrow_mut().cancel_editor();
    }

    #[wasm_bindgen(js_name = setFieldValue)]
    pub fn set_field_value(&self, name: &str, value: &str) -> Result<(), JsValue> {
        self.shared
            .session
            .borrow_mut()
            .set_field_value(name, value)
            .map_err(to_js)
    }

    /// Generate the report from the current fields and save it
    pub fn download(&self) -> Result<(), JsValue> {
        let blob = self.shared.session.borrow().download().map_err(to_js)?;
        save_blob(&blob)
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let snapshot = PageSnapshot::capture(&self.shared.session.borrow());
        serde_wasm_bindgen::to_value(&snapshot).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Drain pending `{ level, message }` notifications
    #[wasm_bindgen(js_name = takeNotifications)]
    pub fn take_notifications(&self) -> Result<JsValue, JsValue> {
        let notes = self.shared.session.borrow_mut().take_notifications();
        serde_wasm_bindgen::to_value(&notes).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    fn render(&self, request: Option<RenderRequest>) {
        if let Some(request) = request {
            spawn_local(run_renders(self.shared.clone(), request));
        }
        self.shared.notify_change();
    }
}

async fn run_upload(shared: Rc<Shared>, url: String, file: File, ticket: UploadTicket) {
    let result = upload_file(&url, &file, ticket.document_type).await;
    if let Err(ref err) = result {
        web_sys::console::error_1(&format!("Upload error: {}", err).into());
    }
    shared.session.borrow_mut().upload_finished(&ticket, result);
    shared.notify_change();
}

async fn run_load(shared: Rc<Shared>, file: File, ticket: LoadTicket) {
    let loaded = match JsFuture::from(file.array_buffer()).await {
        Ok(buffer) => pdf_bridge::load_document(Uint8Array::new(&buffer)).await,
        Err(err) => Err(js_error_text(&err)),
    };

    let result = match loaded {
        Ok(document) => {
            let pages = document.page_count();
            let current = shared.session.borrow().viewer().generation() == ticket.generation();
            if current {
                *shared.document.borrow_mut() = Some((ticket.generation(), Rc::new(document)));
            }
            Ok(pages)
        }
        Err(message) => Err(message),
    };

    let request = shared.session.borrow_mut().load_finished(ticket, result);
    if let Some(request) = request {
        run_renders(shared.clone(), request).await;
    } else {
        shared.notify_change();
    }
}

/// Perform `request` and every follow-up render the viewer asks for
async fn run_renders(shared: Rc<Shared>, first: RenderRequest) {
    let mut next = Some(first);

    while let Some(request) = next {
        let document = shared
            .document
            .borrow()
            .as_ref()
            .filter(|(generation, _)| *generation == request.generation)
            .map(|(_, document)| document.clone());

        // a request for a replaced document has nothing to draw
        let result = match document {
            Some(document) => {
                document
                    .render(request.page, &shared.canvas, request.scale)
                    .await
            }
            None => Ok(()),
        };
        if let Err(ref message) = result {
            web_sys::console::error_1(
                &format!("Error rendering page {}: {}", request.page, message).into(),
            );
        }

        next = shared.session.borrow_mut().render_finished(&request, result);
        shared.notify_change();
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
