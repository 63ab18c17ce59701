//! pdf.js bindings
//!
//! pdf.js owns parsing and rasterization in the browser. Document proxies are handed back to
//! Rust so a late load of an old file can never replace the document on screen.

use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;

// External JavaScript functions from pdf-bridge.js
#[wasm_bindgen(module = "/www/js/pdf-bridge.js")]
extern "C" {
    #[wasm_bindgen(js_name = initPdfJs, catch)]
    async fn init_pdf_js_internal(worker_src: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = loadDocument, catch)]
    async fn load_document_internal(data: Uint8Array) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = renderPage, catch)]
    async fn render_page_internal(
        document: &JsValue,
        page_num: u32,
        canvas: &HtmlCanvasElement,
        scale: f64,
    ) -> Result<JsValue, JsValue>;
}

/// A loaded pdf.js document proxy
pub struct BridgeDocument {
    proxy: JsValue,
    page_count: u32,
}

impl BridgeDocument {
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Draw 1-indexed `page` onto `canvas`, resizing the canvas to the page viewport
    pub async fn render(
        &self,
        page: u32,
        canvas: &HtmlCanvasElement,
        scale: f64,
    ) -> Result<(), String> {
        render_page_internal(&self.proxy, page, canvas, scale)
            .await
            .map(|_| ())
            .map_err(|e| js_error_text(&e))
    }
}

/// Point pdf.js at its worker script; must run before the first load
pub async fn init_pdf_js(worker_src: &str) -> Result<(), String> {
    init_pdf_js_internal(worker_src)
        .await
        .map(|_| ())
        .map_err(|e| js_error_text(&e))
}

/// Parse `bytes` with pdf.js
pub async fn load_document(bytes: Uint8Array) -> Result<BridgeDocument, String> {
    let proxy = load_document_internal(bytes)
        .await
        .map_err(|e| js_error_text(&e))?;

    if proxy.is_undefined() || proxy.is_null() {
        return Err("Failed to load PDF document".to_string());
    }

    let page_count = Reflect::get(&proxy, &JsValue::from_str("numPages"))
        .ok()
        .and_then(|n| n.as_f64())
        .map(|n| n as u32)
        .unwrap_or(0);

    Ok(BridgeDocument { proxy, page_count })
}

/// Best-effort message out of a thrown JS value
pub fn js_error_text(err: &JsValue) -> String {
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}
