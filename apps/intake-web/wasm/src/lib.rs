//! WASM front-end for the contract intake page
//!
//! All page state lives in Rust inside [`IntakeApp`]; the page script only wires DOM events
//! to it and redraws from [`IntakeApp::snapshot`] when the change callback fires.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { IntakeApp } from './pkg/intake_wasm.js';
//!
//! await init();
//!
//! const app = new IntakeApp(document.getElementById('pdf-canvas'), { endpoint: 'http://localhost:8000' });
//! await app.initPdfJs();
//! app.setChangeCallback(() => redraw(app.snapshot(), app.takeNotifications()));
//!
//! app.selectDocumentType('MSA');
//! fileInput.onchange = (e) => app.selectFile(e.target.files[0]);
//! nextButton.onclick = () => app.nextPage();
//! downloadButton.onclick = () => app.download();
//! ```

pub mod app;
pub mod download;
pub mod http;
pub mod pdf_bridge;
pub mod snapshot;

use wasm_bindgen::prelude::*;

pub use app::IntakeApp;
pub use snapshot::PageSnapshot;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Document type tags accepted by `selectDocumentType`
#[wasm_bindgen(js_name = documentTypes)]
pub fn document_types() -> Vec<String> {
    intake_core::DocumentType::ALL
        .iter()
        .map(|t| t.as_str().to_string())
        .collect()
}

#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;
    use web_sys::HtmlCanvasElement;

    wasm_bindgen_test_configure!(run_in_browser);

    fn canvas() -> HtmlCanvasElement {
        web_sys::window()
            .unwrap()
            .document()
            .unwrap()
            .create_element("canvas")
            .unwrap()
            .dyn_into()
            .unwrap()
    }

    #[wasm_bindgen_test]
    fn test_app_creation_with_defaults() {
        let app = IntakeApp::new(canvas(), JsValue::UNDEFINED);
        assert!(app.is_ok());
    }

    #[wasm_bindgen_test]
    fn test_select_unknown_document_type() {
        let app = IntakeApp::new(canvas(), JsValue::NULL).unwrap();
        assert!(app.select_document_type("LEASE").is_err());
        assert!(app.select_document_type("msa").is_ok());
    }

    #[wasm_bindgen_test]
    fn test_download_before_upload_fails() {
        let app = IntakeApp::new(canvas(), JsValue::NULL).unwrap();
        assert!(app.download().is_err());
    }
}
