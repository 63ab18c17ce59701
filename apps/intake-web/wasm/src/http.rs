//! Multipart upload to the extraction backend over `fetch`

use intake_core::upload::{FILE_FIELD, TYPE_FIELD};
use intake_core::{DocumentType, UploadController, UploadError, UploadResponse};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FormData, Request, RequestInit, RequestMode, Response};

use crate::pdf_bridge::js_error_text;

/// POST `file` and its document type to `url`
///
/// Failures to reach the server map to [`UploadError::Network`]; anything the server
/// answered goes through [`UploadController::interpret`].
pub async fn upload_file(
    url: &str,
    file: &File,
    document_type: DocumentType,
) -> Result<UploadResponse, UploadError> {
    let network = |e: JsValue| UploadError::Network(js_error_text(&e));

    let form = FormData::new().map_err(network)?;
    form.append_with_blob_and_filename(FILE_FIELD, file, &file.name())
        .map_err(network)?;
    form.append_with_str(TYPE_FIELD, document_type.as_str())
        .map_err(network)?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::Cors);
    opts.set_body(&form);

    let request = Request::new_with_str_and_init(url, &opts).map_err(network)?;

    let window = web_sys::window().ok_or_else(|| UploadError::Network("No window".into()))?;
    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(network)?;
    let response: Response = response.dyn_into().map_err(network)?;

    let status = response.status();
    let body = JsFuture::from(response.text().map_err(network)?)
        .await
        .map_err(network)?
        .as_string()
        .unwrap_or_default();

    UploadController::interpret(status, &body)
}
