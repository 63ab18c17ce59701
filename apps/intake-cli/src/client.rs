//! HTTP client for the extraction backend

use std::time::Duration;

use anyhow::{Context, Result};
use intake_core::upload::{FILE_FIELD, TYPE_FIELD};
use intake_core::{DocumentType, IntakeConfig, UploadController, UploadError, UploadResponse};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tracing::debug;

const PDF_MIME: &str = "application/pdf";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub url: String,
    pub status: u16,
    pub body: serde_json::Value,
}

pub struct ExtractionClient {
    http: reqwest::Client,
    upload_url: String,
    health_url: String,
}

impl ExtractionClient {
    pub fn new(config: &IntakeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            upload_url: config.upload_url(),
            health_url: config.health_url(),
        })
    }

    /// POST the PDF as `multipart/form-data` with its document type
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        document_type: DocumentType,
    ) -> Result<UploadResponse, UploadError> {
        let network = |e: reqwest::Error| UploadError::Network(e.to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(PDF_MIME)
            .map_err(network)?;
        let form = Form::new()
            .part(FILE_FIELD, part)
            .text(TYPE_FIELD, document_type.as_str());

        debug!(url = %self.upload_url, file_name, %document_type, "sending upload");
        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(network)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(network)?;
        UploadController::interpret(status, &body)
    }

    /// Probe the backend's root endpoint
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .http
            .get(&self.health_url)
            .send()
            .await
            .with_context(|| format!("cannot reach {}", self.health_url))?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            anyhow::bail!("{} responded with status {}", self.health_url, status);
        }

        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
        Ok(HealthStatus {
            url: self.health_url.clone(),
            status: status.as_u16(),
            body,
        })
    }
}
