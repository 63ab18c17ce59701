//! Front-end configuration shared by the browser app and the CLI

use serde::{Deserialize, Serialize};

use crate::error::{IntakeError, Result};
use crate::export::REPORT_FILE_NAME;
use crate::viewer::ZoomSettings;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";
pub const DEFAULT_UPLOAD_PATH: &str = "/upload";
pub const DEFAULT_PDF_WORKER_SRC: &str =
    "https://cdn.jsdelivr.net/npm/pdfjs-dist@3.11.174/build/pdf.worker.min.js";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntakeConfig {
    /// Base URL of the extraction backend
    pub endpoint: String,
    pub upload_path: String,
    pub report_file_name: String,
    pub initial_scale: f64,
    pub zoom_step: f64,
    pub min_scale: f64,
    pub pdf_worker_src: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        let zoom = ZoomSettings::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            upload_path: DEFAULT_UPLOAD_PATH.to_string(),
            report_file_name: REPORT_FILE_NAME.to_string(),
            initial_scale: zoom.initial_scale,
            zoom_step: zoom.step,
            min_scale: zoom.min_scale,
            pdf_worker_src: DEFAULT_PDF_WORKER_SRC.to_string(),
        }
    }
}

impl IntakeConfig {
    pub fn upload_url(&self) -> String {
        join_url(&self.endpoint, &self.upload_path)
    }

    /// URL of the backend's `GET /` health probe
    pub fn health_url(&self) -> String {
        join_url(&self.endpoint, "/")
    }

    pub fn zoom(&self) -> ZoomSettings {
        ZoomSettings {
            initial_scale: self.initial_scale,
            step: self.zoom_step,
            min_scale: self.min_scale,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(IntakeError::InvalidConfig("endpoint is empty".to_string()));
        }
        if self.report_file_name.trim().is_empty() {
            return Err(IntakeError::InvalidConfig(
                "report file name is empty".to_string(),
            ));
        }
        if self.zoom_step <= 0.0 || self.min_scale <= 0.0 {
            return Err(IntakeError::InvalidConfig(
                "zoom step and minimum scale must be positive".to_string(),
            ));
        }
        if self.initial_scale < self.min_scale {
            return Err(IntakeError::InvalidConfig(format!(
                "initial scale {} is below the minimum {}",
                self.initial_scale, self.min_scale
            )));
        }
        Ok(())
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        format!("{}/", base)
    } else {
        format!("{}/{}", base, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IntakeConfig::default();
        assert_eq!(config.upload_url(), "http://localhost:8000/upload");
        assert_eq!(config.health_url(), "http://localhost:8000/");
        assert_eq!(config.report_file_name, "Contract_Report.xlsx");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_url_join_slashes() {
        let config = IntakeConfig {
            endpoint: "https://api.example.com/".to_string(),
            upload_path: "upload".to_string(),
            ..Default::default()
        };
        assert_eq!(config.upload_url(), "https://api.example.com/upload");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: IntakeConfig =
            serde_json::from_str(r#"{"endpoint":"http://10.0.0.5:8080","initialScale":1.0}"#)
                .unwrap();
        assert_eq!(config.endpoint, "http://10.0.0.5:8080");
        assert_eq!(config.initial_scale, 1.0);
        assert_eq!(config.zoom_step, 0.25);
        assert_eq!(config.upload_path, "/upload");
    }

    #[test]
    fn test_validate_rejects_bad_zoom() {
        let config = IntakeConfig {
            initial_scale: 0.25,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(IntakeError::InvalidConfig(_))
        ));

        let config = IntakeConfig {
            zoom_step: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
