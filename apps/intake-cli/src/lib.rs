//! Contract intake from the command line
//!
//! Runs the same session flow as the browser page: pick a document type, upload a PDF to the
//! extraction backend, review or correct the extracted fields and write the XLSX report.

pub mod client;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use intake_core::{
    DocumentType, FieldRow, IntakeConfig, IntakeSession, NotificationLevel, PdfDocument,
    UploadOutcome,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::client::{ExtractionClient, HealthStatus};

#[derive(Debug, Parser)]
#[command(name = "intake")]
#[command(version, about = "Extract contract fields from a PDF and export them as a report")]
pub struct Cli {
    /// Base URL of the extraction backend
    #[arg(long, global = true, env = "INTAKE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// JSON configuration file (partial; missing keys use defaults)
    #[arg(long, global = true, env = "INTAKE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the field names collected for a document type
    Schema {
        #[arg(long = "type", default_value = "SOW")]
        document_type: DocumentType,
    },
    /// Print page count and page sizes of a PDF
    Inspect {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Upload a PDF, apply corrections and write the report
    Upload(UploadArgs),
    /// Check that the backend is reachable
    Health,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[arg(long = "type", default_value = "SOW")]
    pub document_type: DocumentType,

    /// Set a field directly, e.g. `--set reviewer_name="J. Doe"`
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub assignments: Vec<(String, String)>,

    /// Correct an extracted field and its page, e.g. `--edit sow_no=SOW-12@3`
    #[arg(long = "edit", value_name = "NAME=VALUE@PAGE", value_parser = parse_edit)]
    pub edits: Vec<FieldEdit>,

    /// Where to write the report; a directory gets the configured report file name
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdit {
    pub name: String,
    pub value: String,
    pub page: String,
}

#[derive(Debug, Serialize)]
pub struct SchemaOutput {
    pub document_type: DocumentType,
    pub extracted: Vec<&'static str>,
    pub user: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct PageOutput {
    pub page: u32,
    pub width: f64,
    pub height: f64,
    /// Canvas size at the configured initial zoom
    pub viewport: (u32, u32),
}

#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub path: String,
    pub page_count: u32,
    pub version: String,
    pub encrypted: bool,
    pub title: Option<String>,
    pub pages: Vec<PageOutput>,
}

#[derive(Debug, Serialize)]
pub struct UploadSummary {
    pub file_name: String,
    pub document_type: DocumentType,
    pub page_count: Option<u32>,
    pub fields: Vec<FieldRow>,
    pub missing: Vec<String>,
    pub out_of_range: Vec<String>,
    pub report: Option<PathBuf>,
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.endpoint)?;

    match cli.command {
        Commands::Schema { document_type } => print_json(&schema(document_type)),
        Commands::Inspect { file } => print_json(&inspect(&config, &file)?),
        Commands::Upload(args) => print_json(&upload(config, args).await?),
        Commands::Health => print_json(&health(&config).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Defaults, then the config file, then the endpoint override
pub fn load_config(path: Option<&Path>, endpoint: Option<String>) -> Result<IntakeConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => IntakeConfig::default(),
    };

    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
    }
    config.validate()?;
    Ok(config)
}

pub fn schema(document_type: DocumentType) -> SchemaOutput {
    SchemaOutput {
        document_type,
        extracted: document_type.extracted_fields().to_vec(),
        user: intake_core::schema::USER_FIELDS.to_vec(),
    }
}

pub fn inspect(config: &IntakeConfig, file: &Path) -> Result<InspectOutput> {
    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let document = PdfDocument::load(&bytes)?;

    let pages = (1..=document.page_count())
        .map(|page| -> Result<PageOutput> {
            let size = document.page_size(page)?;
            Ok(PageOutput {
                page,
                width: size.width,
                height: size.height,
                viewport: size.viewport(config.initial_scale),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let info = document.info();
    Ok(InspectOutput {
        path: file.display().to_string(),
        page_count: info.page_count,
        version: info.version.clone(),
        encrypted: info.encrypted,
        title: info.title.clone(),
        pages,
    })
}

pub async fn upload(config: IntakeConfig, args: UploadArgs) -> Result<UploadSummary> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("failed to read {}", args.file.display()))?;
    let file_name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", args.file.display()))?;

    let client = ExtractionClient::new(&config)?;
    let mut session = IntakeSession::new(config)?;
    session.select_document_type(args.document_type);
    let selection = session.select_file(&file_name)?;

    // No drawing surface here: a render counts as done as soon as it is requested
    let page_count = PdfDocument::load(&bytes).map(|doc| doc.page_count());
    let loaded = page_count.as_ref().ok().copied();
    let load = page_count.map_err(|e| e.to_string());
    if let Some(first) = session.load_finished(selection.load, load) {
        session.render_finished(&first, Ok(()));
    }

    let result = client.upload(bytes, &file_name, args.document_type).await;
    let outcome = session.upload_finished(&selection.upload, result);

    let mut failure = None;
    for note in session.take_notifications() {
        match note.level {
            NotificationLevel::Info => info!("{}", note.message),
            NotificationLevel::Error => {
                error!("{}", note.message);
                failure = Some(note.message);
            }
        }
    }

    let report = match outcome {
        UploadOutcome::Applied(report) => report,
        UploadOutcome::Failed(err) => {
            anyhow::bail!(failure.unwrap_or_else(|| err.to_string()))
        }
        UploadOutcome::Stale => anyhow::bail!("upload was superseded"),
    };

    for (name, value) in &args.assignments {
        session
            .set_field_value(name, value)
            .with_context(|| format!("cannot set {}", name))?;
    }
    for edit in &args.edits {
        apply_edit(&mut session, edit).with_context(|| format!("cannot edit {}", edit.name))?;
    }

    let out_of_range = session.out_of_range_fields();
    if !out_of_range.is_empty() {
        warn!(fields = ?out_of_range, "some fields point past the last page");
    }

    let report_path = match &args.output {
        Some(output) => {
            let blob = session.download()?;
            let path = if output.is_dir() {
                output.join(&blob.file_name)
            } else {
                output.clone()
            };
            fs::write(&path, &blob.bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = blob.bytes.len(), "report written");
            Some(path)
        }
        None => None,
    };

    Ok(UploadSummary {
        file_name,
        document_type: session.document_type(),
        page_count: loaded,
        fields: session.rows(),
        missing: report.missing,
        out_of_range,
        report: report_path,
    })
}

fn apply_edit(session: &mut IntakeSession, edit: &FieldEdit) -> Result<()> {
    session.open_editor(&edit.name)?;
    session.set_editor_value(&edit.value);
    session.set_editor_page(&edit.page);
    if let Err(err) = session.submit_editor() {
        session.cancel_editor();
        return Err(err.into());
    }
    Ok(())
}

pub async fn health(config: &IntakeConfig) -> Result<HealthStatus> {
    ExtractionClient::new(config)?.health().await
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {:?}", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in {:?}", s));
    }
    Ok((name.to_string(), value.to_string()))
}

fn parse_edit(s: &str) -> Result<FieldEdit, String> {
    let (name, rest) = parse_assignment(s)?;
    let (value, page) = rest
        .rsplit_once('@')
        .ok_or_else(|| format!("expected NAME=VALUE@PAGE, got {:?}", s))?;
    Ok(FieldEdit {
        name,
        value: value.to_string(),
        page: page.to_string(),
    })
}
