//! File conversion tool and format rules.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Formats accepted as conversion input.
const SOURCE_FORMATS: &[&str] = &[
    "pdf", "docx", "doc", "pptx", "ppt", "xlsx", "xls", "jpg", "jpeg", "png", "webp", "txt", "csv",
];

/// Formats the conversion service can produce.
const TARGET_FORMATS: &[&str] = &["pdf", "docx", "pptx", "xlsx"];

/// Check a source/target pairing against the supported format tables.
pub fn validate_conversion(source_ext: &str, target: &str) -> Result<(), ToolError> {
    let source_ext = source_ext.to_ascii_lowercase();
    let target = target.to_ascii_lowercase();

    if !SOURCE_FORMATS.contains(&source_ext.as_str()) {
        return Err(ToolError::UnsupportedConversion(format!(
            "cannot convert from .{source_ext} files"
        )));
    }
    if !TARGET_FORMATS.contains(&target.as_str()) {
        return Err(ToolError::UnsupportedConversion(format!(
            "cannot convert to .{target} files"
        )));
    }
    if source_ext == target {
        return Err(ToolError::UnsupportedConversion(format!(
            "file is already in .{target} format"
        )));
    }
    Ok(())
}

/// The deterministic target used when no usable target was stated.
pub fn fallback_target(source_ext: &str) -> Option<&'static str> {
    match source_ext.to_ascii_lowercase().as_str() {
        "pdf" => Some("docx"),
        "doc" | "docx" | "ppt" | "pptx" | "xls" | "xlsx" => Some("pdf"),
        "jpg" | "jpeg" | "png" | "webp" => Some("pdf"),
        _ => None,
    }
}

/// Derive the output file name: `report.pdf` converted to docx becomes
/// `report_converted.docx`.
pub fn output_filename(source_name: &str, target: &str) -> String {
    let base = source_name
        .rsplit_once('.')
        .map(|(base, _)| base)
        .unwrap_or(source_name);
    format!("{base}_converted.{target}")
}

/// Mime type for a produced file.
pub fn mime_for(target: &str) -> &'static str {
    match target.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Deserialize)]
struct ConversionResponse {
    /// Base64 payload of the converted file.
    file: String,
}

/// Converts an attached file to another format via the conversion service.
///
/// # Parameters
///
/// - `target_format` (required): Desired output format.
/// - `file_data` (required): Base64 payload of the source file.
/// - `file_name` (required): Source file name, used for format detection
///   and output naming.
/// - `mime_type` (optional): Source mime type.
pub struct FileConversion {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl FileConversion {
    /// Create a conversion tool with explicit configuration.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Read configuration from `CONVERT_API_URL` and `CONVERT_API_KEY`.
    pub fn from_env() -> Result<Self, ToolError> {
        let api_url = env::var("CONVERT_API_URL")
            .map_err(|_| ToolError::ExecutionFailed("CONVERT_API_URL not set".to_string()))?;
        let api_key = env::var("CONVERT_API_KEY").unwrap_or_default();
        Self::new(api_url, api_key)
    }
}

#[async_trait]
impl Tool for FileConversion {
    fn name(&self) -> &str {
        "file_conversion"
    }

    fn description(&self) -> &str {
        "Converts a file from one format to another (e.g. PDF to DOCX)."
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let target = args.get_string("target_format")?.to_ascii_lowercase();
        let file_data = args.get_string("file_data")?;
        let file_name = args.get_string("file_name")?;
        let mime_type = args.get_string_opt("mime_type").unwrap_or_default();

        let source_ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .ok_or_else(|| ToolError::InvalidParameter {
                name: "file_name".to_string(),
                reason: "no file extension".to_string(),
            })?;

        validate_conversion(&source_ext, &target)?;

        debug!("Converting {} ({}) to {}", file_name, source_ext, target);

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "file": file_data,
                "fileName": file_name,
                "mimeType": mime_type,
                "targetFormat": target,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Conversion service returned {}", status);
            return Err(ToolError::ExecutionFailed(format!(
                "conversion service returned status {status}"
            )));
        }

        let converted: ConversionResponse = response.json().await?;
        let out_name = output_filename(&file_name, &target);
        let out_mime = mime_for(&target);

        Ok(
            ToolOutput::success("Here is your converted document.").with_payload(json!({
                "file": converted.file,
                "fileName": out_name,
                "mimeType": out_mime,
            })),
        )
    }
}
