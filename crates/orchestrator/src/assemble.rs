//! Final response assembly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use chat_core::Mode;

use crate::dispatch::DispatchOutcome;
use crate::error::EngineError;

/// Reply used when no path produced any text.
const EMPTY_REPLY_PLACEHOLDER: &str =
    "I understood your request but couldn't generate a text response.";

/// Guidance reply when a media generation turn fails entirely.
const MEDIA_GUIDANCE_REPLY: &str = "I couldn't create that just now. Please try again in a \
     moment, or open the Magic Tools section and try from there.";

/// A converted file returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionFile {
    /// Base64 payload of the converted file.
    pub file: String,
    pub file_name: String,
    pub mime_type: String,
}

/// The complete response for one turn.
///
/// Failures are also carried in this shape with `success` kept true, so
/// clients always render a reply instead of an error screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalResponse {
    pub success: bool,
    pub reply: String,
    pub detected_mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_results: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_confirmation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion: Option<ConversionFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl FinalResponse {
    fn base(mode: Mode, reply: impl Into<String>) -> Self {
        Self {
            success: true,
            reply: reply.into(),
            detected_mode: mode,
            image_url: None,
            video_url: None,
            audio_url: None,
            search_results: None,
            reminder: None,
            voice_confirmation: None,
            conversion: None,
            error: None,
            details: None,
        }
    }

    /// Assemble a response from a dispatch outcome.
    pub fn from_outcome(mode: Mode, outcome: DispatchOutcome) -> Self {
        let reply = if outcome.reply.trim().is_empty() {
            EMPTY_REPLY_PLACEHOLDER.to_string()
        } else {
            outcome.reply
        };

        Self {
            image_url: outcome.image_url,
            video_url: outcome.video_url,
            audio_url: outcome.audio_url,
            search_results: outcome.search_results,
            reminder: outcome.reminder,
            voice_confirmation: outcome.voice_confirmation,
            ..Self::base(mode, reply)
        }
    }

    /// A successful conversion response.
    pub fn conversion_success(mode: Mode, reply: impl Into<String>, file: ConversionFile) -> Self {
        Self {
            conversion: Some(file),
            ..Self::base(mode, reply)
        }
    }

    /// A failed conversion, reported in the reply text.
    pub fn conversion_failure(mode: Mode, error: impl std::fmt::Display) -> Self {
        Self::base(mode, format!("Conversion failed: {error}"))
    }

    /// A plain text response with no tool effects.
    pub fn text(mode: Mode, reply: impl Into<String>) -> Self {
        Self::base(mode, reply)
    }

    /// Map a turn failure to the client-facing envelope.
    ///
    /// Media generation modes get a guidance reply. Everything else gets
    /// a system message carrying the failure details, with `success`
    /// still true so clients render it as a normal message.
    pub fn from_failure(mode: Mode, error: &EngineError) -> Self {
        if matches!(mode, Mode::ImageGen | Mode::VideoGen) {
            return Self::base(mode, MEDIA_GUIDANCE_REPLY);
        }

        let details = error.to_string();
        Self {
            error: Some("AI failed to respond".to_string()),
            details: Some(details.clone()),
            ..Self::base(
                mode,
                format!(
                    "System Message: AI failed to respond - {details}. \
                     Please try again later or check your network."
                ),
            )
        }
    }
}
