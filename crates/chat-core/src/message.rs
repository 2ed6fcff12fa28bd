//! Message, attachment, and turn request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mode::Mode;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    System,
}

impl Role {
    /// Get the wire name used by provider-neutral history.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
            Self::System => "system",
        }
    }
}

/// Broad attachment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    Document,
}

impl AttachmentKind {
    /// Derive the kind from a mime type string.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("video/") {
            Self::Video
        } else if mime.starts_with("audio/") {
            Self::Audio
        } else {
            Self::Document
        }
    }
}

/// A file attached to a message.
///
/// `data` holds either a base64 payload or a URL reference; the engine
/// passes it through to providers without decoding. Clients send
/// `{mimeType, base64Data, name}`; the kind is derived from the mime
/// type when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "AttachmentWire")]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub mime_type: String,
    pub data: String,
    #[serde(default)]
    pub name: String,
}

/// The inbound attachment shape, with the wire field names.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachmentWire {
    #[serde(default)]
    kind: Option<AttachmentKind>,
    #[serde(alias = "mime_type")]
    mime_type: String,
    #[serde(alias = "base64Data")]
    data: String,
    #[serde(default)]
    name: String,
}

impl From<AttachmentWire> for Attachment {
    fn from(wire: AttachmentWire) -> Self {
        Self {
            kind: wire
                .kind
                .unwrap_or_else(|| AttachmentKind::from_mime(&wire.mime_type)),
            mime_type: wire.mime_type,
            data: wire.data,
            name: wire.name,
        }
    }
}

impl Attachment {
    /// Create an attachment, deriving the kind from the mime type.
    pub fn new(
        mime_type: impl Into<String>,
        data: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let mime_type = mime_type.into();
        Self {
            kind: AttachmentKind::from_mime(&mime_type),
            mime_type,
            data: data.into(),
            name: name.into(),
        }
    }

    /// Create an image attachment.
    pub fn image(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(mime_type, data, "image")
    }

    /// Create a document attachment.
    pub fn document(
        mime_type: impl Into<String>,
        data: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::new(mime_type, data, name)
    }

    /// Whether this attachment is an image.
    pub fn is_image(&self) -> bool {
        self.kind == AttachmentKind::Image || self.mime_type.starts_with("image/")
    }

    /// The lower-cased file extension from the attachment name, if any.
    pub fn extension(&self) -> Option<String> {
        let ext = self.name.rsplit('.').next()?;
        if ext == self.name {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// A single message in conversation history. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    // Client-supplied history entries usually carry no timestamp.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl HistoryMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attachments: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Create a model (assistant) message.
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
            attachments: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach files to this message.
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// One inbound user turn, as received by the engine.
///
/// Wire names are camelCase, with the persona fields also accepted
/// under their client names `agentType`/`agentCategory` and the search
/// flag under `isDeepSearch`. Snake_case spellings are accepted too.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    /// The user's message text.
    pub content: String,
    /// Prior conversation, oldest first.
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
    /// Attachments on the current message.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Session this turn belongs to.
    #[serde(alias = "session_id")]
    pub session_id: String,
    /// Explicit mode; overrides classification when present.
    pub mode: Option<Mode>,
    /// Preferred reply language hint from the caller.
    pub language: Option<String>,
    /// Model hint; a non-default hint routes to an alternate provider.
    pub model: Option<String>,
    /// Caller-supplied system instruction override.
    #[serde(alias = "system_instruction")]
    pub system_instruction: Option<String>,
    /// Active persona name (e.g. "Video Creator").
    #[serde(alias = "agentType", alias = "persona_name")]
    pub persona_name: Option<String>,
    /// Active persona category.
    #[serde(alias = "agentCategory", alias = "persona_category")]
    pub persona_category: Option<String>,
    /// Deep-search flag; raises the web search snippet limit.
    #[serde(default, alias = "isDeepSearch", alias = "deep_search")]
    pub deep_search: bool,
}

impl TurnRequest {
    /// Create a minimal turn request.
    pub fn new(content: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            session_id: session_id.into(),
            ..Self::default()
        }
    }

    /// Set attachments.
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Set conversation history.
    pub fn with_history(mut self, history: Vec<HistoryMessage>) -> Self {
        self.history = history;
        self
    }

    /// First image attachment on the current message, if any.
    pub fn first_image(&self) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.is_image())
    }

    /// Most recent image attachment in history, scanning newest to oldest.
    pub fn latest_history_image(&self) -> Option<&Attachment> {
        self.history
            .iter()
            .rev()
            .find_map(|msg| msg.attachments.iter().find(|a| a.is_image()))
    }
}
