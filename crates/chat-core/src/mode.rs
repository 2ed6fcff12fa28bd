//! Turn mode classification.
//!
//! `detect_mode` is a pure, total function over the message text and
//! attachments. Rules are checked in priority order and the first match
//! wins; matching is case-insensitive substring matching on the trimmed
//! message.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::message::Attachment;

/// The behavioral mode selected for one turn.
///
/// Derived per request, never stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    NormalChat,
    FileAnalysis,
    FileConversion,
    ContentWriting,
    CodingHelp,
    TaskAssistant,
    DeepSearch,
    ImageGen,
    VideoGen,
    AudioGen,
    ImageEdit,
}

impl Mode {
    /// Wire tag for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NormalChat => "NORMAL_CHAT",
            Self::FileAnalysis => "FILE_ANALYSIS",
            Self::FileConversion => "FILE_CONVERSION",
            Self::ContentWriting => "CONTENT_WRITING",
            Self::CodingHelp => "CODING_HELP",
            Self::TaskAssistant => "TASK_ASSISTANT",
            Self::DeepSearch => "DEEP_SEARCH",
            Self::ImageGen => "IMAGE_GEN",
            Self::VideoGen => "VIDEO_GEN",
            Self::AudioGen => "AUDIO_GEN",
            Self::ImageEdit => "IMAGE_EDIT",
        }
    }

    /// Human-readable name for display.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::NormalChat => "Chat",
            Self::FileAnalysis => "File Analysis",
            Self::FileConversion => "File Conversion",
            Self::ContentWriting => "Content Writing",
            Self::CodingHelp => "Coding Help",
            Self::TaskAssistant => "Task Assistant",
            Self::DeepSearch => "Deep Search",
            Self::ImageGen => "Image Gen",
            Self::VideoGen => "Video Gen",
            Self::AudioGen => "Audio Gen",
            Self::ImageEdit => "Image Edit",
        }
    }

    /// Whether this mode triggers the media-generation reply handling.
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            Self::ImageGen | Self::VideoGen | Self::AudioGen | Self::ImageEdit
        )
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::NormalChat
    }
}

const IMAGE_NOUNS: &[&str] = &["image", "photo", "pic", "draw"];
const IMAGE_VERBS: &[&str] = &["generate", "create", "make", "draw", "show"];
const VIDEO_VERBS: &[&str] = &["generate", "create", "make"];
const AUDIO_NOUNS: &[&str] = &["audio", "sound", "music", "voice", "song"];
const AUDIO_VERBS: &[&str] = &["generate", "create", "make", "compose"];

const CODING_KEYWORDS: &[&str] = &[
    "code", "function", "class", "debug", "error", "bug", "programming",
    "javascript", "python", "java", "rust", "react", "node", "api",
    "algorithm", "syntax", "compile", "runtime", "variable", "loop", "array",
    "object", "database", "sql", "html", "css", "typescript", "component",
    "import", "export", "async", "await", "promise", "callback",
    "fix this code", "write a function", "create a script", "implement",
    "refactor",
];

const WRITING_KEYWORDS: &[&str] = &[
    "write", "article", "blog", "essay", "content", "draft", "compose",
    "create a post", "write about", "paragraph", "story", "letter",
    "email template", "description", "summary", "report", "document",
    "copywriting", "marketing copy", "social media post", "caption",
    "headline", "slogan", "tagline", "press release",
];

const TASK_KEYWORDS: &[&str] = &[
    "task", "todo", "plan", "schedule", "organize", "goal", "objective",
    "remind", "reminder", "alarm",
    "steps", "how to", "guide me", "help me plan", "breakdown", "roadmap",
    "timeline", "priority", "checklist", "action items", "strategy",
    "project plan", "workflow", "process", "milestone",
];

const CONVERSION_KEYWORDS: &[&str] = &[
    "convert", "change format", "make it", "turn into", "transform",
    "pdf to word", "word to pdf", "pdf to doc", "doc to pdf", "docx to pdf",
    "pdf to docx", "convert karo", "badlo", "format change", "file convert",
    "is file ko", "convert this", "make this a", "change this to",
    "into pdf", "to pdf", "into word", "to word", "into doc", "to doc",
    "me convert", "pdf me", "word me", "doc me",
    "pptx to pdf", "ppt to pdf", "excel to pdf", "xlsx to pdf",
    "image to pdf", "jpg to pdf", "png to pdf", "webp to pdf", "txt to pdf",
];

const IMAGE_EDIT_KEYWORDS: &[&str] = &[
    "edit", "modify", "remove", "erase", "retouch", "replace",
    "change the", "background", "make it look",
];

// Code-like syntax: fenced blocks, declarations, tags, comments.
static CODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```|function\s*\(|const\s+\w+\s*=|class\s+\w+|import\s+.*from|<\w+>|\{\s*\w+:|//|/\*")
        .expect("code pattern regex is valid")
});

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|kw| haystack.contains(kw))
}

/// Classify one user turn into a [`Mode`].
///
/// Priority order, first match wins:
/// 1. media-generation intent (video before image before audio)
/// 2. attachments present: image edit, then conversion, else file analysis
/// 3. coding keywords or code-like syntax
/// 4. writing keywords
/// 5. task keywords
/// 6. normal chat
pub fn detect_mode(message: &str, attachments: &[Attachment]) -> Mode {
    let lower = message.to_lowercase();
    let lower = lower.trim();

    // Video before image before audio: "make a video from this picture"
    // must resolve to video generation.
    if lower.contains("video") && contains_any(lower, VIDEO_VERBS) {
        return Mode::VideoGen;
    }

    if contains_any(lower, IMAGE_NOUNS) && contains_any(lower, IMAGE_VERBS) {
        return Mode::ImageGen;
    }

    if contains_any(lower, AUDIO_NOUNS) && contains_any(lower, AUDIO_VERBS) {
        return Mode::AudioGen;
    }

    if !attachments.is_empty() {
        let has_image = attachments.iter().any(|a| a.is_image());
        if has_image && contains_any(lower, IMAGE_EDIT_KEYWORDS) {
            return Mode::ImageEdit;
        }
        if contains_any(lower, CONVERSION_KEYWORDS) {
            return Mode::FileConversion;
        }
        return Mode::FileAnalysis;
    }

    if contains_any(lower, CODING_KEYWORDS) || CODE_PATTERN.is_match(message) {
        return Mode::CodingHelp;
    }

    if contains_any(lower, WRITING_KEYWORDS) {
        return Mode::ContentWriting;
    }

    if contains_any(lower, TASK_KEYWORDS) {
        return Mode::TaskAssistant;
    }

    Mode::NormalChat
}

/// Coerce a `NormalChat` classification toward a specialized persona.
///
/// Last-resort tie-break: when detection yields normal chat but the active
/// persona's name carries a domain hint, the matching specialized mode is
/// used instead. Any other detected mode is left untouched.
pub fn coerce_for_persona(detected: Mode, persona_name: &str) -> Mode {
    if detected != Mode::NormalChat {
        return detected;
    }
    let lower = persona_name.to_lowercase();
    if lower.contains("video") {
        Mode::VideoGen
    } else if lower.contains("image") {
        if lower.contains("edit") || lower.contains("modify") {
            Mode::ImageEdit
        } else {
            Mode::ImageGen
        }
    } else if lower.contains("music") || lower.contains("lyria") || lower.contains("audio") {
        Mode::AudioGen
    } else {
        detected
    }
}
