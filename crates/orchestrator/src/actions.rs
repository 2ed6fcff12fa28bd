//! Tool action types dispatched by the engine.

use serde::{Deserialize, Serialize};

use chat_core::ToolCall;

/// Default audio duration in seconds when none was stated.
pub const DEFAULT_AUDIO_DURATION: f64 = 30.0;

fn default_duration() -> f64 {
    DEFAULT_AUDIO_DURATION
}

/// One tool action, recovered from a structured tool call or from
/// action JSON embedded in reply text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ToolAction {
    /// Generate an image from a prompt.
    GenerateImage { prompt: String },

    /// Generate a video clip from a prompt.
    GenerateVideo { prompt: String },

    /// Generate music or audio from a prompt.
    GenerateAudio {
        prompt: String,
        #[serde(default = "default_duration")]
        duration: f64,
    },

    /// Edit an existing image according to a prompt.
    ModifyImage { prompt: String },

    /// Search the web.
    WebSearch { query: String },

    /// Set a reminder or alarm.
    SetReminder {
        title: String,
        datetime: String,
        #[serde(default)]
        is_alarm: bool,
    },

    /// Convert an attached file to another format.
    FileConversion { target_format: String },
}

impl ToolAction {
    /// Build an action from a structured provider tool call.
    ///
    /// Returns `None` when the call names an unknown tool or is missing
    /// a required argument; such calls are dropped rather than failed.
    pub fn from_tool_call(call: &ToolCall) -> Option<Self> {
        match call.name.as_str() {
            "generate_image" => Some(Self::GenerateImage {
                prompt: call.arg_str("prompt")?.to_string(),
            }),
            "generate_video" => Some(Self::GenerateVideo {
                prompt: call.arg_str("prompt")?.to_string(),
            }),
            "generate_audio" => Some(Self::GenerateAudio {
                prompt: call.arg_str("prompt")?.to_string(),
                duration: call.arg_f64("duration").unwrap_or(DEFAULT_AUDIO_DURATION),
            }),
            "modify_image" => Some(Self::ModifyImage {
                prompt: call.arg_str("prompt")?.to_string(),
            }),
            "web_search" => Some(Self::WebSearch {
                query: call.arg_str("query")?.to_string(),
            }),
            "set_reminder" => Some(Self::SetReminder {
                title: call.arg_str("title")?.to_string(),
                datetime: call.arg_str("datetime")?.to_string(),
                is_alarm: call.arg_bool("is_alarm").unwrap_or(false),
            }),
            "file_conversion" => Some(Self::FileConversion {
                target_format: call.arg_str("target_format")?.to_string(),
            }),
            _ => None,
        }
    }

    /// The tool name this action dispatches to.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::GenerateImage { .. } => "generate_image",
            Self::GenerateVideo { .. } => "generate_video",
            Self::GenerateAudio { .. } => "generate_audio",
            Self::ModifyImage { .. } => "modify_image",
            Self::WebSearch { .. } => "web_search",
            Self::SetReminder { .. } => "set_reminder",
            Self::FileConversion { .. } => "file_conversion",
        }
    }

    /// Whether this action produces a media artifact.
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            Self::GenerateImage { .. }
                | Self::GenerateVideo { .. }
                | Self::GenerateAudio { .. }
                | Self::ModifyImage { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use serde_json::Value;

    fn call(name: &str, pairs: &[(&str, Value)]) -> ToolCall {
        let mut args = HashMap::new();
        for (k, v) in pairs {
            args.insert(k.to_string(), v.clone());
        }
        ToolCall::new(name, args)
    }

    #[test]
    fn test_parse_action_json() {
        let action: ToolAction =
            serde_json::from_str(r#"{"action": "generate_image", "prompt": "a red bicycle"}"#)
                .unwrap();
        assert_eq!(
            action,
            ToolAction::GenerateImage {
                prompt: "a red bicycle".to_string()
            }
        );
    }

    #[test]
    fn test_audio_duration_defaults() {
        let action: ToolAction =
            serde_json::from_str(r#"{"action": "generate_audio", "prompt": "lofi beats"}"#)
                .unwrap();
        assert_eq!(
            action,
            ToolAction::GenerateAudio {
                prompt: "lofi beats".to_string(),
                duration: 30.0
            }
        );
    }

    #[test]
    fn test_from_tool_call() {
        let action = ToolAction::from_tool_call(&call(
            "set_reminder",
            &[
                ("title", Value::String("standup".into())),
                ("datetime", Value::String("2026-09-01T09:00:00".into())),
            ],
        ))
        .unwrap();
        assert_eq!(
            action,
            ToolAction::SetReminder {
                title: "standup".to_string(),
                datetime: "2026-09-01T09:00:00".to_string(),
                is_alarm: false
            }
        );
    }

    #[test]
    fn test_from_tool_call_drops_incomplete() {
        // Missing required prompt
        assert!(ToolAction::from_tool_call(&call("generate_image", &[])).is_none());
        // Unknown tool
        assert!(ToolAction::from_tool_call(&call(
            "launch_rocket",
            &[("prompt", Value::String("x".into()))]
        ))
        .is_none());
    }

    #[test]
    fn test_media_classification() {
        let image: ToolAction =
            serde_json::from_str(r#"{"action": "generate_image", "prompt": "p"}"#).unwrap();
        let search: ToolAction =
            serde_json::from_str(r#"{"action": "web_search", "query": "q"}"#).unwrap();
        assert!(image.is_media());
        assert!(!search.is_media());
    }
}
