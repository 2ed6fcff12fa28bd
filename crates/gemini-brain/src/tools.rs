//! Tool function declarations offered to the model.

use serde_json::json;

use crate::api_types::{FunctionDeclaration, ToolDeclarations};

/// Build the declarations for every capability tool.
///
/// These are sent with each generation call so the model can trigger
/// tools natively instead of emitting JSON action text.
pub fn tool_declarations() -> Vec<ToolDeclarations> {
    vec![ToolDeclarations {
        function_declarations: vec![
            FunctionDeclaration {
                name: "generate_image".to_string(),
                description: "Generates a high-quality image from a text prompt.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "prompt": {
                            "type": "string",
                            "description": "Detailed description of the image to generate."
                        }
                    },
                    "required": ["prompt"]
                }),
            },
            FunctionDeclaration {
                name: "generate_video".to_string(),
                description: "Generates a cinematic video clip from a text prompt.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "prompt": {
                            "type": "string",
                            "description": "Detailed description of the video to generate."
                        }
                    },
                    "required": ["prompt"]
                }),
            },
            FunctionDeclaration {
                name: "generate_audio".to_string(),
                description: "Generates high-fidelity music or audio from a text prompt.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "prompt": {
                            "type": "string",
                            "description": "Detailed description of the music or audio to generate, including style and mood."
                        },
                        "duration": {
                            "type": "number",
                            "description": "Duration of the audio in seconds (default 30)."
                        }
                    },
                    "required": ["prompt"]
                }),
            },
            FunctionDeclaration {
                name: "modify_image".to_string(),
                description: "The primary tool for all image editing and modifications. \
                              Use this to remove backgrounds, erase objects or text, change \
                              colors, add elements, or transform existing images."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "prompt": {
                            "type": "string",
                            "description": "Exhaustive instructions for the edit (e.g. 'remove all text and fill background')."
                        }
                    },
                    "required": ["prompt"]
                }),
            },
            FunctionDeclaration {
                name: "web_search".to_string(),
                description: "Performs a real-time web search for information not present in the model's training data.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query to look up on the web."
                        }
                    },
                    "required": ["query"]
                }),
            },
            FunctionDeclaration {
                name: "set_reminder".to_string(),
                description: "Sets a reminder or alarm for the user.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "title": {
                            "type": "string",
                            "description": "The title or description of the reminder."
                        },
                        "datetime": {
                            "type": "string",
                            "description": "The date and time for the reminder in ISO format."
                        },
                        "is_alarm": {
                            "type": "boolean",
                            "description": "Whether this is an alarm (true) or just a reminder (false)."
                        }
                    },
                    "required": ["title", "datetime"]
                }),
            },
            FunctionDeclaration {
                name: "file_conversion".to_string(),
                description: "Converts a file from one format to another (e.g., PDF to DOCX, PPTX to PDF).".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "target_format": {
                            "type": "string",
                            "description": "The desired output format (pdf, docx, pptx, xlsx)."
                        }
                    },
                    "required": ["target_format"]
                }),
            },
        ],
    }]
}
