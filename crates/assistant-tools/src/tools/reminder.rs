//! Reminder tool.
//!
//! Produces the confirmation text and a structured payload the client
//! app uses to schedule the reminder locally. Nothing is persisted
//! server side.

use async_trait::async_trait;
use chat_core::Language;
use serde_json::json;
use tracing::debug;

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Sets a reminder or alarm for the user.
///
/// # Parameters
///
/// - `title` (required): What the reminder is about.
/// - `datetime` (required): ISO timestamp for the reminder.
/// - `is_alarm` (optional): Whether it rings as an alarm. Defaults to false.
pub struct SetReminder;

impl SetReminder {
    pub fn new() -> Self {
        Self
    }

    /// The confirmation sentence, localized to the reply language.
    pub fn confirmation(title: &str, time: &str, language: Language) -> String {
        if language.is_hindi_family() {
            format!("Theek hai, main {time} par \"{title}\" ke liye reminder set kar dungi.")
        } else {
            format!("Okay, I've set a reminder for \"{title}\" at {time}.")
        }
    }
}

impl Default for SetReminder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SetReminder {
    fn name(&self) -> &str {
        "set_reminder"
    }

    fn description(&self) -> &str {
        "Sets a reminder or alarm for the user; the client app schedules it."
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let title = args.get_string("title")?;
        let datetime = args.get_string("datetime")?;
        let is_alarm = args.get_bool_or("is_alarm", false);

        debug!("Setting reminder '{}' at {} (alarm: {})", title, datetime, is_alarm);

        let content = Self::confirmation(&title, &datetime, args.language);
        Ok(ToolOutput::success(content).with_payload(json!({
            "title": title,
            "datetime": datetime,
            "isAlarm": is_alarm,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use serde_json::Value;

    fn reminder_params(title: &str, datetime: &str) -> HashMap<String, Value> {
        let mut params = HashMap::new();
        params.insert("title".to_string(), Value::String(title.to_string()));
        params.insert("datetime".to_string(), Value::String(datetime.to_string()));
        params
    }

    #[tokio::test]
    async fn test_english_confirmation() {
        let tool = SetReminder::new();
        let args = ToolArgs::new(reminder_params("call mom", "2026-09-01T18:00:00"));
        let result = tool.execute(args).await.unwrap();

        assert!(result.success);
        assert_eq!(
            result.content,
            "Okay, I've set a reminder for \"call mom\" at 2026-09-01T18:00:00."
        );
        assert_eq!(result.payload.unwrap()["isAlarm"], false);
    }

    #[tokio::test]
    async fn test_hinglish_confirmation() {
        let tool = SetReminder::new();
        let args = ToolArgs::with_context(
            reminder_params("dawai lena", "9 PM"),
            Language::Hinglish,
            false,
        );
        let result = tool.execute(args).await.unwrap();
        assert_eq!(
            result.content,
            "Theek hai, main 9 PM par \"dawai lena\" ke liye reminder set kar dungi."
        );
    }

    #[tokio::test]
    async fn test_missing_datetime() {
        let tool = SetReminder::new();
        let mut params = HashMap::new();
        params.insert("title".to_string(), Value::String("x".to_string()));
        let result = tool.execute(ToolArgs::new(params)).await;
        assert!(matches!(result, Err(ToolError::MissingParameter(_))));
    }
}
