//! The turn engine.
//!
//! One `process` call runs a full turn: resolve the reply language and
//! mode, build the system instruction, route the generation call,
//! dispatch any tool activity, and assemble the final response. File
//! conversion turns take their own path because the converted bytes,
//! not the model text, are the product.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use assistant_tools::{ToolError, ToolRegistry};
use chat_core::{
    build_instruction, coerce_for_persona, detect_language, detect_mode, HistoryMessage,
    InstructionContext, Language, Mode, ModelRequest, SessionStore, TurnRequest, DEFAULT_CATEGORY,
};

use crate::assemble::{ConversionFile, FinalResponse};
use crate::config::EngineConfig;
use crate::dispatch::Dispatcher;
use crate::error::EngineError;
use crate::extract::{conversion_reply_text, extract_conversion};
use crate::router::ProviderRouter;

/// The turn engine.
pub struct ChatEngine {
    router: Arc<ProviderRouter>,
    dispatcher: Dispatcher,
    registry: Arc<ToolRegistry>,
    sessions: Arc<SessionStore>,
}

impl ChatEngine {
    /// Create an engine from its collaborators.
    pub fn new(router: Arc<ProviderRouter>, registry: Arc<ToolRegistry>, config: &EngineConfig) -> Self {
        Self {
            router,
            dispatcher: Dispatcher::new(Arc::clone(&registry)),
            registry,
            sessions: Arc::new(SessionStore::with_limits(
                config.max_history_turns,
                config.max_sessions,
            )),
        }
    }

    /// The session store, for ownership linking at the API boundary.
    pub fn sessions(&self) -> Arc<SessionStore> {
        Arc::clone(&self.sessions)
    }

    /// Process one turn.
    pub async fn process(&self, request: &TurnRequest) -> Result<FinalResponse, EngineError> {
        let language = resolve_language(request);
        let mode = resolve_mode(request);

        info!(
            session = %request.session_id,
            mode = mode.as_str(),
            language = language.as_str(),
            attachments = request.attachments.len(),
            "processing turn"
        );

        let ctx = instruction_context(request);
        let instruction = build_instruction(
            mode,
            &ctx,
            request.system_instruction.as_deref(),
            Utc::now(),
        );

        let history = if request.history.is_empty() {
            self.sessions.get(&request.session_id).await
        } else {
            request.history.clone()
        };

        let model_request = ModelRequest {
            system_instruction: instruction.clone(),
            history,
            content: request.content.clone(),
            attachments: request.attachments.clone(),
            model: request.model.clone(),
            enable_tools: true,
        };

        let response = if mode == Mode::FileConversion {
            self.process_conversion(request, mode, &model_request).await?
        } else {
            let reply = self.router.generate(&model_request).await?;
            let outcome = self
                .dispatcher
                .dispatch(&self.router, request, &instruction, language, reply)
                .await;

            match outcome.conversion_request.clone() {
                Some(target) => {
                    let reply_text = if outcome.reply.trim().is_empty() {
                        "Here is your converted document.".to_string()
                    } else {
                        outcome.reply.clone()
                    };
                    match self.run_conversion(request, &target).await {
                        Ok(file) => FinalResponse::conversion_success(mode, reply_text, file),
                        Err(e) => {
                            warn!(error = %e, "conversion failed");
                            FinalResponse::conversion_failure(mode, e)
                        }
                    }
                }
                None => FinalResponse::from_outcome(mode, outcome),
            }
        };

        self.sessions
            .append_exchange(
                &request.session_id,
                HistoryMessage::user(&request.content)
                    .with_attachments(request.attachments.clone()),
                HistoryMessage::model(&response.reply),
            )
            .await;

        Ok(response)
    }

    /// The conversion path: ask the model for conversion parameters,
    /// fall back to a deterministic target when it fails to state one,
    /// and run the conversion service.
    async fn process_conversion(
        &self,
        request: &TurnRequest,
        mode: Mode,
        model_request: &ModelRequest,
    ) -> Result<FinalResponse, EngineError> {
        if request.attachments.is_empty() {
            return Ok(FinalResponse::conversion_failure(
                mode,
                "no file was attached",
            ));
        }

        let reply = self.router.generate(model_request).await?;

        let target = extract_conversion(&reply.text)
            .map(|p| p.target_format)
            .or_else(|| {
                let ext = request.attachments[0].extension()?;
                let target = assistant_tools::fallback_target(&ext)?;
                info!(source = %ext, target, "model stated no target, using deterministic fallback");
                Some(target.to_string())
            });

        let target = match target {
            Some(t) => t,
            None => {
                return Ok(FinalResponse::conversion_failure(
                    mode,
                    "could not determine a target format for this file",
                ))
            }
        };

        match self.run_conversion(request, &target).await {
            Ok(file) => Ok(FinalResponse::conversion_success(
                mode,
                conversion_reply_text(&reply.text),
                file,
            )),
            Err(e) => {
                warn!(error = %e, "conversion failed");
                Ok(FinalResponse::conversion_failure(mode, e))
            }
        }
    }

    async fn run_conversion(
        &self,
        request: &TurnRequest,
        target: &str,
    ) -> Result<ConversionFile, ToolError> {
        let attachment = request
            .attachments
            .first()
            .ok_or_else(|| ToolError::ExecutionFailed("no file was attached".to_string()))?;

        let mut params = HashMap::new();
        params.insert(
            "target_format".to_string(),
            Value::String(target.to_string()),
        );
        params.insert(
            "file_data".to_string(),
            Value::String(attachment.data.clone()),
        );
        params.insert(
            "file_name".to_string(),
            Value::String(attachment.name.clone()),
        );
        params.insert(
            "mime_type".to_string(),
            Value::String(attachment.mime_type.clone()),
        );

        let out = self.registry.execute("file_conversion", params).await?;
        let payload = out
            .payload
            .ok_or_else(|| ToolError::ExecutionFailed("conversion returned no file".to_string()))?;

        serde_json::from_value(payload)
            .map_err(|e| ToolError::ExecutionFailed(format!("bad conversion payload: {e}")))
    }
}

fn resolve_language(request: &TurnRequest) -> Language {
    match request.language.as_deref().map(str::to_lowercase) {
        Some(hint) if hint == "hindi" => Language::Hindi,
        Some(hint) if hint == "hinglish" => Language::Hinglish,
        Some(hint) if hint == "english" => Language::English,
        _ => detect_language(&request.content),
    }
}

fn resolve_mode(request: &TurnRequest) -> Mode {
    if let Some(mode) = request.mode {
        return mode;
    }
    if request.deep_search {
        return Mode::DeepSearch;
    }
    let detected = detect_mode(&request.content, &request.attachments);
    match request.persona_name.as_deref() {
        Some(persona) => coerce_for_persona(detected, persona),
        None => detected,
    }
}

fn instruction_context(request: &TurnRequest) -> InstructionContext {
    let mut ctx = match request.persona_name.as_deref() {
        Some(name) => InstructionContext::for_persona(
            name,
            request
                .persona_category
                .as_deref()
                .unwrap_or(DEFAULT_CATEGORY),
        ),
        None => InstructionContext::default(),
    };
    ctx.file_count = request.attachments.len();
    ctx.explicit_mode = request.mode.is_some();
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use assistant_tools::{async_trait, Tool, ToolArgs, ToolOutput};
    use chat_core::{Attachment, ProviderError, ProviderReply};
    use mock_model::ScriptedModel;
    use serde_json::json;

    struct FakeConverter;

    #[async_trait]
    impl Tool for FakeConverter {
        fn name(&self) -> &str {
            "file_conversion"
        }
        fn description(&self) -> &str {
            "test conversion tool"
        }
        async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
            let target = args.get_string("target_format")?;
            let name = args.get_string("file_name")?;
            Ok(
                ToolOutput::success("Here is your converted document.").with_payload(json!({
                    "file": "Q09OVkVSVEVE",
                    "fileName": assistant_tools::output_filename(&name, &target),
                    "mimeType": assistant_tools::mime_for(&target),
                })),
            )
        }
    }

    fn engine_with(replies: Vec<Result<ProviderReply, ProviderError>>) -> ChatEngine {
        let router = Arc::new(ProviderRouter::new(Arc::new(ScriptedModel::new(replies))));
        let mut registry = ToolRegistry::new();
        registry.register(FakeConverter);
        registry.register(assistant_tools::SetReminder::new());
        ChatEngine::new(router, Arc::new(registry), &EngineConfig::default())
    }

    #[tokio::test]
    async fn test_plain_chat_turn() {
        let engine = engine_with(vec![Ok(ProviderReply::text_only("Hello! How can I help?"))]);
        let request = TurnRequest::new("hi there", "s1");

        let response = engine.process(&request).await.unwrap();
        assert!(response.success);
        assert_eq!(response.reply, "Hello! How can I help?");
        assert_eq!(response.detected_mode, Mode::NormalChat);
    }

    #[tokio::test]
    async fn test_turn_appends_session_history() {
        let engine = engine_with(vec![
            Ok(ProviderReply::text_only("First reply")),
            Ok(ProviderReply::text_only("Second reply")),
        ]);

        engine
            .process(&TurnRequest::new("first message", "s1"))
            .await
            .unwrap();
        engine
            .process(&TurnRequest::new("second message", "s1"))
            .await
            .unwrap();

        let history = engine.sessions().get("s1").await;
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].content, "first message");
        assert_eq!(history[3].content, "Second reply");
    }

    #[tokio::test]
    async fn test_explicit_mode_wins_over_detection() {
        let engine = engine_with(vec![Ok(ProviderReply::text_only("ok"))]);
        let mut request = TurnRequest::new("generate an image of a cat", "s1");
        request.mode = Some(Mode::ContentWriting);

        let response = engine.process(&request).await.unwrap();
        assert_eq!(response.detected_mode, Mode::ContentWriting);
    }

    #[tokio::test]
    async fn test_deep_search_flag_sets_mode() {
        let engine = engine_with(vec![Ok(ProviderReply::text_only("researching"))]);
        let mut request = TurnRequest::new("tell me about rust", "s1");
        request.deep_search = true;

        let response = engine.process(&request).await.unwrap();
        assert_eq!(response.detected_mode, Mode::DeepSearch);
    }

    #[tokio::test]
    async fn test_conversion_turn_with_stated_target() {
        let engine = engine_with(vec![Ok(ProviderReply::text_only(
            "Converting your file!\n{\"action\": \"file_conversion\", \"target_format\": \"docx\"}",
        ))]);
        let request = TurnRequest::new("convert my report to word", "s1")
            .with_attachments(vec![Attachment::document("application/pdf", "AAAA", "report.pdf")]);

        let response = engine.process(&request).await.unwrap();
        assert!(response.success);
        let conversion = response.conversion.unwrap();
        assert_eq!(conversion.file_name, "report_converted.docx");
        assert_eq!(
            conversion.mime_type,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(response.reply, "Converting your file!");
    }

    #[tokio::test]
    async fn test_conversion_fallback_target_from_extension() {
        // The model states no parameters; the source extension decides.
        let engine = engine_with(vec![Ok(ProviderReply::text_only("Working on it."))]);
        let request = TurnRequest::new("convert this file", "s1")
            .with_attachments(vec![Attachment::document("application/pdf", "AAAA", "notes.pdf")]);

        let response = engine.process(&request).await.unwrap();
        let conversion = response.conversion.unwrap();
        assert_eq!(conversion.file_name, "notes_converted.docx");
    }

    #[tokio::test]
    async fn test_conversion_without_attachment_fails_gracefully() {
        let engine = engine_with(vec![Ok(ProviderReply::text_only("unused"))]);
        let mut request = TurnRequest::new("convert my file to pdf", "s1");
        request.mode = Some(Mode::FileConversion);

        let response = engine.process(&request).await.unwrap();
        assert!(response.reply.starts_with("Conversion failed:"));
        assert!(response.conversion.is_none());
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let engine = engine_with(vec![Err(ProviderError::Transport("timed out".to_string()))]);
        let request = TurnRequest::new("hi", "s1");

        let result = engine.process(&request).await;
        assert!(matches!(result, Err(EngineError::Provider(_))));
    }
}
