//! Dual-path tool dispatch.
//!
//! Structured tool calls from the provider run on the native path:
//! each call executes in response order, and media side effects get a
//! short follow-up generation so the confirmation reads in the
//! assistant's voice. Providers without function calling embed action
//! JSON in the reply text instead; the legacy path recovers it, runs
//! the tool, and strips the JSON from the user-facing reply. When both
//! paths produce the same artifact kind, the legacy result wins.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use assistant_tools::{ToolArgs, ToolRegistry};
use chat_core::{Language, ModelRequest, ProviderReply, TurnRequest};

use crate::actions::ToolAction;
use crate::extract::{extract_legacy_action, strip_action_text};
use crate::router::ProviderRouter;

/// Reply used when tools ran but produced no text at all.
const TOOLS_ONLY_REPLY: &str = "I've processed your request using my specialized tools.";

/// Reply when an image edit was requested but no source image exists
/// anywhere in the conversation.
const NO_SOURCE_IMAGE_REPLY: &str = "I understand you want to edit an image, but I couldn't find \
     the source image in our chat. Please upload an image and tell me what to change.";

/// The collected effects of one turn's tool activity.
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    /// User-facing reply text after tool processing.
    pub reply: String,
    /// Generated or edited image URL.
    pub image_url: Option<String>,
    /// Generated video URL.
    pub video_url: Option<String>,
    /// Generated audio URL.
    pub audio_url: Option<String>,
    /// Web search results, when real results backed the answer.
    pub search_results: Option<Value>,
    /// Reminder payload for the client app to schedule.
    pub reminder: Option<Value>,
    /// Spoken confirmation for the reminder.
    pub voice_confirmation: Option<String>,
    /// Target format when the model requested a file conversion natively.
    pub conversion_request: Option<String>,
}

/// Executes tool actions and folds their effects into the reply.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Process one provider reply into a final outcome.
    ///
    /// Tool and narration failures are absorbed along the way, so this
    /// always yields an outcome.
    pub async fn dispatch(
        &self,
        router: &ProviderRouter,
        request: &TurnRequest,
        system_instruction: &str,
        language: Language,
        reply: ProviderReply,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome {
            reply: reply.text.clone(),
            ..DispatchOutcome::default()
        };

        let had_tool_calls = reply.has_tool_calls();
        for call in &reply.tool_calls {
            match ToolAction::from_tool_call(call) {
                Some(action) => {
                    self.run_native(router, request, system_instruction, language, action, &mut outcome)
                        .await;
                }
                None => warn!(tool = %call.name, "dropping unusable tool call"),
            }
        }

        // The legacy path scans whatever text remains. Action JSON in the
        // text wins over a native artifact of the same kind.
        if let Some(extracted) = extract_legacy_action(&outcome.reply) {
            info!(action = extracted.action.tool_name(), "recovered action from reply text");
            outcome.reply = strip_action_text(&outcome.reply, &extracted.raw);
            self.run_legacy(request, extracted.action, &mut outcome).await;
        }

        if had_tool_calls && outcome.reply.trim().is_empty() {
            outcome.reply = TOOLS_ONLY_REPLY.to_string();
        }

        outcome
    }

    async fn run_native(
        &self,
        router: &ProviderRouter,
        request: &TurnRequest,
        system_instruction: &str,
        language: Language,
        action: ToolAction,
        outcome: &mut DispatchOutcome,
    ) {
        let model = request.model.as_deref();
        match action {
            ToolAction::GenerateImage { prompt } => {
                if let Some(url) = self.execute_media(request, &ToolAction::GenerateImage { prompt: prompt.clone() }).await {
                    outcome.image_url = Some(url);
                    outcome.reply = narrate(
                        router,
                        system_instruction,
                        model,
                        format!("I have successfully generated an image for: \"{prompt}\". Tell the user it's ready."),
                        format!("I've generated the image for: \"{prompt}\""),
                    )
                    .await;
                }
            }
            ToolAction::GenerateVideo { prompt } => {
                if let Some(url) = self.execute_media(request, &ToolAction::GenerateVideo { prompt: prompt.clone() }).await {
                    outcome.video_url = Some(url);
                    outcome.reply = narrate(
                        router,
                        system_instruction,
                        model,
                        format!("I have successfully generated a video for: \"{prompt}\". Tell the user it's ready."),
                        format!("I've generated the video for: \"{prompt}\""),
                    )
                    .await;
                }
            }
            ToolAction::GenerateAudio { prompt, duration } => {
                if let Some(url) = self.execute_media(request, &ToolAction::GenerateAudio { prompt: prompt.clone(), duration }).await {
                    outcome.audio_url = Some(url);
                    outcome.reply = narrate(
                        router,
                        system_instruction,
                        model,
                        format!("I have successfully generated the music for: \"{prompt}\". Tell the user it's ready."),
                        format!("I've generated the music for: \"{prompt}\""),
                    )
                    .await;
                }
            }
            ToolAction::ModifyImage { prompt } => {
                if request.first_image().is_none() && request.latest_history_image().is_none() {
                    outcome.reply = NO_SOURCE_IMAGE_REPLY.to_string();
                    return;
                }
                if let Some(url) = self.execute_media(request, &ToolAction::ModifyImage { prompt: prompt.clone() }).await {
                    outcome.image_url = Some(url);
                    outcome.reply = narrate(
                        router,
                        system_instruction,
                        model,
                        format!("I have successfully modified the image as requested: \"{prompt}\". Tell the user it's ready."),
                        "I've successfully modified the image based on your request!".to_string(),
                    )
                    .await;
                }
            }
            ToolAction::WebSearch { query } => {
                self.run_search(router, request, system_instruction, language, &query, outcome)
                    .await;
            }
            ToolAction::SetReminder { title, datetime, is_alarm } => {
                let mut params = HashMap::new();
                params.insert("title".to_string(), Value::String(title));
                params.insert("datetime".to_string(), Value::String(datetime));
                params.insert("is_alarm".to_string(), Value::Bool(is_alarm));

                match self
                    .registry
                    .execute_args("set_reminder", ToolArgs::with_context(params, language, false))
                    .await
                {
                    Ok(out) => {
                        outcome.voice_confirmation = Some(out.content.clone());
                        outcome.reply = out.content;
                        outcome.reminder = out.payload;
                    }
                    Err(e) => warn!(error = %e, "reminder tool failed, keeping text reply"),
                }
            }
            ToolAction::FileConversion { target_format } => {
                // Conversion needs the attachment bytes; the engine runs it
                // as its own step. Here we only record the request.
                if request.attachments.is_empty() {
                    outcome.reply =
                        "Please attach the file you'd like me to convert.".to_string();
                } else {
                    outcome.conversion_request = Some(target_format);
                }
            }
        }
    }

    /// Legacy actions come out of reply text: the surrounding prose is
    /// already the user-facing reply, so no narration call is made.
    async fn run_legacy(
        &self,
        request: &TurnRequest,
        action: ToolAction,
        outcome: &mut DispatchOutcome,
    ) {
        if let ToolAction::ModifyImage { .. } = &action {
            if request.first_image().is_none() && request.latest_history_image().is_none() {
                outcome.reply = NO_SOURCE_IMAGE_REPLY.to_string();
                return;
            }
        }

        let fallback = match &action {
            ToolAction::GenerateImage { prompt } => format!("I've generated the image for: \"{prompt}\""),
            ToolAction::GenerateVideo { prompt } => format!("I've generated the video for: \"{prompt}\""),
            ToolAction::GenerateAudio { prompt, .. } => format!("I've generated the music for: \"{prompt}\""),
            ToolAction::ModifyImage { .. } => {
                "I've successfully modified the image based on your request!".to_string()
            }
            _ => return,
        };

        let Some(url) = self.execute_media(request, &action).await else {
            return;
        };
        match &action {
            ToolAction::GenerateImage { .. } | ToolAction::ModifyImage { .. } => {
                outcome.image_url = Some(url);
            }
            ToolAction::GenerateVideo { .. } => outcome.video_url = Some(url),
            ToolAction::GenerateAudio { .. } => outcome.audio_url = Some(url),
            _ => {}
        }

        if outcome.reply.trim().is_empty() {
            outcome.reply = fallback;
        }
    }

    /// Run a media tool, returning the artifact URL. Tool failures are
    /// caught here so the turn's text reply survives them.
    async fn execute_media(&self, request: &TurnRequest, action: &ToolAction) -> Option<String> {
        let mut params = HashMap::new();
        match action {
            ToolAction::GenerateImage { prompt }
            | ToolAction::GenerateVideo { prompt }
            | ToolAction::ModifyImage { prompt } => {
                params.insert("prompt".to_string(), Value::String(prompt.clone()));
            }
            ToolAction::GenerateAudio { prompt, duration } => {
                params.insert("prompt".to_string(), Value::String(prompt.clone()));
                params.insert("duration".to_string(), Value::from(*duration));
            }
            _ => {}
        }

        if let ToolAction::ModifyImage { .. } = action {
            let source = request
                .first_image()
                .or_else(|| request.latest_history_image());
            if let Some(image) = source {
                params.insert("image_data".to_string(), Value::String(image.data.clone()));
                params.insert("mime_type".to_string(), Value::String(image.mime_type.clone()));
            }
        }

        match self.registry.execute(action.tool_name(), params).await {
            Ok(out) => out.media_url,
            Err(e) => {
                warn!(tool = action.tool_name(), error = %e, "media tool failed, keeping text reply");
                None
            }
        }
    }

    async fn run_search(
        &self,
        router: &ProviderRouter,
        request: &TurnRequest,
        system_instruction: &str,
        language: Language,
        query: &str,
        outcome: &mut DispatchOutcome,
    ) {
        let mut params = HashMap::new();
        params.insert("query".to_string(), Value::String(query.to_string()));

        let out = match self
            .registry
            .execute_args(
                "web_search",
                ToolArgs::with_context(params, language, request.deep_search),
            )
            .await
        {
            Ok(out) => out,
            Err(e) => {
                warn!(error = %e, "search tool failed, keeping text reply");
                return;
            }
        };

        let placeholder = out
            .payload
            .as_ref()
            .and_then(|p| p.get("placeholder"))
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        if placeholder {
            // A search backend without credentials returns canned hits.
            // Citing those would fabricate sources, so answer directly.
            info!("search returned placeholder results, answering from model knowledge");
            outcome.reply = narrate(
                router,
                system_instruction,
                request.model.as_deref(),
                format!("The web search was unavailable. Answer the user's question from your own knowledge: \"{query}\""),
                outcome.reply.clone(),
            )
            .await;
        } else {
            let results = out
                .payload
                .as_ref()
                .and_then(|p| p.get("results"))
                .cloned();
            outcome.reply = narrate(
                router,
                system_instruction,
                request.model.as_deref(),
                format!(
                    "Using these web search results, answer the user's question.\n\nQuestion: {query}\n\nResults:\n{}",
                    out.content
                ),
                out.content.clone(),
            )
            .await;
            outcome.search_results = results;
        }
    }
}

/// Run a short follow-up generation, returning the fallback text when
/// the call fails or comes back blank. The turn's model hint is carried
/// over so the confirmation comes from the model that served the turn.
async fn narrate(
    router: &ProviderRouter,
    system_instruction: &str,
    model: Option<&str>,
    prompt: String,
    fallback: String,
) -> String {
    let mut follow_up = ModelRequest::follow_up(system_instruction, prompt);
    follow_up.model = model.map(str::to_string);
    match router.generate(&follow_up).await {
        Ok(reply) if !reply.text.trim().is_empty() => reply.text,
        Ok(_) => fallback,
        Err(e) => {
            warn!(error = %e, "narration call failed, using templated confirmation");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assistant_tools::{async_trait, Tool, ToolError, ToolOutput};
    use chat_core::{Attachment, ProviderError, ToolCall};
    use mock_model::ScriptedModel;
    use serde_json::json;

    struct FakeMedia {
        name: &'static str,
        url: &'static str,
    }

    #[async_trait]
    impl Tool for FakeMedia {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "test media tool"
        }
        async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
            let prompt = args.get_string("prompt")?;
            Ok(ToolOutput::success(prompt).with_media(self.url))
        }
    }

    struct FakeSearch {
        placeholder: bool,
    }

    #[async_trait]
    impl Tool for FakeSearch {
        fn name(&self) -> &str {
            "web_search"
        }
        fn description(&self) -> &str {
            "test search tool"
        }
        async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
            args.get_string("query")?;
            let limit = if args.deep_search { 10 } else { 5 };
            Ok(ToolOutput::success("Rust 1.80 released (blog.rust-lang.org)")
                .with_payload(json!({
                    "results": [{"title": "Rust 1.80", "limit": limit}],
                    "placeholder": self.placeholder,
                })))
        }
    }

    fn media_registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(FakeMedia {
            name: "generate_image",
            url: "https://cdn.test/image.png",
        });
        registry.register(FakeMedia {
            name: "generate_video",
            url: "https://cdn.test/video.mp4",
        });
        registry.register(FakeMedia {
            name: "generate_audio",
            url: "https://cdn.test/audio.mp3",
        });
        registry.register(FakeMedia {
            name: "modify_image",
            url: "https://cdn.test/edited.png",
        });
        registry.register(assistant_tools::SetReminder::new());
        Arc::new(registry)
    }

    fn router_with(replies: Vec<Result<ProviderReply, ProviderError>>) -> ProviderRouter {
        ProviderRouter::new(Arc::new(ScriptedModel::new(replies)))
    }

    fn image_call(prompt: &str) -> ToolCall {
        let mut args = HashMap::new();
        args.insert("prompt".to_string(), Value::String(prompt.to_string()));
        ToolCall::new("generate_image", args)
    }

    #[tokio::test]
    async fn test_native_image_with_narration() {
        let dispatcher = Dispatcher::new(media_registry());
        let router = router_with(vec![Ok(ProviderReply::text_only("Your image is ready!"))]);
        let request = TurnRequest::new("draw a cat", "s1");

        let reply = ProviderReply {
            text: String::new(),
            tool_calls: vec![image_call("a cat")],
        };

        let outcome = dispatcher
            .dispatch(&router, &request, "persona", Language::English, reply)
            .await;

        assert_eq!(outcome.image_url.as_deref(), Some("https://cdn.test/image.png"));
        assert_eq!(outcome.reply, "Your image is ready!");
    }

    #[tokio::test]
    async fn test_narration_failure_uses_template() {
        let dispatcher = Dispatcher::new(media_registry());
        let router = router_with(vec![Err(ProviderError::Api {
            status: 500,
            message: "down".to_string(),
        })]);
        let request = TurnRequest::new("draw a cat", "s1");

        let reply = ProviderReply {
            text: String::new(),
            tool_calls: vec![image_call("a cat")],
        };

        let outcome = dispatcher
            .dispatch(&router, &request, "persona", Language::English, reply)
            .await;

        assert_eq!(outcome.reply, "I've generated the image for: \"a cat\"");
    }

    #[tokio::test]
    async fn test_narration_carries_model_hint() {
        let default = Arc::new(ScriptedModel::new(vec![Ok(ProviderReply::text_only(
            "Here you go!",
        ))]));
        let router = ProviderRouter::new(default.clone());
        let dispatcher = Dispatcher::new(media_registry());
        let mut request = TurnRequest::new("draw a cat", "s1");
        request.model = Some("gemini-2.5-pro".to_string());

        let reply = ProviderReply {
            text: String::new(),
            tool_calls: vec![image_call("a cat")],
        };

        dispatcher
            .dispatch(&router, &request, "persona", Language::English, reply)
            .await;

        let calls = default.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model.as_deref(), Some("gemini-2.5-pro"));
        assert!(!calls[0].enable_tools);
    }

    #[tokio::test]
    async fn test_legacy_action_stripped_and_executed() {
        let dispatcher = Dispatcher::new(media_registry());
        let router = router_with(vec![]);
        let request = TurnRequest::new("make a video", "s1");

        let reply = ProviderReply::text_only(
            "On it! {\"action\": \"generate_video\", \"prompt\": \"waves at sunset\"}",
        );

        let outcome = dispatcher
            .dispatch(&router, &request, "persona", Language::English, reply)
            .await;

        assert_eq!(outcome.video_url.as_deref(), Some("https://cdn.test/video.mp4"));
        assert_eq!(outcome.reply, "On it!");
    }

    #[tokio::test]
    async fn test_legacy_empty_text_gets_template() {
        let dispatcher = Dispatcher::new(media_registry());
        let router = router_with(vec![]);
        let request = TurnRequest::new("music please", "s1");

        let reply = ProviderReply::text_only(
            "{\"action\": \"generate_audio\", \"prompt\": \"lofi beats\"}",
        );

        let outcome = dispatcher
            .dispatch(&router, &request, "persona", Language::English, reply)
            .await;

        assert_eq!(outcome.audio_url.as_deref(), Some("https://cdn.test/audio.mp3"));
        assert_eq!(outcome.reply, "I've generated the music for: \"lofi beats\"");
    }

    #[tokio::test]
    async fn test_modify_without_source_image() {
        let dispatcher = Dispatcher::new(media_registry());
        let router = router_with(vec![]);
        let request = TurnRequest::new("remove the background", "s1");

        let mut args = HashMap::new();
        args.insert("prompt".to_string(), Value::String("remove background".into()));
        let reply = ProviderReply {
            text: String::new(),
            tool_calls: vec![ToolCall::new("modify_image", args)],
        };

        let outcome = dispatcher
            .dispatch(&router, &request, "persona", Language::English, reply)
            .await;

        assert!(outcome.image_url.is_none());
        assert_eq!(outcome.reply, NO_SOURCE_IMAGE_REPLY);
    }

    #[tokio::test]
    async fn test_modify_uses_history_image() {
        let dispatcher = Dispatcher::new(media_registry());
        let router = router_with(vec![Ok(ProviderReply::text_only("Done, take a look!"))]);
        let history = vec![chat_core::HistoryMessage::user("here's my photo")
            .with_attachments(vec![Attachment::image("image/png", "BASE64")])];
        let request = TurnRequest::new("remove the background", "s1").with_history(history);

        let mut args = HashMap::new();
        args.insert("prompt".to_string(), Value::String("remove background".into()));
        let reply = ProviderReply {
            text: String::new(),
            tool_calls: vec![ToolCall::new("modify_image", args)],
        };

        let outcome = dispatcher
            .dispatch(&router, &request, "persona", Language::English, reply)
            .await;

        assert_eq!(outcome.image_url.as_deref(), Some("https://cdn.test/edited.png"));
        assert_eq!(outcome.reply, "Done, take a look!");
    }

    #[tokio::test]
    async fn test_search_with_real_results() {
        let mut registry = ToolRegistry::new();
        registry.register(FakeSearch { placeholder: false });
        let dispatcher = Dispatcher::new(Arc::new(registry));
        let router = router_with(vec![Ok(ProviderReply::text_only(
            "Rust 1.80 shipped with new features.",
        ))]);
        let request = TurnRequest::new("rust news", "s1");

        let mut args = HashMap::new();
        args.insert("query".to_string(), Value::String("rust news".into()));
        let reply = ProviderReply {
            text: String::new(),
            tool_calls: vec![ToolCall::new("web_search", args)],
        };

        let outcome = dispatcher
            .dispatch(&router, &request, "persona", Language::English, reply)
            .await;

        assert_eq!(outcome.reply, "Rust 1.80 shipped with new features.");
        assert!(outcome.search_results.is_some());
    }

    #[tokio::test]
    async fn test_placeholder_search_omits_results() {
        let mut registry = ToolRegistry::new();
        registry.register(FakeSearch { placeholder: true });
        let dispatcher = Dispatcher::new(Arc::new(registry));
        let router = router_with(vec![Ok(ProviderReply::text_only(
            "From what I know, Rust 1.80 is out.",
        ))]);
        let request = TurnRequest::new("rust news", "s1");

        let mut args = HashMap::new();
        args.insert("query".to_string(), Value::String("rust news".into()));
        let reply = ProviderReply {
            text: String::new(),
            tool_calls: vec![ToolCall::new("web_search", args)],
        };

        let outcome = dispatcher
            .dispatch(&router, &request, "persona", Language::English, reply)
            .await;

        assert_eq!(outcome.reply, "From what I know, Rust 1.80 is out.");
        assert!(outcome.search_results.is_none());
    }

    #[tokio::test]
    async fn test_reminder_localized_confirmation() {
        let dispatcher = Dispatcher::new(media_registry());
        let router = router_with(vec![]);
        let request = TurnRequest::new("yaad dilana", "s1");

        let mut args = HashMap::new();
        args.insert("title".to_string(), Value::String("dawai lena".into()));
        args.insert("datetime".to_string(), Value::String("9 PM".into()));
        let reply = ProviderReply {
            text: String::new(),
            tool_calls: vec![ToolCall::new("set_reminder", args)],
        };

        let outcome = dispatcher
            .dispatch(&router, &request, "persona", Language::Hinglish, reply)
            .await;

        assert_eq!(
            outcome.reply,
            "Theek hai, main 9 PM par \"dawai lena\" ke liye reminder set kar dungi."
        );
        assert!(outcome.reminder.is_some());
        assert_eq!(outcome.voice_confirmation.as_deref(), Some(outcome.reply.as_str()));
    }

    #[tokio::test]
    async fn test_native_conversion_flags_request() {
        let dispatcher = Dispatcher::new(media_registry());
        let router = router_with(vec![]);
        let request = TurnRequest::new("convert this", "s1")
            .with_attachments(vec![Attachment::document("application/pdf", "AAAA", "a.pdf")]);

        let mut args = HashMap::new();
        args.insert("target_format".to_string(), Value::String("docx".into()));
        let reply = ProviderReply {
            text: "Converting your file now.".to_string(),
            tool_calls: vec![ToolCall::new("file_conversion", args)],
        };

        let outcome = dispatcher
            .dispatch(&router, &request, "persona", Language::English, reply)
            .await;

        assert_eq!(outcome.conversion_request.as_deref(), Some("docx"));
        assert_eq!(outcome.reply, "Converting your file now.");
    }

    struct FailingMedia;

    #[async_trait]
    impl Tool for FailingMedia {
        fn name(&self) -> &str {
            "generate_image"
        }
        fn description(&self) -> &str {
            "test failing media tool"
        }
        async fn execute(&self, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
            Err(ToolError::ExecutionFailed("service down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_media_tool_failure_keeps_text_reply() {
        let mut registry = ToolRegistry::new();
        registry.register(FailingMedia);
        let dispatcher = Dispatcher::new(Arc::new(registry));
        let router = router_with(vec![]);
        let request = TurnRequest::new("draw a cat", "s1");

        let reply = ProviderReply {
            text: "Let me create that for you.".to_string(),
            tool_calls: vec![image_call("a cat")],
        };

        let outcome = dispatcher
            .dispatch(&router, &request, "persona", Language::English, reply)
            .await;

        assert!(outcome.image_url.is_none());
        assert_eq!(outcome.reply, "Let me create that for you.");
    }

    #[tokio::test]
    async fn test_dropped_call_keeps_text() {
        let dispatcher = Dispatcher::new(media_registry());
        let router = router_with(vec![]);
        let request = TurnRequest::new("hi", "s1");

        // Missing required prompt argument; the call is dropped.
        let reply = ProviderReply {
            text: String::new(),
            tool_calls: vec![ToolCall::new("generate_image", HashMap::new())],
        };

        let outcome = dispatcher
            .dispatch(&router, &request, "persona", Language::English, reply)
            .await;

        assert!(outcome.image_url.is_none());
        assert_eq!(outcome.reply, TOOLS_ONLY_REPLY);
    }
}
