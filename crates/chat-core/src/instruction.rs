//! System instruction synthesis.
//!
//! Pure composition: base persona identity + mode behavior block +
//! language-mirroring rule, with the tool-usage policy appended for
//! chat/tool modes. Persona templates live in an immutable map built
//! once at startup.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

use crate::mode::Mode;

/// Default persona name when the caller supplies none.
pub const DEFAULT_PERSONA: &str = "Sona";

/// Default persona category.
pub const DEFAULT_CATEGORY: &str = "General";

/// Delimiter separating per-file analysis blocks in file-analysis mode.
pub const SPLIT_RESPONSE_DELIMITER: &str = "---SPLIT_RESPONSE---";

/// Context feeding the instruction builder.
#[derive(Debug, Clone)]
pub struct InstructionContext {
    /// Active persona name.
    pub persona_name: String,
    /// Active persona category.
    pub persona_category: String,
    /// Number of attachments on the current message.
    pub file_count: usize,
    /// True when the caller supplied the mode explicitly. Media modes
    /// switch to a strict JSON-only contract in that case.
    pub explicit_mode: bool,
}

impl Default for InstructionContext {
    fn default() -> Self {
        Self {
            persona_name: DEFAULT_PERSONA.to_string(),
            persona_category: DEFAULT_CATEGORY.to_string(),
            file_count: 0,
            explicit_mode: false,
        }
    }
}

impl InstructionContext {
    /// Context for a named persona.
    pub fn for_persona(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            persona_name: name.into(),
            persona_category: category.into(),
            ..Self::default()
        }
    }

    /// Whether a specialized (non-default) persona is active.
    pub fn is_specialized(&self) -> bool {
        self.persona_name != DEFAULT_PERSONA
    }
}

/// Specialty lines for known personas, keyed by persona name.
///
/// Built once; unknown personas fall back to the generic identity.
static PERSONA_SPECIALTIES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert(
        "Video Creator",
        "You specialize in cinematic video generation and motion design prompts.",
    );
    map.insert(
        "Image Studio",
        "You specialize in high-quality image generation prompts.",
    );
    map.insert(
        "Image Editor",
        "You specialize in editing and modifying existing images.",
    );
    map.insert(
        "Music Composer",
        "You specialize in music and audio generation prompts.",
    );
    map.insert(
        "Deep Researcher",
        "You specialize in thorough multi-source research and synthesis.",
    );
    map
});

const LANGUAGE_RULE: &str = "\n\nCRITICAL LANGUAGE RULE:\n\
ALWAYS respond in the SAME LANGUAGE as the user's message.\n\
- If the user writes in HINDI (Devanagari or Romanized), respond in HINDI.\n\
- If the user writes in ENGLISH, respond in ENGLISH.\n\
- If the user mixes languages, prioritize the dominant language.";

fn base_identity(ctx: &InstructionContext) -> String {
    let mut identity = format!(
        "You are {}, an AI assistant built for productivity, intelligence, and real-world execution.",
        ctx.persona_name
    );
    if let Some(specialty) = PERSONA_SPECIALTIES.get(ctx.persona_name.as_str()) {
        identity.push(' ');
        identity.push_str(specialty);
    }
    identity
}

fn media_behavior_rule(explicit: bool) -> &'static str {
    if explicit {
        "1. MANDATORY: Output ONLY the JSON object. Do not speak."
    } else {
        "1. Describe what you are about to create in 1-2 friendly sentences.\n\
         2. THEN, immediately follow with the mandatory JSON object below."
    }
}

/// Build the mode behavior block (identity + mode rules + language rule).
pub fn mode_instruction(mode: Mode, ctx: &InstructionContext) -> String {
    let identity = base_identity(ctx);

    match mode {
        Mode::FileAnalysis => {
            let multi_file = if ctx.file_count > 1 {
                format!(
                    "\n\nMULTI-FILE ANALYSIS ({count} files):\n\
                     You MUST provide {count} distinct analysis blocks.\n\
                     Use \"{delim}\" as the delimiter between each file's analysis.\n\
                     Format:\n\
                     {delim}\n\
                     **[Translated header for 'Analysis of'] [Filename 1]**\n\
                     [Full analysis in the document's language]\n\n\
                     {delim}\n\
                     **[Translated header for 'Analysis of'] [Filename 2]**\n\
                     [Full analysis in the document's language]",
                    count = ctx.file_count,
                    delim = SPLIT_RESPONSE_DELIMITER,
                )
            } else {
                String::new()
            };
            format!(
                "{identity}\n\n\
                 MODE: FILE_ANALYSIS - Document Intelligence\n\n\
                 You are an AI analyst.\n\n\
                 CRITICAL INSTRUCTION - LANGUAGE MIRRORING:\n\
                 You must behave like a mirror for the document's language.\n\
                 1. READ the document content.\n\
                 2. DETECT the language of the content.\n\
                 3. RESPOND IN THAT EXACT LANGUAGE (unless the user asks in a different language).\n\
                 4. If the user says \"Read this\" or \"Explain this\", provide a clear, read-aloud friendly analysis.\n\
                 5. If the user asks a specific question about the document, ANSWER THAT QUESTION DIRECTLY.\n\n\
                 DO NOT TRANSLATE unless asked.\n\
                 Use the document's language for ALL headers, titles, and text.\
                 {multi_file}\n\n\
                 OUTPUT STYLE:\n\
                 - Plain text with markdown formatting\n\
                 - No emojis\n\
                 - Professional and clear\n\n\
                 REMEMBER: the output language must match the input document language exactly."
            )
        }

        Mode::FileConversion => format!(
            "{identity}\n\n\
             MODE: FILE_CONVERSION\n\n\
             Your SOLE purpose is to output a JSON verification object to trigger a file conversion utility.\n\
             You generally receive a file and a user command like \"convert to pdf\".\n\n\
             CRITICAL INSTRUCTIONS:\n\
             1. IGNORE TYPOS: Treat \"ot\" as \"to\", \"duc\" as \"doc\", \"pfd\" as \"pdf\", and so on.\n\
             2. DETECT FORMATS:\n\
                - Identify the source format from the attached file name or extension (PDF, DOCX, PPTX, XLSX, JPG, PNG, WEBP, TXT).\n\
                - Identify the target format from the user's text.\n\
             3. DEFAULTS when no target is specified:\n\
                - Source PDF -> target DOCX\n\
                - Source DOCX -> target PDF\n\
                - Source PPTX/XLSX/image -> target PDF\n\n\
             OUTPUT FORMAT (STRICT JSON ONLY):\n\
             Do NOT speak. Do NOT add markdown text outside the JSON.\n\
             Output ONLY this JSON structure:\n\n\
             {{\"action\": \"file_conversion\", \"source_format\": \"pdf\", \"target_format\": \"docx\", \"file_name\": \"original.pdf\"}}\n\n\
             END OF INSTRUCTION. OUTPUT ONLY JSON."
        ),

        Mode::ContentWriting => format!(
            "{identity}\n\n\
             MODE: CONTENT_WRITING\n\n\
             You are a professional writer and content creator.\n\n\
             RESPONSE BEHAVIOR:\n\
             - Answer directly without greeting messages\n\
             - Focus on providing the requested content immediately\n\n\
             YOUR ROLE:\n\
             - Produce clean, engaging, structured content\n\
             - Adapt tone based on context (formal, casual, marketing, technical)\n\
             - Optimize for clarity and readability\n\n\
             OUTPUT FORMAT:\n\
             - Use proper headings and structure\n\
             - Write in clear, concise paragraphs\n\
             - Use active voice when appropriate\
             {LANGUAGE_RULE}"
        ),

        Mode::CodingHelp => format!(
            "{identity}\n\n\
             MODE: CODING_HELP\n\n\
             You are a senior software engineer and coding mentor.\n\n\
             RESPONSE BEHAVIOR:\n\
             - Answer directly without greeting messages\n\
             - Focus on providing the solution immediately\n\n\
             YOUR ROLE:\n\
             - Explain programming concepts step-by-step\n\
             - Provide clean, production-quality code\n\
             - Debug and fix code issues\n\
             - Mention edge cases and potential issues\n\n\
             OUTPUT FORMAT:\n\
             - Explain the logic before showing code\n\
             - Use proper code blocks with language specification\n\
             - Provide examples and use cases\
             {LANGUAGE_RULE}"
        ),

        Mode::TaskAssistant => format!(
            "{identity}\n\n\
             MODE: TASK_ASSISTANT\n\n\
             You are a productivity expert and task management specialist.\n\n\
             RESPONSE BEHAVIOR:\n\
             - Answer directly without greeting messages\n\
             - Focus on providing the task breakdown immediately\n\n\
             YOUR ROLE:\n\
             - Break down goals into clear, actionable steps\n\
             - Provide timelines and priorities\n\
             - Be motivating but practical\n\n\
             OUTPUT FORMAT:\n\
             - Start with a brief overview\n\
             - Number all steps clearly\n\
             - Indicate priority levels (High/Medium/Low)\n\
             - Include checkpoints and milestones\
             {LANGUAGE_RULE}"
        ),

        Mode::DeepSearch => format!(
            "{identity}\n\n\
             MODE: DEEP_SEARCH\n\n\
             You are a research assistant performing thorough, multi-source analysis.\n\n\
             YOUR ROLE:\n\
             - Use the web_search tool for real-time information\n\
             - Cross-check facts across multiple snippets before asserting them\n\
             - Synthesize findings into a structured, sourced answer\n\
             - State clearly when information could not be verified\
             {LANGUAGE_RULE}"
        ),

        Mode::ImageGen => format!(
            "{identity}\n\n\
             MODE: IMAGE_GEN\n\n\
             You are a creative AI specializing in image generation prompts.\n\n\
             BEHAVIOR RULE:\n{rule}\n\n\
             MANDATORY JSON FORMAT:\n\
             {{\"action\": \"generate_image\", \"prompt\": \"highly detailed, artistic description\"}}\n\n\
             If you are not generating an image but just discussing images, keep it brief.\
             {LANGUAGE_RULE}",
            rule = media_behavior_rule(ctx.explicit_mode),
        ),

        Mode::VideoGen => format!(
            "{identity}\n\n\
             MODE: VIDEO_GEN\n\n\
             You are a creative AI specializing in video generation prompts.\n\n\
             BEHAVIOR RULE:\n{rule}\n\n\
             MANDATORY JSON FORMAT:\n\
             {{\"action\": \"generate_video\", \"prompt\": \"highly detailed, cinematic description\"}}\n\n\
             If you are not generating a video but just discussing videos, keep it brief.\
             {LANGUAGE_RULE}",
            rule = media_behavior_rule(ctx.explicit_mode),
        ),

        Mode::AudioGen => format!(
            "{identity}\n\n\
             MODE: AUDIO_GEN\n\n\
             You are a creative AI specializing in audio and music generation prompts.\n\n\
             BEHAVIOR RULE:\n{rule}\n\n\
             MANDATORY JSON FORMAT:\n\
             {{\"action\": \"generate_audio\", \"prompt\": \"highly detailed description of style and mood\", \"duration\": 30}}\n\n\
             If you are not generating audio but just discussing music, keep it brief.\
             {LANGUAGE_RULE}",
            rule = media_behavior_rule(ctx.explicit_mode),
        ),

        Mode::ImageEdit => format!(
            "{identity}\n\n\
             MODE: IMAGE_EDIT\n\n\
             You are a creative AI specializing in modifying existing images.\n\n\
             BEHAVIOR RULE:\n{rule}\n\n\
             MANDATORY JSON FORMAT:\n\
             {{\"action\": \"modify_image\", \"prompt\": \"exhaustive instructions for the edit\"}}\n\n\
             Follow the user's exact modification instructions.\
             {LANGUAGE_RULE}",
            rule = media_behavior_rule(ctx.explicit_mode),
        ),

        Mode::NormalChat => format!(
            "{identity}\n\n\
             MODE: NORMAL_CHAT\n\n\
             You are a friendly, intelligent conversational assistant.\n\n\
             RESPONSE BEHAVIOR:\n\
             - Answer directly without greeting messages\n\
             - Focus on providing the answer immediately\n\n\
             YOUR ROLE:\n\
             - Answer questions naturally and concisely\n\
             - Be helpful, supportive, and confident\n\
             - Adapt to the user's communication style\n\n\
             OUTPUT FORMAT:\n\
             - Keep answers clear and structured\n\
             - Use bullet points for lists\n\
             - Be conversational but informative\
             {LANGUAGE_RULE}"
        ),
    }
}

/// The tool-usage policy appended to chat/tool modes.
///
/// Carries real-time date/time context and instructs the model to prefer
/// native structured tool calls over emitting JSON text.
pub fn tool_usage_rules(now: DateTime<Utc>) -> String {
    let date_str = now.format("%A, %e %B %Y");
    let time_str = now.format("%I:%M %p");
    format!(
        "REAL-TIME CONTEXT: Today is {date_str}, and the current time is {time_str}.\n\n\
         MANDATORY: You have access to specialized tools for generating images, videos, audio, and web search.\n\
         - To generate an IMAGE: use the 'generate_image' tool.\n\
         - To generate a VIDEO: use the 'generate_video' tool.\n\
         - To generate MUSIC or AUDIO: use the 'generate_audio' tool.\n\
         - To modify or edit an existing IMAGE: use the 'modify_image' tool.\n\
         - To perform a WEB SEARCH: use the 'web_search' tool for ANY real-time information, current events, or facts you are not 100% sure about.\n\n\
         CRITICAL RULE: NEVER output raw JSON text or markdown code blocks containing \"action\" or \"prompt\" fields. \
         You MUST use the native function calling feature to execute tools. \
         Just call the tool and then provide a natural language response."
    )
}

/// Compose the final system instruction for a turn.
///
/// File conversion and file analysis always use the mode instruction, even
/// when the caller supplied an override. Specialized personas get the mode
/// instruction plus a persona reminder; otherwise the override (or mode
/// instruction) is used with the tool-usage policy appended.
pub fn build_instruction(
    mode: Mode,
    ctx: &InstructionContext,
    override_instruction: Option<&str>,
    now: DateTime<Utc>,
) -> String {
    let mode_text = mode_instruction(mode, ctx);

    if matches!(mode, Mode::FileConversion | Mode::FileAnalysis) {
        return mode_text;
    }

    let rules = tool_usage_rules(now);

    if ctx.is_specialized() {
        return format!(
            "{mode_text}\n\n{rules}\n\nRemember, your specific persona is {} from the {} category.",
            ctx.persona_name, ctx.persona_category
        );
    }

    let base = override_instruction
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
        .unwrap_or(mode_text);

    format!("{base}\n\n{rules}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> InstructionContext {
        InstructionContext::default()
    }

    #[test]
    fn test_identity_uses_persona_name() {
        let ctx = InstructionContext::for_persona("Video Creator", "Creative");
        let text = mode_instruction(Mode::NormalChat, &ctx);
        assert!(text.starts_with("You are Video Creator"));
        assert!(text.contains("cinematic video generation"));
    }

    #[test]
    fn test_split_response_protocol_only_for_multi_file_analysis() {
        let mut c = ctx();
        c.file_count = 3;
        let text = mode_instruction(Mode::FileAnalysis, &c);
        assert!(text.contains(SPLIT_RESPONSE_DELIMITER));
        assert!(text.contains("3 distinct analysis blocks"));

        c.file_count = 1;
        let single = mode_instruction(Mode::FileAnalysis, &c);
        assert!(!single.contains(SPLIT_RESPONSE_DELIMITER));

        let chat = mode_instruction(Mode::NormalChat, &c);
        assert!(!chat.contains(SPLIT_RESPONSE_DELIMITER));
    }

    #[test]
    fn test_conversion_mode_is_strict_json_only() {
        let text = mode_instruction(Mode::FileConversion, &ctx());
        assert!(text.contains("STRICT JSON ONLY"));
        assert!(text.contains("\"action\": \"file_conversion\""));
        assert!(text.contains("IGNORE TYPOS"));
    }

    #[test]
    fn test_explicit_media_mode_forbids_prose() {
        let mut c = ctx();
        c.explicit_mode = true;
        let text = mode_instruction(Mode::ImageGen, &c);
        assert!(text.contains("Output ONLY the JSON object"));

        c.explicit_mode = false;
        let text = mode_instruction(Mode::ImageGen, &c);
        assert!(text.contains("1-2 friendly sentences"));
    }

    #[test]
    fn test_tool_rules_carry_date() {
        let now = Utc::now();
        let rules = tool_usage_rules(now);
        assert!(rules.contains("REAL-TIME CONTEXT"));
        assert!(rules.contains("generate_image"));
        assert!(rules.contains("native function calling"));
    }

    #[test]
    fn test_build_instruction_conversion_ignores_override() {
        let text = build_instruction(
            Mode::FileConversion,
            &ctx(),
            Some("You are a pirate."),
            Utc::now(),
        );
        assert!(!text.contains("pirate"));
        assert!(text.contains("FILE_CONVERSION"));
        // No tool rules in conversion mode: JSON output must stay clean.
        assert!(!text.contains("REAL-TIME CONTEXT"));
    }

    #[test]
    fn test_build_instruction_appends_tool_rules_for_chat() {
        let text = build_instruction(Mode::NormalChat, &ctx(), None, Utc::now());
        assert!(text.contains("NORMAL_CHAT"));
        assert!(text.contains("REAL-TIME CONTEXT"));
    }

    #[test]
    fn test_build_instruction_override_for_chat() {
        let text = build_instruction(Mode::NormalChat, &ctx(), Some("Custom base."), Utc::now());
        assert!(text.starts_with("Custom base."));
        assert!(text.contains("REAL-TIME CONTEXT"));
    }

    #[test]
    fn test_specialized_persona_reminder() {
        let ctx = InstructionContext::for_persona("Music Composer", "Creative");
        let text = build_instruction(Mode::AudioGen, &ctx, None, Utc::now());
        assert!(text.contains("your specific persona is Music Composer from the Creative category"));
    }
}
