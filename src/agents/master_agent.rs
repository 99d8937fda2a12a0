use rig::completion::Prompt;
use rig::prelude::*;
use rig::providers::openai;
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::agents::classifier::classify_response;
use crate::agents::session::Session;
use crate::error::{AppError, Result};
use crate::models::{ChatReply, HistoryEntry};
use crate::storage::AiConfig;
use crate::tools::{EditImage, GenerateImage, WebSearch};

/// Upper bound on tool-call round trips within a single turn.
const MAX_TOOL_TURNS: usize = 5;

pub const MASTER_PROMPT: &str = r#"You are Sarvo AI, a helpful and friendly AI assistant with multiple capabilities.

## YOUR CAPABILITIES:
1. **Chat**: Have natural conversations, answer questions, help with coding, explain concepts
2. **Image Generation**: Create new images from text descriptions
3. **Image Editing**: Modify existing images based on instructions
4. **Web Search**: Find current information from the internet

## HOW TO DECIDE WHICH TOOL TO USE:

### Use generate_image when:
- User says: "generate", "create", "make", "draw", "design" + image/picture/photo
- Examples: "Generate an image of a cat", "Create a logo for my company"

### Use edit_image when:
- User says: "edit", "modify", "change", "update", "fix" + mentions an image
- User sent an image and wants changes
- Examples: "Edit this image to add sunglasses", "Change the background to blue"

### Use websearch when:
- User asks about current events, news, or real-time information
- User says: "search", "find", "what's the latest", "current", "today"
- Examples: "What's the latest AI news?", "Search for Python tutorials"

### Respond directly (no tool) when:
- General conversation: "Hello", "How are you?"
- Knowledge questions: "What is machine learning?"
- Coding help: "Write a Python function to..."
- Explanations: "Explain how transformers work"

## RESPONSE GUIDELINES:
- Be friendly and helpful
- If generating an image, describe what you're creating
- If searching, summarize the key findings
- Always explain what you're doing

Remember: You decide which tool to use based on what the user needs!"#;

// ============================================================================
// MASTER AGENT
// ============================================================================

/// Routes each chat turn through an OpenAI-backed agent that can call the
/// image and search tools, then normalizes whatever comes back into a
/// [`ChatReply`].
pub struct MasterAgent {
    client: openai::Client,
    chat_model: String,
    session: RwLock<Session>,
    generate_image: GenerateImage,
    edit_image: EditImage,
    web_search: WebSearch,
}

impl MasterAgent {
    pub fn new(ai_config: &AiConfig, output_dir: impl Into<PathBuf>) -> Result<Self> {
        log::info!("🤖 Initializing Sarvo AI master agent");

        let client = openai::Client::builder()
            .api_key(&ai_config.api_key)
            .base_url(&ai_config.api_base)
            .build()
            .map_err(|e| AppError::internal(format!("AI client setup failed: {}", e)))?;

        let http = reqwest::Client::new();
        let output_dir = output_dir.into();

        Ok(Self {
            client,
            chat_model: ai_config.chat_model.clone(),
            session: RwLock::new(Session::new()),
            generate_image: GenerateImage::new(http.clone(), ai_config.clone(), output_dir.clone()),
            edit_image: EditImage::new(http.clone(), ai_config.clone(), output_dir),
            web_search: WebSearch::new(http),
        })
    }

    /// One full chat turn. Never fails: agent errors become a polite text
    /// reply, and the turn is recorded in the transcript either way.
    pub async fn process(&self, message: &str, image_url: Option<&str>) -> ChatReply {
        let full_input = {
            let mut session = self.session.write().await;
            session.compose_input(message, image_url)
        };

        log::info!("💬 User input: {}", message);
        log::debug!("Composed agent input: {}", full_input);

        let reply = match self.run_agent(&full_input).await {
            Ok(raw) => {
                log::debug!("Agent raw response: {}", raw);
                classify_response(&raw)
            }
            Err(e) => {
                log::error!("❌ Agent run failed: {}", e);
                error_reply(&e)
            }
        };

        {
            let mut session = self.session.write().await;
            session.record_turn(message, &reply.content);
        }

        log::info!("🤖 Replying with {} content", reply.kind);
        reply
    }

    async fn run_agent(
        &self,
        input: &str,
    ) -> std::result::Result<String, rig::completion::PromptError> {
        let agent = self
            .client
            .agent(&self.chat_model)
            .preamble(MASTER_PROMPT)
            .tool(self.generate_image.clone())
            .tool(self.edit_image.clone())
            .tool(self.web_search.clone())
            .build();

        agent.prompt(input).multi_turn(MAX_TOOL_TURNS).await
    }

    pub async fn set_current_image(&self, image_url: impl Into<String>) {
        self.session.write().await.set_current_image(image_url);
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.session.read().await.history().to_vec()
    }

    pub async fn clear_session(&self) {
        log::info!("🧹 Clearing session");
        self.session.write().await.clear();
    }
}

fn error_reply(err: &impl std::fmt::Display) -> ChatReply {
    ChatReply::text(format!("Sorry, I encountered an error: {}", err))
}

// ============================================================================
// TESTS
// ============================================================================
