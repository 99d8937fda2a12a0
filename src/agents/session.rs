use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

use crate::models::HistoryEntry;

/// Words that signal the user wants to change an already-uploaded image.
const EDIT_INTENT_KEYWORDS: &[&str] = &["edit", "modify", "change", "update", "fix", "add", "remove"];

static EDIT_INTENT: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(EDIT_INTENT_KEYWORDS)
        .unwrap()
});

/// Conversation state for one chat session: the last-known image reference
/// and the transcript. One instance is shared by the whole process.
#[derive(Debug, Default)]
pub struct Session {
    current_image: Option<String>,
    history: Vec<HistoryEntry>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_current_image(&mut self, image_url: impl Into<String>) {
        let image_url = image_url.into();
        log::info!("🖼️  Current image set to {}", image_url);
        self.current_image = Some(image_url);
    }

    pub fn current_image(&self) -> Option<&str> {
        self.current_image.as_deref()
    }

    /// Compose the outgoing agent input for one turn.
    ///
    /// An explicit image reference overwrites the stored one and is announced
    /// to the agent. Without one, the stored reference is announced only when
    /// the message reads like an edit request. Otherwise the message passes
    /// through untouched. Only the first branch mutates state.
    pub fn compose_input(&mut self, message: &str, image_url: Option<&str>) -> String {
        if let Some(url) = image_url {
            self.current_image = Some(url.to_string());
            return format!("{}\n\n[User has provided an image: {}]", message, url);
        }

        if let Some(previous) = &self.current_image {
            if EDIT_INTENT.is_match(message) {
                return format!("{}\n\n[Previously uploaded image: {}]", message, previous);
            }
        }

        message.to_string()
    }

    pub fn record_turn(&mut self, user_message: &str, reply_content: &str) {
        self.history.push(HistoryEntry::user(user_message));
        self.history.push(HistoryEntry::assistant(reply_content));
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Full reset: transcript and current image. Used by the explicit
    /// clear endpoint only; turns and errors never clear the image.
    pub fn clear(&mut self) {
        self.history.clear();
        self.current_image = None;
    }
}

// ============================================================================
// Tests
// ============================================================================
