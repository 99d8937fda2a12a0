use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::models::ChatReply;

/// Caption used when stripping an image marker leaves no text behind.
const DEFAULT_CAPTION: &str = "Here is your image";

static IMAGE_PATH_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[IMAGE_PATH:([^\]]+)\]").unwrap());

static SANDBOX_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"sandbox:/outputs/([A-Za-z0-9_.-]+)").unwrap());

static SANDBOX_MARKDOWN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[.*?\]\(sandbox:/outputs/.*?\)").unwrap());

/// Classify raw agent output as an image reply or a plain text reply.
///
/// Checks are ordered and the first match wins:
/// 1. an explicit `[IMAGE_PATH:<path>]` marker emitted by the image tools,
/// 2. a `sandbox:/outputs/<file>` reference, usually inside a markdown
///    image tag, which some model backends emit instead of the marker,
/// 3. otherwise the text is returned unmodified.
///
/// Total over any input; never fails.
pub fn classify_response(raw: &str) -> ChatReply {
    if let Some(caps) = IMAGE_PATH_MARKER.captures(raw) {
        let filename = basename(&caps[1]).to_string();
        let content = IMAGE_PATH_MARKER.replace_all(raw, "").trim().to_string();
        return image_reply(content, &filename);
    }

    if let Some(caps) = SANDBOX_REF.captures(raw) {
        let filename = caps[1].to_string();
        // Strip the whole markdown tag, not just the URL inside it.
        let content = SANDBOX_MARKDOWN_TAG.replace_all(raw, "").trim().to_string();
        return image_reply(content, &filename);
    }

    ChatReply::text(raw)
}

fn image_reply(content: String, filename: &str) -> ChatReply {
    let content = if content.is_empty() {
        DEFAULT_CAPTION.to_string()
    } else {
        content
    };
    ChatReply::image(content, format!("/outputs/{}", filename))
}

fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReplyKind;

    #[test]
    fn test_image_path_marker() {
        let reply = classify_response(
            "Here is your cat! [IMAGE_PATH:outputs/generated_20240101_abcd1234.png]",
        );
        assert_eq!(reply.kind, ReplyKind::Image);
        assert_eq!(reply.content, "Here is your cat!");
        assert_eq!(
            reply.image_url.as_deref(),
            Some("/outputs/generated_20240101_abcd1234.png")
        );
    }

    #[test]
    fn test_marker_stripped_from_content() {
        let reply = classify_response("Before [IMAGE_PATH:outputs/a.png] after");
        assert_eq!(reply.content, "Before  after");
        assert!(!reply.content.contains("IMAGE_PATH"));
    }

    #[test]
    fn test_whitespace_only_remainder_gets_default_caption() {
        let reply = classify_response("  [IMAGE_PATH:outputs/a.png]  ");
        assert_eq!(reply.kind, ReplyKind::Image);
        assert_eq!(reply.content, "Here is your image");
    }

    #[test]
    fn test_plain_text_passthrough() {
        let input = "The capital of France is Paris.\n\nAnything else?";
        let reply = classify_response(input);
        assert_eq!(reply.kind, ReplyKind::Text);
        assert_eq!(reply.content, input);
        assert!(reply.image_url.is_none());
    }

    #[test]
    fn test_sandbox_markdown_reference() {
        let reply = classify_response("Sure, here's a photo ![cat](sandbox:/outputs/cat123.png) enjoy!");
        assert_eq!(reply.kind, ReplyKind::Image);
        assert_eq!(reply.content, "Sure, here's a photo  enjoy!");
        assert_eq!(reply.image_url.as_deref(), Some("/outputs/cat123.png"));
    }

    #[test]
    fn test_sandbox_markdown_only_gets_default_caption() {
        let reply = classify_response("![generated image](sandbox:/outputs/pic_1.png)");
        assert_eq!(reply.content, "Here is your image");
        assert_eq!(reply.image_url.as_deref(), Some("/outputs/pic_1.png"));
    }

    #[test]
    fn test_bare_sandbox_reference_keeps_text() {
        // Only the markdown tag form is stripped; a bare reference stays in
        // the content while still being classified as an image.
        let reply = classify_response("Saved under sandbox:/outputs/result.png for you");
        assert_eq!(reply.kind, ReplyKind::Image);
        assert_eq!(reply.image_url.as_deref(), Some("/outputs/result.png"));
        assert_eq!(reply.content, "Saved under sandbox:/outputs/result.png for you");
    }

    #[test]
    fn test_marker_takes_precedence_over_sandbox() {
        let reply = classify_response(
            "![old](sandbox:/outputs/old.png) done [IMAGE_PATH:outputs/new.png]",
        );
        assert_eq!(reply.kind, ReplyKind::Image);
        assert_eq!(reply.image_url.as_deref(), Some("/outputs/new.png"));
    }

    #[test]
    fn test_all_markers_removed_first_path_wins() {
        let reply =
            classify_response("a [IMAGE_PATH:outputs/one.png] b [IMAGE_PATH:outputs/two.png] c");
        assert_eq!(reply.image_url.as_deref(), Some("/outputs/one.png"));
        assert_eq!(reply.content, "a  b  c");
    }

    #[test]
    fn test_basename_of_nested_path() {
        let reply = classify_response("[IMAGE_PATH:/srv/app/outputs/deep/cat.png]");
        assert_eq!(reply.image_url.as_deref(), Some("/outputs/cat.png"));
    }

    #[test]
    fn test_content_never_empty() {
        for input in ["[IMAGE_PATH:a.png]", "![x](sandbox:/outputs/y.png)", "text"] {
            assert!(!classify_response(input).content.is_empty());
        }
    }
}
