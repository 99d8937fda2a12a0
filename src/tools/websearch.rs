use rig::completion::ToolDefinition;
use rig::tool::Tool;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::ToolFailure;

const SEARCH_ENDPOINT: &str = "https://api.duckduckgo.com/";
const DEFAULT_REGION: &str = "us-en";
const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WebSearchArgs {
    /// Search query string.
    pub keywords: String,
    /// Region code such as "us-en" (default).
    #[serde(default)]
    pub region: Option<String>,
    /// Number of results to return. Default: 5.
    #[serde(default)]
    pub max_results: Option<usize>,
}

/// One search hit, rendered to the agent as part of a JSON list.
#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub href: String,
    pub body: String,
}

/// Queries the DuckDuckGo instant answer API and hands the agent a pretty
/// JSON list of `{title, href, body}` rows.
#[derive(Clone)]
pub struct WebSearch {
    http: reqwest::Client,
}

impl WebSearch {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn run(&self, args: &WebSearchArgs) -> Result<String, ToolFailure> {
        let region = args.region.as_deref().unwrap_or(DEFAULT_REGION);
        let max_results = args.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        log::info!("🔍 Searching the web: {}", args.keywords);

        let response = self
            .http
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("q", args.keywords.as_str()),
                ("format", "json"),
                ("no_html", "1"),
                ("kl", region),
            ])
            .send()
            .await?;

        // DuckDuckGo answers throttled clients with 202 and an empty body.
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::ACCEPTED
        {
            return Err(ToolFailure::RateLimited);
        }

        let answer: InstantAnswer = response.error_for_status()?.json().await?;
        let results = collect_results(&answer, max_results);
        Ok(serde_json::to_string_pretty(&results)?)
    }
}

#[derive(Debug, Default, Deserialize)]
struct InstantAnswer {
    #[serde(default, rename = "Heading")]
    heading: String,
    #[serde(default, rename = "AbstractText")]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default, rename = "RelatedTopics")]
    related_topics: Vec<RelatedTopic>,
}

/// Related topics are either direct links or named groups of further topics.
/// Only links carry `FirstURL`, which is what serde disambiguates on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Link {
        #[serde(default, rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL")]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

fn collect_results(answer: &InstantAnswer, max_results: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if !answer.abstract_text.is_empty() {
        let title = if answer.heading.is_empty() {
            answer.abstract_url.clone()
        } else {
            answer.heading.clone()
        };
        results.push(SearchResult {
            title,
            href: answer.abstract_url.clone(),
            body: answer.abstract_text.clone(),
        });
    }

    collect_topics(&answer.related_topics, &mut results);
    results.truncate(max_results);
    results
}

fn collect_topics(topics: &[RelatedTopic], results: &mut Vec<SearchResult>) {
    for topic in topics {
        match topic {
            RelatedTopic::Link { text, first_url } => {
                // Link text reads "Title - description".
                let (title, body) = match text.split_once(" - ") {
                    Some((title, body)) => (title.to_string(), body.to_string()),
                    None => (text.clone(), String::new()),
                };
                results.push(SearchResult {
                    title,
                    href: first_url.clone(),
                    body,
                });
            }
            RelatedTopic::Group { topics } => collect_topics(topics, results),
        }
    }
}

fn failure_text(err: &ToolFailure) -> String {
    match err {
        ToolFailure::RateLimited => "Rate limit reached. Please try again later.".to_string(),
        other => format!("Search error: {}", other),
    }
}

impl Tool for WebSearch {
    const NAME: &'static str = "websearch";

    type Error = std::convert::Infallible;
    type Args = WebSearchArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Search the web for current information. Use for questions \
                          about recent events, news, weather, prices or anything that \
                          needs up-to-date facts."
                .to_string(),
            parameters: schema_for!(WebSearchArgs).to_value(),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        match self.run(&args).await {
            Ok(text) => Ok(text),
            Err(err) => {
                log::error!("❌ Web search failed: {}", err);
                Ok(failure_text(&err))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Heading": "Rust",
        "AbstractText": "Rust is a multi-paradigm programming language.",
        "AbstractURL": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
        "RelatedTopics": [
            {
                "Text": "Rust (programming language) - A general-purpose programming language.",
                "FirstURL": "https://duckduckgo.com/Rust_(programming_language)"
            },
            {
                "Name": "Related",
                "Topics": [
                    {
                        "Text": "Cargo - The Rust package manager.",
                        "FirstURL": "https://duckduckgo.com/Cargo"
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parses_links_and_groups() {
        let answer: InstantAnswer = serde_json::from_str(SAMPLE).unwrap();
        let results = collect_results(&answer, 5);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Rust");
        assert_eq!(
            results[0].body,
            "Rust is a multi-paradigm programming language."
        );
        assert_eq!(results[1].title, "Rust (programming language)");
        assert_eq!(
            results[2].href,
            "https://duckduckgo.com/Cargo"
        );
    }

    #[test]
    fn test_respects_max_results() {
        let answer: InstantAnswer = serde_json::from_str(SAMPLE).unwrap();
        let results = collect_results(&answer, 2);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_empty_answer_yields_no_results() {
        let answer: InstantAnswer = serde_json::from_str("{}").unwrap();
        assert!(collect_results(&answer, 5).is_empty());
        assert_eq!(
            serde_json::to_string_pretty(&collect_results(&answer, 5)).unwrap(),
            "[]"
        );
    }

    #[test]
    fn test_link_text_without_separator_keeps_full_text() {
        let json = r#"{"RelatedTopics":[{"Text":"Plain", "FirstURL":"https://x.test/"}]}"#;
        let answer: InstantAnswer = serde_json::from_str(json).unwrap();
        let results = collect_results(&answer, 5);
        assert_eq!(results[0].title, "Plain");
        assert_eq!(results[0].body, "");
    }

    #[test]
    fn test_failure_text_rate_limit_is_literal() {
        assert_eq!(
            failure_text(&ToolFailure::RateLimited),
            "Rate limit reached. Please try again later."
        );
        let other = failure_text(&ToolFailure::Provider("boom".to_string()));
        assert_eq!(other, "Search error: boom");
    }
}
