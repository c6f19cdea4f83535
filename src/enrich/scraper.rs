use async_trait::async_trait;
use log::warn;
use reqwest::Client as HttpClient;
use std::time::Duration;
use url::Url;

use super::PromptEnricher;
use crate::models::api::TextGenerationRequest;

/// Fetch timeout per referenced page.
const FETCH_TIMEOUT_SECS: u64 = 10;
/// Characters kept per fetched page.
const PAGE_CONTENT_CAP: usize = 4000;

/// Fetches every URL mentioned in the prompt and turns the pages into plain
/// text for the generation context.
pub struct UrlContentEnricher {
    http: HttpClient,
}

impl UrlContentEnricher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http })
    }

    async fn fetch_page(&self, url: &Url) -> Result<String, reqwest::Error> {
        let html = self.http
            .get(url.as_str())
            .send().await?
            .error_for_status()?
            .text().await?;
        Ok(strip_html_tags(&html))
    }
}

#[async_trait]
impl PromptEnricher for UrlContentEnricher {
    async fn enrich(&self, request: &TextGenerationRequest) -> String {
        let urls = extract_urls(&request.prompt);
        if urls.is_empty() {
            return String::new();
        }

        let mut sections = Vec::new();
        for url in urls {
            match self.fetch_page(&url).await {
                Ok(text) if !text.is_empty() => {
                    sections.push(truncate_chars(&text, PAGE_CONTENT_CAP));
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("Skipping page content from {}: {}", url, err);
                }
            }
        }
        sections.join(" ")
    }
}

/// Pulls http(s) URLs out of whitespace-separated prompt tokens.
pub fn extract_urls(prompt: &str) -> Vec<Url> {
    prompt
        .split_whitespace()
        .filter(|token| token.starts_with("http://") || token.starts_with("https://"))
        .filter_map(|token| Url::parse(token).ok())
        .collect()
}

/// Reduces an HTML page to its visible text: tags are replaced by spaces,
/// script and style bodies are dropped, whitespace runs collapse to one
/// space.
pub fn strip_html_tags(html: &str) -> String {
    let mut result = String::new();
    let mut remaining = html;

    while let Some(start) = remaining.find('<') {
        result.push_str(&remaining[..start]);
        result.push(' ');

        let tag_region = &remaining[start..];
        let end = match tag_region.find('>') {
            Some(end) => end,
            None => {
                remaining = "";
                break;
            }
        };

        let tag = &tag_region[1..end];
        remaining = &tag_region[end + 1..];

        let name = tag
            .trim_start_matches('/')
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        if !tag.starts_with('/') && (name == "script" || name == "style") {
            let close_tag = format!("</{}>", name);
            remaining = match find_ignore_ascii_case(remaining, &close_tag) {
                Some(pos) => &remaining[pos + close_tag.len()..],
                None => "",
            };
        }
    }
    result.push_str(remaining);

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

fn truncate_chars(text: &str, cap: usize) -> String {
    text.chars().take(cap).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::SupportedModel;

    fn request(prompt: &str) -> TextGenerationRequest {
        TextGenerationRequest {
            prompt: prompt.to_string(),
            model: SupportedModel::Gpt4o,
            temperature: 0.5,
        }
    }

    #[test]
    fn finds_urls_among_prompt_tokens() {
        let urls = extract_urls("Summarize https://example.com/a and http://foo.io please");
        let found: Vec<String> = urls.iter().map(|u| u.to_string()).collect();
        assert_eq!(found, vec!["https://example.com/a", "http://foo.io/"]);
    }

    #[test]
    fn ignores_tokens_without_a_scheme() {
        assert!(extract_urls("visit example.com and www.foo.io").is_empty());
        assert!(extract_urls("no links here").is_empty());
    }

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let html = "<html><body><h1>Title</h1>\n<p>Hello <b>world</b></p></body></html>";
        assert_eq!(strip_html_tags(html), "Title Hello world");
    }

    #[test]
    fn drops_script_and_style_bodies() {
        let html = "<p>keep</p><script>var x = 1;</script><style>p { color: red }</style>done";
        assert_eq!(strip_html_tags(html), "keep done");
    }

    #[test]
    fn script_close_tag_matches_case_insensitively() {
        let html = "<SCRIPT>alert(1)</ScRiPt>after";
        assert_eq!(strip_html_tags(html), "after");
    }

    #[test]
    fn unterminated_markup_drops_the_tail() {
        assert_eq!(strip_html_tags("before<a href="), "before");
        assert_eq!(strip_html_tags("<script>never closed"), "");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(strip_html_tags("just words"), "just words");
    }

    #[tokio::test]
    async fn prompt_without_urls_enriches_to_empty() {
        let enricher = UrlContentEnricher::new().unwrap();
        let content = enricher.enrich(&request("tell me a story")).await;
        assert_eq!(content, "");
    }
}
