use async_trait::async_trait;
use log::{ debug, error };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use std::time::Duration;

use super::{ ChatClient, OBTAIN_FAILURE_CONTENT, PARSE_FAILURE_CONTENT };
use crate::llm::{ GenerationError, ModelConfig, GENERATION_TIMEOUT_SECS, MODELS };

pub struct OpenAIChatClient {
    http: HttpClient,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    messages: Vec<WireMessage>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAIChatClient {
    pub fn new(api_key: String) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e|
                format!("Invalid API key format: {}", e)
            )?
        );

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(GENERATION_TIMEOUT_SECS))
            .build()?;

        Ok(Self { http })
    }

    async fn request_completion(
        &self,
        config: &ModelConfig,
        model: &str,
        prompt: &str,
        temperature: f32
    ) -> Result<String, GenerationError> {
        let req = ChatCompletionRequest {
            model: model.to_string(),
            temperature,
            messages: build_messages(config.system_prompt, prompt),
        };

        let resp = self.http
            .post(config.endpoint)
            .json(&req)
            .send().await?
            .error_for_status()?
            .json::<ChatCompletionResponse>().await?;

        extract_content(resp).ok_or(GenerationError::MalformedResponse)
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32
    ) -> Result<String, GenerationError> {
        let config = MODELS.get(model).ok_or_else(||
            GenerationError::UnsupportedModel(model.to_string())
        )?;

        match self.request_completion(config, model, prompt, temperature).await {
            Ok(content) => {
                debug!("Generated text: {}", content);
                Ok(content)
            }
            Err(err) => Ok(failure_content(model, err)),
        }
    }
}

/// Folds a failed completion attempt into the legacy diagnostic sentence
/// that goes out as ordinary content.
fn failure_content(model: &str, err: GenerationError) -> String {
    match err {
        GenerationError::MalformedResponse => {
            error!("Could not extract completion content from the {} response", model);
            PARSE_FAILURE_CONTENT.to_string()
        }
        err => {
            error!("Completion request for {} failed: {}", model, err);
            OBTAIN_FAILURE_CONTENT.to_string()
        }
    }
}

fn build_messages(system_prompt: &str, prompt: &str) -> Vec<WireMessage> {
    vec![
        WireMessage {
            role: "system".to_string(),
            content: system_prompt.to_string(),
        },
        WireMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }
    ]
}

fn extract_content(resp: ChatCompletionResponse) -> Option<String> {
    resp.choices.into_iter().next()?.message?.content
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> ChatCompletionResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn builds_system_then_user_messages() {
        let messages = build_messages("You are an AI assistant", "Hello ");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "You are an AI assistant");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "Hello ");
    }

    #[test]
    fn extracts_first_choice_content() {
        let resp = parse(
            json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "Hi there!" } },
                    { "message": { "role": "assistant", "content": "ignored" } }
                ]
            })
        );
        assert_eq!(extract_content(resp).as_deref(), Some("Hi there!"));
    }

    #[test]
    fn missing_pieces_yield_no_content() {
        assert_eq!(extract_content(parse(json!({}))), None);
        assert_eq!(extract_content(parse(json!({ "choices": [] }))), None);
        assert_eq!(extract_content(parse(json!({ "choices": [{}] }))), None);
        assert_eq!(
            extract_content(parse(json!({ "choices": [{ "message": { "role": "assistant" } }] }))),
            None
        );
    }

    #[test]
    fn missing_content_collapses_to_the_parse_diagnostic() {
        assert_eq!(
            failure_content("gpt-4o", GenerationError::MalformedResponse),
            PARSE_FAILURE_CONTENT
        );
    }

    #[test]
    fn upstream_failure_collapses_to_the_obtain_diagnostic() {
        let err = HttpClient::new().get("http://").build().unwrap_err();
        assert_eq!(
            failure_content("gpt-3.5-turbo", GenerationError::Upstream(err)),
            OBTAIN_FAILURE_CONTENT
        );
    }

    #[tokio::test]
    async fn unknown_model_fails_before_any_request() {
        let client = OpenAIChatClient::new("test-key".to_string()).unwrap();
        let result = client.generate("llama3", "hi", 0.2).await;
        match result {
            Err(GenerationError::UnsupportedModel(model)) => assert_eq!(model, "llama3"),
            other => panic!("expected UnsupportedModel, got {:?}", other.map(|_| ())),
        }
    }
}
