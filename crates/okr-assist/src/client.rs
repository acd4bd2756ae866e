use crate::error::AssistError;
use crate::prompt::{user_prompt, SYSTEM_PROMPT};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Connection settings for a chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct AssistConfig {
    /// Full URL of the chat-completions route.
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl AssistConfig {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            temperature: 0.4,
            max_tokens: 4096,
        }
    }

    /// Read the key from `var`; an unset or empty variable is an error.
    pub fn api_key_from_env(var: &str) -> Result<String> {
        std::env::var(var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AssistError::MissingApiKey(var.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for draft generation. One request per call, no retries.
pub struct DraftClient {
    config: AssistConfig,
    http: reqwest::Client,
}

impl DraftClient {
    pub fn new(config: AssistConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &AssistConfig {
        &self.config
    }

    /// Ask the model for a draft and return the raw text of the first choice.
    pub async fn generate(&self, prompt: &str, organization: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt(prompt, organization),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!(endpoint = %self.config.endpoint, model = %self.config.model, "requesting draft");
        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "draft request failed");
            return Err(AssistError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(AssistError::EmptyResponse)?;
        tracing::debug!(chars = content.len(), "draft received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(server: &mockito::Server) -> DraftClient {
        let mut config = AssistConfig::new(
            format!("{}/v1/chat/completions", server.url()),
            "test-model",
            "secret",
        );
        config.temperature = 0.2;
        config.max_tokens = 512;
        DraftClient::new(config)
    }

    #[tokio::test]
    async fn returns_first_choice_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "test-model",
                "max_tokens": 512,
                "messages": [
                    {"role": "system"},
                    {"role": "user", "content": "Organização: Acme\nPedido: crescer"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Objetivo 1 (Estratégico): Crescer"}}]}"#)
            .create_async()
            .await;

        let text = client(&server).generate("crescer", "Acme").await.unwrap();
        assert_eq!(text, "Objetivo 1 (Estratégico): Crescer");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_carries_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let err = client(&server).generate("x", "").await.unwrap_err();
        match err {
            AssistError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let err = client(&server).generate("x", "Acme").await.unwrap_err();
        assert!(matches!(err, AssistError::EmptyResponse));
    }

    #[test]
    fn missing_key_names_the_variable() {
        let err = AssistConfig::api_key_from_env("OKR_ASSIST_TEST_UNSET_KEY").unwrap_err();
        assert!(err.to_string().contains("OKR_ASSIST_TEST_UNSET_KEY"));
    }
}
