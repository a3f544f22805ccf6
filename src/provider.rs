// AI provider backends behind a single generate/is_working interface

use std::error::Error as _;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ProviderKind;
use crate::error::ProviderError;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Gemini models tried in order when discovering what the key can use
const GEMINI_MODEL_PRIORITY: [&str; 3] = ["gemini-1.5-flash", "gemini-1.5-pro", "gemini-2.0-flash-exp"];

const SYSTEM_MESSAGE: &str = "You are a helpful Thai education assistant.";
const TEMPERATURE: f32 = 0.7;

// ============================================================================
// Provider Interface
// ============================================================================

pub trait AiProvider {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// False once the provider failed its connect probe or any later call.
    fn is_working(&self) -> bool;

    fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Builds the backend for `kind` and runs its connect probe.
pub fn connect(kind: ProviderKind, api_key: &str, model: Option<&str>, timeout: Duration) -> Box<dyn AiProvider> {
    let agent = ureq::AgentBuilder::new().timeout(timeout).build();
    match kind {
        ProviderKind::Gemini => Box::new(GeminiProvider::connect(agent, api_key, model)),
        ProviderKind::Groq | ProviderKind::OpenRouter => {
            Box::new(ChatCompletionProvider::connect(agent, kind, api_key, model))
        }
    }
}

fn map_ureq_error(provider: &str, err: ureq::Error) -> ProviderError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            ProviderError::Request {
                provider: provider.to_string(),
                message: format!("HTTP {}: {}", code, body.trim()),
            }
        }
        ureq::Error::Transport(transport) => {
            let timed_out = transport
                .source()
                .and_then(|s| s.downcast_ref::<io::Error>())
                .map(|e| matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock))
                .unwrap_or(false);
            if timed_out {
                ProviderError::Timeout { provider: provider.to_string() }
            } else {
                ProviderError::Request {
                    provider: provider.to_string(),
                    message: transport.to_string(),
                }
            }
        }
    }
}

fn bad_response(provider: &str, err: impl std::fmt::Display) -> ProviderError {
    ProviderError::BadResponse {
        provider: provider.to_string(),
        message: err.to_string(),
    }
}

// ============================================================================
// Google Gemini
// ============================================================================

#[derive(Debug, Deserialize)]
struct GeminiModelList {
    #[serde(default)]
    models: Vec<GeminiModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModel {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

pub struct GeminiProvider {
    agent: ureq::Agent,
    api_key: String,
    model: String,
    working: AtomicBool,
}

impl GeminiProvider {
    const NAME: &'static str = "Google Gemini";

    /// Picks a model from the account's model list unless one is forced.
    pub fn connect(agent: ureq::Agent, api_key: &str, model: Option<&str>) -> Self {
        let mut provider = Self {
            agent,
            api_key: api_key.to_string(),
            model: String::new(),
            working: AtomicBool::new(false),
        };

        match model {
            Some(forced) => {
                provider.model = qualify_gemini_model(forced);
                provider.working.store(true, Ordering::Relaxed);
            }
            None => match provider.discover_model() {
                Ok(found) => {
                    info!(model = %found, "Gemini model selected");
                    provider.model = found;
                    provider.working.store(true, Ordering::Relaxed);
                }
                Err(e) => warn!("Google API init failed: {}", e),
            },
        }
        provider
    }

    fn discover_model(&self) -> Result<String, ProviderError> {
        let url = format!("{}/models", GEMINI_BASE_URL);
        let list: GeminiModelList = self
            .agent
            .get(&url)
            .query("key", &self.api_key)
            .call()
            .map_err(|e| map_ureq_error(Self::NAME, e))?
            .into_json()
            .map_err(|e| bad_response(Self::NAME, e))?;

        let available: Vec<String> = list
            .models
            .into_iter()
            .filter(|m| m.supported_generation_methods.iter().any(|g| g == "generateContent"))
            .map(|m| m.name)
            .collect();

        pick_gemini_model(&available).ok_or_else(|| ProviderError::EmptyResponse {
            provider: Self::NAME.to_string(),
        })
    }
}

fn qualify_gemini_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

/// Preferred models first, then any flash model, then whatever is left.
fn pick_gemini_model(available: &[String]) -> Option<String> {
    GEMINI_MODEL_PRIORITY
        .iter()
        .find_map(|wanted| available.iter().find(|a| a.contains(*wanted)))
        .or_else(|| available.iter().find(|a| a.to_lowercase().contains("flash")))
        .or_else(|| available.first())
        .cloned()
}

impl AiProvider for GeminiProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_working(&self) -> bool {
        self.working.load(Ordering::Relaxed)
    }

    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        if !self.is_working() {
            return Err(ProviderError::NotConfigured { provider: Self::NAME.to_string() });
        }

        debug!(model = %self.model, chars = prompt.len(), "calling Gemini");
        let url = format!("{}/{}:generateContent", GEMINI_BASE_URL, self.model);
        let body = GeminiRequest {
            contents: vec![GeminiContent { parts: vec![GeminiPart { text: prompt }] }],
        };

        let result = self
            .agent
            .post(&url)
            .query("key", &self.api_key)
            .send_json(&body)
            .map_err(|e| map_ureq_error(Self::NAME, e))
            .and_then(|resp| resp.into_json::<GeminiResponse>().map_err(|e| bad_response(Self::NAME, e)))
            .and_then(|resp| {
                let text: String = resp
                    .candidates
                    .into_iter()
                    .filter_map(|c| c.content)
                    .flat_map(|c| c.parts)
                    .filter_map(|p| p.text)
                    .collect();
                if text.trim().is_empty() {
                    Err(ProviderError::EmptyResponse { provider: Self::NAME.to_string() })
                } else {
                    Ok(text)
                }
            });

        if let Err(ref e) = result {
            warn!("Google API error: {}", e);
            self.working.store(false, Ordering::Relaxed);
        }
        result
    }
}

// ============================================================================
// OpenAI-compatible chat completions (Groq, OpenRouter)
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

pub struct ChatCompletionProvider {
    agent: ureq::Agent,
    name: &'static str,
    base_url: &'static str,
    api_key: String,
    model: String,
    working: AtomicBool,
}

impl ChatCompletionProvider {
    /// Sends a 5-token test completion; the provider only reports working
    /// when it succeeds.
    pub fn connect(agent: ureq::Agent, kind: ProviderKind, api_key: &str, model: Option<&str>) -> Self {
        let base_url = match kind {
            ProviderKind::OpenRouter => OPENROUTER_BASE_URL,
            _ => GROQ_BASE_URL,
        };
        let provider = Self {
            agent,
            name: kind.display_name(),
            base_url,
            api_key: api_key.to_string(),
            model: model.unwrap_or(kind.default_model()).to_string(),
            working: AtomicBool::new(false),
        };

        let probe = ChatRequest {
            model: &provider.model,
            messages: vec![ChatMessage { role: "user", content: "test" }],
            temperature: None,
            max_tokens: Some(5),
        };
        match provider.complete(&probe) {
            Ok(_) => provider.working.store(true, Ordering::Relaxed),
            Err(e) => warn!("{} init failed: {}", provider.name, e),
        }
        provider
    }

    fn complete(&self, request: &ChatRequest<'_>) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response: ChatResponse = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(request)
            .map_err(|e| map_ureq_error(self.name, e))?
            .into_json()
            .map_err(|e| bad_response(self.name, e))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::EmptyResponse { provider: self.name.to_string() })
    }
}

impl AiProvider for ChatCompletionProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_working(&self) -> bool {
        self.working.load(Ordering::Relaxed)
    }

    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        if !self.is_working() {
            return Err(ProviderError::NotConfigured { provider: self.name.to_string() });
        }

        debug!(provider = self.name, model = %self.model, chars = prompt.len(), "calling chat completion");
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_MESSAGE },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: Some(TEMPERATURE),
            max_tokens: None,
        };

        let result = self.complete(&request).and_then(|text| {
            if text.trim().is_empty() {
                Err(ProviderError::EmptyResponse { provider: self.name.to_string() })
            } else {
                Ok(text)
            }
        });

        if let Err(ref e) = result {
            warn!("{} API error: {}", self.name, e);
            self.working.store(false, Ordering::Relaxed);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn gemini_model_priority() {
        let available = names(&["models/gemini-pro", "models/gemini-1.5-pro", "models/gemini-1.5-flash"]);
        assert_eq!(pick_gemini_model(&available).as_deref(), Some("models/gemini-1.5-flash"));
    }

    #[test]
    fn gemini_falls_back_to_any_flash_then_first() {
        let flash = names(&["models/gemini-pro", "models/gemini-2.5-flash-lite"]);
        assert_eq!(pick_gemini_model(&flash).as_deref(), Some("models/gemini-2.5-flash-lite"));

        let other = names(&["models/gemini-pro", "models/gemma"]);
        assert_eq!(pick_gemini_model(&other).as_deref(), Some("models/gemini-pro"));

        assert_eq!(pick_gemini_model(&[]), None);
    }

    #[test]
    fn gemini_model_names_are_qualified() {
        assert_eq!(qualify_gemini_model("gemini-1.5-pro"), "models/gemini-1.5-pro");
        assert_eq!(qualify_gemini_model("models/gemini-1.5-pro"), "models/gemini-1.5-pro");
    }

    #[test]
    fn chat_request_skips_unset_fields() {
        let request = ChatRequest {
            model: "m",
            messages: vec![ChatMessage { role: "user", content: "hi" }],
            temperature: None,
            max_tokens: Some(5),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["max_tokens"], 5);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn forced_gemini_model_skips_discovery() {
        let agent = ureq::AgentBuilder::new().timeout(Duration::from_millis(10)).build();
        let provider = GeminiProvider::connect(agent, "key", Some("gemini-1.5-pro"));
        assert!(provider.is_working());
        assert_eq!(provider.model(), "models/gemini-1.5-pro");
    }

    #[test]
    fn silent_server_maps_to_timeout() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/v1/models", listener.local_addr().unwrap());
        let agent = ureq::AgentBuilder::new().timeout(Duration::from_millis(300)).build();

        let err = agent.get(&url).call().unwrap_err();
        let mapped = map_ureq_error("Groq", err);
        assert!(matches!(mapped, ProviderError::Timeout { ref provider } if provider == "Groq"), "{mapped:?}");
        drop(listener);
    }
}
