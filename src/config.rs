// AI provider configuration shared by the CLI and the library

use std::time::Duration;

use clap::ValueEnum;
use serde::Serialize;

use crate::provider::{self, AiProvider};

/// Seconds to wait for an AI provider before falling back to templates
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

/// Environment variable read for the provider API key
pub const API_KEY_ENV: &str = "WORKSHEET_AI_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
pub enum ProviderKind {
    /// Google Gemini generateContent API
    Gemini,
    /// Groq chat completions
    Groq,
    /// OpenRouter chat completions
    #[value(name = "openrouter")]
    OpenRouter,
}

impl ProviderKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Google Gemini",
            ProviderKind::Groq => "Groq",
            ProviderKind::OpenRouter => "OpenRouter",
        }
    }

    /// Model used when no override is configured. Gemini picks its model at
    /// connect time, so this is only the first preference there.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-1.5-flash",
            ProviderKind::Groq => "llama-3.3-70b-versatile",
            ProviderKind::OpenRouter => "openrouter/auto",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiSettings {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout: Duration,
}

impl AiSettings {
    pub fn new(provider: ProviderKind, api_key: Option<String>) -> Self {
        Self {
            provider,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: None,
            timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds and probes the configured provider. `None` without an API key.
    pub fn connect(&self) -> Option<Box<dyn AiProvider>> {
        let key = self.api_key.as_deref()?;
        Some(provider::connect(self.provider, key, self.model.as_deref(), self.timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_key_means_no_provider() {
        let settings = AiSettings::new(ProviderKind::Groq, Some("   ".to_string()));
        assert!(settings.api_key.is_none());
        assert!(settings.connect().is_none());
    }

    #[test]
    fn defaults() {
        let settings = AiSettings::new(ProviderKind::Gemini, None).with_model(Some(String::new()));
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS));
        assert!(settings.model.is_none());
        assert_eq!(ProviderKind::OpenRouter.default_model(), "openrouter/auto");
    }
}
