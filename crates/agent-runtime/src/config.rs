//! Backend selection
//!
//! The provider is chosen once at startup from a string identifier and
//! turned into a [`Backend`] that the orchestrator holds for its lifetime.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::Message,
    provider::{ConversationOptions, LlmProvider, Response},
};
use async_trait::async_trait;

use crate::{claude, gemini, ollama, ClaudeProvider, GeminiProvider, OpenAiProvider};
#[cfg(feature = "ollama")]
use crate::OllamaProvider;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Supported LLM providers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Claude,
    Ollama,
}

impl ProviderKind {
    pub const ALL: [Self; 4] = [Self::OpenAi, Self::Gemini, Self::Claude, Self::Ollama];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Claude => "claude",
            Self::Ollama => "ollama",
        }
    }

    /// Model used when none is configured
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => agent_core::provider::DEFAULT_MODEL,
            Self::Gemini => "gemini-2.0-flash",
            Self::Claude => "claude-3-5-sonnet-latest",
            Self::Ollama => "llama3.2",
        }
    }

    /// Environment variable holding the API key, if the provider needs one
    pub const fn api_key_var(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::Claude => Some("CLAUDE_API_KEY"),
            Self::Ollama => None,
        }
    }

    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => crate::openai::DEFAULT_BASE_URL,
            Self::Gemini => gemini::DEFAULT_BASE_URL,
            Self::Claude => claude::DEFAULT_BASE_URL,
            Self::Ollama => ollama::DEFAULT_HOST,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            "claude" | "anthropic" => Ok(Self::Claude),
            "ollama" => Ok(Self::Ollama),
            _ => Err(AgentError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Everything needed to construct a [`Backend`]
#[derive(Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub kind: ProviderKind,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl BackendConfig {
    /// Read credentials and endpoints from the process environment
    pub fn from_env(kind: ProviderKind, model: Option<String>, timeout: Duration) -> Result<Self> {
        Self::from_lookup(kind, model, timeout, |key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(
        kind: ProviderKind,
        model: Option<String>,
        timeout: Duration,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = match kind.api_key_var() {
            Some(var) => Some(
                get(var).ok_or_else(|| AgentError::Config(format!("{var} must be set for the {kind} provider")))?,
            ),
            None => None,
        };

        let base_url = match kind {
            ProviderKind::Ollama => {
                let host = get("OLLAMA_HOST").unwrap_or_else(|| ollama::DEFAULT_HOST.into());
                let port = match get("OLLAMA_PORT") {
                    Some(p) => p
                        .parse()
                        .map_err(|_| AgentError::Config(format!("OLLAMA_PORT is not a port number: {p}")))?,
                    None => ollama::DEFAULT_PORT,
                };
                ollama::base_url(&host, port)
            }
            _ => kind.default_base_url().to_string(),
        };

        Ok(Self {
            kind,
            model: model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| kind.default_model().to_string()),
            api_key,
            base_url,
            timeout,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// A concrete LLM provider, selected once at configuration time
pub enum Backend {
    OpenAi(OpenAiProvider),
    Gemini(GeminiProvider),
    Claude(ClaudeProvider),
    #[cfg(feature = "ollama")]
    Ollama(OllamaProvider),
}

impl Backend {
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let key = || {
            config
                .api_key
                .clone()
                .ok_or_else(|| AgentError::Config(format!("missing API key for the {} provider", config.kind)))
        };

        let backend = match config.kind {
            ProviderKind::OpenAi => Self::OpenAi(OpenAiProvider::new(&config.base_url, key()?, config.timeout)?),
            ProviderKind::Gemini => Self::Gemini(GeminiProvider::new(&config.base_url, key()?, config.timeout)?),
            ProviderKind::Claude => Self::Claude(ClaudeProvider::new(&config.base_url, key()?, config.timeout)?),
            #[cfg(feature = "ollama")]
            ProviderKind::Ollama => Self::Ollama(OllamaProvider::with_base_url(&config.base_url, config.timeout)?),
            #[cfg(not(feature = "ollama"))]
            ProviderKind::Ollama => {
                return Err(AgentError::Config("built without the `ollama` feature".into()));
            }
        };

        tracing::info!(provider = %config.kind, model = %config.model, "Backend configured");
        Ok(backend)
    }

    pub const fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Gemini(_) => ProviderKind::Gemini,
            Self::Claude(_) => ProviderKind::Claude,
            #[cfg(feature = "ollama")]
            Self::Ollama(_) => ProviderKind::Ollama,
        }
    }

    fn inner(&self) -> &dyn LlmProvider {
        match self {
            Self::OpenAi(p) => p,
            Self::Gemini(p) => p,
            Self::Claude(p) => p,
            #[cfg(feature = "ollama")]
            Self::Ollama(p) => p,
        }
    }
}

#[async_trait]
impl LlmProvider for Backend {
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    async fn health_check(&self) -> Result<bool> {
        self.inner().health_check().await
    }

    async fn complete(&self, messages: &[Message], options: &ConversationOptions) -> Result<Response> {
        self.inner().complete(messages, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| ((*k).into(), (*v).into())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_parse_provider_kind() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
        assert_eq!(" ollama ".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);

        let err = "mistral".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, AgentError::UnsupportedProvider(ref name) if name == "mistral"));
    }

    #[test]
    fn test_round_trips_through_display() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.to_string().parse::<ProviderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = BackendConfig::from_lookup(ProviderKind::Claude, None, DEFAULT_TIMEOUT, lookup(&[])).unwrap_err();
        assert!(matches!(err, AgentError::Config(ref msg) if msg.contains("CLAUDE_API_KEY")));

        let blank = lookup(&[("OPENAI_API_KEY", "  ")]);
        assert!(BackendConfig::from_lookup(ProviderKind::OpenAi, None, DEFAULT_TIMEOUT, blank).is_err());
    }

    #[test]
    fn test_defaults_per_provider() {
        let config = BackendConfig::from_lookup(
            ProviderKind::OpenAi,
            None,
            DEFAULT_TIMEOUT,
            lookup(&[("OPENAI_API_KEY", "sk-test")]),
        )
        .unwrap();
        assert_eq!(config.model, "gpt-4.1-mini");
        assert_eq!(config.base_url, crate::openai::DEFAULT_BASE_URL);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));

        let config = BackendConfig::from_lookup(
            ProviderKind::Gemini,
            Some("gemini-1.5-pro".into()),
            DEFAULT_TIMEOUT,
            lookup(&[("GEMINI_API_KEY", "g")]),
        )
        .unwrap();
        assert_eq!(config.model, "gemini-1.5-pro");
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = BackendConfig::from_lookup(ProviderKind::Ollama, None, DEFAULT_TIMEOUT, lookup(&[])).unwrap();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert!(config.api_key.is_none());

        let config = BackendConfig::from_lookup(
            ProviderKind::Ollama,
            None,
            DEFAULT_TIMEOUT,
            lookup(&[("OLLAMA_HOST", "http://gpu-box/"), ("OLLAMA_PORT", "8080")]),
        )
        .unwrap();
        assert_eq!(config.base_url, "http://gpu-box:8080");

        let bad_port = lookup(&[("OLLAMA_PORT", "eleven")]);
        assert!(BackendConfig::from_lookup(ProviderKind::Ollama, None, DEFAULT_TIMEOUT, bad_port).is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = BackendConfig::from_lookup(
            ProviderKind::OpenAi,
            None,
            DEFAULT_TIMEOUT,
            lookup(&[("OPENAI_API_KEY", "sk-secret")]),
        )
        .unwrap();
        assert!(!format!("{config:?}").contains("sk-secret"));
    }

    #[test]
    fn test_backend_from_config() {
        let config = BackendConfig::from_lookup(
            ProviderKind::Claude,
            None,
            DEFAULT_TIMEOUT,
            lookup(&[("CLAUDE_API_KEY", "k")]),
        )
        .unwrap();
        let backend = Backend::from_config(&config).unwrap();
        assert_eq!(backend.kind(), ProviderKind::Claude);
        assert_eq!(backend.name(), "claude");
    }

    #[cfg(feature = "ollama")]
    #[test]
    fn test_ollama_backend_from_config() {
        let config = BackendConfig::from_lookup(
            ProviderKind::Ollama,
            Some("qwen2.5".into()),
            DEFAULT_TIMEOUT,
            lookup(&[("OLLAMA_HOST", "http://127.0.0.1"), ("OLLAMA_PORT", "11500")]),
        )
        .unwrap();
        let backend = Backend::from_config(&config).unwrap();
        assert_eq!(backend.kind(), ProviderKind::Ollama);
        assert_eq!(config.model, "qwen2.5");
    }
}
