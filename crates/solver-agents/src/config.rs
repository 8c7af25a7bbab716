use crate::client::OpenAiCompatClient;
use crate::model::ModelCapability;
use anyhow::{bail, Context, Result};
use reasoner::{EscalationConfig, ModelInfo};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PROVIDER: &str = "google_genai";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_STRONGER_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_VISION_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_VISION_STRONGER_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// A chat provider reachable through an OpenAI-compatible endpoint.
#[derive(Debug, Clone, Copy)]
pub struct ProviderSpec {
    pub name: &'static str,
    /// Environment variable holding this provider's key.
    pub api_key_env: Option<&'static str>,
    pub base_url: &'static str,
}

/// Known providers. Unknown names fall back to the first entry's URL.
pub const PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "google_genai",
        api_key_env: Some("GOOGLE_API_KEY"),
        base_url: "https://generativelanguage.googleapis.com/v1beta/openai",
    },
    ProviderSpec {
        name: "openai",
        api_key_env: Some("OPENAI_API_KEY"),
        base_url: "https://api.openai.com/v1",
    },
    ProviderSpec {
        name: "groq",
        api_key_env: Some("GROQ_API_KEY"),
        base_url: "https://api.groq.com/openai/v1",
    },
    ProviderSpec {
        name: "mistralai",
        api_key_env: Some("MISTRAL_API_KEY"),
        base_url: "https://api.mistral.ai/v1",
    },
    ProviderSpec {
        name: "together",
        api_key_env: Some("TOGETHER_API_KEY"),
        base_url: "https://api.together.xyz/v1",
    },
    ProviderSpec {
        name: "fireworks",
        api_key_env: Some("FIREWORKS_API_KEY"),
        base_url: "https://api.fireworks.ai/inference/v1",
    },
    ProviderSpec {
        name: "deepseek",
        api_key_env: Some("DEEPSEEK_API_KEY"),
        base_url: "https://api.deepseek.com/v1",
    },
    ProviderSpec {
        name: "ollama",
        api_key_env: None,
        base_url: "http://localhost:11434/v1",
    },
];

pub fn provider_spec(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Solver configuration: model endpoints, request settings, escalation policy.
///
/// `Default` reads the environment; a TOML file may override any field.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Provider label reported in results (`LLM_TEXT_PROVIDER`).
    pub provider: String,
    /// OpenAI-compatible base URL (`LLM_BASE_URL`).
    pub base_url: String,
    /// `LLM_API_KEY`, else the provider's own key variable.
    pub api_key: Option<String>,
    /// Base tier model (`LLM_TEXT_MODEL`).
    pub text_model: String,
    /// Strong tier model (`LLM_TEXT_STRONGER_MODEL`).
    pub stronger_model: String,
    /// Base tier for image questions (`LLM_VISION_MODEL`).
    pub vision_model: String,
    /// Strong tier for image questions (`LLM_VISION_STRONGER_MODEL`).
    pub vision_stronger_model: String,
    pub temperature: f32,
    /// Per-request timeout (`LLM_TIMEOUT_SECS`).
    pub timeout_secs: u64,
    pub max_tokens: Option<u32>,
    /// Fallback log filter when `RUST_LOG` is unset (`LOG_LEVEL`).
    pub log_level: String,
    pub escalation: EscalationConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl SolverConfig {
    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = get("LLM_TEXT_PROVIDER").unwrap_or_else(|| DEFAULT_PROVIDER.into());
        let spec = provider_spec(&provider);
        let base_url = get("LLM_BASE_URL").unwrap_or_else(|| {
            spec.map(|s| s.base_url)
                .unwrap_or(PROVIDERS[0].base_url)
                .to_string()
        });
        let api_key = get("LLM_API_KEY")
            .or_else(|| spec.and_then(|s| s.api_key_env).and_then(|key| get(key)));

        Self {
            provider,
            base_url,
            api_key,
            text_model: get("LLM_TEXT_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.into()),
            stronger_model: get("LLM_TEXT_STRONGER_MODEL")
                .unwrap_or_else(|| DEFAULT_STRONGER_MODEL.into()),
            vision_model: get("LLM_VISION_MODEL").unwrap_or_else(|| DEFAULT_VISION_MODEL.into()),
            vision_stronger_model: get("LLM_VISION_STRONGER_MODEL")
                .unwrap_or_else(|| DEFAULT_VISION_STRONGER_MODEL.into()),
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: get("LLM_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            max_tokens: None,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.into()),
            escalation: EscalationConfig::default(),
        }
    }

    /// Parse a TOML document. Missing fields keep their environment defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse solver config TOML")?;
        Ok(config)
    }

    /// Environment defaults, overridden by `path` when given, then validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                Self::from_toml_str(&text)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.text_model.trim().is_empty() {
            bail!("text_model must not be empty");
        }
        if self.stronger_model.trim().is_empty() {
            bail!("stronger_model must not be empty");
        }
        if self.vision_model.trim().is_empty() || self.vision_stronger_model.trim().is_empty() {
            bail!("vision_model and vision_stronger_model must not be empty");
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            bail!("base_url must be an http(s) URL, got {:?}", self.base_url);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            bail!("temperature must be within [0, 2], got {}", self.temperature);
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be positive");
        }
        let threshold = self.escalation.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            bail!("escalation.confidence_threshold must be within [0, 1], got {threshold}");
        }
        Ok(())
    }

    pub fn base_model(&self) -> ModelInfo {
        ModelInfo::new(&self.provider, &self.text_model)
    }

    pub fn strong_model(&self) -> ModelInfo {
        ModelInfo::new(&self.provider, &self.stronger_model)
    }

    pub fn vision_base_model(&self) -> ModelInfo {
        ModelInfo::new(&self.provider, &self.vision_model)
    }

    pub fn vision_strong_model(&self) -> ModelInfo {
        ModelInfo::new(&self.provider, &self.vision_stronger_model)
    }
}

/// The model capabilities wired into the orchestrator: a base and a strong
/// tier for text, and the same pair for images.
///
/// All tiers share one HTTP client; the model is selected per request by
/// name in the request body.
pub struct ClientSet {
    pub base: Arc<dyn ModelCapability>,
    pub strong: Arc<dyn ModelCapability>,
    pub vision_base: Arc<dyn ModelCapability>,
    pub vision_strong: Arc<dyn ModelCapability>,
}

impl ClientSet {
    pub fn from_config(config: &SolverConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let build = |info: ModelInfo| {
            OpenAiCompatClient::new(http.clone(), &config.base_url, config.api_key.clone(), info)
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens)
        };

        Ok(Self {
            base: Arc::new(build(config.base_model())),
            strong: Arc::new(build(config.strong_model())),
            vision_base: Arc::new(build(config.vision_base_model())),
            vision_strong: Arc::new(build(config.vision_strong_model())),
        })
    }
}
