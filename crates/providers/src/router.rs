//! Provider router: selects the correct LLM provider based on config.

use std::collections::HashMap;
use std::sync::Arc;
use huddle_config::{AppConfig, ProviderConfig};
use huddle_core::provider::Provider;
use crate::openai_compat::OpenAiCompatProvider;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Build providers from configuration.
///
/// Azure needs an endpoint; an `azure` entry without one is skipped (and the
/// caller will find no default provider, which is a startup error).
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        if let Some(provider) = build_one(name, provider_config, config.api_key.as_deref()) {
            router.register(name.clone(), provider);
        } else {
            tracing::warn!(provider = %name, "Skipping provider with no api_url");
        }
    }

    // Ensure the default provider exists (even if not explicitly configured)
    if router.get(&config.default_provider).is_none()
        && let Some(provider) = build_one(
            &config.default_provider,
            &ProviderConfig::default(),
            config.api_key.as_deref(),
        )
    {
        router.register(config.default_provider.clone(), provider);
    }

    router
}

fn build_one(
    name: &str,
    provider_config: &ProviderConfig,
    fallback_key: Option<&str>,
) -> Option<Arc<dyn Provider>> {
    let api_key = provider_config
        .api_key
        .as_deref()
        .or(fallback_key)
        .unwrap_or_default()
        .to_string();

    if name == "azure" {
        let endpoint = provider_config.api_url.as_deref()?;
        let mut provider = OpenAiCompatProvider::azure(endpoint, api_key);
        if let Some(version) = &provider_config.api_version {
            provider = provider.with_api_version(version);
        }
        if provider_config.use_bearer {
            provider = provider.with_bearer();
        }
        return Some(Arc::new(provider));
    }

    let base_url = provider_config
        .api_url
        .clone()
        .or_else(|| default_base_url(name))?;
    Some(Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new("openai");
        let provider = Arc::new(OpenAiCompatProvider::openai("sk-test"));
        router.register("openai", provider);

        assert!(router.get("openai").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default().is_some());
        assert_eq!(router.list(), vec!["openai"]);
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openai").unwrap().contains("api.openai.com"));
        assert!(default_base_url("ollama").unwrap().contains("localhost:11434"));
        assert!(default_base_url("azure").is_none());
    }

    #[test]
    fn azure_without_endpoint_has_no_default() {
        let config = AppConfig::default();
        let router = build_from_config(&config);
        assert!(router.default().is_none());
    }

    #[test]
    fn azure_with_endpoint_is_registered() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "azure".into(),
            ProviderConfig {
                api_url: Some("https://res.openai.azure.com".into()),
                ..ProviderConfig::default()
            },
        );
        let router = build_from_config(&config);
        let provider = router.default().unwrap();
        assert_eq!(provider.name(), "azure");
    }

    #[test]
    fn well_known_default_needs_no_entry() {
        let config = AppConfig {
            default_provider: "openai".into(),
            api_key: Some("sk".into()),
            ..AppConfig::default()
        };
        let router = build_from_config(&config);
        assert_eq!(router.default().unwrap().name(), "openai");
    }
}
