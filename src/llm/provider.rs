//! Chat-completion provider selection from the environment

use super::{Endpoint, LlmError, LlmService, LoggingService, OpenAIService};
use std::sync::Arc;

const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Configuration for the chat-completion service
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub azure_deployment: Option<String>,
    pub azure_api_key: Option<String>,
    pub azure_endpoint: Option<String>,
    pub azure_api_version: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub openai_model: Option<String>,
}

impl LlmConfig {
    /// Build from an arbitrary variable lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            azure_deployment: get("AZURE_OPENAI_API_DEPLOYMENT_NAME"),
            azure_api_key: get("AZURE_OPENAI_API_KEY"),
            azure_endpoint: get("AZURE_OPENAI_API_ENDPOINT"),
            azure_api_version: get("AZURE_OPENAI_API_VERSION"),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            openai_model: get("OPENAI_MODEL"),
        }
    }

    fn has_azure(&self) -> bool {
        self.azure_deployment.is_some()
            || self.azure_api_key.is_some()
            || self.azure_endpoint.is_some()
    }

    /// Pick the provider: Azure when any Azure variable is present, then
    /// plain `OpenAI`. Returns the API key and the endpoint.
    pub fn resolve(&self) -> Result<(String, Endpoint), LlmError> {
        if self.has_azure() {
            let missing = |name: &str| LlmError::invalid_request(format!("{name} is not set"));
            let api_key = self
                .azure_api_key
                .clone()
                .ok_or_else(|| missing("AZURE_OPENAI_API_KEY"))?;
            let endpoint = self
                .azure_endpoint
                .clone()
                .ok_or_else(|| missing("AZURE_OPENAI_API_ENDPOINT"))?;
            let deployment = self
                .azure_deployment
                .clone()
                .ok_or_else(|| missing("AZURE_OPENAI_API_DEPLOYMENT_NAME"))?;
            let api_version = self
                .azure_api_version
                .clone()
                .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());

            return Ok((
                api_key,
                Endpoint::Azure {
                    endpoint,
                    deployment,
                    api_version,
                },
            ));
        }

        if let Some(api_key) = &self.openai_api_key {
            return Ok((
                api_key.clone(),
                Endpoint::OpenAI {
                    base_url: self
                        .openai_base_url
                        .clone()
                        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                    model: self
                        .openai_model
                        .clone()
                        .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                },
            ));
        }

        Err(LlmError::invalid_request(
            "no chat-completion service configured (set AZURE_OPENAI_* or OPENAI_API_KEY)",
        ))
    }
}

/// Construct the configured service, wrapped with logging
pub fn connect(config: &LlmConfig) -> Result<Arc<dyn LlmService>, LlmError> {
    let (api_key, endpoint) = config.resolve()?;
    let service: Arc<dyn LlmService> = Arc::new(OpenAIService::new(api_key, endpoint)?);
    Ok(Arc::new(LoggingService::new(service)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> LlmConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        LlmConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn azure_is_preferred() {
        let cfg = config(&[
            ("AZURE_OPENAI_API_DEPLOYMENT_NAME", "gpt-4o"),
            ("AZURE_OPENAI_API_KEY", "az-key"),
            ("AZURE_OPENAI_API_ENDPOINT", "https://acme.openai.azure.com"),
            ("AZURE_OPENAI_API_VERSION", "2024-10-21"),
            ("OPENAI_API_KEY", "sk-ignored"),
        ]);
        let (key, endpoint) = cfg.resolve().unwrap();
        assert_eq!(key, "az-key");
        assert_eq!(
            endpoint,
            Endpoint::Azure {
                endpoint: "https://acme.openai.azure.com".to_string(),
                deployment: "gpt-4o".to_string(),
                api_version: "2024-10-21".to_string(),
            }
        );
    }

    #[test]
    fn partial_azure_config_names_missing_variable() {
        let cfg = config(&[
            ("AZURE_OPENAI_API_DEPLOYMENT_NAME", "gpt-4o"),
            ("AZURE_OPENAI_API_ENDPOINT", "https://acme.openai.azure.com"),
        ]);
        let err = cfg.resolve().unwrap_err();
        assert!(err.message.contains("AZURE_OPENAI_API_KEY"));
    }

    #[test]
    fn azure_version_defaults() {
        let cfg = config(&[
            ("AZURE_OPENAI_API_DEPLOYMENT_NAME", "gpt-4o"),
            ("AZURE_OPENAI_API_KEY", "k"),
            ("AZURE_OPENAI_API_ENDPOINT", "https://acme.openai.azure.com"),
        ]);
        let (_, endpoint) = cfg.resolve().unwrap();
        assert!(endpoint.url().ends_with("api-version=2024-06-01"));
    }

    #[test]
    fn openai_fallback_with_defaults() {
        let cfg = config(&[("OPENAI_API_KEY", "sk-test")]);
        let (key, endpoint) = cfg.resolve().unwrap();
        assert_eq!(key, "sk-test");
        assert_eq!(endpoint.model_id(), "gpt-4o");
        assert_eq!(endpoint.url(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn blank_values_are_unset() {
        let cfg = config(&[("AZURE_OPENAI_API_KEY", "  "), ("OPENAI_API_KEY", "")]);
        assert!(cfg.resolve().is_err());
    }

    #[test]
    fn connect_wraps_service() {
        let cfg = config(&[("OPENAI_API_KEY", "sk-test"), ("OPENAI_MODEL", "gpt-4o-mini")]);
        let service = connect(&cfg).unwrap();
        assert_eq!(service.model_id(), "gpt-4o-mini");
    }
}
