//! On-demand word definitions, best-effort.
//!
//! A tapped word plus its surrounding sentence go to the same external
//! service the aligner uses.  Lookups are strictly peripheral: the
//! [`SafeLookup`] wrapper turns every failure into a placeholder string
//! so a flaky network can never interrupt practice.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::ServiceConfig;

/// Shown when the service is unreachable or replies with garbage.
pub const LOOKUP_PLACEHOLDER: &str = "No definition available.";

// ---------------------------------------------------------------------------
// LookupError
// ---------------------------------------------------------------------------

/// Errors from the definition service.  Callers normally never see
/// these; [`SafeLookup`] absorbs them.
#[derive(Debug, Error)]
pub enum LookupError {
    /// No API credential configured; the service cannot be called.
    #[error("no definition service credential configured")]
    MissingCredential,

    /// HTTP transport or connection error.
    #[error("definition request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("definition request timed out")]
    Timeout,

    /// The response could not be parsed as the expected JSON shape.
    #[error("failed to parse definition response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LookupError::Timeout
        } else {
            LookupError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// DefinitionProvider trait
// ---------------------------------------------------------------------------

/// Async trait for definition backends.
#[async_trait]
pub trait DefinitionProvider: Send + Sync {
    /// Look up `word` as it occurs inside `context` (usually the
    /// sentence the word was tapped in).
    async fn define(&self, word: &str, context: &str) -> Result<String, LookupError>;
}

// ---------------------------------------------------------------------------
// ApiDefinitionLookup
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WireDefinition {
    definition: String,
}

/// Calls a JSON definition endpoint at `{base_url}/v1/define`.
///
/// Shares the [`ServiceConfig`] credential with the aligner.
pub struct ApiDefinitionLookup {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl ApiDefinitionLookup {
    pub fn from_config(config: &ServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl DefinitionProvider for ApiDefinitionLookup {
    async fn define(&self, word: &str, context: &str) -> Result<String, LookupError> {
        let key = self.config.api_key.as_deref().unwrap_or("");
        if key.is_empty() {
            return Err(LookupError::MissingCredential);
        }

        let url = format!("{}/v1/define", self.config.base_url);
        let body = serde_json::json!({
            "model": self.config.model,
            "word": word,
            "context": context,
        });

        let response = self.client.post(&url).bearer_auth(key).json(&body).send().await?;

        let wire: WireDefinition = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        let definition = wire.definition.trim().to_string();
        if definition.is_empty() {
            return Err(LookupError::Parse("empty definition".into()));
        }
        Ok(definition)
    }
}

// ---------------------------------------------------------------------------
// SafeLookup
// ---------------------------------------------------------------------------

/// Wraps any provider and guarantees a displayable string comes back.
///
/// Failures are logged and replaced with [`LOOKUP_PLACEHOLDER`].
pub struct SafeLookup<P> {
    inner: P,
}

impl<P: DefinitionProvider> SafeLookup<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    /// Never fails.  Whatever the inner provider does, the caller gets
    /// a string it can put on screen.
    pub async fn define(&self, word: &str, context: &str) -> String {
        match self.inner.define(word, context).await {
            Ok(definition) => definition,
            Err(e) => {
                log::warn!("definition lookup for {word:?} failed: {e}");
                LOOKUP_PLACEHOLDER.to_string()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysOk;

    #[async_trait]
    impl DefinitionProvider for AlwaysOk {
        async fn define(&self, word: &str, _context: &str) -> Result<String, LookupError> {
            Ok(format!("{word}: a test definition"))
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl DefinitionProvider for AlwaysFails {
        async fn define(&self, _word: &str, _context: &str) -> Result<String, LookupError> {
            Err(LookupError::Request("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn safe_lookup_passes_through_success() {
        let lookup = SafeLookup::new(AlwaysOk);
        let text = lookup.define("ephemeral", "An ephemeral glow.").await;
        assert_eq!(text, "ephemeral: a test definition");
    }

    #[tokio::test]
    async fn safe_lookup_absorbs_failure() {
        let lookup = SafeLookup::new(AlwaysFails);
        let text = lookup.define("ephemeral", "An ephemeral glow.").await;
        assert_eq!(text, LOOKUP_PLACEHOLDER);
    }

    #[tokio::test]
    async fn missing_credential_without_network() {
        let config = ServiceConfig {
            api_key: None,
            ..ServiceConfig::default()
        };
        let provider = ApiDefinitionLookup::from_config(&config);
        let err = provider.define("word", "context").await.unwrap_err();
        assert!(matches!(err, LookupError::MissingCredential));
    }

    #[test]
    fn wire_definition_parses() {
        let json = r#"{"definition":"  lasting a very short time  "}"#;
        let wire: WireDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(wire.definition.trim(), "lasting a very short time");
    }

    /// `ApiDefinitionLookup` must be usable as `dyn DefinitionProvider`.
    #[test]
    fn provider_is_object_safe() {
        let provider: Box<dyn DefinitionProvider> =
            Box::new(ApiDefinitionLookup::from_config(&ServiceConfig::default()));
        drop(provider);
    }
}
