//! Client for the external AST-merge service.
//!
//! The delegate is an out-of-process structural merge service consulted
//! before any local heuristic. Its contract is deliberately soft: absent or
//! empty content in the reply means "no answer", not an error, and transport
//! failures are reported as errors for the resolver to swallow. The resolver
//! boundary guarantees that a delegate failure never aborts resolution.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Language;

/// Errors from the delegate transport.
///
/// These never cross the resolver boundary; the resolver treats any error as
/// "no answer" and falls through to local heuristics.
#[derive(Debug, Error)]
pub enum DelegateError {
    /// HTTP request failed (connect, timeout, non-2xx, body decode).
    #[error("delegate request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Client construction failed.
    #[error("delegate client error: {0}")]
    Client(String),
}

/// A structural merge request: one file triple plus its language tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegateRequest {
    pub path: String,
    pub base: String,
    pub left: String,
    pub right: String,
    pub language: Language,
}

/// The delegate's reply.
///
/// `content: None` or an empty string means the service declined to merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DelegateReply {
    pub content: Option<String>,
    #[serde(default)]
    pub diagnostics: Vec<String>,
}

impl DelegateReply {
    /// Returns the merged content if the service produced an answer.
    pub fn answer(&self) -> Option<&str> {
        match self.content.as_deref() {
            Some(c) if !c.is_empty() => Some(c),
            _ => None,
        }
    }
}

/// Capability interface for the structural merge service.
///
/// Implemented by [`HttpAstService`] in production and by in-process fakes
/// in tests.
#[async_trait]
pub trait StructuralMergeDelegate: Send + Sync {
    async fn merge(&self, request: &DelegateRequest) -> Result<DelegateReply, DelegateError>;
}

/// Default request timeout for the delegate service.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the AST-merge service.
pub struct HttpAstService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAstService {
    /// Creates a client for the service at `endpoint` (a full URL).
    pub fn new(endpoint: impl Into<String>) -> Result<Self, DelegateError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| DelegateError::Client(e.to_string()))?;

        Ok(HttpAstService {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl StructuralMergeDelegate for HttpAstService {
    async fn merge(&self, request: &DelegateRequest) -> Result<DelegateReply, DelegateError> {
        let reply = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<DelegateReply>()
            .await?;

        Ok(reply)
    }
}
