use std::sync::Arc;

use fitcoach_core::client::CompletionBackend;
use fitcoach_core::config::CoachConfig;

/// Shared handles the tool implementations draw on: the plain HTTP client
/// for the nutrition database and the completion backend for vision calls.
#[derive(Clone)]
pub struct ToolContext {
    pub http: reqwest::Client,
    pub backend: Arc<dyn CompletionBackend>,
    pub config: Arc<CoachConfig>,
}

impl ToolContext {
    pub fn new(backend: Arc<dyn CompletionBackend>, config: Arc<CoachConfig>) -> Self {
        Self {
            http: reqwest::Client::new(),
            backend,
            config,
        }
    }
}
