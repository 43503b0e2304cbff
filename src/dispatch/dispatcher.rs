//! Query dispatcher: one logical query, every target at once.
//!
//! - All target calls are started together and awaited together
//! - Outcomes come back in target order regardless of completion order
//! - A failing target is recorded as its own error outcome and nothing else
//! - Each branch owns its request, clock and result; nothing is shared

use crate::client::{ChatBackend, ChatRequest, Message};
use crate::models::{BackendOutcome, BackendTarget, Config, QueryRequest};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Responses shorter than this many characters get exactly one retry.
pub const SHORT_RESPONSE_THRESHOLD: usize = 5;

/// Defaults applied when a request leaves something unset.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSettings {
    /// Targets used when the request has no override
    pub models: Vec<BackendTarget>,
    /// Timeout for every individual call, retries included
    pub timeout: Duration,
    pub default_temperature: Option<f64>,
    pub default_max_tokens: Option<u32>,
}

impl From<&Config> for DispatchSettings {
    fn from(config: &Config) -> Self {
        Self {
            models: config.models.clone(),
            timeout: config.timeout(),
            default_temperature: config.default_temperature,
            default_max_tokens: config.default_max_tokens,
        }
    }
}

/// Fans queries out to a chat backend.
pub struct Dispatcher<B: ?Sized> {
    backend: Arc<B>,
    settings: DispatchSettings,
}

impl<B: ChatBackend + ?Sized> Dispatcher<B> {
    pub fn new(backend: Arc<B>, settings: DispatchSettings) -> Self {
        Self { backend, settings }
    }

    pub fn from_config(backend: Arc<B>, config: &Config) -> Self {
        Self::new(backend, DispatchSettings::from(config))
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Explicit override first, configured defaults otherwise.
    pub fn resolve_targets(&self, request: &QueryRequest) -> Vec<BackendTarget> {
        request
            .models
            .clone()
            .unwrap_or_else(|| self.settings.models.clone())
    }

    /// `[system?] + [user]`, with context folded into the user message.
    pub fn build_messages(request: &QueryRequest) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_instruction() {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(request.user_content()));
        messages
    }

    /// Query every resolved target and collect one outcome per target.
    ///
    /// Completes only when every target, including any retry, has finished.
    pub async fn dispatch(&self, request: &QueryRequest) -> Vec<BackendOutcome> {
        let targets = self.resolve_targets(request);
        if targets.is_empty() {
            debug!("No targets resolved, nothing to dispatch");
            return Vec::new();
        }

        let messages = Self::build_messages(request);
        let temperature = request.temperature.or(self.settings.default_temperature);
        let max_tokens = request.max_tokens.or(self.settings.default_max_tokens);

        info!(targets = targets.len(), "Dispatching query");
        let start = Instant::now();

        let calls = targets.into_iter().map(|model| {
            self.query_target(ChatRequest {
                model,
                messages: messages.clone(),
                temperature,
                max_tokens,
            })
        });
        let outcomes = join_all(calls).await;

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            succeeded = outcomes.len() - failed,
            failed = failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Dispatch complete"
        );
        outcomes
    }

    /// One target's branch: call, maybe retry once, record elapsed time.
    async fn query_target(&self, request: ChatRequest) -> BackendOutcome {
        let start = Instant::now();
        let timeout = self.settings.timeout;
        let target = request.model.clone();

        let outcome = match self.backend.complete(&request, timeout).await {
            Ok(reply) => {
                let mut text = reply.content.unwrap_or_default();
                let mut usage = reply.usage;

                if text.chars().count() < SHORT_RESPONSE_THRESHOLD {
                    debug!(model = %target, chars = text.chars().count(), "Short response, retrying once");
                    match self.backend.complete(&request, timeout).await {
                        Ok(retry) => {
                            if let Some(content) = retry.content {
                                text = content;
                                usage = retry.usage;
                            }
                        }
                        Err(e) => {
                            debug!(model = %target, error = %e, "Retry failed, keeping short response");
                        }
                    }
                }

                BackendOutcome::success(target, text).with_usage(usage)
            }
            Err(e) => {
                warn!(model = %target, error = %e, "Target failed");
                BackendOutcome::failure(target, e.to_string())
            }
        };

        outcome.with_latency(start.elapsed().as_millis() as u64)
    }
}
