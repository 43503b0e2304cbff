//! In-memory `ChatBackend` that replays scripted replies per model.

use crate::client::{ChatBackend, ChatReply, ChatRequest};
use crate::models::{OpenRouterError, Result, SecondOpinionError, TokenUsage};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum StepResult {
    Content(Option<String>, TokenUsage),
    Fail(String),
}

/// One scripted call result.
#[derive(Debug, Clone)]
pub(crate) struct Step {
    delay_ms: u64,
    result: StepResult,
}

impl Step {
    pub(crate) fn text(content: &str) -> Self {
        Self {
            delay_ms: 0,
            result: StepResult::Content(Some(content.to_string()), TokenUsage::default()),
        }
    }

    pub(crate) fn no_content() -> Self {
        Self {
            delay_ms: 0,
            result: StepResult::Content(None, TokenUsage::default()),
        }
    }

    pub(crate) fn fail(message: &str) -> Self {
        Self {
            delay_ms: 0,
            result: StepResult::Fail(message.to_string()),
        }
    }

    pub(crate) fn after_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub(crate) fn with_usage(mut self, prompt: u32, completion: u32) -> Self {
        if let StepResult::Content(_, usage) = &mut self.result {
            *usage = TokenUsage {
                prompt_tokens: Some(prompt),
                completion_tokens: Some(completion),
            };
        }
        self
    }
}

/// Replays steps per model in call order and records every request.
///
/// Models without a script answer with `default_step` when one is set, and
/// with a model-not-found error otherwise.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    default_step: Option<Step>,
    requests: Mutex<Vec<(ChatRequest, Duration)>>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(self, model: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(model.to_string(), steps.into_iter().collect());
        self
    }

    pub(crate) fn default_step(mut self, step: Step) -> Self {
        self.default_step = Some(step);
        self
    }

    pub(crate) fn requests(&self) -> Vec<(ChatRequest, Duration)> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn calls_for(&self, model: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r.model.as_str() == model)
            .count()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest, timeout: Duration) -> Result<ChatReply> {
        let step = {
            self.requests.lock().unwrap().push((request.clone(), timeout));
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(request.model.as_str()) {
                Some(steps) => steps.pop_front().or_else(|| self.default_step.clone()),
                None => self.default_step.clone(),
            }
        };

        let Some(step) = step else {
            return Err(OpenRouterError::ModelNotFound(request.model.to_string()).into());
        };

        if step.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(step.delay_ms)).await;
        }

        match step.result {
            StepResult::Content(content, usage) => Ok(ChatReply { content, usage }),
            StepResult::Fail(message) => Err(SecondOpinionError::Internal(message)),
        }
    }
}
