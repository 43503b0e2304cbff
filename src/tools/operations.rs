//! Tool operations.
//!
//! Each tool turns its arguments into a `QueryRequest` and hands it to the
//! dispatcher; the outcomes come back as Markdown plus a summary.

use crate::client::{CatalogCache, CatalogSource, ChatBackend, ModelInfo};
use crate::dispatch::Dispatcher;
use crate::models::{
    BackendOutcome, BackendTarget, QueryRequest, Result, SecondOpinionError, validate_temperature,
};
use crate::report::{AggregateSummary, build_summary, format_results};
use crate::tools::{COMPARE_APPROACHES_PROMPT, FACT_CHECK_PROMPT, ReviewFocus};
use serde::Deserialize;
use std::sync::Arc;

/// Targets containing this marker are search-augmented and go first for fact checks.
pub const SEARCH_PROVIDER_MARKER: &str = "perplexity";

/// Merged result of one tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// For display
    pub markdown: String,
    /// For the calling assistant only
    pub summary: AggregateSummary,
}

impl ToolOutput {
    pub fn from_outcomes(outcomes: &[BackendOutcome]) -> Self {
        Self {
            markdown: format_results(outcomes),
            summary: build_summary(outcomes),
        }
    }
}

fn check_temperature(temperature: Option<f64>) -> Result<Option<f64>> {
    match temperature {
        Some(t) if validate_temperature(t).is_none() => Err(SecondOpinionError::InvalidInput(
            format!("temperature must be between 0 and 2, got {t}"),
        )),
        other => Ok(other),
    }
}

fn check_max_tokens(max_tokens: Option<i64>) -> Result<Option<u32>> {
    max_tokens
        .map(|m| {
            u32::try_from(m)
                .ok()
                .filter(|m| *m > 0)
                .ok_or_else(|| {
                    SecondOpinionError::InvalidInput(format!(
                        "max_tokens must be a positive integer, got {m}"
                    ))
                })
        })
        .transpose()
}

/// Arguments of `get_second_opinion`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecondOpinionArgs {
    pub query: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub models: Option<Vec<BackendTarget>>,
    #[serde(default)]
    pub max_tokens: Option<i64>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl SecondOpinionArgs {
    pub fn into_request(self) -> Result<QueryRequest> {
        Ok(QueryRequest::new(self.query)
            .with_context(self.context)
            .with_system_prompt(self.system_prompt)
            .with_models(self.models)
            .with_temperature(check_temperature(self.temperature)?)
            .with_max_tokens(check_max_tokens(self.max_tokens)?))
    }
}

/// Arguments of `review_code`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewCodeArgs {
    pub code: String,
    #[serde(default)]
    pub language: Option<String>,
    pub focus: ReviewFocus,
    #[serde(default)]
    pub models: Option<Vec<BackendTarget>>,
    #[serde(default)]
    pub max_tokens: Option<i64>,
}

impl ReviewCodeArgs {
    pub fn into_request(self) -> Result<QueryRequest> {
        let lang = self.language.as_deref().unwrap_or("");
        let query = format!("Review the following code:\n\n```{lang}\n{}\n```", self.code);
        Ok(QueryRequest::new(query)
            .with_system_prompt(Some(self.focus.system_prompt().to_string()))
            .with_models(self.models)
            .with_max_tokens(check_max_tokens(self.max_tokens)?))
    }
}

/// Arguments of `compare_approaches`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompareApproachesArgs {
    pub question: String,
    pub approaches: Vec<String>,
    #[serde(default)]
    pub models: Option<Vec<BackendTarget>>,
}

impl CompareApproachesArgs {
    pub fn into_request(self) -> Result<QueryRequest> {
        if self.approaches.len() < 2 {
            return Err(SecondOpinionError::InvalidInput(format!(
                "at least 2 approaches are required, got {}",
                self.approaches.len()
            )));
        }
        let numbered = self
            .approaches
            .iter()
            .enumerate()
            .map(|(i, a)| format!("{}. {a}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");
        let query = format!("{}\n\nApproaches:\n{numbered}", self.question);
        Ok(QueryRequest::new(query)
            .with_system_prompt(Some(COMPARE_APPROACHES_PROMPT.to_string()))
            .with_models(self.models))
    }
}

/// Arguments of `fact_check`.
#[derive(Debug, Clone, Deserialize)]
pub struct FactCheckArgs {
    pub claim: String,
    #[serde(default)]
    pub models: Option<Vec<BackendTarget>>,
}

impl FactCheckArgs {
    /// The target list is always explicit here: the override or the
    /// configured defaults, search-augmented targets first.
    pub fn into_request(self, configured: &[BackendTarget]) -> QueryRequest {
        let models = prioritize_search_models(self.models.unwrap_or_else(|| configured.to_vec()));
        QueryRequest::new(format!("Fact-check the following claim:\n\n\"{}\"", self.claim))
            .with_system_prompt(Some(FACT_CHECK_PROMPT.to_string()))
            .with_models(Some(models))
    }
}

/// Arguments of `model_info`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelInfoArgs {
    #[serde(default)]
    pub models: Option<Vec<BackendTarget>>,
}

/// Stable reorder: search-augmented targets first, others keep their order.
pub fn prioritize_search_models(mut models: Vec<BackendTarget>) -> Vec<BackendTarget> {
    models.sort_by_key(|m| !m.as_str().to_lowercase().contains(SEARCH_PROVIDER_MARKER));
    models
}

/// Every tool operation, bound to one dispatcher and one catalog.
pub struct Toolbox<B: ?Sized> {
    dispatcher: Dispatcher<B>,
    catalog_source: Arc<dyn CatalogSource>,
    catalog: CatalogCache,
}

impl<B: ChatBackend + ?Sized> Toolbox<B> {
    pub fn new(dispatcher: Dispatcher<B>, catalog_source: Arc<dyn CatalogSource>) -> Self {
        Self {
            dispatcher,
            catalog_source,
            catalog: CatalogCache::new(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<B> {
        &self.dispatcher
    }

    /// Generic multi-model query.
    pub async fn second_opinion(&self, args: SecondOpinionArgs) -> Result<ToolOutput> {
        let request = args.into_request()?;
        Ok(self.run(&request).await)
    }

    pub async fn review_code(&self, args: ReviewCodeArgs) -> Result<ToolOutput> {
        let request = args.into_request()?;
        Ok(self.run(&request).await)
    }

    pub async fn compare_approaches(&self, args: CompareApproachesArgs) -> Result<ToolOutput> {
        let request = args.into_request()?;
        Ok(self.run(&request).await)
    }

    pub async fn fact_check(&self, args: FactCheckArgs) -> ToolOutput {
        let request = args.into_request(&self.dispatcher.settings().models);
        self.run(&request).await
    }

    /// Configured targets, verbatim.
    pub fn list_models(&self) -> &[BackendTarget] {
        &self.dispatcher.settings().models
    }

    /// Catalog metadata for the given targets, or for the configured ones.
    pub async fn model_info(&self, args: ModelInfoArgs) -> Result<Vec<ModelInfo>> {
        let catalog = self
            .catalog
            .get_or_fetch(self.catalog_source.as_ref())
            .await?;
        let targets = args
            .models
            .unwrap_or_else(|| self.dispatcher.settings().models.clone());
        Ok(catalog.lookup(&targets))
    }

    async fn run(&self, request: &QueryRequest) -> ToolOutput {
        let outcomes = self.dispatcher.dispatch(request).await;
        ToolOutput::from_outcomes(&outcomes)
    }
}
