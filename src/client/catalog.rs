//! Model catalog lookup.
//!
//! Best-effort enrichment: maps target identifiers to descriptive metadata.
//! Unknown identifiers get a synthetic record instead of an error; only a
//! failed upstream fetch is an error.

use crate::models::{BackendTarget, Result, SecondOpinionError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::OnceCell;
use tracing::warn;

/// Descriptive metadata for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub context_length: u64,
    pub max_completion_tokens: Option<u64>,
    pub modality: String,
    pub input_cost_per_token: f64,
    pub output_cost_per_token: f64,
}

impl ModelInfo {
    /// Placeholder for an identifier the catalog does not know.
    pub fn unknown(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            context_length: 0,
            max_completion_tokens: None,
            modality: "unknown".to_string(),
            input_cost_per_token: 0.0,
            output_cost_per_token: 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    data: Vec<Value>,
}

/// Costs arrive as decimal strings; anything unparseable is zero.
fn parse_cost(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    }
    .filter(|c| c.is_finite())
    .unwrap_or(0.0)
}

impl ModelInfo {
    /// Lenient conversion of one `/models` entry; `None` only without an id.
    ///
    /// Numeric fields that are not non-negative integers read as absent.
    fn from_entry(entry: &Value) -> Option<Self> {
        let id = entry.get("id")?.as_str()?;
        let pricing = entry.get("pricing");

        Some(Self {
            id: id.to_string(),
            name: entry
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(id)
                .to_string(),
            context_length: entry
                .get("context_length")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            max_completion_tokens: entry
                .pointer("/top_provider/max_completion_tokens")
                .and_then(Value::as_u64),
            modality: entry
                .pointer("/architecture/modality")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            input_cost_per_token: parse_cost(pricing.and_then(|p| p.get("prompt"))),
            output_cost_per_token: parse_cost(pricing.and_then(|p| p.get("completion"))),
        })
    }
}

/// Snapshot of the remote catalog, keyed by model identifier.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    entries: HashMap<String, ModelInfo>,
}

impl ModelCatalog {
    /// Parse a `/models` response body.
    pub fn from_json(body: &str) -> Result<Self> {
        let response: CatalogResponse = serde_json::from_str(body)
            .map_err(|e| SecondOpinionError::ParseError(format!("Invalid model catalog: {e}")))?;
        let infos: Vec<ModelInfo> = response
            .data
            .iter()
            .filter_map(ModelInfo::from_entry)
            .collect();
        let skipped = response.data.len() - infos.len();
        if skipped > 0 {
            warn!(skipped, "Skipped catalog entries without an id");
        }
        Ok(infos.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Metadata for one identifier, synthetic if unknown.
    pub fn get(&self, id: &str) -> ModelInfo {
        self.entries
            .get(id)
            .cloned()
            .unwrap_or_else(|| ModelInfo::unknown(id))
    }

    /// Metadata for each target, in the given order.
    pub fn lookup(&self, targets: &[BackendTarget]) -> Vec<ModelInfo> {
        targets.iter().map(|t| self.get(t.as_str())).collect()
    }
}

impl FromIterator<ModelInfo> for ModelCatalog {
    fn from_iter<I: IntoIterator<Item = ModelInfo>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|m| (m.id.clone(), m)).collect(),
        }
    }
}

/// Something that can fetch the catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_catalog(&self) -> Result<ModelCatalog>;
}

/// Catalog fetched at most once per process.
///
/// Concurrent first callers share one in-flight fetch. A failed fetch is not
/// remembered, so the next caller tries again.
#[derive(Debug, Default)]
pub struct CatalogCache {
    cell: OnceCell<ModelCatalog>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_fetch<S>(&self, source: &S) -> Result<&ModelCatalog>
    where
        S: CatalogSource + ?Sized,
    {
        self.cell.get_or_try_init(|| source.fetch_catalog()).await
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}
