//! Tool descriptions and input schemas advertised by `tools/list`.

use crate::tools::ReviewFocus;
use serde_json::{Value, json};

pub const GET_SECOND_OPINION: &str = "get_second_opinion";
pub const REVIEW_CODE: &str = "review_code";
pub const COMPARE_APPROACHES: &str = "compare_approaches";
pub const FACT_CHECK: &str = "fact_check";
pub const LIST_MODELS: &str = "list_models";
pub const MODEL_INFO: &str = "model_info";

pub const SERVER_INSTRUCTIONS: &str = "This server provides multiple AI perspectives via OpenRouter. Available tools:

- get_second_opinion: General-purpose multi-model query. Supports context, system prompts, model/temperature/max_tokens overrides.
- review_code: Specialized code review with focus areas (security, performance, style, bugs).
- compare_approaches: Compare 2+ technical approaches with pros/cons and a recommendation.
- fact_check: Verify a claim across models, prioritizing search-augmented models.
- list_models: Show currently configured model list.
- model_info: Look up context size, pricing and modality for configured or given models.

Resource: second-opinion://config - read server configuration (models, timeout, defaults).

Present each model's response as-is. The structured JSON summary (audience: assistant) contains latency and success/error counts for your internal use.";

fn models_property() -> Value {
    json!({
        "type": "array",
        "items": {"type": "string"},
        "description": "Override configured models for this request"
    })
}

fn max_tokens_property() -> Value {
    json!({
        "type": "integer",
        "exclusiveMinimum": 0,
        "description": "Max response tokens per model"
    })
}

/// Every advertised tool, in listing order.
pub fn tool_definitions() -> Vec<Value> {
    let focus: Vec<&str> = ReviewFocus::ALL.iter().map(|f| f.as_str()).collect();

    vec![
        json!({
            "name": GET_SECOND_OPINION,
            "description": "Query multiple AI models in parallel via OpenRouter and return their responses. Supports optional context, system prompts, model overrides, and temperature/max_tokens control. Returns Markdown with ### model-name headers separated by --- dividers, plus a JSON structured summary for the assistant.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "The question or prompt to send to all models"},
                    "context": {"type": "string", "description": "Additional context prepended to the query (e.g. code, document, conversation history)"},
                    "system_prompt": {"type": "string", "description": "System prompt sent to all models"},
                    "models": models_property(),
                    "max_tokens": max_tokens_property(),
                    "temperature": {"type": "number", "minimum": 0, "maximum": 2, "description": "Sampling temperature (0-2)"}
                },
                "required": ["query"]
            }
        }),
        json!({
            "name": REVIEW_CODE,
            "description": "Send code to multiple AI models for review with a specific focus area (security, performance, style, or bugs). Each model returns targeted feedback.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "code": {"type": "string", "description": "The code to review"},
                    "language": {"type": "string", "description": "Programming language (e.g. typescript, python)"},
                    "focus": {"type": "string", "enum": focus, "description": "Review focus area"},
                    "models": models_property(),
                    "max_tokens": max_tokens_property()
                },
                "required": ["code", "focus"]
            }
        }),
        json!({
            "name": COMPARE_APPROACHES,
            "description": "Compare two or more technical approaches by sending them to multiple AI models for analysis. Each model provides pros, cons, and a recommendation.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "question": {"type": "string", "description": "The decision or problem to evaluate"},
                    "approaches": {"type": "array", "items": {"type": "string"}, "minItems": 2, "description": "The approaches to compare (minimum 2)"},
                    "models": models_property()
                },
                "required": ["question", "approaches"]
            }
        }),
        json!({
            "name": FACT_CHECK,
            "description": "Fact-check a claim by sending it to multiple AI models. Prioritizes search-augmented models (e.g. Perplexity) when available.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "claim": {"type": "string", "description": "The claim to fact-check"},
                    "models": models_property()
                },
                "required": ["claim"]
            }
        }),
        json!({
            "name": LIST_MODELS,
            "description": "Return the list of AI models currently configured for second-opinion queries.",
            "inputSchema": {"type": "object", "properties": {}}
        }),
        json!({
            "name": MODEL_INFO,
            "description": "Look up OpenRouter catalog metadata (context length, max completion tokens, modality, per-token pricing) for the configured models or the given ones.",
            "inputSchema": {
                "type": "object",
                "properties": {"models": models_property()}
            }
        }),
    ]
}
