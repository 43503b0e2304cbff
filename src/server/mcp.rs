//! Stdio MCP server.
//!
//! Newline-delimited JSON-RPC on stdin/stdout. Requests are handled
//! concurrently, so a slow tool call never holds up a `ping`. Responses are
//! written in completion order; clients match them by id.

use crate::client::ChatBackend;
use crate::models::{Config, Result, SecondOpinionError};
use crate::server::protocol::{
    INTERNAL_ERROR, INVALID_REQUEST, JSONRPC_VERSION, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, PARSE_ERROR,
};
use crate::server::schema::{
    COMPARE_APPROACHES, FACT_CHECK, GET_SECOND_OPINION, LIST_MODELS, MODEL_INFO, REVIEW_CODE,
    SERVER_INSTRUCTIONS, tool_definitions,
};
use crate::tools::{ToolOutput, Toolbox};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

pub const SERVER_NAME: &str = "second-opinion";
pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const CONFIG_RESOURCE_URI: &str = "second-opinion://config";

/// Tool and resource handler behind the stdio transport.
pub struct McpServer<B: ?Sized> {
    toolbox: Toolbox<B>,
    config_resource: Value,
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> std::result::Result<T, JsonRpcError> {
    serde_json::from_value(arguments)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid arguments: {e}")))
}

fn tool_error(error: SecondOpinionError) -> JsonRpcError {
    match error {
        SecondOpinionError::InvalidInput(message) => JsonRpcError::invalid_params(message),
        other => JsonRpcError::new(INTERNAL_ERROR, other.to_string()),
    }
}

/// Markdown for display plus the summary for the assistant only.
fn tool_result(output: ToolOutput) -> std::result::Result<Value, JsonRpcError> {
    let summary = serde_json::to_string(&output.summary)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))?;
    Ok(json!({
        "content": [
            {"type": "text", "text": output.markdown},
            {"type": "text", "text": summary, "annotations": {"audience": ["assistant"]}}
        ]
    }))
}

fn text_result(text: String, is_error: bool) -> Value {
    let mut result = json!({"content": [{"type": "text", "text": text}]});
    if is_error {
        result["isError"] = Value::Bool(true);
    }
    result
}

impl<B: ChatBackend + ?Sized> McpServer<B> {
    pub fn new(toolbox: Toolbox<B>, config: &Config) -> Self {
        Self {
            toolbox,
            config_resource: config.resource_json(),
        }
    }

    /// Handle one raw line; `None` when nothing should be written back.
    pub async fn handle_line(&self, line: String) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle(request).await?,
            Err(e) => {
                warn!(error = %e, "Unparseable message");
                JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(PARSE_ERROR, format!("Parse error: {e}")),
                )
            }
        };

        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "Failed to serialize response");
                None
            }
        }
    }

    /// Route one request. Notifications never get a response.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "Request received");

        let Some(id) = request.id else {
            debug!(method = %request.method, "Notification ignored");
            return None;
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(INVALID_REQUEST, "jsonrpc must be \"2.0\""),
            ));
        }
        if id.is_null() {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(INVALID_REQUEST, "id must not be null"),
            ));
        }

        let params = request.params.unwrap_or(Value::Null);
        let result = match request.method.as_str() {
            "initialize" => Ok(self.initialize(&params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({"tools": tool_definitions()})),
            "tools/call" => self.call_tool(params).await,
            "resources/list" => Ok(self.list_resources()),
            "resources/read" => self.read_resource(&params),
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn initialize(&self, params: &Value) -> Value {
        let protocol_version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);
        json!({
            "protocolVersion": protocol_version,
            "capabilities": {"tools": {}, "resources": {}},
            "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")},
            "instructions": SERVER_INSTRUCTIONS,
        })
    }

    async fn call_tool(&self, params: Value) -> std::result::Result<Value, JsonRpcError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("Missing tool name"))?
            .to_string();
        let arguments = params
            .get("arguments")
            .cloned()
            .filter(|a| !a.is_null())
            .unwrap_or_else(|| json!({}));

        info!(tool = %name, "Tool call");

        match name.as_str() {
            GET_SECOND_OPINION => {
                let output = self.toolbox.second_opinion(parse_args(arguments)?).await;
                tool_result(output.map_err(tool_error)?)
            }
            REVIEW_CODE => {
                let output = self.toolbox.review_code(parse_args(arguments)?).await;
                tool_result(output.map_err(tool_error)?)
            }
            COMPARE_APPROACHES => {
                let output = self.toolbox.compare_approaches(parse_args(arguments)?).await;
                tool_result(output.map_err(tool_error)?)
            }
            FACT_CHECK => tool_result(self.toolbox.fact_check(parse_args(arguments)?).await),
            LIST_MODELS => {
                let models = serde_json::to_string(self.toolbox.list_models())
                    .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))?;
                Ok(text_result(models, false))
            }
            MODEL_INFO => match self.toolbox.model_info(parse_args(arguments)?).await {
                Ok(infos) => {
                    let text = serde_json::to_string_pretty(&infos)
                        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))?;
                    Ok(text_result(text, false))
                }
                Err(e) => {
                    warn!(error = %e, "Model catalog lookup failed");
                    Ok(text_result(e.to_string(), true))
                }
            },
            other => Err(JsonRpcError::invalid_params(format!("Unknown tool: {other}"))),
        }
    }

    fn list_resources(&self) -> Value {
        json!({
            "resources": [{
                "uri": CONFIG_RESOURCE_URI,
                "name": "server_config",
                "mimeType": "application/json"
            }]
        })
    }

    fn read_resource(&self, params: &Value) -> std::result::Result<Value, JsonRpcError> {
        let uri = params.get("uri").and_then(Value::as_str).unwrap_or_default();
        if uri != CONFIG_RESOURCE_URI {
            return Err(JsonRpcError::invalid_params(format!("Unknown resource: {uri}")));
        }
        Ok(json!({
            "contents": [{
                "uri": CONFIG_RESOURCE_URI,
                "mimeType": "application/json",
                "text": self.config_resource.to_string()
            }]
        }))
    }

    /// Serve until the input closes, then finish any in-flight requests.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut in_flight = FuturesUnordered::new();

        info!("Serving on stdio");
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line.map_err(|e| SecondOpinionError::io("reading request", e))? {
                        Some(line) => in_flight.push(self.handle_line(line)),
                        None => break,
                    }
                }
                Some(reply) = in_flight.next(), if !in_flight.is_empty() => {
                    if let Some(reply) = reply {
                        write_line(&mut writer, &reply).await?;
                    }
                }
            }
        }

        while let Some(reply) = in_flight.next().await {
            if let Some(reply) = reply {
                write_line(&mut writer, &reply).await?;
            }
        }
        info!("Input closed, shutting down");
        Ok(())
    }
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> Result<()> {
    writer
        .write_all(line.as_bytes())
        .await
        .map_err(|e| SecondOpinionError::io("writing response", e))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| SecondOpinionError::io("writing response", e))?;
    writer
        .flush()
        .await
        .map_err(|e| SecondOpinionError::io("flushing response", e))
}
