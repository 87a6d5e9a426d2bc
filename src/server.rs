use crate::http::ApiClient;
use crate::mcp::{mcp_wrap, tool_error_envelope, PROTOCOL_VERSION};
use crate::tools::{call_tool, tool_descriptors};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

// Minimal JSON-RPC 2.0 types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Id {
    Str(String),
    Num(i64),
    Null,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Option<Id>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Option<Id>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

fn rpc_error(id: Option<Id>, code: i64, message: &str, data: Option<Value>) -> Response {
    Response {
        jsonrpc: "2.0".into(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.into(),
            data,
        }),
        id,
    }
}

fn rpc_ok(id: Option<Id>, result: Value) -> Response {
    Response {
        jsonrpc: "2.0".into(),
        result: Some(result),
        error: None,
        id,
    }
}

/// Serve newline-delimited JSON-RPC on stdin/stdout until stdin closes.
pub async fn run_stdio_server(client: ApiClient) -> anyhow::Result<()> {
    info!(
        "Starting constant-contact-mcp stdio server; protocol={} api={}",
        PROTOCOL_VERSION,
        client.base_url()
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if let Some(resp) = handle_line(&client, &line).await {
            write_response(&mut out, &resp).await?;
        }
    }
    info!("stdin closed; shutting down");
    Ok(())
}

async fn write_response<W>(out: &mut W, resp: &Response) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut payload = serde_json::to_vec(resp)?;
    payload.push(b'\n');
    out.write_all(&payload).await?;
    out.flush().await?;
    Ok(())
}

/// Process one input line. Returns `None` for blank lines and notifications.
pub async fn handle_line(client: &ApiClient, line: &str) -> Option<Response> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let raw: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(e) => {
            warn!("Unparseable request: {}", e);
            return Some(rpc_error(
                None,
                PARSE_ERROR,
                &format!("Parse error: {}", e),
                None,
            ));
        }
    };
    let id = raw
        .get("id")
        .and_then(|v| serde_json::from_value::<Id>(v.clone()).ok());
    let req: Request = match serde_json::from_value(raw) {
        Ok(r) => r,
        Err(e) => {
            warn!("Malformed request: {}", e);
            return Some(rpc_error(
                id,
                INVALID_REQUEST,
                &format!("Invalid Request: {}", e),
                None,
            ));
        }
    };
    debug!("Received method={}", req.method);
    if req.id.is_none() {
        debug!("Notification {} acknowledged", req.method);
        return None;
    }
    Some(dispatch(client, req).await)
}

async fn dispatch(client: &ApiClient, req: Request) -> Response {
    match req.method.as_str() {
        "initialize" => handle_initialize(req.id),
        "ping" => rpc_ok(req.id, serde_json::json!({})),
        "tools/list" => handle_tools_list(req.id),
        "tools/call" => handle_tools_call(client, req.id, req.params).await,
        other => rpc_error(
            req.id,
            METHOD_NOT_FOUND,
            &format!("Method not found: {}", other),
            None,
        ),
    }
}

fn handle_initialize(id: Option<Id>) -> Response {
    rpc_ok(
        id,
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": "constant-contact-mcp",
                "version": env!("CARGO_PKG_VERSION"),
            }
        }),
    )
}

fn handle_tools_list(id: Option<Id>) -> Response {
    let tools = tool_descriptors();
    rpc_ok(id, serde_json::json!({ "tools": tools }))
}

#[derive(Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

async fn handle_tools_call(client: &ApiClient, id: Option<Id>, params: Value) -> Response {
    let call: ToolCallParams = match serde_json::from_value(params) {
        Ok(c) => c,
        Err(e) => {
            return rpc_error(id, INVALID_PARAMS, &format!("Invalid params: {}", e), None)
        }
    };
    if !tool_descriptors().iter().any(|t| t.name == call.name) {
        return rpc_error(
            id,
            METHOD_NOT_FOUND,
            &format!("Tool not found: {}", call.name),
            None,
        );
    }
    let args = if call.arguments.is_null() {
        Value::Object(Default::default())
    } else {
        call.arguments
    };
    match call_tool(client, &call.name, &args).await {
        Ok(value) => rpc_ok(id, mcp_wrap(value, None, false)),
        Err(e) => {
            warn!("tool {} failed: {}", call.name, e);
            rpc_ok(id, tool_error_envelope(&e))
        }
    }
}
