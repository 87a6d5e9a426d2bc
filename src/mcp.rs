use crate::tools::ToolError;
use serde_json::Value;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Wrap a tool's JSON output for `tools/call`. The text block defaults to the
/// pretty-printed value; arrays and scalars go under `structuredContent.result`
/// since that field must be an object. `isError` appears on failures only.
pub fn mcp_wrap(structured: Value, text_opt: Option<String>, is_error: bool) -> Value {
    let text = match text_opt {
        Some(s) => s,
        None => serde_json::to_string_pretty(&structured).unwrap_or_else(|_| "{}".to_string()),
    };
    let structured = match structured {
        Value::Object(_) => structured,
        other => serde_json::json!({ "result": other }),
    };
    let mut obj = serde_json::json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": structured,
    });
    if is_error {
        if let Some(map) = obj.as_object_mut() {
            map.insert("isError".to_string(), Value::Bool(true));
        }
    }
    obj
}

pub fn tool_error_envelope(err: &ToolError) -> Value {
    let structured = serde_json::json!({ "error": err.info() });
    mcp_wrap(structured, Some(format!("Error: {}", err)), true)
}
