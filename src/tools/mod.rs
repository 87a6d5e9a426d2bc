//! Tool registry: one tool per Constant Contact operation, grouped by
//! resource family. Each group exposes its descriptors and a dispatcher that
//! claims the tool names it owns.

mod campaigns;
mod contacts;
mod landing_pages;
mod lists;
mod reporting;
mod segments;
mod social;
mod tags;
mod templates;

use crate::error::{ApiError, ErrorInfo};
use crate::http::{encode_path_segment, success_marker, ApiClient};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ToolError {
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::InvalidParams(_) => "invalid_params",
            ToolError::UnknownTool(_) => "unknown_tool",
            ToolError::Api(e) => e.code(),
        }
    }

    pub fn info(&self) -> ErrorInfo {
        match self {
            ToolError::Api(e) => e.info(),
            other => ErrorInfo {
                code: other.code().to_string(),
                message: other.to_string(),
                retriable: false,
            },
        }
    }
}

pub type ToolResult = Result<Value, ToolError>;

pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    let mut tools = Vec::new();
    tools.extend(contacts::descriptors());
    tools.extend(campaigns::descriptors());
    tools.extend(lists::descriptors());
    tools.extend(segments::descriptors());
    tools.extend(templates::descriptors());
    tools.extend(reporting::descriptors());
    tools.extend(landing_pages::descriptors());
    tools.extend(social::descriptors());
    tools.extend(tags::descriptors());
    tools.push(ToolDescriptor::new(
        "rate_limit_status",
        "Report the remaining API call budget and when it resets",
        schema(serde_json::json!({}), &[]),
    ));
    tools
}

/// Run the tool `name` with `args` against `client`.
pub async fn call_tool(client: &ApiClient, name: &str, args: &Value) -> ToolResult {
    if !(args.is_object() || args.is_null()) {
        return Err(ToolError::InvalidParams("arguments must be an object".into()));
    }
    if name == "rate_limit_status" {
        return serde_json::to_value(client.rate_limit_status())
            .map_err(|e| ToolError::Api(ApiError::Other(e.to_string())));
    }
    if let Some(out) = contacts::call(client, name, args).await {
        return out;
    }
    if let Some(out) = campaigns::call(client, name, args).await {
        return out;
    }
    if let Some(out) = lists::call(client, name, args).await {
        return out;
    }
    if let Some(out) = segments::call(client, name, args).await {
        return out;
    }
    if let Some(out) = templates::call(client, name, args).await {
        return out;
    }
    if let Some(out) = reporting::call(client, name, args).await {
        return out;
    }
    if let Some(out) = landing_pages::call(client, name, args).await {
        return out;
    }
    if let Some(out) = social::call(client, name, args).await {
        return out;
    }
    if let Some(out) = tags::call(client, name, args).await {
        return out;
    }
    Err(ToolError::UnknownTool(name.to_string()))
}

// ---- schema helpers ----

pub(crate) fn schema(properties: Value, required: &[&str]) -> Value {
    let mut s = serde_json::json!({
        "type": "object",
        "additionalProperties": false,
        "properties": properties,
    });
    if !required.is_empty() {
        s["required"] = serde_json::json!(required);
    }
    s
}

// ---- argument helpers ----

pub(crate) fn req_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    match args.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            Err(ToolError::InvalidParams(format!("missing required field `{}`", key)))
        }
        Some(_) => Err(ToolError::InvalidParams(format!("`{}` must be a string", key))),
    }
}

pub(crate) fn opt_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Positive numeric argument; numeric strings are accepted.
pub(crate) fn opt_u64(args: &Value, key: &str) -> Option<u64> {
    let n = match args.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    n.filter(|n| *n > 0)
}

pub(crate) fn limit(args: &Value) -> Option<usize> {
    opt_u64(args, "limit").map(|n| n as usize)
}

pub(crate) fn req_str_array(args: &Value, key: &str) -> Result<Vec<String>, ToolError> {
    let Some(Value::Array(items)) = args.get(key) else {
        return Err(ToolError::InvalidParams(format!(
            "`{}` must be an array of strings",
            key
        )));
    };
    items
        .iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                ToolError::InvalidParams(format!("`{}` must be an array of strings", key))
            })
        })
        .collect()
}

/// Percent-encoded path segment from a required id argument.
pub(crate) fn path_id(args: &Value, key: &str) -> Result<String, ToolError> {
    req_str(args, key).map(encode_path_segment)
}

/// Copy the listed keys that are present, non-null and non-false into a new object.
pub(crate) fn pick(args: &Value, keys: &[&str]) -> Map<String, Value> {
    let mut out = Map::new();
    for key in keys {
        match args.get(*key) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => {}
            Some(Value::String(s)) if s.is_empty() => {}
            Some(v) => {
                out.insert((*key).to_string(), v.clone());
            }
        }
    }
    out
}

/// Every argument except `id_key`, for update-style tools.
pub(crate) fn without(args: &Value, id_key: &str) -> Value {
    let mut map = args.as_object().cloned().unwrap_or_default();
    map.remove(id_key);
    Value::Object(map)
}

pub(crate) fn params_or_none(map: Map<String, Value>) -> Option<Value> {
    if map.is_empty() {
        None
    } else {
        Some(Value::Object(map))
    }
}

pub(crate) fn done(message: impl Into<String>) -> Value {
    let mut v = success_marker();
    v["message"] = Value::String(message.into());
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn tool_names_are_unique_and_schemas_are_objects() {
        let tools = tool_descriptors();
        let names: HashSet<_> = tools.iter().map(|t| t.name.clone()).collect();
        assert_eq!(names.len(), tools.len());
        for t in &tools {
            assert_eq!(t.input_schema["type"], "object", "{}", t.name);
        }
        for expected in [
            "contacts_list",
            "lists_list",
            "segments_list",
            "campaigns_list",
            "templates_list",
            "reporting_campaign_stats",
            "landing_pages_list",
            "social_list_posts",
            "tags_list",
            "rate_limit_status",
        ] {
            assert!(names.contains(expected), "missing {}", expected);
        }
    }

    #[test]
    fn required_fields_listed_in_schema() {
        let tools = tool_descriptors();
        let get = tools.iter().find(|t| t.name == "contacts_get").unwrap();
        assert_eq!(get.input_schema["required"], json!(["contact_id"]));
    }

    #[test]
    fn arg_helpers() {
        let args = json!({"id": "a/b", "n": 25, "s": "30", "f": false, "e": "", "arr": ["x", "y"]});
        assert_eq!(path_id(&args, "id").unwrap(), "a%2Fb");
        assert!(matches!(req_str(&args, "missing"), Err(ToolError::InvalidParams(_))));
        assert!(matches!(req_str(&args, "n"), Err(ToolError::InvalidParams(_))));
        assert_eq!(opt_u64(&args, "n"), Some(25));
        assert_eq!(opt_u64(&args, "s"), Some(30));
        assert_eq!(req_str_array(&args, "arr").unwrap(), vec!["x", "y"]);
        let picked = pick(&args, &["n", "f", "e", "nope"]);
        assert_eq!(Value::Object(picked), json!({"n": 25}));
        assert_eq!(without(&json!({"id": 1, "name": "x"}), "id"), json!({"name": "x"}));
    }

    #[test]
    fn done_marker() {
        assert_eq!(done("ok"), json!({"success": true, "message": "ok"}));
    }
}
