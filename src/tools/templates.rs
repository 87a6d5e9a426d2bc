use super::{limit, path_id, pick, schema, ToolDescriptor, ToolResult};
use crate::http::ApiClient;
use serde_json::{json, Value};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "templates_list",
            "List all email templates",
            schema(
                json!({
                    "limit": {"type": "integer"},
                    "type": {"type": "string", "enum": ["custom", "system"]}
                }),
                &[],
            ),
        ),
        ToolDescriptor::new(
            "templates_get",
            "Get an email template by ID",
            schema(json!({"template_id": {"type": "string"}}), &["template_id"]),
        ),
    ]
}

pub async fn call(client: &ApiClient, name: &str, args: &Value) -> Option<ToolResult> {
    let out = match name {
        "templates_list" => list(client, args).await,
        "templates_get" => get(client, args).await,
        _ => return None,
    };
    Some(out)
}

async fn list(client: &ApiClient, args: &Value) -> ToolResult {
    let params = Value::Object(pick(args, &["limit", "type"]));
    let templates = client
        .get_paginated("/emails/templates", Some(&params), limit(args))
        .await?;
    Ok(Value::Array(templates))
}

async fn get(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "template_id")?;
    Ok(client
        .get(&format!("/emails/templates/{}", id), None)
        .await?)
}
