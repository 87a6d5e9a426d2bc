use super::{done, limit, path_id, pick, req_str, schema, without, ToolDescriptor, ToolResult};
use crate::http::ApiClient;
use serde_json::{json, Value};

pub fn descriptors() -> Vec<ToolDescriptor> {
    let page_only = || schema(json!({"page_id": {"type": "string"}}), &["page_id"]);
    vec![
        ToolDescriptor::new(
            "landing_pages_list",
            "List landing pages",
            schema(
                json!({
                    "limit": {"type": "integer"},
                    "status": {"type": "string", "enum": ["DRAFT", "ACTIVE", "DELETED"]}
                }),
                &[],
            ),
        ),
        ToolDescriptor::new("landing_pages_get", "Get a landing page by ID", page_only()),
        ToolDescriptor::new(
            "landing_pages_create",
            "Create a draft landing page",
            schema(
                json!({
                    "name": {"type": "string"},
                    "html_content": {"type": "string"},
                    "description": {"type": "string"}
                }),
                &["name", "html_content"],
            ),
        ),
        ToolDescriptor::new(
            "landing_pages_update",
            "Update a landing page",
            schema(
                json!({
                    "page_id": {"type": "string"},
                    "name": {"type": "string"},
                    "description": {"type": "string"},
                    "html_content": {"type": "string"},
                    "status": {"type": "string", "enum": ["DRAFT", "ACTIVE"]}
                }),
                &["page_id"],
            ),
        ),
        ToolDescriptor::new("landing_pages_delete", "Delete a landing page", page_only()),
        ToolDescriptor::new(
            "landing_pages_publish",
            "Publish (activate) a landing page",
            page_only(),
        ),
        ToolDescriptor::new(
            "landing_pages_get_stats",
            "Visit and conversion statistics for a landing page",
            page_only(),
        ),
    ]
}

pub async fn call(client: &ApiClient, name: &str, args: &Value) -> Option<ToolResult> {
    let out = match name {
        "landing_pages_list" => list(client, args).await,
        "landing_pages_get" => get(client, args).await,
        "landing_pages_create" => create(client, args).await,
        "landing_pages_update" => update(client, args).await,
        "landing_pages_delete" => delete(client, args).await,
        "landing_pages_publish" => publish(client, args).await,
        "landing_pages_get_stats" => stats(client, args).await,
        _ => return None,
    };
    Some(out)
}

async fn list(client: &ApiClient, args: &Value) -> ToolResult {
    let params = Value::Object(pick(args, &["limit", "status"]));
    let pages = client
        .get_paginated("/landing_pages", Some(&params), limit(args))
        .await?;
    Ok(Value::Array(pages))
}

async fn get(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "page_id")?;
    Ok(client.get(&format!("/landing_pages/{}", id), None).await?)
}

async fn create(client: &ApiClient, args: &Value) -> ToolResult {
    let mut body = pick(args, &["description"]);
    body.insert("name".into(), json!(req_str(args, "name")?));
    body.insert("html_content".into(), json!(req_str(args, "html_content")?));
    body.insert("status".into(), json!("DRAFT"));
    Ok(client
        .post("/landing_pages", Some(&Value::Object(body)))
        .await?)
}

async fn update(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "page_id")?;
    let updates = without(args, "page_id");
    Ok(client
        .put(&format!("/landing_pages/{}", id), Some(&updates))
        .await?)
}

async fn delete(client: &ApiClient, args: &Value) -> ToolResult {
    let raw = req_str(args, "page_id")?;
    let id = path_id(args, "page_id")?;
    client.delete(&format!("/landing_pages/{}", id)).await?;
    Ok(done(format!("Landing page {} deleted", raw)))
}

async fn publish(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "page_id")?;
    Ok(client
        .put(
            &format!("/landing_pages/{}", id),
            Some(&json!({ "status": "ACTIVE" })),
        )
        .await?)
}

async fn stats(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "page_id")?;
    Ok(client
        .get(&format!("/reports/landing_pages/{}/stats", id), None)
        .await?)
}
