use super::{done, limit, path_id, pick, req_str, schema, without, ToolDescriptor, ToolResult};
use crate::http::ApiClient;
use serde_json::{json, Value};

pub fn descriptors() -> Vec<ToolDescriptor> {
    let tag_only = || schema(json!({"tag_id": {"type": "string"}}), &["tag_id"]);
    vec![
        ToolDescriptor::new(
            "tags_list",
            "List all contact tags",
            schema(json!({"limit": {"type": "integer"}}), &[]),
        ),
        ToolDescriptor::new("tags_get", "Get a tag by ID", tag_only()),
        ToolDescriptor::new(
            "tags_create",
            "Create a contact tag",
            schema(
                json!({"name": {"type": "string"}, "tag_source": {"type": "string"}}),
                &["name"],
            ),
        ),
        ToolDescriptor::new(
            "tags_update",
            "Rename a contact tag",
            schema(
                json!({"tag_id": {"type": "string"}, "name": {"type": "string"}}),
                &["tag_id", "name"],
            ),
        ),
        ToolDescriptor::new("tags_delete", "Delete a contact tag", tag_only()),
        ToolDescriptor::new(
            "tags_get_usage",
            "How many contacts carry a tag",
            tag_only(),
        ),
    ]
}

pub async fn call(client: &ApiClient, name: &str, args: &Value) -> Option<ToolResult> {
    let out = match name {
        "tags_list" => list(client, args).await,
        "tags_get" => get(client, args).await,
        "tags_create" => create(client, args).await,
        "tags_update" => update(client, args).await,
        "tags_delete" => delete(client, args).await,
        "tags_get_usage" => usage(client, args).await,
        _ => return None,
    };
    Some(out)
}

async fn list(client: &ApiClient, args: &Value) -> ToolResult {
    let params = Value::Object(pick(args, &["limit"]));
    let tags = client
        .get_paginated("/contact_tags", Some(&params), limit(args))
        .await?;
    Ok(Value::Array(tags))
}

async fn get(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "tag_id")?;
    Ok(client.get(&format!("/contact_tags/{}", id), None).await?)
}

async fn create(client: &ApiClient, args: &Value) -> ToolResult {
    let mut body = pick(args, &["tag_source"]);
    body.insert("name".into(), json!(req_str(args, "name")?));
    Ok(client
        .post("/contact_tags", Some(&Value::Object(body)))
        .await?)
}

async fn update(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "tag_id")?;
    req_str(args, "name")?;
    let updates = without(args, "tag_id");
    Ok(client
        .put(&format!("/contact_tags/{}", id), Some(&updates))
        .await?)
}

async fn delete(client: &ApiClient, args: &Value) -> ToolResult {
    let raw = req_str(args, "tag_id")?;
    let id = path_id(args, "tag_id")?;
    client.delete(&format!("/contact_tags/{}", id)).await?;
    Ok(done(format!("Tag {} deleted", raw)))
}

async fn usage(client: &ApiClient, args: &Value) -> ToolResult {
    let raw = req_str(args, "tag_id")?;
    let id = path_id(args, "tag_id")?;
    let tag = client.get(&format!("/contact_tags/{}", id), None).await?;
    Ok(json!({
        "tag_id": raw,
        "name": tag.get("name").cloned().unwrap_or(Value::Null),
        "contacts_count": tag.get("contacts_count").and_then(Value::as_u64).unwrap_or(0),
        "created_at": tag.get("created_at").cloned().unwrap_or(Value::Null),
    }))
}
