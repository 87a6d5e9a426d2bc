use super::{
    done, limit, path_id, pick, req_str, req_str_array, schema, without, ToolDescriptor,
    ToolResult,
};
use crate::http::ApiClient;
use serde_json::{json, Value};

pub fn descriptors() -> Vec<ToolDescriptor> {
    let post_only = || schema(json!({"post_id": {"type": "string"}}), &["post_id"]);
    vec![
        ToolDescriptor::new(
            "social_list_posts",
            "List social media posts",
            schema(
                json!({
                    "limit": {"type": "integer"},
                    "status": {"type": "string", "enum": ["DRAFT", "SCHEDULED", "PUBLISHED", "FAILED"]}
                }),
                &[],
            ),
        ),
        ToolDescriptor::new("social_get_post", "Get a social post by ID", post_only()),
        ToolDescriptor::new(
            "social_create_post",
            "Create a social post, optionally scheduled",
            schema(
                json!({
                    "content": {"type": "string"},
                    "platforms": {"type": "array", "items": {"type": "string", "enum": ["facebook", "twitter", "linkedin", "instagram"]}},
                    "scheduled_time": {"type": "string"},
                    "image_url": {"type": "string"},
                    "link_url": {"type": "string"}
                }),
                &["content", "platforms"],
            ),
        ),
        ToolDescriptor::new(
            "social_update_post",
            "Update a social post",
            schema(
                json!({
                    "post_id": {"type": "string"},
                    "content": {"type": "string"},
                    "scheduled_time": {"type": "string"},
                    "image_url": {"type": "string"},
                    "link_url": {"type": "string"}
                }),
                &["post_id"],
            ),
        ),
        ToolDescriptor::new("social_delete_post", "Delete a social post", post_only()),
        ToolDescriptor::new(
            "social_publish_now",
            "Publish a social post immediately",
            post_only(),
        ),
    ]
}

pub async fn call(client: &ApiClient, name: &str, args: &Value) -> Option<ToolResult> {
    let out = match name {
        "social_list_posts" => list(client, args).await,
        "social_get_post" => get(client, args).await,
        "social_create_post" => create(client, args).await,
        "social_update_post" => update(client, args).await,
        "social_delete_post" => delete(client, args).await,
        "social_publish_now" => publish(client, args).await,
        _ => return None,
    };
    Some(out)
}

async fn list(client: &ApiClient, args: &Value) -> ToolResult {
    let params = Value::Object(pick(args, &["limit", "status"]));
    let posts = client
        .get_paginated("/social/posts", Some(&params), limit(args))
        .await?;
    Ok(Value::Array(posts))
}

async fn get(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "post_id")?;
    Ok(client.get(&format!("/social/posts/{}", id), None).await?)
}

async fn create(client: &ApiClient, args: &Value) -> ToolResult {
    let mut body = pick(args, &["scheduled_time", "image_url", "link_url"]);
    let status = if body.contains_key("scheduled_time") {
        "SCHEDULED"
    } else {
        "DRAFT"
    };
    body.insert("content".into(), json!(req_str(args, "content")?));
    body.insert(
        "platforms".into(),
        json!(req_str_array(args, "platforms")?),
    );
    body.insert("status".into(), json!(status));
    Ok(client
        .post("/social/posts", Some(&Value::Object(body)))
        .await?)
}

async fn update(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "post_id")?;
    let updates = without(args, "post_id");
    Ok(client
        .put(&format!("/social/posts/{}", id), Some(&updates))
        .await?)
}

async fn delete(client: &ApiClient, args: &Value) -> ToolResult {
    let raw = req_str(args, "post_id")?;
    let id = path_id(args, "post_id")?;
    client.delete(&format!("/social/posts/{}", id)).await?;
    Ok(done(format!("Social post {} deleted", raw)))
}

async fn publish(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "post_id")?;
    Ok(client
        .post(&format!("/social/posts/{}/publish", id), Some(&json!({})))
        .await?)
}
