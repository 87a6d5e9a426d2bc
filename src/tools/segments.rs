use super::{
    done, limit, path_id, pick, req_str, schema, without, ToolDescriptor, ToolError, ToolResult,
};
use crate::http::ApiClient;
use serde_json::{json, Value};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "segments_list",
            "List all segments",
            schema(json!({"limit": {"type": "integer"}}), &[]),
        ),
        ToolDescriptor::new(
            "segments_get",
            "Get a segment by ID",
            schema(json!({"segment_id": {"type": "string"}}), &["segment_id"]),
        ),
        ToolDescriptor::new(
            "segments_create",
            "Create a segment from criteria",
            schema(
                json!({
                    "name": {"type": "string"},
                    "segment_criteria": {"type": ["string", "object"], "description": "Criteria as JSON object or JSON-encoded string"}
                }),
                &["name", "segment_criteria"],
            ),
        ),
        ToolDescriptor::new(
            "segments_update",
            "Update a segment",
            schema(
                json!({
                    "segment_id": {"type": "string"},
                    "name": {"type": "string"},
                    "segment_criteria": {"type": ["string", "object"]}
                }),
                &["segment_id"],
            ),
        ),
        ToolDescriptor::new(
            "segments_delete",
            "Delete a segment",
            schema(json!({"segment_id": {"type": "string"}}), &["segment_id"]),
        ),
        ToolDescriptor::new(
            "segments_get_contacts",
            "List the contacts matched by a segment",
            schema(
                json!({"segment_id": {"type": "string"}, "limit": {"type": "integer"}}),
                &["segment_id"],
            ),
        ),
    ]
}

pub async fn call(client: &ApiClient, name: &str, args: &Value) -> Option<ToolResult> {
    let out = match name {
        "segments_list" => list(client, args).await,
        "segments_get" => get(client, args).await,
        "segments_create" => create(client, args).await,
        "segments_update" => update(client, args).await,
        "segments_delete" => delete(client, args).await,
        "segments_get_contacts" => contacts(client, args).await,
        _ => return None,
    };
    Some(out)
}

/// Criteria may arrive as an object or as a JSON-encoded string.
fn parse_criteria(raw: &Value) -> Result<Value, ToolError> {
    match raw {
        Value::String(s) => serde_json::from_str(s)
            .map_err(|_| ToolError::InvalidParams("Invalid segment_criteria JSON".into())),
        other => Ok(other.clone()),
    }
}

async fn list(client: &ApiClient, args: &Value) -> ToolResult {
    let params = Value::Object(pick(args, &["limit"]));
    let segments = client
        .get_paginated("/segments", Some(&params), limit(args))
        .await?;
    Ok(Value::Array(segments))
}

async fn get(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "segment_id")?;
    Ok(client.get(&format!("/segments/{}", id), None).await?)
}

async fn create(client: &ApiClient, args: &Value) -> ToolResult {
    let name = req_str(args, "name")?;
    let criteria = args
        .get("segment_criteria")
        .filter(|v| !v.is_null())
        .ok_or_else(|| ToolError::InvalidParams("missing required field `segment_criteria`".into()))?;
    let body = json!({ "name": name, "segment_criteria": parse_criteria(criteria)? });
    Ok(client.post("/segments", Some(&body)).await?)
}

async fn update(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "segment_id")?;
    let mut updates = without(args, "segment_id");
    if let Some(raw) = updates.get("segment_criteria").filter(|v| !v.is_null()) {
        let parsed = parse_criteria(raw)?;
        updates["segment_criteria"] = parsed;
    }
    Ok(client
        .put(&format!("/segments/{}", id), Some(&updates))
        .await?)
}

async fn delete(client: &ApiClient, args: &Value) -> ToolResult {
    let raw = req_str(args, "segment_id")?;
    let id = path_id(args, "segment_id")?;
    client.delete(&format!("/segments/{}", id)).await?;
    Ok(done(format!("Segment {} deleted", raw)))
}

async fn contacts(client: &ApiClient, args: &Value) -> ToolResult {
    let mut params = pick(args, &["limit"]);
    params.insert("segment_ids".into(), json!(req_str(args, "segment_id")?));
    let contacts = client
        .get_paginated("/contacts", Some(&Value::Object(params)), limit(args))
        .await?;
    Ok(json!({ "count": contacts.len(), "contacts": contacts }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_accepts_object_or_encoded_string() {
        let obj = json!({"version": "1.0.0", "criteria": {"type": "and", "group": []}});
        assert_eq!(parse_criteria(&obj).unwrap(), obj);
        let encoded = Value::String(obj.to_string());
        assert_eq!(parse_criteria(&encoded).unwrap(), obj);
        assert!(matches!(
            parse_criteria(&json!("{not json")),
            Err(ToolError::InvalidParams(_))
        ));
    }
}
