use super::{
    done, limit, params_or_none, path_id, pick, req_str, req_str_array, schema, without,
    ToolDescriptor, ToolResult,
};
use crate::http::{encode_path_segment, ApiClient};
use serde_json::{json, Value};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "lists_list",
            "List all contact lists",
            schema(
                json!({
                    "limit": {"type": "integer"},
                    "include_count": {"type": "boolean"},
                    "include_membership_count": {"type": "string", "enum": ["all", "active", "unsubscribed"]}
                }),
                &[],
            ),
        ),
        ToolDescriptor::new(
            "lists_get",
            "Get a contact list by ID",
            schema(
                json!({
                    "list_id": {"type": "string"},
                    "include_membership_count": {"type": "string", "enum": ["all", "active", "unsubscribed"]}
                }),
                &["list_id"],
            ),
        ),
        ToolDescriptor::new(
            "lists_create",
            "Create a contact list",
            schema(
                json!({
                    "name": {"type": "string"},
                    "description": {"type": "string"},
                    "favorite": {"type": "boolean"}
                }),
                &["name"],
            ),
        ),
        ToolDescriptor::new(
            "lists_update",
            "Update a contact list",
            schema(
                json!({
                    "list_id": {"type": "string"},
                    "name": {"type": "string"},
                    "description": {"type": "string"},
                    "favorite": {"type": "boolean"}
                }),
                &["list_id"],
            ),
        ),
        ToolDescriptor::new(
            "lists_delete",
            "Delete a contact list",
            schema(json!({"list_id": {"type": "string"}}), &["list_id"]),
        ),
        ToolDescriptor::new(
            "lists_add_contacts",
            "Add contacts to a list",
            schema(
                json!({
                    "list_id": {"type": "string"},
                    "contact_ids": {"type": "array", "items": {"type": "string"}}
                }),
                &["list_id", "contact_ids"],
            ),
        ),
        ToolDescriptor::new(
            "lists_remove_contacts",
            "Remove contacts from a list",
            schema(
                json!({
                    "list_id": {"type": "string"},
                    "contact_ids": {"type": "array", "items": {"type": "string"}}
                }),
                &["list_id", "contact_ids"],
            ),
        ),
        ToolDescriptor::new(
            "lists_get_membership",
            "List the contacts that belong to a list",
            schema(
                json!({
                    "list_id": {"type": "string"},
                    "limit": {"type": "integer"},
                    "status": {"type": "string", "enum": ["all", "active", "unsubscribed"]}
                }),
                &["list_id"],
            ),
        ),
        ToolDescriptor::new(
            "lists_get_stats",
            "Membership statistics for a list",
            schema(json!({"list_id": {"type": "string"}}), &["list_id"]),
        ),
    ]
}

pub async fn call(client: &ApiClient, name: &str, args: &Value) -> Option<ToolResult> {
    let out = match name {
        "lists_list" => list(client, args).await,
        "lists_get" => get(client, args).await,
        "lists_create" => create(client, args).await,
        "lists_update" => update(client, args).await,
        "lists_delete" => delete(client, args).await,
        "lists_add_contacts" => change_membership(client, args, true).await,
        "lists_remove_contacts" => change_membership(client, args, false).await,
        "lists_get_membership" => membership(client, args).await,
        "lists_get_stats" => stats(client, args).await,
        _ => return None,
    };
    Some(out)
}

async fn list(client: &ApiClient, args: &Value) -> ToolResult {
    let params = Value::Object(pick(
        args,
        &["limit", "include_count", "include_membership_count"],
    ));
    let lists = client
        .get_paginated("/contact_lists", Some(&params), limit(args))
        .await?;
    Ok(Value::Array(lists))
}

async fn get(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "list_id")?;
    let params = params_or_none(pick(args, &["include_membership_count"]));
    Ok(client
        .get(&format!("/contact_lists/{}", id), params.as_ref())
        .await?)
}

async fn create(client: &ApiClient, args: &Value) -> ToolResult {
    let mut body = json!({ "name": req_str(args, "name")? });
    if let Some(d) = args.get("description").filter(|v| v.is_string()) {
        body["description"] = d.clone();
    }
    if let Some(f) = args.get("favorite").filter(|v| v.is_boolean()) {
        body["favorite"] = f.clone();
    }
    Ok(client.post("/contact_lists", Some(&body)).await?)
}

async fn update(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "list_id")?;
    let updates = without(args, "list_id");
    Ok(client
        .put(&format!("/contact_lists/{}", id), Some(&updates))
        .await?)
}

async fn delete(client: &ApiClient, args: &Value) -> ToolResult {
    let raw = req_str(args, "list_id")?;
    client
        .delete(&format!("/contact_lists/{}", encode_path_segment(raw)))
        .await?;
    Ok(done(format!("List {} deleted", raw)))
}

/// Membership edits go through each contact's `list_memberships`. A failure
/// on one contact is reported in its row and does not stop the batch.
async fn change_membership(client: &ApiClient, args: &Value, add: bool) -> ToolResult {
    let list_id = req_str(args, "list_id")?;
    let contact_ids = req_str_array(args, "contact_ids")?;
    let mut results = Vec::with_capacity(contact_ids.len());
    for contact_id in contact_ids {
        let row = match update_contact_lists(client, &contact_id, list_id, add).await {
            Ok(true) => json!({ "contact_id": contact_id, "success": true }),
            Ok(false) => {
                json!({ "contact_id": contact_id, "success": true, "message": "Already member" })
            }
            Err(e) => json!({ "contact_id": contact_id, "success": false, "error": e.to_string() }),
        };
        results.push(row);
    }
    Ok(json!({ "results": results }))
}

// Returns false when nothing had to change.
async fn update_contact_lists(
    client: &ApiClient,
    contact_id: &str,
    list_id: &str,
    add: bool,
) -> Result<bool, crate::error::ApiError> {
    let path = format!("/contacts/{}", encode_path_segment(contact_id));
    let contact = client.get(&path, None).await?;
    let mut memberships: Vec<String> = contact
        .get("list_memberships")
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    if add {
        if memberships.iter().any(|m| m == list_id) {
            return Ok(false);
        }
        memberships.push(list_id.to_string());
    } else {
        memberships.retain(|m| m != list_id);
    }
    client
        .put(&path, Some(&json!({ "list_memberships": memberships })))
        .await?;
    Ok(true)
}

async fn membership(client: &ApiClient, args: &Value) -> ToolResult {
    let mut params = pick(args, &["status", "limit"]);
    params.insert("list_ids".into(), json!(req_str(args, "list_id")?));
    let contacts = client
        .get_paginated("/contacts", Some(&Value::Object(params)), limit(args))
        .await?;
    Ok(json!({ "count": contacts.len(), "contacts": contacts }))
}

async fn stats(client: &ApiClient, args: &Value) -> ToolResult {
    let raw = req_str(args, "list_id")?;
    let list = client
        .get(
            &format!("/contact_lists/{}", encode_path_segment(raw)),
            Some(&json!({ "include_membership_count": "all" })),
        )
        .await?;
    let contacts = client
        .get_paginated(
            "/contacts",
            Some(&json!({ "list_ids": raw, "status": "all" })),
            None,
        )
        .await?;
    let permission = |c: &Value, p: &str| {
        c.get("permission_to_send").and_then(Value::as_str) == Some(p)
    };
    let active = contacts.iter().filter(|c| permission(c, "implicit")).count();
    let unsubscribed = contacts
        .iter()
        .filter(|c| permission(c, "unsubscribed"))
        .count();
    Ok(json!({
        "list_id": raw,
        "name": list.get("name").cloned().unwrap_or(Value::Null),
        "total_members": list.get("membership_count").and_then(Value::as_u64).unwrap_or(0),
        "active_members": active,
        "unsubscribed_members": unsubscribed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_tools_require_contact_ids() {
        let names: Vec<String> = descriptors().into_iter().map(|d| d.name).collect();
        assert!(names.contains(&"lists_add_contacts".to_string()));
        let add = descriptors()
            .into_iter()
            .find(|d| d.name == "lists_add_contacts")
            .unwrap();
        assert_eq!(add.input_schema["required"], json!(["list_id", "contact_ids"]));
    }
}
