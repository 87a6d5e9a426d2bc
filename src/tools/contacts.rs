use super::{
    done, limit, params_or_none, path_id, pick, req_str, req_str_array, schema, without,
    ToolDescriptor, ToolResult,
};
use crate::http::ApiClient;
use serde_json::{json, Map, Value};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "contacts_list",
            "List all contacts with optional filters",
            schema(
                json!({
                    "limit": {"type": "integer", "description": "Maximum number of contacts to return (default 50)"},
                    "email": {"type": "string", "description": "Filter by email address"},
                    "status": {"type": "string", "enum": ["all", "active", "unsubscribed", "removed", "non_subscriber"]},
                    "list_ids": {"type": "string", "description": "Comma-separated list IDs to filter by"},
                    "include_count": {"type": "boolean"}
                }),
                &[],
            ),
        ),
        ToolDescriptor::new(
            "contacts_get",
            "Get a specific contact by contact ID",
            schema(
                json!({
                    "contact_id": {"type": "string"},
                    "include": {"type": "string", "description": "Comma-separated sub-resources, e.g. custom_fields,list_memberships,taggings"}
                }),
                &["contact_id"],
            ),
        ),
        ToolDescriptor::new(
            "contacts_create",
            "Create a new contact",
            schema(
                json!({
                    "email_address": {"type": "string"},
                    "first_name": {"type": "string"},
                    "last_name": {"type": "string"},
                    "job_title": {"type": "string"},
                    "company_name": {"type": "string"},
                    "phone_number": {"type": "string"},
                    "list_memberships": {"type": "array", "items": {"type": "string"}},
                    "street_address": {"type": "string"},
                    "city": {"type": "string"},
                    "state": {"type": "string"},
                    "postal_code": {"type": "string"},
                    "country": {"type": "string"}
                }),
                &["email_address"],
            ),
        ),
        ToolDescriptor::new(
            "contacts_update",
            "Update an existing contact",
            schema(
                json!({
                    "contact_id": {"type": "string"},
                    "email_address": {"type": "string"},
                    "first_name": {"type": "string"},
                    "last_name": {"type": "string"},
                    "job_title": {"type": "string"},
                    "company_name": {"type": "string"},
                    "phone_number": {"type": "string"},
                    "list_memberships": {"type": "array", "items": {"type": "string"}}
                }),
                &["contact_id"],
            ),
        ),
        ToolDescriptor::new(
            "contacts_delete",
            "Delete a contact",
            schema(json!({"contact_id": {"type": "string"}}), &["contact_id"]),
        ),
        ToolDescriptor::new(
            "contacts_search",
            "Search contacts by email, name or list",
            schema(
                json!({
                    "email": {"type": "string"},
                    "first_name": {"type": "string"},
                    "last_name": {"type": "string"},
                    "list_id": {"type": "string"},
                    "limit": {"type": "integer"}
                }),
                &[],
            ),
        ),
        ToolDescriptor::new(
            "contacts_list_tags",
            "List the tags applied to a contact",
            schema(json!({"contact_id": {"type": "string"}}), &["contact_id"]),
        ),
        ToolDescriptor::new(
            "contacts_add_tag",
            "Add a tag to a contact",
            schema(
                json!({"contact_id": {"type": "string"}, "tag_id": {"type": "string"}}),
                &["contact_id", "tag_id"],
            ),
        ),
        ToolDescriptor::new(
            "contacts_remove_tag",
            "Remove a tag from a contact",
            schema(
                json!({"contact_id": {"type": "string"}, "tag_id": {"type": "string"}}),
                &["contact_id", "tag_id"],
            ),
        ),
        ToolDescriptor::new(
            "contacts_import",
            "Start a contact import into one or more lists",
            schema(
                json!({
                    "file_name": {"type": "string"},
                    "list_ids": {"type": "array", "items": {"type": "string"}}
                }),
                &["file_name", "list_ids"],
            ),
        ),
        ToolDescriptor::new(
            "contacts_export",
            "Start a contact export",
            schema(
                json!({
                    "list_ids": {"type": "array", "items": {"type": "string"}},
                    "segment_ids": {"type": "array", "items": {"type": "string"}},
                    "status": {"type": "string", "enum": ["all", "active", "unsubscribed"]}
                }),
                &[],
            ),
        ),
        ToolDescriptor::new(
            "contacts_get_activity",
            "Get tracking activity for a contact",
            schema(
                json!({
                    "contact_id": {"type": "string"},
                    "tracking_type": {"type": "string", "enum": ["em_sends", "em_opens", "em_clicks", "em_bounces", "em_optouts", "em_forwards"]},
                    "limit": {"type": "integer"}
                }),
                &["contact_id"],
            ),
        ),
    ]
}

pub async fn call(client: &ApiClient, name: &str, args: &Value) -> Option<ToolResult> {
    let out = match name {
        "contacts_list" => list(client, args).await,
        "contacts_get" => get(client, args).await,
        "contacts_create" => create(client, args).await,
        "contacts_update" => update(client, args).await,
        "contacts_delete" => delete(client, args).await,
        "contacts_search" => search(client, args).await,
        "contacts_list_tags" => list_tags(client, args).await,
        "contacts_add_tag" => add_tag(client, args).await,
        "contacts_remove_tag" => remove_tag(client, args).await,
        "contacts_import" => import(client, args).await,
        "contacts_export" => export(client, args).await,
        "contacts_get_activity" => activity(client, args).await,
        _ => return None,
    };
    Some(out)
}

async fn list(client: &ApiClient, args: &Value) -> ToolResult {
    let params = Value::Object(pick(
        args,
        &["limit", "email", "status", "list_ids", "include_count"],
    ));
    let contacts = client
        .get_paginated("/contacts", Some(&params), limit(args))
        .await?;
    Ok(json!({ "count": contacts.len(), "contacts": contacts }))
}

async fn get(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "contact_id")?;
    let params = params_or_none(pick(args, &["include"]));
    Ok(client
        .get(&format!("/contacts/{}", id), params.as_ref())
        .await?)
}

async fn create(client: &ApiClient, args: &Value) -> ToolResult {
    let mut contact = Map::new();
    contact.insert(
        "email_address".into(),
        json!(req_str(args, "email_address")?),
    );
    contact.extend(pick(
        args,
        &["first_name", "last_name", "job_title", "company_name"],
    ));
    contact.insert(
        "list_memberships".into(),
        args.get("list_memberships").cloned().unwrap_or(json!([])),
    );
    if let Some(phone) = args.get("phone_number").filter(|v| v.is_string()) {
        contact.insert(
            "phone_numbers".into(),
            json!([{ "phone_number": phone }]),
        );
    }
    let address = pick(args, &["street_address", "city", "state", "postal_code", "country"]);
    if !address.is_empty() {
        let mut addr = Map::new();
        for (k, v) in address {
            let key = if k == "street_address" { "street".to_string() } else { k };
            addr.insert(key, v);
        }
        contact.insert("street_addresses".into(), json!([addr]));
    }
    Ok(client
        .post("/contacts", Some(&Value::Object(contact)))
        .await?)
}

async fn update(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "contact_id")?;
    let mut updates = without(args, "contact_id");
    if let Some(map) = updates.as_object_mut() {
        if let Some(phone) = map.remove("phone_number") {
            if !map.contains_key("phone_numbers") {
                map.insert("phone_numbers".into(), json!([{ "phone_number": phone }]));
            }
        }
    }
    Ok(client
        .put(&format!("/contacts/{}", id), Some(&updates))
        .await?)
}

async fn delete(client: &ApiClient, args: &Value) -> ToolResult {
    let raw = req_str(args, "contact_id")?;
    let id = path_id(args, "contact_id")?;
    client.delete(&format!("/contacts/{}", id)).await?;
    Ok(done(format!("Contact {} deleted", raw)))
}

async fn search(client: &ApiClient, args: &Value) -> ToolResult {
    let mut params = pick(args, &["email", "first_name", "last_name", "limit"]);
    if let Some(list_id) = args.get("list_id").filter(|v| v.is_string()) {
        params.insert("list_ids".into(), list_id.clone());
    }
    let contacts = client
        .get_paginated("/contacts", Some(&Value::Object(params)), limit(args))
        .await?;
    Ok(Value::Array(contacts))
}

async fn list_tags(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "contact_id")?;
    let contact = client
        .get(&format!("/contacts/{}", id), Some(&json!({"include": "taggings"})))
        .await?;
    let tags = contact.get("taggings").cloned().unwrap_or(json!([]));
    Ok(json!({ "tags": tags }))
}

async fn add_tag(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "contact_id")?;
    let tag_id = req_str(args, "tag_id")?;
    client
        .post(
            &format!("/contacts/{}/taggings", id),
            Some(&json!({ "tag_id": tag_id })),
        )
        .await?;
    Ok(done("Tag added to contact"))
}

async fn remove_tag(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "contact_id")?;
    let tag_id = path_id(args, "tag_id")?;
    client
        .delete(&format!("/contacts/{}/taggings/{}", id, tag_id))
        .await?;
    Ok(done("Tag removed from contact"))
}

async fn import(client: &ApiClient, args: &Value) -> ToolResult {
    let body = json!({
        "file_name": req_str(args, "file_name")?,
        "list_ids": req_str_array(args, "list_ids")?,
    });
    Ok(client.post("/contacts/imports", Some(&body)).await?)
}

async fn export(client: &ApiClient, args: &Value) -> ToolResult {
    let body = Value::Object(pick(args, &["list_ids", "segment_ids", "status"]));
    Ok(client.post("/contacts/exports", Some(&body)).await?)
}

async fn activity(client: &ApiClient, args: &Value) -> ToolResult {
    let mut params = Map::new();
    params.insert("contact_id".into(), json!(req_str(args, "contact_id")?));
    if let Some(t) = args.get("tracking_type").filter(|v| v.is_string()) {
        params.insert("tracking_activities".into(), t.clone());
    }
    params.extend(pick(args, &["limit"]));
    let items = client
        .get_paginated(
            "/reports/contact_tracking",
            Some(&Value::Object(params)),
            limit(args),
        )
        .await?;
    Ok(Value::Array(items))
}
