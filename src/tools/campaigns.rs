use super::{
    done, limit, opt_str, path_id, pick, req_str, req_str_array, schema, without, ToolDescriptor,
    ToolResult,
};
use crate::http::ApiClient;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};

// Custom-code email format in the v3 API.
const FORMAT_TYPE_CUSTOM_CODE: u8 = 5;
const PLACEHOLDER_HTML: &str = "<html><body>Email content here</body></html>";

pub fn descriptors() -> Vec<ToolDescriptor> {
    let activity_only = || {
        schema(
            json!({"campaign_activity_id": {"type": "string"}}),
            &["campaign_activity_id"],
        )
    };
    vec![
        ToolDescriptor::new(
            "campaigns_list",
            "List email campaigns",
            schema(
                json!({
                    "limit": {"type": "integer"},
                    "status": {"type": "string", "enum": ["ALL", "DRAFT", "SCHEDULED", "EXECUTING", "DONE", "ERROR", "REMOVED"]}
                }),
                &[],
            ),
        ),
        ToolDescriptor::new(
            "campaigns_get",
            "Get an email campaign activity by ID",
            schema(json!({"campaign_id": {"type": "string"}}), &["campaign_id"]),
        ),
        ToolDescriptor::new(
            "campaigns_create",
            "Create an email campaign",
            schema(
                json!({
                    "name": {"type": "string"},
                    "subject": {"type": "string"},
                    "from_name": {"type": "string"},
                    "from_email": {"type": "string"},
                    "reply_to_email": {"type": "string"},
                    "preheader": {"type": "string"},
                    "html_content": {"type": "string"}
                }),
                &["name", "subject", "from_name", "from_email", "reply_to_email"],
            ),
        ),
        ToolDescriptor::new(
            "campaigns_update",
            "Update an email campaign activity",
            schema(
                json!({
                    "campaign_activity_id": {"type": "string"},
                    "subject": {"type": "string"},
                    "from_name": {"type": "string"},
                    "from_email": {"type": "string"},
                    "reply_to_email": {"type": "string"},
                    "preheader": {"type": "string"},
                    "html_content": {"type": "string"}
                }),
                &["campaign_activity_id"],
            ),
        ),
        ToolDescriptor::new(
            "campaigns_delete",
            "Delete an email campaign",
            schema(json!({"campaign_id": {"type": "string"}}), &["campaign_id"]),
        ),
        ToolDescriptor::new(
            "campaigns_schedule",
            "Schedule a campaign activity for sending",
            schema(
                json!({
                    "campaign_activity_id": {"type": "string"},
                    "scheduled_date": {"type": "string", "description": "ISO-8601 send time"},
                    "contact_list_ids": {"type": "array", "items": {"type": "string"}},
                    "segment_ids": {"type": "array", "items": {"type": "string"}}
                }),
                &["campaign_activity_id", "scheduled_date"],
            ),
        ),
        ToolDescriptor::new(
            "campaigns_send",
            "Send a campaign activity now",
            schema(
                json!({
                    "campaign_activity_id": {"type": "string"},
                    "contact_list_ids": {"type": "array", "items": {"type": "string"}},
                    "segment_ids": {"type": "array", "items": {"type": "string"}}
                }),
                &["campaign_activity_id", "contact_list_ids"],
            ),
        ),
        ToolDescriptor::new(
            "campaigns_get_stats",
            "Get performance statistics for a campaign activity",
            activity_only(),
        ),
        ToolDescriptor::new(
            "campaigns_list_activities",
            "List the activities of a campaign",
            schema(json!({"campaign_id": {"type": "string"}}), &["campaign_id"]),
        ),
        ToolDescriptor::new(
            "campaigns_clone",
            "Copy a campaign under a new name",
            schema(
                json!({"campaign_id": {"type": "string"}, "new_name": {"type": "string"}}),
                &["campaign_id", "new_name"],
            ),
        ),
        ToolDescriptor::new(
            "campaigns_test_send",
            "Send a test email for a campaign activity",
            schema(
                json!({
                    "campaign_activity_id": {"type": "string"},
                    "email_addresses": {"type": "array", "items": {"type": "string"}},
                    "personal_message": {"type": "string"}
                }),
                &["campaign_activity_id", "email_addresses"],
            ),
        ),
        ToolDescriptor::new(
            "campaigns_unschedule",
            "Remove the schedule from a campaign activity",
            activity_only(),
        ),
    ]
}

pub async fn call(client: &ApiClient, name: &str, args: &Value) -> Option<ToolResult> {
    let out = match name {
        "campaigns_list" => list(client, args).await,
        "campaigns_get" => get(client, args).await,
        "campaigns_create" => create(client, args).await,
        "campaigns_update" => update(client, args).await,
        "campaigns_delete" => delete(client, args).await,
        "campaigns_schedule" => schedule(client, args).await,
        "campaigns_send" => send_now(client, args).await,
        "campaigns_get_stats" => stats(client, args).await,
        "campaigns_list_activities" => activities(client, args).await,
        "campaigns_clone" => clone_campaign(client, args).await,
        "campaigns_test_send" => test_send(client, args).await,
        "campaigns_unschedule" => unschedule(client, args).await,
        _ => return None,
    };
    Some(out)
}

async fn list(client: &ApiClient, args: &Value) -> ToolResult {
    let params = Value::Object(pick(args, &["limit", "status"]));
    let campaigns = client
        .get_paginated("/emails", Some(&params), limit(args))
        .await?;
    Ok(Value::Array(campaigns))
}

async fn get(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "campaign_id")?;
    Ok(client
        .get(&format!("/emails/activities/{}", id), None)
        .await?)
}

async fn create(client: &ApiClient, args: &Value) -> ToolResult {
    let activity = json!({
        "format_type": FORMAT_TYPE_CUSTOM_CODE,
        "from_name": req_str(args, "from_name")?,
        "from_email": req_str(args, "from_email")?,
        "reply_to_email": req_str(args, "reply_to_email")?,
        "subject": req_str(args, "subject")?,
        "preheader": opt_str(args, "preheader").unwrap_or(""),
        "html_content": opt_str(args, "html_content").unwrap_or(PLACEHOLDER_HTML),
    });
    let body = json!({
        "name": req_str(args, "name")?,
        "email_campaign_activities": [activity],
    });
    Ok(client.post("/emails", Some(&body)).await?)
}

async fn update(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "campaign_activity_id")?;
    let updates = without(args, "campaign_activity_id");
    Ok(client
        .patch(&format!("/emails/activities/{}", id), Some(&updates))
        .await?)
}

async fn delete(client: &ApiClient, args: &Value) -> ToolResult {
    let raw = req_str(args, "campaign_id")?;
    let id = path_id(args, "campaign_id")?;
    client.delete(&format!("/emails/{}", id)).await?;
    Ok(done(format!("Campaign {} deleted", raw)))
}

async fn post_schedule(client: &ApiClient, args: &Value, body: Map<String, Value>) -> ToolResult {
    let id = path_id(args, "campaign_activity_id")?;
    Ok(client
        .post(
            &format!("/emails/activities/{}/schedules", id),
            Some(&Value::Object(body)),
        )
        .await?)
}

async fn schedule(client: &ApiClient, args: &Value) -> ToolResult {
    let mut body = pick(args, &["contact_list_ids", "segment_ids"]);
    body.insert(
        "scheduled_date".into(),
        json!(req_str(args, "scheduled_date")?),
    );
    post_schedule(client, args, body).await
}

async fn send_now(client: &ApiClient, args: &Value) -> ToolResult {
    let mut body = pick(args, &["segment_ids"]);
    body.insert(
        "contact_list_ids".into(),
        json!(req_str_array(args, "contact_list_ids")?),
    );
    body.insert(
        "scheduled_date".into(),
        json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    post_schedule(client, args, body).await
}

async fn stats(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "campaign_activity_id")?;
    Ok(client
        .get(
            &format!("/reports/stats/email_campaign_activities/{}", id),
            None,
        )
        .await?)
}

async fn activities(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "campaign_id")?;
    Ok(client.get(&format!("/emails/{}", id), None).await?)
}

async fn clone_campaign(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "campaign_id")?;
    let new_name = req_str(args, "new_name")?;
    let original = client.get(&format!("/emails/{}", id), None).await?;
    let body = json!({
        "name": new_name,
        "email_campaign_activities": original
            .get("campaign_activities")
            .cloned()
            .unwrap_or(Value::Null),
    });
    Ok(client.post("/emails", Some(&body)).await?)
}

async fn test_send(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "campaign_activity_id")?;
    let mut body = pick(args, &["personal_message"]);
    body.insert(
        "email_addresses".into(),
        json!(req_str_array(args, "email_addresses")?),
    );
    Ok(client
        .post(
            &format!("/emails/activities/{}/tests", id),
            Some(&Value::Object(body)),
        )
        .await?)
}

async fn unschedule(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "campaign_activity_id")?;
    client
        .delete(&format!("/emails/activities/{}/schedules", id))
        .await?;
    Ok(done("Campaign unscheduled"))
}
