use super::{limit, path_id, pick, req_str, schema, ToolDescriptor, ToolResult};
use crate::http::ApiClient;
use serde_json::{json, Value};

// Tracking reports that are plain paginated listings under an email activity.
const TRACKING_REPORTS: [(&str, &str, &[&str]); 6] = [
    ("reporting_bounce_summary", "bounces", &["bounce_code", "limit"]),
    ("reporting_click_summary", "clicks", &["url_id", "limit"]),
    ("reporting_open_summary", "opens", &["limit"]),
    ("reporting_forwards", "forwards", &["limit"]),
    ("reporting_optouts", "optouts", &["limit"]),
    ("reporting_sends", "sends", &["limit"]),
];

pub fn descriptors() -> Vec<ToolDescriptor> {
    let activity = || {
        schema(
            json!({"campaign_activity_id": {"type": "string"}}),
            &["campaign_activity_id"],
        )
    };
    let activity_paged = || {
        schema(
            json!({
                "campaign_activity_id": {"type": "string"},
                "limit": {"type": "integer"}
            }),
            &["campaign_activity_id"],
        )
    };
    vec![
        ToolDescriptor::new(
            "reporting_campaign_stats",
            "Aggregate statistics for a campaign activity",
            activity(),
        ),
        ToolDescriptor::new(
            "reporting_contact_stats",
            "Activity summary for a contact",
            schema(
                json!({
                    "contact_id": {"type": "string"},
                    "start_date": {"type": "string"},
                    "end_date": {"type": "string"}
                }),
                &["contact_id"],
            ),
        ),
        ToolDescriptor::new(
            "reporting_bounce_summary",
            "Bounce report for a campaign activity",
            schema(
                json!({
                    "campaign_activity_id": {"type": "string"},
                    "bounce_code": {"type": "string"},
                    "limit": {"type": "integer"}
                }),
                &["campaign_activity_id"],
            ),
        ),
        ToolDescriptor::new(
            "reporting_click_summary",
            "Click report for a campaign activity",
            schema(
                json!({
                    "campaign_activity_id": {"type": "string"},
                    "url_id": {"type": "string"},
                    "limit": {"type": "integer"}
                }),
                &["campaign_activity_id"],
            ),
        ),
        ToolDescriptor::new(
            "reporting_open_summary",
            "Open report for a campaign activity",
            activity_paged(),
        ),
        ToolDescriptor::new(
            "reporting_unique_opens",
            "Unique opens and open rate for a campaign activity",
            activity(),
        ),
        ToolDescriptor::new(
            "reporting_unique_clicks",
            "Unique clicks and click rate for a campaign activity",
            activity(),
        ),
        ToolDescriptor::new(
            "reporting_forwards",
            "Forward report for a campaign activity",
            activity_paged(),
        ),
        ToolDescriptor::new(
            "reporting_optouts",
            "Opt-out report for a campaign activity",
            activity_paged(),
        ),
        ToolDescriptor::new(
            "reporting_sends",
            "Send report for a campaign activity",
            activity_paged(),
        ),
        ToolDescriptor::new(
            "reporting_campaign_links",
            "Link click counts for a campaign activity",
            activity(),
        ),
    ]
}

pub async fn call(client: &ApiClient, name: &str, args: &Value) -> Option<ToolResult> {
    if let Some((_, kind, keys)) = TRACKING_REPORTS.iter().find(|(n, _, _)| *n == name) {
        return Some(tracking(client, args, kind, keys).await);
    }
    let out = match name {
        "reporting_campaign_stats" => campaign_stats(client, args).await,
        "reporting_contact_stats" => contact_stats(client, args).await,
        "reporting_unique_opens" => stat_pair(client, args, "unique_opens", "open_rate").await,
        "reporting_unique_clicks" => stat_pair(client, args, "unique_clicks", "click_rate").await,
        "reporting_campaign_links" => links(client, args).await,
        _ => return None,
    };
    Some(out)
}

async fn fetch_activity_stats(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "campaign_activity_id")?;
    Ok(client
        .get(
            &format!("/reports/stats/email_campaign_activities/{}", id),
            None,
        )
        .await?)
}

async fn campaign_stats(client: &ApiClient, args: &Value) -> ToolResult {
    fetch_activity_stats(client, args).await
}

async fn stat_pair(client: &ApiClient, args: &Value, count: &str, rate: &str) -> ToolResult {
    let raw = req_str(args, "campaign_activity_id")?;
    let stats = fetch_activity_stats(client, args).await?;
    let read = |key: &str| {
        stats
            .get("stats")
            .and_then(|s| s.get(key))
            .cloned()
            .filter(|v| !v.is_null())
            .unwrap_or(json!(0))
    };
    let mut out = json!({ "campaign_activity_id": raw });
    out[count] = read(count);
    out[rate] = read(rate);
    Ok(out)
}

async fn contact_stats(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "contact_id")?;
    let params = Value::Object(pick(args, &["start_date", "end_date"]));
    Ok(client
        .get(
            &format!("/reports/contact_reports/{}/activity_summary", id),
            Some(&params),
        )
        .await?)
}

async fn tracking(client: &ApiClient, args: &Value, kind: &str, keys: &[&str]) -> ToolResult {
    let id = path_id(args, "campaign_activity_id")?;
    let params = Value::Object(pick(args, keys));
    let rows = client
        .get_paginated(
            &format!("/reports/email_reports/{}/tracking/{}", id, kind),
            Some(&params),
            limit(args),
        )
        .await?;
    Ok(Value::Array(rows))
}

async fn links(client: &ApiClient, args: &Value) -> ToolResult {
    let id = path_id(args, "campaign_activity_id")?;
    Ok(client
        .get(&format!("/reports/email_reports/{}/links", id), None)
        .await?)
}
