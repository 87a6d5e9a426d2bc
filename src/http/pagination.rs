use serde_json::Value;
use url::Url;

/// Envelope fields that may carry a page's items, in probe order.
/// The generic field comes first; resource-specific names follow.
pub const ENVELOPE_ITEM_FIELDS: [&str; 8] = [
    "results",
    "contacts",
    "lists",
    "segments",
    "campaigns",
    "pages",
    "posts",
    "tags",
];

pub const DEFAULT_PAGE_LIMIT: u64 = 50;

/// Take the item list out of a listing envelope.
///
/// The first field of [`ENVELOPE_ITEM_FIELDS`] that is present and not null
/// wins, even if it is empty. A winning field that is not an array, or an
/// envelope with none of the fields, yields no items.
pub fn take_items(envelope: &mut Value) -> Vec<Value> {
    let Some(obj) = envelope.as_object_mut() else {
        return Vec::new();
    };
    for field in ENVELOPE_ITEM_FIELDS {
        match obj.get_mut(field) {
            None | Some(Value::Null) => continue,
            Some(Value::Array(items)) => return std::mem::take(items),
            Some(_) => return Vec::new(),
        }
    }
    Vec::new()
}

/// Read the next-page link from `_links.next`, which the API returns either
/// as a bare string or as `{ "href": ... }`.
pub fn next_link(envelope: &Value) -> Option<String> {
    let next = envelope.get("_links")?.get("next")?;
    let href = match next {
        Value::String(s) => s.as_str(),
        Value::Object(o) => o.get("href")?.as_str()?,
        _ => return None,
    };
    if href.trim().is_empty() {
        None
    } else {
        Some(href.to_string())
    }
}

/// Turn a next-page cursor into a request target relative to `base_url`.
///
/// A cursor prefixed with the base URL loses that prefix. Links that repeat
/// the base URL's path (`/v3/contacts?cursor=..` against `https://host/v3`)
/// lose the path. Anything else is returned untouched.
pub fn relativize_cursor(base_url: &str, cursor: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if let Some(rest) = cursor.strip_prefix(base) {
        return rest.to_string();
    }
    if cursor.starts_with("http://") || cursor.starts_with("https://") {
        return cursor.to_string();
    }
    if let Ok(u) = Url::parse(base) {
        let base_path = u.path().trim_end_matches('/');
        if !base_path.is_empty() {
            if let Some(rest) = cursor.strip_prefix(base_path) {
                if rest.starts_with('/') || rest.starts_with('?') {
                    return rest.to_string();
                }
            }
        }
    }
    cursor.to_string()
}
