//! Best-effort extraction of items and continuation cursors from upstream
//! bodies whose shape varies by endpoint and API version.
//!
//! Each guess is one entry in an ordered table and the first entry that
//! matches wins. Bodies that match nothing yield an empty page with no cursor,
//! which ends pagination rather than failing it.

use serde_json::Value;

/// Returns the item list for one known response shape, if the body has it.
type ItemsExtractor = fn(&mut Value) -> Option<&mut Vec<Value>>;

/// Returns the raw cursor value for one known response shape.
type CursorExtractor = fn(&Value) -> Option<&Value>;

const ITEM_SHAPES: &[(&str, ItemsExtractor)] = &[
    ("data", |body| body.get_mut("data")?.as_array_mut()),
    ("top-level list", Value::as_array_mut),
    ("gamePasses", |body| body.get_mut("gamePasses")?.as_array_mut()),
    ("items", |body| body.get_mut("items")?.as_array_mut()),
];

const CURSOR_SHAPES: &[(&str, CursorExtractor)] = &[
    ("nextExclusiveStartId", |body| body.get("nextExclusiveStartId")),
    ("nextCursor", |body| body.get("nextCursor")),
    ("meta.nextExclusiveStartId", |body| {
        body.get("meta")?.get("nextExclusiveStartId")
    }),
];

/// One upstream page after normalization.
#[derive(Debug, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub next_cursor: Option<String>,
}

pub fn normalize(mut body: Value) -> Page {
    let next_cursor = extract_cursor(&body);
    let items = extract_items(&mut body);
    Page { items, next_cursor }
}

fn extract_items(body: &mut Value) -> Vec<Value> {
    for (shape, extractor) in ITEM_SHAPES {
        if let Some(items) = extractor(body) {
            tracing::trace!(shape, count = items.len(), "Matched item shape");
            return std::mem::take(items);
        }
    }

    tracing::debug!("No known item shape in upstream body");
    Vec::new()
}

fn extract_cursor(body: &Value) -> Option<String> {
    CURSOR_SHAPES
        .iter()
        .filter_map(|(_, extractor)| extractor(body))
        .find_map(cursor_text)
}

// Cursors are usually strings but some versions return numeric ids.
fn cursor_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
