use crate::errors::GamepassError;
use crate::metrics_defs::{PAGINATION_CAP_REACHED, PAGINATION_PAGES};
use crate::normalize::normalize;
use crate::types::NumericId;
use crate::upstream::{Endpoints, Upstream};
use serde_json::Value;
use shared::{counter, histogram};

/// Upper bound on upstream calls for a single listing. Protects against
/// upstream cursor loops and cursors that never run out.
pub const MAX_PAGES: usize = 50;

/// Lists every gamepass created by `user_id`, following upstream cursors.
///
/// Pages are fetched strictly in sequence and concatenated in request order.
/// Items are not deduplicated across pages. Any failed page fails the whole
/// listing and the pages already collected are dropped.
pub async fn list_created_gamepasses(
    upstream: &dyn Upstream,
    endpoints: &Endpoints,
    user_id: &str,
) -> Result<Vec<Value>, GamepassError> {
    let user_id = NumericId::parse("userId", user_id)?;

    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page_fetches = 0;

    loop {
        if page_fetches == MAX_PAGES {
            tracing::warn!(
                user_id = %user_id,
                pages = page_fetches,
                items = items.len(),
                "Stopped paginating at page cap while upstream still returned a cursor"
            );
            counter!(PAGINATION_CAP_REACHED).increment(1);
            break;
        }

        let url = endpoints.created_gamepasses(&user_id, cursor.as_deref());
        let response = upstream.get(&url, None).await?;
        page_fetches += 1;

        if !response.is_success() {
            tracing::warn!(
                user_id = %user_id,
                page = page_fetches,
                status = %response.status,
                "Created gamepasses page failed, discarding partial results"
            );
            return Err(GamepassError::Upstream {
                status: response.status,
                body: response.json(),
            });
        }

        let page = normalize(response.json());
        items.extend(page.items);

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    histogram!(PAGINATION_PAGES).record(page_fetches as f64);
    tracing::debug!(
        user_id = %user_id,
        pages = page_fetches,
        items = items.len(),
        "Fetched created gamepasses"
    );

    Ok(items)
}
