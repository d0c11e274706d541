use crate::config::OwnershipStyle;
use crate::errors::GamepassError;
use crate::metrics_defs::OWNERSHIP_VERDICTS;
use crate::types::NumericId;
use crate::upstream::{Endpoints, Upstream};
use http::StatusCode;
use serde::{Serialize, Serializer};
use serde_json::Value;
use shared::counter;

/// Serialized as `true`, `false` or `"unknown"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    NotOwned,
    Unknown,
}

impl Ownership {
    fn as_str(&self) -> &'static str {
        match self {
            Ownership::Owned => "owned",
            Ownership::NotOwned => "not_owned",
            Ownership::Unknown => "unknown",
        }
    }
}

impl From<bool> for Ownership {
    fn from(owns: bool) -> Self {
        if owns {
            Ownership::Owned
        } else {
            Ownership::NotOwned
        }
    }
}

impl Serialize for Ownership {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ownership::Owned => serializer.serialize_bool(true),
            Ownership::NotOwned => serializer.serialize_bool(false),
            Ownership::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OwnershipVerdict {
    pub owns: Ownership,
    /// Upstream payload, passed through for diagnostics.
    pub raw: Value,
}

/// Count-like fields consulted when there is no `data` list.
const COUNT_FIELDS: &[&str] = &["totalCount", "total", "count"];

/// Reads an inventory response body into a verdict.
///
/// A `data` list decides by emptiness. Otherwise any positive numeric count
/// field means owned, and numeric counts that are all zero mean not owned.
/// Anything else is unknown.
pub fn interpret_inventory(body: &Value) -> Ownership {
    if let Some(data) = body.get("data").and_then(Value::as_array) {
        return (!data.is_empty()).into();
    }

    let mut counts = COUNT_FIELDS
        .iter()
        .filter_map(|field| body.get(*field).and_then(Value::as_f64))
        .peekable();

    if counts.peek().is_none() {
        return Ownership::Unknown;
    }
    counts.any(|count| count > 0.0).into()
}

/// Reads an `is-owned` body. Only the literal `true`, in any case, means owned.
pub fn interpret_is_owned(body: &str) -> Ownership {
    body.trim().eq_ignore_ascii_case("true").into()
}

/// Checks whether `user_id` owns `game_pass_id` using the configured style.
///
/// Both ids are validated before any upstream call is made.
pub async fn check_ownership(
    upstream: &dyn Upstream,
    endpoints: &Endpoints,
    style: OwnershipStyle,
    api_key: Option<&str>,
    user_id: &str,
    game_pass_id: &str,
) -> Result<OwnershipVerdict, GamepassError> {
    let user_id = NumericId::parse("userId", user_id)?;
    let game_pass_id = NumericId::parse("gamePassId", game_pass_id)?;

    let verdict = match style {
        OwnershipStyle::Inventory => {
            let url = endpoints.inventory_item(&user_id, &game_pass_id);
            let response = upstream.get(&url, api_key).await?;
            let raw = response.json();

            if response.status == StatusCode::NOT_FOUND {
                // Upstream reports items a user does not hold as missing
                OwnershipVerdict {
                    owns: Ownership::NotOwned,
                    raw,
                }
            } else if !response.is_success() {
                return Err(GamepassError::Upstream {
                    status: response.status,
                    body: raw,
                });
            } else {
                OwnershipVerdict {
                    owns: interpret_inventory(&raw),
                    raw,
                }
            }
        }
        OwnershipStyle::IsOwned => {
            let url = endpoints.is_owned(&user_id, &game_pass_id);
            let response = upstream.get(&url, api_key).await?;

            if !response.is_success() {
                return Err(GamepassError::Upstream {
                    status: response.status,
                    body: response.json(),
                });
            }

            OwnershipVerdict {
                owns: interpret_is_owned(&response.body),
                raw: response.json(),
            }
        }
    };

    let style_tag = match style {
        OwnershipStyle::Inventory => "inventory",
        OwnershipStyle::IsOwned => "is_owned",
    };
    counter!(
        OWNERSHIP_VERDICTS,
        "style" => style_tag,
        "verdict" => verdict.owns.as_str()
    )
    .increment(1);

    if verdict.owns == Ownership::Unknown {
        tracing::info!(
            user_id = %user_id,
            game_pass_id = %game_pass_id,
            "Unrecognised ownership response shape"
        );
    }

    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use crate::errors::UpstreamError;
    use crate::testutils::{ScriptedUpstream, json_response, text_response};
    use serde_json::json;

    fn endpoints() -> Endpoints {
        Endpoints::new(&UpstreamConfig::default())
    }

    async fn check(
        upstream: &ScriptedUpstream,
        style: OwnershipStyle,
    ) -> Result<OwnershipVerdict, GamepassError> {
        check_ownership(upstream, &endpoints(), style, None, "1", "2").await
    }

    #[test]
    fn test_interpret_inventory() {
        assert_eq!(interpret_inventory(&json!({"data": []})), Ownership::NotOwned);
        assert_eq!(
            interpret_inventory(&json!({"data": [{"type": "GamePass", "id": 2}]})),
            Ownership::Owned
        );
        assert_eq!(interpret_inventory(&json!({"totalCount": 3})), Ownership::Owned);
        assert_eq!(interpret_inventory(&json!({"total": 0})), Ownership::NotOwned);
        assert_eq!(interpret_inventory(&json!({"count": 1})), Ownership::Owned);
        // Any positive count field is enough
        assert_eq!(
            interpret_inventory(&json!({"totalCount": 0, "count": 5})),
            Ownership::Owned
        );
        assert_eq!(
            interpret_inventory(&json!({"totalCount": 0, "total": 0})),
            Ownership::NotOwned
        );
        assert_eq!(
            interpret_inventory(&json!({"total": "x", "count": 0})),
            Ownership::NotOwned
        );
        // data wins over counts
        assert_eq!(
            interpret_inventory(&json!({"data": [], "totalCount": 5})),
            Ownership::NotOwned
        );
        assert_eq!(interpret_inventory(&json!({"count": "3"})), Ownership::Unknown);
        assert_eq!(interpret_inventory(&json!({"owned": true})), Ownership::Unknown);
        assert_eq!(interpret_inventory(&json!("true")), Ownership::Unknown);
    }

    #[test]
    fn test_interpret_is_owned() {
        assert_eq!(interpret_is_owned("true"), Ownership::Owned);
        assert_eq!(interpret_is_owned("TRUE\n"), Ownership::Owned);
        assert_eq!(interpret_is_owned("false"), Ownership::NotOwned);
        assert_eq!(interpret_is_owned(""), Ownership::NotOwned);
        assert_eq!(interpret_is_owned("yes"), Ownership::NotOwned);
    }

    #[test]
    fn test_serialize_verdict() {
        let owned = OwnershipVerdict {
            owns: Ownership::Owned,
            raw: json!({"data": [1]}),
        };
        assert_eq!(
            serde_json::to_value(&owned).unwrap(),
            json!({"owns": true, "raw": {"data": [1]}})
        );
        assert_eq!(
            serde_json::to_value(Ownership::NotOwned).unwrap(),
            json!(false)
        );
        assert_eq!(
            serde_json::to_value(Ownership::Unknown).unwrap(),
            json!("unknown")
        );
    }

    #[tokio::test]
    async fn test_inventory_style() {
        let upstream = ScriptedUpstream::new(|_, _| {
            json_response(200, json!({"data": [{"type": "GamePass", "instanceId": null}]}))
        });
        let verdict = check(&upstream, OwnershipStyle::Inventory).await.unwrap();
        assert_eq!(verdict.owns, Ownership::Owned);
        assert_eq!(
            upstream.calls()[0].as_str(),
            "https://inventory.roblox.com/v1/users/1/items/GamePass/2"
        );

        let upstream = ScriptedUpstream::new(|_, _| json_response(200, json!({"data": []})));
        let verdict = check(&upstream, OwnershipStyle::Inventory).await.unwrap();
        assert_eq!(verdict.owns, Ownership::NotOwned);
    }

    #[tokio::test]
    async fn test_inventory_not_found_is_not_owned() {
        let upstream = ScriptedUpstream::new(|_, _| {
            json_response(404, json!({"errors": [{"code": 1, "message": "not found"}]}))
        });
        let verdict = check(&upstream, OwnershipStyle::Inventory).await.unwrap();
        assert_eq!(verdict.owns, Ownership::NotOwned);
        assert_eq!(verdict.raw["errors"][0]["code"], json!(1));
    }

    #[tokio::test]
    async fn test_inventory_unknown_shape_keeps_raw() {
        let upstream = ScriptedUpstream::new(|_, _| json_response(200, json!({"weird": "shape"})));
        let verdict = check(&upstream, OwnershipStyle::Inventory).await.unwrap();
        assert_eq!(verdict.owns, Ownership::Unknown);
        assert_eq!(verdict.raw, json!({"weird": "shape"}));
    }

    #[tokio::test]
    async fn test_inventory_error_status_is_forwarded() {
        let upstream = ScriptedUpstream::new(|_, _| {
            json_response(429, json!({"errors": [{"message": "TooManyRequests"}]}))
        });
        let err = check(&upstream, OwnershipStyle::Inventory).await.unwrap_err();
        match err {
            GamepassError::Upstream { status, body } => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(body["errors"][0]["message"], json!("TooManyRequests"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_is_owned_style() {
        let upstream = ScriptedUpstream::new(|_, _| text_response(200, "true"));
        let verdict = check(&upstream, OwnershipStyle::IsOwned).await.unwrap();
        assert_eq!(verdict.owns, Ownership::Owned);
        assert_eq!(
            upstream.calls()[0].as_str(),
            "https://inventory.roblox.com/v1/users/1/items/GamePass/2/is-owned"
        );

        let upstream = ScriptedUpstream::new(|_, _| text_response(200, "False"));
        let verdict = check(&upstream, OwnershipStyle::IsOwned).await.unwrap();
        assert_eq!(verdict.owns, Ownership::NotOwned);
    }

    #[tokio::test]
    async fn test_is_owned_style_has_no_not_found_convention() {
        let upstream = ScriptedUpstream::new(|_, _| text_response(404, "Not Found"));
        let err = check(&upstream, OwnershipStyle::IsOwned).await.unwrap_err();
        assert!(matches!(
            err,
            GamepassError::Upstream { status, .. } if status == StatusCode::NOT_FOUND
        ));
    }

    #[tokio::test]
    async fn test_network_failure() {
        let upstream = ScriptedUpstream::new(|_, _| {
            Err(UpstreamError::RequestFailed(
                "inventory.roblox.com".into(),
                "dns error".into(),
            ))
        });
        let err = check(&upstream, OwnershipStyle::Inventory).await.unwrap_err();
        assert!(matches!(err, GamepassError::Network(_)));
    }

    #[tokio::test]
    async fn test_invalid_ids_make_no_calls() {
        let upstream = ScriptedUpstream::new(|_, _| json_response(200, json!({"data": []})));

        let err = check_ownership(
            &*upstream,
            &endpoints(),
            OwnershipStyle::Inventory,
            None,
            "abc",
            "2",
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "userId must be numeric");

        let err = check_ownership(
            &*upstream,
            &endpoints(),
            OwnershipStyle::IsOwned,
            None,
            "1",
            "",
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "gamePassId must be numeric");

        assert_eq!(upstream.call_count(), 0);
    }

    #[tokio::test]
    async fn test_api_key_is_attached_when_configured() {
        let upstream = ScriptedUpstream::new(|_, _| json_response(200, json!({"data": []})));
        check_ownership(
            &*upstream,
            &endpoints(),
            OwnershipStyle::Inventory,
            Some("secret"),
            "1",
            "2",
        )
        .await
        .unwrap();
        assert_eq!(upstream.api_keys(), vec![Some("secret".to_string())]);
    }
}
