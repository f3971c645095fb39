use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Result, TransformationError};

/// Version marker a structured script result must declare, also exposed to
/// scripts as the `HookshotApiVersion` global.
pub const API_VERSION: &str = "v2";

/// HTTP response a script may ask the webhook endpoint to reply with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Allow-listed mention request attached to message content. Any other
/// key the script put on `mentions` is dropped during interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mentions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<String>>,
}

/// Chat-message content produced by a transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    pub plain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msgtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentions: Option<Mentions>,
}

impl MessageContent {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            plain: text.into(),
            html: None,
            msgtype: None,
            mentions: None,
        }
    }
}

/// Validated outcome of a transformation run.
///
/// `content: None` is the explicit "post nothing" case a script opts into
/// with `empty: true`; a webhook response may accompany either case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_response: Option<WebhookResponse>,
}

/// Reduce the raw `result` value a script produced into the validated v2
/// contract.
///
/// State machine over the raw value:
/// - string → legacy v1 message template
/// - anything that isn't an object → fixed "No content" message
/// - object → full v2 validation; every malformed field is a typed error,
///   never silently dropped or defaulted
///
/// # Errors
///
/// [`TransformationError::VersionMismatch`] when an object result does not
/// declare `version: "v2"`, and the field-level validation errors
/// described on each [`TransformationError`] variant.
pub fn interpret(raw: Value) -> Result<ExecuteResult> {
    let obj = match raw {
        // Legacy v1 api: a bare string is wrapped in a fixed template and
        // never validated further.
        Value::String(text) => {
            return Ok(ExecuteResult {
                content: Some(MessageContent::plain(format!("Received webhook: {text}"))),
                webhook_response: None,
            });
        }
        Value::Object(map) => map,
        // Unassigned, numbers, booleans, arrays: nothing usable.
        _ => {
            return Ok(ExecuteResult {
                content: Some(MessageContent::plain("No content")),
                webhook_response: None,
            });
        }
    };

    match obj.get("version").and_then(Value::as_str) {
        Some(API_VERSION) => {}
        other => {
            return Err(TransformationError::VersionMismatch {
                found: other.map_or_else(|| "none".to_string(), ToString::to_string),
            });
        }
    }

    let webhook_response = obj
        .get("webhookResponse")
        .map(parse_webhook_response)
        .transpose()?;

    if obj.get("empty").is_some_and(js_truthy) {
        return Ok(ExecuteResult {
            content: None,
            webhook_response,
        });
    }

    let plain = obj
        .get("plain")
        .and_then(Value::as_str)
        .ok_or(TransformationError::MissingPlainField)?
        .to_string();
    let html = optional_string(&obj, "html")?;
    let msgtype = optional_string(&obj, "msgtype")?;
    let mentions = obj.get("mentions").map(parse_mentions).transpose()?;

    Ok(ExecuteResult {
        content: Some(MessageContent {
            plain,
            html,
            msgtype,
            mentions,
        }),
        webhook_response,
    })
}

/// JavaScript truthiness over a JSON value. `empty` follows the script's
/// notion of truthy, not strict boolean typing.
fn js_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn optional_string(obj: &Map<String, Value>, field: &'static str) -> Result<Option<String>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(TransformationError::InvalidFieldType { field }),
    }
}

fn parse_webhook_response(value: &Value) -> Result<WebhookResponse> {
    // A non-object `webhookResponse` cannot provide a body, so it fails
    // the same way a missing body does.
    let Some(obj) = value.as_object() else {
        return Err(TransformationError::InvalidWebhookResponse { field: "body" });
    };

    let body = obj
        .get("body")
        .and_then(Value::as_str)
        .ok_or(TransformationError::InvalidWebhookResponse { field: "body" })?
        .to_string();

    let status_code = match obj.get("statusCode") {
        None | Some(Value::Null) => None,
        Some(v) => {
            // Scripts hand us JS numbers; accept integral floats but
            // nothing fractional, and require a real HTTP status code.
            let code = v
                .as_i64()
                .or_else(|| {
                    v.as_f64()
                        .filter(|f| f.fract() == 0.0)
                        .map(|f| f as i64)
                })
                .and_then(|c| u16::try_from(c).ok())
                .filter(|c| (100..=599).contains(c))
                .ok_or(TransformationError::InvalidWebhookResponse {
                    field: "statusCode",
                })?;
            Some(code)
        }
    };

    let content_type = match obj.get("contentType") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(TransformationError::InvalidWebhookResponse {
                field: "contentType",
            });
        }
    };

    Ok(WebhookResponse {
        body,
        status_code,
        content_type,
    })
}

fn parse_mentions(value: &Value) -> Result<Mentions> {
    let Value::Object(obj) = value else {
        return Err(TransformationError::InvalidMentions { field: "mentions" });
    };

    let room = match obj.get("room") {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            return Err(TransformationError::InvalidMentions {
                field: "mentions.room",
            });
        }
    };

    let user_ids = match obj.get("user_ids") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|item| {
                    item.as_str().map(ToString::to_string).ok_or(
                        TransformationError::InvalidMentions {
                            field: "mentions.user_ids",
                        },
                    )
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        Some(_) => {
            return Err(TransformationError::InvalidMentions {
                field: "mentions.user_ids",
            });
        }
    };

    // Everything else the script attached to `mentions` is dropped here.
    Ok(Mentions { room, user_ids })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn legacy_string_result_uses_fixed_template() {
        let result = interpret(json!("ok")).unwrap();
        assert_eq!(result.content.unwrap().plain, "Received webhook: ok");
        assert!(result.webhook_response.is_none());
    }

    #[test]
    fn non_object_results_collapse_to_no_content() {
        for raw in [json!(null), json!(42), json!(true), json!([1, 2])] {
            let result = interpret(raw).unwrap();
            assert_eq!(result.content.unwrap().plain, "No content");
        }
    }

    #[test]
    fn minimal_v2_result() {
        let result = interpret(json!({ "version": "v2", "plain": "hello" })).unwrap();
        let content = result.content.unwrap();
        assert_eq!(content.plain, "hello");
        assert!(content.html.is_none());
        assert!(content.msgtype.is_none());
        assert!(content.mentions.is_none());
        assert!(result.webhook_response.is_none());
    }

    #[test]
    fn missing_plain_is_an_error() {
        let err = interpret(json!({ "version": "v2" })).unwrap_err();
        assert!(matches!(err, TransformationError::MissingPlainField));
    }

    #[test]
    fn non_string_plain_is_an_error() {
        let err = interpret(json!({ "version": "v2", "plain": 5 })).unwrap_err();
        assert!(matches!(err, TransformationError::MissingPlainField));
    }

    #[test]
    fn wrong_version_is_an_error() {
        let err = interpret(json!({ "version": "v1", "plain": "x" })).unwrap_err();
        assert!(matches!(
            err,
            TransformationError::VersionMismatch { found } if found == "v1"
        ));
    }

    #[test]
    fn absent_version_is_an_error() {
        let err = interpret(json!({ "plain": "x" })).unwrap_err();
        assert!(matches!(err, TransformationError::VersionMismatch { .. }));
    }

    #[test]
    fn empty_result_has_no_content() {
        let result = interpret(json!({ "version": "v2", "empty": true })).unwrap();
        assert!(result.content.is_none());
        assert!(result.webhook_response.is_none());
    }

    #[test]
    fn empty_follows_js_truthiness() {
        for truthy in [json!(1), json!("yes"), json!({}), json!([])] {
            let result =
                interpret(json!({ "version": "v2", "empty": truthy, "plain": "p" })).unwrap();
            assert!(result.content.is_none());
        }
        for falsy in [json!(false), json!(0), json!(""), json!(null)] {
            let result =
                interpret(json!({ "version": "v2", "empty": falsy, "plain": "p" })).unwrap();
            assert_eq!(result.content.unwrap().plain, "p");
        }
    }

    #[test]
    fn empty_result_can_carry_a_webhook_response() {
        let result = interpret(json!({
            "version": "v2",
            "empty": true,
            "webhookResponse": { "body": "accepted", "statusCode": 202 }
        }))
        .unwrap();
        assert!(result.content.is_none());
        let response = result.webhook_response.unwrap();
        assert_eq!(response.body, "accepted");
        assert_eq!(response.status_code, Some(202));
        assert!(response.content_type.is_none());
    }

    #[test]
    fn optional_content_fields_are_validated() {
        let result = interpret(json!({
            "version": "v2",
            "plain": "p",
            "html": "<b>p</b>",
            "msgtype": "m.notice"
        }))
        .unwrap();
        let content = result.content.unwrap();
        assert_eq!(content.html.as_deref(), Some("<b>p</b>"));
        assert_eq!(content.msgtype.as_deref(), Some("m.notice"));

        let err = interpret(json!({ "version": "v2", "plain": "p", "html": 1 })).unwrap_err();
        assert!(matches!(
            err,
            TransformationError::InvalidFieldType { field: "html" }
        ));
        let err = interpret(json!({ "version": "v2", "plain": "p", "msgtype": [] })).unwrap_err();
        assert!(matches!(
            err,
            TransformationError::InvalidFieldType { field: "msgtype" }
        ));
    }

    #[test]
    fn mentions_are_sanitized_to_the_allow_list() {
        let result = interpret(json!({
            "version": "v2",
            "plain": "p",
            "mentions": { "room": true, "user_ids": ["@a:x"], "extra": "drop-me" }
        }))
        .unwrap();
        let mentions = result.content.unwrap().mentions.unwrap();
        assert_eq!(mentions.room, Some(true));
        assert_eq!(mentions.user_ids, Some(vec!["@a:x".to_string()]));
        let serialized = serde_json::to_value(&mentions).unwrap();
        assert!(serialized.get("extra").is_none());
    }

    #[test]
    fn invalid_mentions_types_are_errors() {
        let err = interpret(json!({
            "version": "v2", "plain": "p", "mentions": { "room": "yes" }
        }))
        .unwrap_err();
        assert!(matches!(err, TransformationError::InvalidMentions { .. }));

        let err = interpret(json!({
            "version": "v2", "plain": "p", "mentions": { "user_ids": "@a:x" }
        }))
        .unwrap_err();
        assert!(matches!(err, TransformationError::InvalidMentions { .. }));

        let err = interpret(json!({
            "version": "v2", "plain": "p", "mentions": { "user_ids": [1] }
        }))
        .unwrap_err();
        assert!(matches!(err, TransformationError::InvalidMentions { .. }));
    }

    #[test]
    fn webhook_response_body_must_be_a_string() {
        let err = interpret(json!({
            "version": "v2", "plain": "p", "webhookResponse": { "body": 123 }
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            TransformationError::InvalidWebhookResponse { field: "body" }
        ));

        let err = interpret(json!({
            "version": "v2", "plain": "p", "webhookResponse": {}
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            TransformationError::InvalidWebhookResponse { field: "body" }
        ));
    }

    #[test]
    fn webhook_response_status_code_must_be_an_http_integer() {
        for bad in [json!(20.5), json!("200"), json!(99), json!(700), json!(-1)] {
            let err = interpret(json!({
                "version": "v2",
                "plain": "p",
                "webhookResponse": { "body": "b", "statusCode": bad }
            }))
            .unwrap_err();
            assert!(matches!(
                err,
                TransformationError::InvalidWebhookResponse { field: "statusCode" }
            ));
        }

        // An integral float is what a JS number often dumps as.
        let result = interpret(json!({
            "version": "v2",
            "plain": "p",
            "webhookResponse": { "body": "b", "statusCode": 204.0 }
        }))
        .unwrap();
        assert_eq!(result.webhook_response.unwrap().status_code, Some(204));
    }

    #[test]
    fn webhook_response_content_type_must_be_a_string() {
        let err = interpret(json!({
            "version": "v2",
            "plain": "p",
            "webhookResponse": { "body": "b", "contentType": 7 }
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            TransformationError::InvalidWebhookResponse { field: "contentType" }
        ));
    }

    #[test]
    fn webhook_response_is_validated_even_for_empty_results() {
        let err = interpret(json!({
            "version": "v2",
            "empty": true,
            "webhookResponse": { "body": 1 }
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            TransformationError::InvalidWebhookResponse { field: "body" }
        ));
    }
}
