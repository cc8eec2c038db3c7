//! Frame classification: request vs response vs notification.
//!
//! The rule is purely structural (presence of `id`/`method`), applied to the
//! already-parsed JSON value — never a full decode into a concrete envelope
//! type before the kind is known. This mirrors `gjson.GetBytes(msg, "id").Exists()`
//! / `"method").Exists()` in the original implementation, and deliberately
//! avoids serde's untagged-enum matching order, which cannot tell a
//! notification apart from a response with every optional field absent.

use serde_json::Value;

use crate::protocol::errors::ProtocolError;
use crate::protocol::message::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

/// The three kinds of inbound frame, each decoded into its concrete type.
pub enum Classified {
    Request(JsonRpcRequest),
    Response(JsonRpcResponse),
    Notification(JsonRpcNotification),
}

/// Classify and decode one raw JSON-RPC envelope.
///
/// # Errors
///
/// Returns `ProtocolError::Serialization` if the envelope's `id`/`method`
/// shape implies one kind but the rest of the object doesn't decode into it.
pub fn classify(raw: &Value) -> Result<Classified, ProtocolError> {
    let has_id = raw.get("id").is_some();
    let has_method = raw.get("method").is_some();

    if !has_id {
        let notification: JsonRpcNotification = serde_json::from_value(raw.clone())?;
        return Ok(Classified::Notification(notification));
    }

    if !has_method {
        let response: JsonRpcResponse = serde_json::from_value(raw.clone())?;
        return Ok(Classified::Response(response));
    }

    let request: JsonRpcRequest = serde_json::from_value(raw.clone())?;
    Ok(Classified::Request(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_has_both_id_and_method() {
        let raw = json!({"jsonrpc":"2.0","id":1,"method":"ping"});
        match classify(&raw).unwrap() {
            Classified::Request(req) => assert_eq!(req.method, "ping"),
            _ => panic!("expected request"),
        }
    }

    #[test]
    fn response_has_id_but_no_method() {
        let raw = json!({"jsonrpc":"2.0","id":1,"result":{}});
        match classify(&raw).unwrap() {
            Classified::Response(resp) => assert_eq!(resp.id, Some(crate::protocol::message::RequestId::new_number(1))),
            _ => panic!("expected response"),
        }
    }

    #[test]
    fn notification_has_no_id() {
        let raw = json!({"jsonrpc":"2.0","method":"notifications/initialized"});
        match classify(&raw).unwrap() {
            Classified::Notification(n) => assert_eq!(n.method, "notifications/initialized"),
            _ => panic!("expected notification"),
        }
    }

    #[test]
    fn empty_response_is_not_misread_as_notification() {
        // A response with neither result nor error (shouldn't normally happen,
        // but has no "method" either) must still classify as Response, not
        // fall through to Notification, since `id` is present.
        let raw = json!({"jsonrpc":"2.0","id":5});
        match classify(&raw).unwrap() {
            Classified::Response(_) => {}
            _ => panic!("expected response"),
        }
    }
}
