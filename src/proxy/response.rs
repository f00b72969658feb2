//! Proxy responses and the structured error body.
//!
//! Every non-2xx body a proxy returns has the same two-key shape:
//! `error_message` is a fixed human-readable string per status, and
//! `error_response` carries structured detail. String detail is wrapped
//! under the `__all__` form-error key so clients can treat every detail
//! payload as a field-to-messages map.

use serde_json::{Value, json};

/// Status and JSON body a proxy hands back to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: Value,
}

impl ProxyResponse {
    /// A 200 response carrying the downstream's body verbatim.
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn error(status: u16, message: &str, detail: Option<Value>) -> ProxyResponse {
    let error_response = match detail {
        Some(Value::String(s)) => json!({ "__all__": [s] }),
        Some(detail) => detail,
        None => json!({}),
    };
    ProxyResponse {
        status,
        body: json!({
            "error_message": message,
            "error_response": error_response,
        }),
    }
}

/// A 400 response, carrying the downstream's rejection detail when given.
#[must_use]
pub fn error_400(detail: Option<Value>) -> ProxyResponse {
    error(400, "Bad Request", detail)
}

/// A 403 response.
#[must_use]
pub fn error_403(detail: Option<Value>) -> ProxyResponse {
    error(403, "Forbidden", detail)
}

/// A 404 response.
#[must_use]
pub fn error_404(detail: Option<Value>) -> ProxyResponse {
    error(404, "Not Found", detail)
}

/// A 405 response.
#[must_use]
pub fn error_405(detail: Option<Value>) -> ProxyResponse {
    error(405, "Method Not Allowed", detail)
}
