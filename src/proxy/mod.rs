//! Scoped proxying of client requests onto downstream resources.
//!
//! A proxy endpoint is described once by a [`ProxyDescriptor`] (which
//! verbs it permits, how it rewrites arguments, whether PATCH is gated on
//! ownership) and served by a [`ResourceProxy`], which turns each client
//! request into at most one downstream call.

mod descriptor;
mod dispatch;
mod response;

use std::fmt;

pub use descriptor::ProxyDescriptor;
pub use dispatch::ResourceProxy;
pub use response::{ProxyResponse, error_400, error_403, error_404, error_405};
use serde_json::Value;

use crate::resource::Query;
use crate::session::Principal;

/// The HTTP verbs a proxy endpoint can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Filtered read.
    Get,
    /// Create.
    Post,
    /// Partial update of one record.
    Patch,
}

impl Verb {
    /// Lowercase verb name, as used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Patch => "patch",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated request a proxy serves.
///
/// Proxies mount behind authentication, so a principal is always present.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Verb of the client's request.
    pub verb: Verb,
    /// Principal the request is scoped to.
    pub principal: Principal,
}

/// The arguments a rewrite hook sees and may replace.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    /// Query parameters for a GET.
    pub query: Query,
    /// Body for a POST or PATCH.
    pub payload: Value,
}

/// Client-supplied request parts, before rewriting.
#[derive(Debug, Clone, Default)]
pub struct ProxyRequest {
    /// Record id from the request path, if the request addresses one.
    pub id: Option<String>,
    /// Client-supplied query parameters.
    pub query: Query,
    /// Client-supplied body.
    pub payload: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_display_is_lowercase() {
        assert_eq!(Verb::Get.to_string(), "get");
        assert_eq!(Verb::Post.to_string(), "post");
        assert_eq!(Verb::Patch.as_str(), "patch");
    }
}
