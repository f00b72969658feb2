//! The downstream calling convention.
//!
//! Every downstream interaction in this crate goes through
//! [`ResourceService`]: three raw verbs plus the derived single-record
//! reads built on top of them. Records are [`serde_json::Value`] because
//! the downstream service owns its schemas; this crate only depends on
//! the handful of fields it reads, checked at the point of use.

use std::future::Future;

use serde_json::Value;
use tracing::debug;

use crate::error::{GatewayError, Result};
use crate::resource::ResourceLocator;

/// Ordered query parameters for a downstream GET.
///
/// Insertion order is preserved; setting an existing key replaces its
/// value in place. Rewrite hooks rely on replace semantics so an injected
/// scoping key always wins over a client-supplied one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    /// Creates an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any existing value for `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Returns the value for `key`, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Whether the query has no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The parameters in insertion order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

/// Client-side calling convention for the downstream resource service.
///
/// Implementors provide the three raw verbs; the single-record reads and
/// URI-addressed get are derived. [`HttpResourceService`] is the
/// production implementation.
///
/// [`HttpResourceService`]: crate::resource::HttpResourceService
pub trait ResourceService: Send + Sync {
    /// GET on a resource, filtered by `query`.
    ///
    /// For a collection locator this returns the downstream's result
    /// array; for a record locator, the record object.
    fn get(
        &self,
        locator: &ResourceLocator,
        query: &Query,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// POST `payload` to a resource, returning the created record.
    fn post(
        &self,
        locator: &ResourceLocator,
        payload: &Value,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// PATCH `payload` onto a single record.
    fn patch(
        &self,
        locator: &ResourceLocator,
        payload: &Value,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// GET expected to match exactly one record.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when the filter matches zero or
    /// more than one record, and [`GatewayError::MalformedRecord`] when
    /// the downstream response is not an array.
    fn get_object(
        &self,
        locator: &ResourceLocator,
        query: &Query,
    ) -> impl Future<Output = Result<Value>> + Send {
        async move {
            let result = self.get(locator, query).await?;
            let Value::Array(mut records) = result else {
                return Err(GatewayError::MalformedRecord(format!(
                    "expected an array from {locator}"
                )));
            };
            if records.len() == 1 {
                Ok(records.remove(0))
            } else {
                debug!(target = %locator, matches = records.len(), "object lookup missed");
                Err(GatewayError::NotFound(locator.to_string()))
            }
        }
    }

    /// Like [`get_object`](ResourceService::get_object), named for call
    /// sites where absence is a hard failure rather than a branch.
    fn get_object_or_404(
        &self,
        locator: &ResourceLocator,
        query: &Query,
    ) -> impl Future<Output = Result<Value>> + Send {
        self.get_object(locator, query)
    }

    /// GET a resource addressed by a URI path, as found in record fields.
    fn get_by_uri(&self, uri: &str) -> impl Future<Output = Result<Value>> + Send {
        let locator = ResourceLocator::parse(uri);
        async move { self.get(&locator, &Query::new()).await }
    }
}

/// Extracts the primary key from a downstream record as a string.
///
/// The downstream serializes `resource_pk` as a number on some resources
/// and a string on others; both are accepted.
pub(crate) fn record_pk(record: &Value) -> Result<String> {
    match record.get("resource_pk") {
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(GatewayError::MalformedRecord(
            "record is missing a resource_pk".to_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::resource::mock::{MockOutcome, MockService};

    #[test]
    fn test_query_set_replaces_in_place() {
        let mut query = Query::new();
        query.set("active", "1");
        query.set("buyer__uuid", "idp:abc");
        query.set("active", "0");

        assert_eq!(query.get("active"), Some("0"));
        assert_eq!(
            query.pairs(),
            [
                ("active".to_owned(), "0".to_owned()),
                ("buyer__uuid".to_owned(), "idp:abc".to_owned()),
            ]
        );
    }

    #[test]
    fn test_query_get_missing() {
        let query = Query::new();
        assert!(query.is_empty());
        assert_eq!(query.get("active"), None);
    }

    #[tokio::test]
    async fn test_get_object_single_match() {
        let service = MockService::new();
        service.respond("get generic.buyer", MockOutcome::Ok(json!([{"resource_pk": 7}])));

        let record = service
            .get_object(&ResourceLocator::from_dotted("generic.buyer"), &Query::new())
            .await
            .unwrap();
        assert_eq!(record["resource_pk"], 7);
    }

    #[tokio::test]
    async fn test_get_object_zero_matches_is_not_found() {
        let service = MockService::new();
        service.respond("get generic.buyer", MockOutcome::Ok(json!([])));

        let result = service
            .get_object(&ResourceLocator::from_dotted("generic.buyer"), &Query::new())
            .await;
        assert!(matches!(result.unwrap_err(), GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_object_many_matches_is_not_found() {
        let service = MockService::new();
        service.respond(
            "get generic.buyer",
            MockOutcome::Ok(json!([{"resource_pk": 1}, {"resource_pk": 2}])),
        );

        let result = service
            .get_object(&ResourceLocator::from_dotted("generic.buyer"), &Query::new())
            .await;
        assert!(matches!(result.unwrap_err(), GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_object_rejects_non_array() {
        let service = MockService::new();
        service.respond("get generic.buyer", MockOutcome::Ok(json!({"resource_pk": 1})));

        let result = service
            .get_object(&ResourceLocator::from_dotted("generic.buyer"), &Query::new())
            .await;
        assert!(matches!(result.unwrap_err(), GatewayError::MalformedRecord(_)));
    }

    #[tokio::test]
    async fn test_get_by_uri_parses_and_dispatches() {
        let service = MockService::new();
        service.respond(
            "get generic.seller(3)",
            MockOutcome::Ok(json!({"resource_pk": 3})),
        );

        let record = service.get_by_uri("/generic/seller/3/").await.unwrap();
        assert_eq!(record["resource_pk"], 3);
        assert_eq!(service.call_count("get", "generic.seller(3)"), 1);
    }

    #[test]
    fn test_record_pk_accepts_number_and_string() {
        assert_eq!(record_pk(&json!({"resource_pk": 42})).unwrap(), "42");
        assert_eq!(record_pk(&json!({"resource_pk": "42"})).unwrap(), "42");
        assert!(matches!(
            record_pk(&json!({"uuid": "x"})).unwrap_err(),
            GatewayError::MalformedRecord(_)
        ));
    }
}
