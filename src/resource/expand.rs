//! Cross-resource expansion.
//!
//! Downstream records reference each other by URI-valued fields. Given a
//! page of records and a spec of which fields to follow, [`expand`]
//! replaces each named URI in place with the fetched record, recursing
//! into nested specs. Expansion is driven entirely by the spec: no field
//! is followed unless named, and every resolved field costs one GET even
//! when two records reference the same URI.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tracing::debug;

use crate::error::{GatewayError, Result};
use crate::resource::ResourceService;

/// Which URI-valued fields to expand, and how deep.
///
/// Fields are followed in the order they were added. A nested spec is
/// applied to the fetched record before it replaces the URI.
///
/// # Examples
///
/// ```
/// use payfront::resource::ExpansionSpec;
///
/// let spec = ExpansionSpec::new()
///     .field("paymethod")
///     .nested("transaction", ExpansionSpec::new().field("seller_product"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExpansionSpec {
    fields: Vec<(String, Option<ExpansionSpec>)>,
}

impl ExpansionSpec {
    /// Creates an empty spec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field to expand one level.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push((name.into(), None));
        self
    }

    /// Adds a field whose fetched record is itself expanded by `spec`.
    #[must_use]
    pub fn nested(mut self, name: impl Into<String>, spec: ExpansionSpec) -> Self {
        self.fields.push((name.into(), Some(spec)));
        self
    }

    /// The fields in order, with their nested specs.
    #[must_use]
    pub fn entries(&self) -> &[(String, Option<ExpansionSpec>)] {
        &self.fields
    }
}

/// Expands URI-valued fields of every record in `records`, in place.
///
/// Records missing a named field, or holding a non-string value there,
/// are skipped for that field.
///
/// # Errors
///
/// Returns [`GatewayError::ExpansionInput`] if `records` is not an array
/// of objects, and propagates any downstream failure, including
/// [`GatewayError::NotFound`] for dangling references.
pub async fn expand<S: ResourceService>(
    service: &S,
    records: &mut Value,
    spec: &ExpansionSpec,
) -> Result<()> {
    let Value::Array(records) = records else {
        return Err(GatewayError::ExpansionInput(
            "expected an array of records".to_owned(),
        ));
    };
    for record in records {
        expand_record(service, record, spec).await?;
    }
    Ok(())
}

fn expand_record<'a, S: ResourceService>(
    service: &'a S,
    record: &'a mut Value,
    spec: &'a ExpansionSpec,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        let Some(map) = record.as_object_mut() else {
            return Err(GatewayError::ExpansionInput(
                "expected record objects".to_owned(),
            ));
        };
        for (field, nested) in spec.entries() {
            let Some(uri) = map.get(field).and_then(Value::as_str).map(str::to_owned) else {
                continue;
            };
            debug!(%field, %uri, "expanding");
            let mut fetched = service.get_by_uri(&uri).await?;
            if let Some(nested) = nested {
                expand_record(service, &mut fetched, nested).await?;
            }
            map.insert(field.to_owned(), fetched);
        }
        Ok(())
    })
}
