//! Buyer sign-in.

use serde_json::{Value, json};
use tracing::info;

use crate::error::{GatewayError, Result};
use crate::resource::{Query, ResourceLocator, ResourceService};

/// Downstream resource holding buyer records.
pub const BUYER_RESOURCE: &str = "generic.buyer";

/// Outcome of a sign-in: the buyer record, and whether it was created.
#[derive(Debug, Clone)]
pub struct SignIn {
    /// The downstream buyer record.
    pub buyer: Value,
    /// True when the buyer did not exist and was created.
    pub created: bool,
}

/// Finds the buyer for an identity-provider id, creating it on first
/// sign-in.
///
/// Absence here is the expected first-visit case, so it is the one place
/// a missing record is caught rather than propagated.
///
/// # Errors
///
/// Propagates downstream failures; never returns
/// [`GatewayError::NotFound`].
pub async fn sign_in<S: ResourceService>(service: &S, buyer_uuid: &str) -> Result<SignIn> {
    let locator = ResourceLocator::from_dotted(BUYER_RESOURCE);
    let mut query = Query::new();
    query.set("uuid", buyer_uuid);

    match service.get_object(&locator, &query).await {
        Ok(buyer) => Ok(SignIn { buyer, created: false }),
        Err(GatewayError::NotFound(_)) => {
            info!(buyer_uuid, "first sign-in, creating buyer");
            let buyer = service.post(&locator, &json!({ "uuid": buyer_uuid })).await?;
            Ok(SignIn { buyer, created: true })
        }
        Err(other) => Err(other),
    }
}
