//! One-off sales.

use rust_decimal::Decimal;
use serde_json::{Value, json};
use tracing::info;

use crate::error::Result;
use crate::flows::paymethods::create_pay_method;
use crate::resource::{ResourceLocator, ResourceService};
use crate::session::Principal;

/// Provider endpoint that charges a one-off sale.
pub const SALE: &str = "provider.sale";

/// Input for a one-off sale.
///
/// The downstream validates the pay-method fields (exactly one of nonce
/// or stored URI), so they pass through here unchecked and a rejection
/// comes back as a structured client error.
#[derive(Debug, Clone)]
pub struct SaleParams {
    /// Public id of the product being bought.
    pub product_id: String,
    /// Amount to charge.
    pub amount: Decimal,
    /// One-time client nonce.
    pub nonce: Option<String>,
    /// Resource URI of a stored pay method.
    pub pay_method_uri: Option<String>,
}

/// Charges a one-off sale.
///
/// Sales work for anonymous checkouts too, so the principal is optional.
/// When a signed-in buyer pays with a nonce, the method is also stored
/// for later use; a failure there does not undo the completed charge and
/// is propagated after the sale.
pub async fn create_sale<S: ResourceService>(
    service: &S,
    principal: Option<&Principal>,
    params: &SaleParams,
) -> Result<Value> {
    info!(product = %params.product_id, "charging sale");
    let sale = service
        .post(
            &ResourceLocator::from_dotted(SALE),
            &json!({
                "amount": params.amount,
                "product_id": params.product_id,
                "nonce": params.nonce,
                "paymethod": params.pay_method_uri,
            }),
        )
        .await?;

    if let Some(principal) = principal
        && let Some(nonce) = &params.nonce
    {
        create_pay_method(service, principal, nonce).await?;
    }
    Ok(sale)
}
