//! Recurring subscriptions.

use rust_decimal::Decimal;
use serde_json::{Value, json};
use tracing::info;

use crate::error::{GatewayError, Result};
use crate::flows::paymethods::create_pay_method;
use crate::resource::{ExpansionSpec, Query, ResourceLocator, ResourceService, expand, record_pk};
use crate::session::Principal;

/// Vault mirror of subscriptions.
pub const VAULT_SUBSCRIPTION: &str = "provider.vault.subscription";
/// Provider endpoint that opens a subscription.
pub const SUBSCRIPTION: &str = "provider.subscription";
/// Provider endpoint that moves a subscription to another pay method.
pub const SUBSCRIPTION_PAYMETHOD_CHANGE: &str = "provider.subscription.paymethod.change";
/// Provider endpoint that cancels a subscription.
pub const SUBSCRIPTION_CANCEL: &str = "provider.subscription.cancel";

const PRODUCT_RESOURCE: &str = "generic.product";

/// Input for opening a subscription.
///
/// Exactly one of `pay_method_uri` (a stored method) or
/// `pay_method_nonce` (a one-time client token) must be supplied; the
/// URI wins when both are present.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionParams {
    /// Public id of the plan's product record.
    pub plan_id: String,
    /// Price override, when the plan allows one.
    pub amount: Option<Decimal>,
    /// Resource URI of a stored pay method.
    pub pay_method_uri: Option<String>,
    /// One-time client nonce to store a new pay method from.
    pub pay_method_nonce: Option<String>,
}

/// Lists the buyer's subscriptions with their plan products expanded.
pub async fn retrieve<S: ResourceService>(service: &S, principal: &Principal) -> Result<Value> {
    let mut query = Query::new();
    query.set("paymethod__buyer__uuid", principal.id.clone());
    let mut subscriptions = service
        .get(&ResourceLocator::from_dotted(VAULT_SUBSCRIPTION), &query)
        .await?;
    expand(
        service,
        &mut subscriptions,
        &ExpansionSpec::new().field("seller_product"),
    )
    .await?;
    Ok(subscriptions)
}

/// Opens a subscription for `principal` on the plan in `params`.
///
/// # Errors
///
/// Propagates [`GatewayError::NotFound`] when the plan does not exist,
/// returns [`GatewayError::AlreadySubscribed`] when the buyer already has
/// a subscription on it, and [`GatewayError::InvalidRequest`] when no pay
/// method was supplied.
pub async fn create<S: ResourceService>(
    service: &S,
    principal: &Principal,
    params: &SubscriptionParams,
) -> Result<Value> {
    let mut query = Query::new();
    query.set("public_id", params.plan_id.clone());
    let product = service
        .get_object_or_404(&ResourceLocator::from_dotted(PRODUCT_RESOURCE), &query)
        .await?;
    let product_pk = record_pk(&product)?;

    let mut query = Query::new();
    query.set("paymethod__buyer__uuid", principal.id.clone());
    query.set("seller_product", product_pk);
    let existing = service
        .get(&ResourceLocator::from_dotted(VAULT_SUBSCRIPTION), &query)
        .await?;
    if existing.as_array().is_some_and(|subs| !subs.is_empty()) {
        return Err(GatewayError::AlreadySubscribed);
    }

    let pay_method_uri = resolve_pay_method(service, principal, params).await?;
    info!(plan = %params.plan_id, "opening subscription");
    let mut payload = json!({
        "paymethod": pay_method_uri,
        "plan": params.plan_id,
    });
    if let Some(amount) = params.amount
        && let Some(map) = payload.as_object_mut()
    {
        map.insert("amount".to_owned(), json!(amount));
    }
    service.post(&ResourceLocator::from_dotted(SUBSCRIPTION), &payload).await
}

/// Moves one of the buyer's subscriptions to another of their stored pay
/// methods.
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] when either the subscription or
/// the target pay method is not owned by `principal`.
pub async fn change_pay_method<S: ResourceService>(
    service: &S,
    principal: &Principal,
    subscription_uri: &str,
    pay_method_uri: &str,
) -> Result<Value> {
    require_owned(service, principal, VAULT_SUBSCRIPTION, "paymethod__buyer__uuid", subscription_uri)
        .await?;
    require_owned(
        service,
        principal,
        super::paymethods::VAULT_PAYMETHOD,
        "buyer__uuid",
        pay_method_uri,
    )
    .await?;

    service
        .post(
            &ResourceLocator::from_dotted(SUBSCRIPTION_PAYMETHOD_CHANGE),
            &json!({
                "subscription": subscription_uri,
                "paymethod": pay_method_uri,
            }),
        )
        .await
}

/// Cancels one of the buyer's subscriptions.
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] when the subscription is not owned
/// by `principal`.
pub async fn cancel<S: ResourceService>(
    service: &S,
    principal: &Principal,
    subscription_uri: &str,
) -> Result<Value> {
    require_owned(service, principal, VAULT_SUBSCRIPTION, "paymethod__buyer__uuid", subscription_uri)
        .await?;
    info!(subscription_uri, "cancelling subscription");
    service
        .post(
            &ResourceLocator::from_dotted(SUBSCRIPTION_CANCEL),
            &json!({ "subscription": subscription_uri }),
        )
        .await
}

/// Resolves the pay method to charge: a stored URI as-is, or a new
/// method stored from the nonce.
async fn resolve_pay_method<S: ResourceService>(
    service: &S,
    principal: &Principal,
    params: &SubscriptionParams,
) -> Result<String> {
    if let Some(uri) = &params.pay_method_uri {
        return Ok(uri.clone());
    }
    let Some(nonce) = &params.pay_method_nonce else {
        return Err(GatewayError::InvalidRequest(
            "a pay method URI or nonce is required".to_owned(),
        ));
    };
    let method = create_pay_method(service, principal, nonce).await?;
    method["vault"]["resource_uri"]
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| {
            GatewayError::MalformedRecord(
                "pay method response has no vault resource_uri".to_owned(),
            )
        })
}

/// Scoped single-record read that turns absence into a 403-flavored
/// error.
async fn require_owned<S: ResourceService>(
    service: &S,
    principal: &Principal,
    resource: &str,
    scope_key: &str,
    uri: &str,
) -> Result<Value> {
    let mut query = Query::new();
    query.set("resource_uri", uri);
    query.set(scope_key, principal.id.clone());
    match service.get_object(&ResourceLocator::from_dotted(resource), &query).await {
        Ok(record) => Ok(record),
        Err(GatewayError::NotFound(_)) => Err(GatewayError::Forbidden(format!(
            "{uri} is not owned by this buyer"
        ))),
        Err(other) => Err(other),
    }
}
