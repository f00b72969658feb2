//! Stored payment methods.
//!
//! Pay methods live in two places downstream: the provider endpoint that
//! tokenizes a one-time client nonce into a stored method, and the vault
//! mirror that this service lists, updates, and deletes against. Every
//! operation here is scoped to the authenticated buyer.

use serde_json::{Value, json};
use tracing::info;

use crate::error::{GatewayError, Result};
use crate::proxy::{ProxyDescriptor, Verb};
use crate::resource::{Query, ResourceLocator, ResourceService};
use crate::session::Principal;

/// Vault mirror of stored pay methods.
pub const VAULT_PAYMETHOD: &str = "provider.vault.paymethod";
/// Provider endpoint that turns a client nonce into a stored pay method.
pub const PAYMETHOD: &str = "provider.paymethod";
/// Provider endpoint that deletes a stored pay method.
pub const PAYMETHOD_DELETE: &str = "provider.paymethod.delete";

/// Descriptor for the client-facing pay-method endpoint.
///
/// Exposes GET and PATCH on the vault mirror. Every GET is pinned to the
/// authenticated buyer, listing defaults to active methods only, and
/// PATCH is gated on the scoped read so a buyer can only update their own
/// methods.
#[must_use]
pub fn pay_method_proxy() -> ProxyDescriptor {
    ProxyDescriptor::new(VAULT_PAYMETHOD)
        .allow([Verb::Get, Verb::Patch])
        .gate_patch_on_ownership()
        .rewrite(|ctx, effective, mut args| {
            if effective != Verb::Get {
                return args;
            }
            let mut query = Query::new();
            if ctx.verb == Verb::Get {
                let active = args.query.get("active").unwrap_or("true").to_owned();
                query.set("active", active);
            }
            // Pinned last so a client-supplied value never survives.
            query.set("buyer__uuid", ctx.principal.id.clone());
            args.query = query;
            args
        })
}

/// Stores a new pay method for `principal` from a one-time client nonce.
///
/// Returns the provider's response, which carries the vault record under
/// `"vault"`.
pub async fn create_pay_method<S: ResourceService>(
    service: &S,
    principal: &Principal,
    nonce: &str,
) -> Result<Value> {
    service
        .post(
            &ResourceLocator::from_dotted(PAYMETHOD),
            &json!({
                "buyer_uuid": principal.id,
                "nonce": nonce,
            }),
        )
        .await
}

/// Lists the buyer's active pay methods from the vault.
pub async fn active_pay_methods<S: ResourceService>(
    service: &S,
    principal: &Principal,
) -> Result<Value> {
    let mut query = Query::new();
    query.set("active", "true");
    query.set("buyer__uuid", principal.id.clone());
    service.get(&ResourceLocator::from_dotted(VAULT_PAYMETHOD), &query).await
}

/// Deletes one of the buyer's stored pay methods and returns the
/// remaining active ones.
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] when `pay_method_uri` does not
/// resolve to a method owned by `principal`.
pub async fn delete_pay_method<S: ResourceService>(
    service: &S,
    principal: &Principal,
    pay_method_uri: &str,
) -> Result<Value> {
    let mut query = Query::new();
    query.set("resource_uri", pay_method_uri);
    query.set("buyer__uuid", principal.id.clone());
    let owned = service
        .get_object(&ResourceLocator::from_dotted(VAULT_PAYMETHOD), &query)
        .await;
    match owned {
        Ok(_) => {}
        Err(GatewayError::NotFound(_)) => {
            return Err(GatewayError::Forbidden(format!(
                "pay method {pay_method_uri} is not owned by this buyer"
            )));
        }
        Err(other) => return Err(other),
    }

    info!(pay_method_uri, "deleting pay method");
    service
        .post(
            &ResourceLocator::from_dotted(PAYMETHOD_DELETE),
            &json!({ "paymethod": pay_method_uri }),
        )
        .await?;

    active_pay_methods(service, principal).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::proxy::{CallArgs, RequestContext};
    use crate::resource::mock::{MockOutcome, MockService};

    fn principal() -> Principal {
        Principal::new("idp:abc", "/generic/buyer/7/")
    }

    fn get_ctx() -> RequestContext {
        RequestContext { verb: Verb::Get, principal: principal() }
    }

    #[test]
    fn test_proxy_rewrite_scopes_and_defaults_active() {
        let descriptor = pay_method_proxy();
        let args =
            descriptor.rewrite_hook().unwrap()(&get_ctx(), Verb::Get, CallArgs::default());
        assert_eq!(args.query.get("active"), Some("true"));
        assert_eq!(args.query.get("buyer__uuid"), Some("idp:abc"));
    }

    #[test]
    fn test_proxy_rewrite_keeps_client_active_filter() {
        let descriptor = pay_method_proxy();
        let mut args = CallArgs::default();
        args.query.set("active", "false");
        args.query.set("buyer__uuid", "someone-else");

        let args = descriptor.rewrite_hook().unwrap()(&get_ctx(), Verb::Get, args);
        assert_eq!(args.query.get("active"), Some("false"));
        assert_eq!(args.query.get("buyer__uuid"), Some("idp:abc"));
    }

    #[test]
    fn test_proxy_rewrite_ownership_probe_has_no_active_filter() {
        // When the client verb is PATCH, the probe GET is scoped to the
        // buyer only, so inactive methods can still be updated.
        let descriptor = pay_method_proxy();
        let ctx = RequestContext { verb: Verb::Patch, principal: principal() };
        let args = descriptor.rewrite_hook().unwrap()(&ctx, Verb::Get, CallArgs::default());
        assert_eq!(args.query.get("active"), None);
        assert_eq!(args.query.get("buyer__uuid"), Some("idp:abc"));
    }

    #[test]
    fn test_proxy_rewrite_leaves_patch_payload_alone() {
        let descriptor = pay_method_proxy();
        let ctx = RequestContext { verb: Verb::Patch, principal: principal() };
        let args = CallArgs { query: Query::new(), payload: json!({"active": false}) };
        let args = descriptor.rewrite_hook().unwrap()(&ctx, Verb::Patch, args);
        assert_eq!(args.payload, json!({"active": false}));
        assert!(args.query.is_empty());
    }

    #[tokio::test]
    async fn test_create_pay_method_posts_nonce() {
        let service = MockService::new();
        service.respond(
            "post provider.paymethod",
            MockOutcome::Ok(json!({"vault": {"resource_uri": "/provider/vault/paymethod/9/"}})),
        );

        let record = create_pay_method(&service, &principal(), "nonce-1").await.unwrap();
        assert_eq!(record["vault"]["resource_uri"], "/provider/vault/paymethod/9/");
        assert_eq!(
            service.calls()[0].payload,
            json!({"buyer_uuid": "idp:abc", "nonce": "nonce-1"})
        );
    }

    #[tokio::test]
    async fn test_delete_refuses_foreign_pay_method() {
        let service = MockService::new();
        service.respond("get provider.vault.paymethod", MockOutcome::Ok(json!([])));

        let result =
            delete_pay_method(&service, &principal(), "/provider/vault/paymethod/9/").await;
        assert!(matches!(result.unwrap_err(), GatewayError::Forbidden(_)));
        assert_eq!(service.call_count("post", "provider.paymethod.delete"), 0);
    }

    #[tokio::test]
    async fn test_delete_owned_pay_method_returns_remaining() {
        let service = MockService::new();
        service.respond(
            "get provider.vault.paymethod",
            MockOutcome::Ok(json!([{"resource_pk": 9}])),
        );
        service.respond("post provider.paymethod.delete", MockOutcome::Ok(json!(null)));
        service.respond("get provider.vault.paymethod", MockOutcome::Ok(json!([])));

        let remaining =
            delete_pay_method(&service, &principal(), "/provider/vault/paymethod/9/")
                .await
                .unwrap();
        assert_eq!(remaining, json!([]));

        let calls = service.calls();
        assert_eq!(calls[0].query.get("resource_uri"), Some("/provider/vault/paymethod/9/"));
        assert_eq!(calls[0].query.get("buyer__uuid"), Some("idp:abc"));
        assert_eq!(calls[1].payload, json!({"paymethod": "/provider/vault/paymethod/9/"}));
        assert_eq!(calls[2].query.get("active"), Some("true"));
    }
}
