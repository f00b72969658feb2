//! Buyer transaction history.

use serde_json::Value;

use crate::error::Result;
use crate::resource::{ExpansionSpec, Query, ResourceLocator, ResourceService, expand};
use crate::session::Principal;

/// Vault mirror of provider transactions.
pub const VAULT_TRANSACTION: &str = "provider.vault.transaction";

/// Lists the buyer's provider transactions, with each underlying
/// transaction and its product expanded for display.
pub async fn retrieve<S: ResourceService>(service: &S, principal: &Principal) -> Result<Value> {
    let mut query = Query::new();
    query.set("transaction__buyer__uuid", principal.id.clone());
    let mut records = service
        .get(&ResourceLocator::from_dotted(VAULT_TRANSACTION), &query)
        .await?;
    expand(
        service,
        &mut records,
        &ExpansionSpec::new()
            .nested("transaction", ExpansionSpec::new().field("seller_product")),
    )
    .await?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::resource::mock::{MockOutcome, MockService};

    #[tokio::test]
    async fn test_retrieve_scopes_and_expands_two_levels() {
        let service = MockService::new();
        service.respond(
            "get provider.vault.transaction",
            MockOutcome::Ok(json!([{
                "resource_pk": 30,
                "transaction": "/generic/transaction/12/",
            }])),
        );
        service.respond(
            "get generic.transaction(12)",
            MockOutcome::Ok(json!({
                "resource_pk": 12,
                "seller_product": "/generic/product/3/",
            })),
        );
        service.respond(
            "get generic.product(3)",
            MockOutcome::Ok(json!({"resource_pk": 3, "public_id": "plan-a"})),
        );

        let principal = Principal::new("idp:abc", "/generic/buyer/7/");
        let records = retrieve(&service, &principal).await.unwrap();

        assert_eq!(
            records[0]["transaction"]["seller_product"]["public_id"],
            "plan-a"
        );
        assert_eq!(
            service.calls()[0].query.get("transaction__buyer__uuid"),
            Some("idp:abc")
        );
    }
}
