//! Session-bound transaction lifecycle.
//!
//! A session holds at most one live transaction reference. The
//! [`TransactionLedger`] owns that invariant: it creates the downstream
//! transaction record, pins its id into the session, and routes every
//! later status update through that pinned id until the reference is
//! reset.

use std::fmt;

use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use crate::error::{GatewayError, Result};
use crate::resource::{Query, ResourceLocator, ResourceService, record_pk};
use crate::session::{Principal, SessionStore};

/// Transaction statuses, serialized as the downstream's integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Awaiting downstream processing.
    Pending,
    /// Money moved.
    Completed,
    /// Verified against the payment provider.
    Checked,
    /// Provider callback received.
    Received,
    /// The provider declined.
    Failed,
    /// Cancelled before completion.
    Cancelled,
    /// Created by this front-door, not yet handed to the provider.
    Started,
    /// Failed inside the front-door after creation.
    Errored,
}

impl TransactionStatus {
    /// The integer code the downstream stores.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Completed => 1,
            Self::Checked => 2,
            Self::Received => 3,
            Self::Failed => 4,
            Self::Cancelled => 5,
            Self::Started => 6,
            Self::Errored => 7,
        }
    }
}

/// Transaction kinds, serialized as the downstream's integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    /// A purchase.
    Payment,
    /// A provider-initiated refund.
    Refund,
    /// A provider-initiated reversal.
    Reversal,
    /// A refund entered by support staff.
    RefundManual,
    /// A reversal entered by support staff.
    ReversalManual,
}

impl TransactionType {
    /// The integer code the downstream stores.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Payment => 0,
            Self::Refund => 1,
            Self::Reversal => 2,
            Self::RefundManual => 3,
            Self::ReversalManual => 4,
        }
    }
}

/// Provider tag this front-door stamps on every transaction it creates.
pub const PROVIDER_TAG: u8 = 4;

/// Session key pinning the live transaction id.
pub const TRANSACTION_SESSION_KEY: &str = "transaction_id";

const PRODUCT_RESOURCE: &str = "generic.product";
const TRANSACTION_RESOURCE: &str = "generic.transaction";

/// Handle over one session's transaction reference.
///
/// Constructed per request via [`attach`](TransactionLedger::attach); the
/// live id, if any, is read lazily from the session.
pub struct TransactionLedger<'a, S: ResourceService> {
    session: &'a mut dyn SessionStore,
    service: &'a S,
    id: Option<String>,
}

impl<'a, S: ResourceService> TransactionLedger<'a, S> {
    /// Attaches to the session's transaction reference.
    pub fn attach(session: &'a mut dyn SessionStore, service: &'a S) -> Self {
        let id = session.get(TRANSACTION_SESSION_KEY);
        Self { session, service, id }
    }

    /// The live transaction id, if the session holds one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Creates a transaction for `buyer` purchasing the product with
    /// `product_external_id`, and pins its id into the session.
    ///
    /// `extra` fields are merged over the defaults, so a caller can
    /// override anything including status and type.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TransactionAlreadyOpen`] if the session
    /// already holds a live transaction, and propagates
    /// [`GatewayError::NotFound`] when the product does not exist.
    #[instrument(skip(self, buyer, extra), fields(product = product_external_id))]
    pub async fn create(
        &mut self,
        buyer: &Principal,
        product_external_id: &str,
        extra: Map<String, Value>,
    ) -> Result<String> {
        if self.id.is_some() {
            return Err(GatewayError::TransactionAlreadyOpen);
        }

        let mut query = Query::new();
        query.set("external_id", product_external_id);
        let product = self
            .service
            .get_object_or_404(&ResourceLocator::from_dotted(PRODUCT_RESOURCE), &query)
            .await?;
        let seller = product.get("seller").cloned().ok_or_else(|| {
            GatewayError::MalformedRecord("product record has no seller".to_owned())
        })?;
        let seller_product = product.get("resource_uri").cloned().ok_or_else(|| {
            GatewayError::MalformedRecord("product record has no resource_uri".to_owned())
        })?;

        let mut payload = json!({
            "buyer": buyer.buyer_uri,
            "provider": PROVIDER_TAG,
            "seller": seller,
            "seller_product": seller_product,
            "status": TransactionStatus::Started.code(),
            "type": TransactionType::Payment.code(),
        });
        // Caller-supplied fields win.
        if let Some(map) = payload.as_object_mut() {
            for (key, value) in extra {
                map.insert(key, value);
            }
        }

        let record = self
            .service
            .post(&ResourceLocator::from_dotted(TRANSACTION_RESOURCE), &payload)
            .await?;
        let id = record_pk(&record)?;

        self.session.set(TRANSACTION_SESSION_KEY, &id);
        self.id = Some(id.clone());
        debug!(%id, "transaction opened");
        Ok(id)
    }

    /// Patches `fields` onto the live transaction.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NoOpenTransaction`] if the session holds no
    /// live transaction.
    pub async fn update(&mut self, fields: Map<String, Value>) -> Result<()> {
        let Some(id) = self.id.clone() else {
            return Err(GatewayError::NoOpenTransaction);
        };
        let locator = ResourceLocator::from_dotted(TRANSACTION_RESOURCE).with_id(&id);
        debug!(%id, ?fields, "transaction updated");
        self.service.patch(&locator, &Value::Object(fields)).await?;
        Ok(())
    }

    /// Marks the live transaction completed.
    pub async fn succeeded(&mut self) -> Result<()> {
        let mut fields = Map::new();
        fields.insert("status".to_owned(), TransactionStatus::Completed.code().into());
        self.update(fields).await
    }

    /// Marks the live transaction errored, recording `reason`.
    pub async fn errored(&mut self, reason: &str) -> Result<()> {
        let mut fields = Map::new();
        fields.insert("status".to_owned(), TransactionStatus::Errored.code().into());
        fields.insert("status_reason".to_owned(), reason.into());
        self.update(fields).await
    }

    /// Drops the session's transaction reference. Idempotent; the
    /// downstream record is left as-is.
    pub fn reset(&mut self) {
        if let Some(id) = self.id.take() {
            debug!(%id, "transaction reference dropped");
        }
        self.session.delete(TRANSACTION_SESSION_KEY);
    }
}

impl<S: ResourceService> fmt::Debug for TransactionLedger<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionLedger").field("id", &self.id).finish_non_exhaustive()
    }
}
