//! The proxy dispatch state machine.

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{GatewayError, Result};
use crate::proxy::{
    CallArgs, ProxyDescriptor, ProxyRequest, ProxyResponse, RequestContext, Verb, error_400,
    error_403, error_404, error_405,
};
use crate::resource::ResourceService;

/// Serves one proxy endpoint: verb whitelist, argument rewrite, then at
/// most one downstream call.
///
/// [`handle`](ResourceProxy::handle) returns `Ok` with the response the
/// HTTP layer should serialize, including the structured 4xx bodies.
/// `Err` is reserved for what must stay loud: downstream 5xx and
/// transport failures.
#[derive(Debug)]
pub struct ResourceProxy<'a, S: ResourceService> {
    descriptor: &'a ProxyDescriptor,
    service: &'a S,
}

impl<'a, S: ResourceService> ResourceProxy<'a, S> {
    /// Binds a descriptor to the downstream service.
    #[must_use]
    pub fn new(descriptor: &'a ProxyDescriptor, service: &'a S) -> Self {
        Self { descriptor, service }
    }

    /// Serves one client request.
    ///
    /// # Errors
    ///
    /// Propagates [`GatewayError::ServerError`] and
    /// [`GatewayError::HttpError`]; every other outcome is a
    /// [`ProxyResponse`].
    pub async fn handle(
        &self,
        ctx: &RequestContext,
        request: ProxyRequest,
    ) -> Result<ProxyResponse> {
        match ctx.verb {
            Verb::Get => {
                let args = CallArgs { query: request.query, payload: Value::Null };
                self.dispatch(ctx, Verb::Get, request.id.as_deref(), args).await
            }
            Verb::Post => {
                let args = CallArgs { query: Default::default(), payload: request.payload };
                self.dispatch(ctx, Verb::Post, None, args).await
            }
            Verb::Patch => {
                if !self.descriptor.allows(Verb::Patch) {
                    warn!(verb = %Verb::Patch, "verb not permitted on this endpoint");
                    return Ok(error_405(None));
                }
                let Some(id) = request.id.as_deref() else {
                    return Ok(error_400(None));
                };
                if self.descriptor.patch_is_gated() {
                    // Scoped read of the addressed record. Anything short
                    // of success means the principal does not own it, and
                    // the update is never dispatched.
                    let probe =
                        self.dispatch(ctx, Verb::Get, Some(id), CallArgs::default()).await?;
                    if !probe.is_success() {
                        warn!(id, probe_status = probe.status, "ownership gate refused update");
                        return Ok(error_403(Some("Not allowed".into())));
                    }
                }
                let args = CallArgs { query: Default::default(), payload: request.payload };
                self.dispatch(ctx, Verb::Patch, Some(id), args).await
            }
        }
    }

    /// Checks the whitelist, rewrites arguments, and makes exactly one
    /// downstream call.
    async fn dispatch(
        &self,
        ctx: &RequestContext,
        effective: Verb,
        id: Option<&str>,
        mut args: CallArgs,
    ) -> Result<ProxyResponse> {
        if !self.descriptor.allows(effective) {
            warn!(verb = %effective, "verb not permitted on this endpoint");
            return Ok(error_405(None));
        }
        if let Some(hook) = self.descriptor.rewrite_hook() {
            args = hook(ctx, effective, args);
        }

        let locator = self.descriptor.locator(id);
        info!(verb = %effective, target = %locator, "proxying");
        let result = match effective {
            Verb::Get => self.service.get(&locator, &args.query).await,
            Verb::Post => self.service.post(&locator, &args.payload).await,
            Verb::Patch => self.service.patch(&locator, &args.payload).await,
        };

        match result {
            Ok(body) => Ok(ProxyResponse::ok(body)),
            Err(GatewayError::NotFound(_)) => Ok(error_404(None)),
            Err(GatewayError::ClientError { status, body }) => {
                warn!(target = %locator, status, "downstream rejected proxied request");
                let detail = if body.is_null() { None } else { Some(body) };
                Ok(error_400(detail))
            }
            Err(other) => Err(other),
        }
    }
}
