//! Per-endpoint proxy configuration.

use std::fmt;
use std::sync::Arc;

use crate::proxy::{CallArgs, RequestContext, Verb};
use crate::resource::ResourceLocator;

type RewriteHook = dyn Fn(&RequestContext, Verb, CallArgs) -> CallArgs + Send + Sync;

/// Everything that distinguishes one proxy endpoint from another.
///
/// A descriptor names the downstream resource (dotted path), whitelists
/// the verbs the endpoint exposes, and optionally installs an
/// argument-rewrite hook and the ownership gate on PATCH. Descriptors are
/// built once at startup and shared by reference.
///
/// # Examples
///
/// ```
/// use payfront::proxy::{ProxyDescriptor, Verb};
///
/// let descriptor = ProxyDescriptor::new("provider.paymethod")
///     .allow([Verb::Get, Verb::Patch])
///     .gate_patch_on_ownership();
/// assert!(descriptor.allows(Verb::Get));
/// assert!(!descriptor.allows(Verb::Post));
/// ```
#[derive(Clone)]
pub struct ProxyDescriptor {
    resource: String,
    methods: Vec<Verb>,
    rewrite: Option<Arc<RewriteHook>>,
    gated_patch: bool,
}

impl ProxyDescriptor {
    /// Starts a descriptor for the downstream resource at `resource`
    /// (dotted path). No verbs are permitted until
    /// [`allow`](ProxyDescriptor::allow) is called.
    #[must_use]
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            methods: Vec::new(),
            rewrite: None,
            gated_patch: false,
        }
    }

    /// Whitelists the given verbs.
    #[must_use]
    pub fn allow(mut self, verbs: impl IntoIterator<Item = Verb>) -> Self {
        self.methods.extend(verbs);
        self
    }

    /// Installs the argument-rewrite hook.
    ///
    /// The hook runs after the verb check and before the downstream call,
    /// on every permitted request, and returns the arguments to dispatch
    /// with. Hooks must be pure argument transformations.
    #[must_use]
    pub fn rewrite(
        mut self,
        hook: impl Fn(&RequestContext, Verb, CallArgs) -> CallArgs + Send + Sync + 'static,
    ) -> Self {
        self.rewrite = Some(Arc::new(hook));
        self
    }

    /// Requires a scoped GET of the addressed record to succeed before
    /// any PATCH is dispatched.
    #[must_use]
    pub fn gate_patch_on_ownership(mut self) -> Self {
        self.gated_patch = true;
        self
    }

    /// Whether `verb` is in the endpoint's whitelist.
    #[must_use]
    pub fn allows(&self, verb: Verb) -> bool {
        self.methods.contains(&verb)
    }

    /// The installed rewrite hook, if any.
    #[must_use]
    pub fn rewrite_hook(&self) -> Option<&RewriteHook> {
        self.rewrite.as_deref()
    }

    /// Whether PATCH requires the ownership gate.
    #[must_use]
    pub fn patch_is_gated(&self) -> bool {
        self.gated_patch
    }

    /// Locator for the endpoint's resource, narrowed to `id` when given.
    #[must_use]
    pub fn locator(&self, id: Option<&str>) -> ResourceLocator {
        let locator = ResourceLocator::from_dotted(&self.resource);
        match id {
            Some(id) => locator.with_id(id),
            None => locator,
        }
    }
}

impl fmt::Debug for ProxyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyDescriptor")
            .field("resource", &self.resource)
            .field("methods", &self.methods)
            .field("rewrite", &self.rewrite.as_ref().map(|_| "<hook>"))
            .field("gated_patch", &self.gated_patch)
            .finish()
    }
}
